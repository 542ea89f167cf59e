use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};

use crate::overlay::BeatWindow;
use crate::progress::ScrollOffsets;

/// Top-level configuration for the sequence player, the CTA panel and the
/// headless rehearsal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Which frames to load and where they live.
    pub sequence: SequenceConfig,
    /// Spring smoothing applied to raw scroll progress.
    pub spring: SpringConfig,
    /// Render loop cadence and surface defaults.
    pub render: RenderConfig,
    /// Caption beats synchronized to smoothed progress.
    pub narrative: NarrativeConfig,
    /// Forced-open behaviour of the call-to-action panel.
    pub cta: CtaConfig,
    /// Page geometry used by the rehearsal binary.
    pub layout: LayoutConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            sequence: SequenceConfig::default(),
            spring: SpringConfig::default(),
            render: RenderConfig::default(),
            narrative: NarrativeConfig::default(),
            cta: CtaConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.sequence
            .validate()
            .context("invalid sequence configuration")?;
        self.spring
            .validate()
            .context("invalid spring configuration")?;
        self.render
            .validate()
            .context("invalid render configuration")?;
        self.narrative
            .validate()
            .context("invalid narrative configuration")?;
        self.cta.validate().context("invalid cta configuration")?;
        self.layout
            .validate()
            .context("invalid layout configuration")?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        })
    }
}

/// What the loader does with frames that fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Keep only the successes; later frames shift down by the number of
    /// earlier failures.
    Drop,
    /// Fill each failed slot with its nearest decoded neighbour so indices
    /// keep lining up with the sequence.
    #[default]
    NearestNeighbor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SequenceConfig {
    pub base_path_desktop: PathBuf,
    pub base_path_mobile: PathBuf,
    /// Frame filenames are `<prefix>-<NNN>.<extension>`, 1-indexed.
    pub filename_prefix: String,
    pub extension: String,
    pub frame_count: usize,
    /// Viewports narrower than this load the mobile asset set.
    pub mobile_breakpoint_px: f64,
    pub gap_policy: GapPolicy,
    /// Scroll range the sequence container is tracked over.
    pub offsets: ScrollOffsets,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            base_path_desktop: PathBuf::from("public/sequence"),
            base_path_mobile: PathBuf::from("public/framesmobile"),
            filename_prefix: "ezgif-frame".to_string(),
            extension: "jpg".to_string(),
            frame_count: 144,
            mobile_breakpoint_px: 768.0,
            gap_policy: GapPolicy::default(),
            offsets: ScrollOffsets::Pinned,
        }
    }
}

impl SequenceConfig {
    pub fn device_class(&self, viewport_width: f64) -> DeviceClass {
        if viewport_width < self.mobile_breakpoint_px {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn base_path(&self, device: DeviceClass) -> &Path {
        match device {
            DeviceClass::Desktop => &self.base_path_desktop,
            DeviceClass::Mobile => &self.base_path_mobile,
        }
    }

    /// Filename of the zero-based frame `index`.
    pub fn frame_filename(&self, index: usize) -> String {
        format!(
            "{}-{:03}.{}",
            self.filename_prefix,
            index + 1,
            self.extension
        )
    }

    pub fn frame_paths(&self, device: DeviceClass) -> Vec<PathBuf> {
        let base = self.base_path(device);
        (0..self.frame_count)
            .map(|i| base.join(self.frame_filename(i)))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.frame_count > 0,
            "sequence.frame-count must be greater than zero"
        );
        ensure!(
            self.mobile_breakpoint_px.is_finite() && self.mobile_breakpoint_px > 0.0,
            "sequence.mobile-breakpoint-px must be positive"
        );
        ensure!(
            !self.filename_prefix.is_empty(),
            "sequence.filename-prefix must not be empty"
        );
        ensure!(
            !self.extension.is_empty(),
            "sequence.extension must not be empty"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Distance from the target below which the output snaps to it.
    pub rest_delta: f64,
    /// Speed below which the spring is allowed to come to rest.
    pub rest_speed: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 30.0,
            mass: 1.0,
            rest_delta: 0.001,
            rest_speed: 0.01,
        }
    }
}

impl SpringConfig {
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.stiffness.is_finite() && self.stiffness > 0.0,
            "spring.stiffness must be positive"
        );
        ensure!(
            self.mass.is_finite() && self.mass > 0.0,
            "spring.mass must be positive"
        );
        ensure!(
            self.damping.is_finite() && self.damping >= self.critical_damping() - 1e-9,
            "spring.damping ({}) must be at least critical damping ({:.3})",
            self.damping,
            self.critical_damping()
        );
        ensure!(
            self.rest_delta.is_finite() && self.rest_delta > 0.0,
            "spring.rest-delta must be positive"
        );
        ensure!(
            self.rest_speed.is_finite() && self.rest_speed > 0.0,
            "spring.rest-speed must be positive"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderConfig {
    /// Cadence of the render and smoothing loops.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
    /// Surface size used until the first frame is decoded.
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
            fallback_width: 1920,
            fallback_height: 1080,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.frame_interval > Duration::ZERO,
            "render.frame-interval must be positive"
        );
        ensure!(
            self.fallback_width > 0 && self.fallback_height > 0,
            "render.fallback-width and render.fallback-height must be positive"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BeatConfig {
    pub id: String,
    pub window: [f64; 4],
}

impl BeatConfig {
    pub fn beat_window(&self) -> BeatWindow {
        let [start, fade_in_end, fade_out_start, end] = self.window;
        BeatWindow::new(start, fade_in_end, fade_out_start, end)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NarrativeConfig {
    pub beats: Vec<BeatConfig>,
    /// Smoothed progress at which the "scroll down" hint has fully faded.
    pub indicator_fade_end: f64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        let beat = |id: &str, window: [f64; 4]| BeatConfig {
            id: id.to_string(),
            window,
        };
        Self {
            beats: vec![
                beat("beat-a", [0.0, 0.1, 0.2, 0.25]),
                beat("beat-b", [0.25, 0.3, 0.45, 0.5]),
                beat("beat-c", [0.5, 0.55, 0.7, 0.75]),
                beat("beat-d", [0.75, 0.8, 0.9, 0.95]),
            ],
            indicator_fade_end: 0.05,
        }
    }
}

impl NarrativeConfig {
    fn validate(&self) -> Result<()> {
        for beat in &self.beats {
            ensure!(!beat.id.is_empty(), "narrative beat id must not be empty");
            let w = beat.window;
            ensure!(
                w.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)),
                "beat {} window must lie inside [0, 1]",
                beat.id
            );
            ensure!(
                w[0] <= w[1] && w[1] <= w[2] && w[2] <= w[3],
                "beat {} window must be ordered start <= fade-in-end <= fade-out-start <= end",
                beat.id
            );
        }
        ensure!(
            self.indicator_fade_end.is_finite() && self.indicator_fade_end > 0.0,
            "narrative.indicator-fade-end must be positive"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CtaConfig {
    /// How long automatic reversion is suppressed after a forced open.
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Raw progress below which a forced panel falls back to scroll control.
    pub revert_below: f64,
}

impl Default for CtaConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(2000),
            revert_below: 0.1,
        }
    }
}

impl CtaConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.cooldown > Duration::ZERO,
            "cta.cooldown must be positive"
        );
        ensure!(
            self.revert_below > 0.0 && self.revert_below < 1.0,
            "cta.revert-below must lie inside (0, 1)"
        );
        Ok(())
    }
}

/// A vertical length on the page, either absolute or in viewport heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Px(f64),
    Vh(f64),
}

impl Extent {
    pub fn resolve(&self, viewport_height: f64) -> f64 {
        match *self {
            Self::Px(px) => px,
            Self::Vh(vh) => vh / 100.0 * viewport_height,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(n) = raw.strip_suffix("vh") {
            n.trim().parse().ok().map(Self::Vh)
        } else if let Some(n) = raw.strip_suffix("px") {
            n.trim().parse().ok().map(Self::Px)
        } else {
            raw.parse().ok().map(Self::Px)
        }
    }

    fn is_valid(&self) -> bool {
        match *self {
            Self::Px(v) | Self::Vh(v) => v.is_finite() && v >= 0.0,
        }
    }
}

impl<'de> Deserialize<'de> for Extent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(px) => Ok(Self::Px(px)),
            Raw::Text(s) => Self::parse(&s).ok_or_else(|| {
                de::Error::invalid_value(de::Unexpected::Str(&s), &"a length like 500vh or 2500px")
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerConfig {
    pub top: Extent,
    pub height: Extent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutConfig {
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Tall scroll container hosting the pinned frame sequence.
    pub sequence: ContainerConfig,
    /// Container revealing the call-to-action panel.
    pub cta: ContainerConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1440.0,
            viewport_height: 900.0,
            sequence: ContainerConfig {
                top: Extent::Px(0.0),
                height: Extent::Vh(500.0),
            },
            cta: ContainerConfig {
                top: Extent::Vh(800.0),
                height: Extent::Px(2500.0),
            },
        }
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.viewport_width > 0.0 && self.viewport_height > 0.0,
            "layout viewport dimensions must be positive"
        );
        for (name, c) in [("sequence", &self.sequence), ("cta", &self.cta)] {
            ensure!(
                c.top.is_valid() && c.height.is_valid(),
                "layout.{name} extents must be finite and non-negative"
            );
        }
        Ok(())
    }
}
