//! Caption beats faded in and out over windows of smoothed progress.

use crate::config::NarrativeConfig;
use crate::progress::interpolate;

/// Opacity envelope of one caption over smoothed progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatWindow {
    pub start: f64,
    pub fade_in_end: f64,
    pub fade_out_start: f64,
    pub end: f64,
}

impl BeatWindow {
    pub const fn new(start: f64, fade_in_end: f64, fade_out_start: f64, end: f64) -> Self {
        Self {
            start,
            fade_in_end,
            fade_out_start,
            end,
        }
    }

    /// Piecewise-linear envelope, zero outside `[start, end]`.
    pub fn opacity(&self, s: f64) -> f64 {
        if !s.is_finite() || s < self.start || s > self.end {
            return 0.0;
        }
        if s < self.fade_in_end {
            return (s - self.start) / (self.fade_in_end - self.start);
        }
        if s <= self.fade_out_start {
            return 1.0;
        }
        if s < self.end {
            return (self.end - s) / (self.end - self.fade_out_start);
        }
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Beat {
    pub id: String,
    pub window: BeatWindow,
}

/// Every overlay value derived from one smoothed progress sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayFrame {
    pub progress: f64,
    /// Opacity per beat, in configuration order.
    pub beats: Vec<(String, f64)>,
    /// The "scroll to explore" hint, visible only at the very top.
    pub scroll_indicator: f64,
}

impl OverlayFrame {
    pub fn opacity_of(&self, id: &str) -> Option<f64> {
        self.beats
            .iter()
            .find(|(beat, _)| beat == id)
            .map(|(_, o)| *o)
    }

    /// The most visible beat, if any is showing.
    pub fn dominant(&self) -> Option<&str> {
        self.beats
            .iter()
            .filter(|(_, o)| *o > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    beats: Vec<Beat>,
    indicator_fade_end: f64,
}

impl Narrative {
    pub fn new(beats: Vec<Beat>, indicator_fade_end: f64) -> Self {
        Self {
            beats,
            indicator_fade_end,
        }
    }

    pub fn from_config(cfg: &NarrativeConfig) -> Self {
        let beats = cfg
            .beats
            .iter()
            .map(|b| Beat {
                id: b.id.clone(),
                window: b.beat_window(),
            })
            .collect();
        Self::new(beats, cfg.indicator_fade_end)
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn sample(&self, s: f64) -> OverlayFrame {
        OverlayFrame {
            progress: s,
            beats: self
                .beats
                .iter()
                .map(|b| (b.id.clone(), b.window.opacity(s)))
                .collect(),
            scroll_indicator: interpolate(&[0.0, self.indicator_fade_end], &[1.0, 0.0], s),
        }
    }
}
