//! Call-to-action reveal: scroll-driven visuals plus a forced-open override.

use std::time::{Duration, Instant};

use crate::config::CtaConfig;
use crate::progress::mapper::ramp;

const CLIP_MIN_PCT: f64 = 29.0;
const CLIP_MAX_PCT: f64 = 50.0;
const CONTENT_TRAVEL_PX: f64 = 50.0;
const BACKGROUND_START_SCALE: f64 = 1.2;

/// Visual parameters of the panel for one progress value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtaVisuals {
    /// Half-extent of the centred clip square, in percent of the panel.
    pub clip_half_extent_pct: f64,
    pub content_opacity: f64,
    /// Downward offset of the content block in pixels.
    pub content_offset_px: f64,
    pub background_scale: f64,
}

impl CtaVisuals {
    pub fn at(progress: f64) -> Self {
        let clip = ramp(progress, 0.2, 0.6);
        let content = ramp(progress, 0.4, 0.3);
        let scale = ramp(progress, 0.2, 0.5);
        Self::from_phases(clip, content, scale)
    }

    /// The fully revealed end state.
    pub fn terminal() -> Self {
        Self::from_phases(1.0, 1.0, 1.0)
    }

    fn from_phases(clip: f64, content: f64, scale: f64) -> Self {
        Self {
            clip_half_extent_pct: CLIP_MIN_PCT + (CLIP_MAX_PCT - CLIP_MIN_PCT) * clip,
            content_opacity: content,
            content_offset_px: CONTENT_TRAVEL_PX * (1.0 - content),
            background_scale: BACKGROUND_START_SCALE - (BACKGROUND_START_SCALE - 1.0) * scale,
        }
    }

    /// Clip polygon corners in percent, clockwise from top-left.
    pub fn clip_polygon(&self) -> [(f64, f64); 4] {
        let lo = 50.0 - self.clip_half_extent_pct;
        let hi = 50.0 + self.clip_half_extent_pct;
        [(lo, lo), (hi, lo), (hi, hi), (lo, hi)]
    }

    pub fn is_fully_open(&self) -> bool {
        *self == Self::terminal()
    }
}

impl Default for CtaVisuals {
    fn default() -> Self {
        Self::at(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Visuals follow scroll progress.
    Natural,
    /// Visuals are pinned to the terminal state.
    Forced,
}

/// `Natural -> Forced` on an open command; back to `Natural` once progress
/// drops below the threshold and the post-open cooldown has passed.
#[derive(Debug, Clone)]
pub struct ForcedOpen {
    state: RevealState,
    guard_until: Option<Instant>,
    cooldown: Duration,
    revert_below: f64,
}

impl ForcedOpen {
    pub fn new(cooldown: Duration, revert_below: f64) -> Self {
        Self {
            state: RevealState::Natural,
            guard_until: None,
            cooldown,
            revert_below,
        }
    }

    pub fn from_config(cfg: &CtaConfig) -> Self {
        Self::new(cfg.cooldown, cfg.revert_below)
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn guard_active(&self, now: Instant) -> bool {
        self.guard_until.is_some_and(|until| now < until)
    }

    /// Force the panel open and arm the cooldown. Re-arms when already forced.
    pub fn open(&mut self, now: Instant) -> CtaVisuals {
        self.state = RevealState::Forced;
        self.guard_until = Some(now + self.cooldown);
        CtaVisuals::terminal()
    }

    pub fn on_progress(&mut self, raw: f64, now: Instant) -> CtaVisuals {
        if self.state == RevealState::Forced
            && raw < self.revert_below
            && !self.guard_active(now)
        {
            self.state = RevealState::Natural;
            self.guard_until = None;
        }
        self.visuals(raw)
    }

    pub fn visuals(&self, raw: f64) -> CtaVisuals {
        match self.state {
            RevealState::Forced => CtaVisuals::terminal(),
            RevealState::Natural => CtaVisuals::at(raw),
        }
    }
}
