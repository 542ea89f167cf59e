use std::time::Duration;

use crate::config::SpringConfig;

/// Largest integration step; keeps the explicit integrator stable for stiff
/// springs.
const MAX_SUBSTEP_SECS: f64 = 0.004;
/// Longest frame gap honoured per call. Anything longer (a backgrounded host,
/// a debugger pause) is treated as this much time.
const MAX_FRAME_SECS: f64 = 0.064;

/// Damped spring that chases raw progress.
///
/// The output never leaves `[0, 1]` and, once it is within `rest_delta` of
/// the target while moving slower than `rest_speed`, it snaps exactly onto
/// the target and stops integrating until the target moves again.
#[derive(Debug, Clone)]
pub struct Smoother {
    params: SpringConfig,
    position: f64,
    velocity: f64,
    target: f64,
    resting: bool,
    pinned: Option<f64>,
}

impl Smoother {
    pub fn new(params: SpringConfig, initial: f64) -> Self {
        let initial = sanitize(initial);
        Self {
            params,
            position: initial,
            velocity: 0.0,
            target: initial,
            resting: true,
            pinned: None,
        }
    }

    /// Current output. A pinned override wins over the spring.
    pub fn value(&self) -> f64 {
        self.pinned.unwrap_or(self.position.clamp(0.0, 1.0))
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_resting(&self) -> bool {
        self.resting
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    pub fn set_target(&mut self, target: f64) {
        let target = sanitize(target);
        if target != self.target {
            self.target = target;
            self.resting = false;
        }
    }

    /// Force the output to `value` immediately, or release the override with
    /// `None`. The spring keeps tracking its target underneath.
    pub fn pin(&mut self, value: Option<f64>) {
        self.pinned = value.map(sanitize);
    }

    /// Teleport to `value` with no motion.
    pub fn jump_to(&mut self, value: f64) {
        let value = sanitize(value);
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
        self.resting = true;
    }

    /// Advance the spring by `dt` and return the new output.
    pub fn step(&mut self, dt: Duration) -> f64 {
        if self.resting {
            return self.value();
        }
        let mut remaining = dt.as_secs_f64().min(MAX_FRAME_SECS);
        let SpringConfig {
            stiffness,
            damping,
            mass,
            ..
        } = self.params;
        let inv_mass = 1.0 / mass;
        while remaining > 0.0 {
            let h = remaining.min(MAX_SUBSTEP_SECS);
            let displacement = self.position - self.target;
            let acceleration = (-stiffness * displacement - damping * self.velocity) * inv_mass;
            self.velocity += acceleration * h;
            self.position += self.velocity * h;
            remaining -= h;
        }
        if (self.position - self.target).abs() <= self.params.rest_delta
            && self.velocity.abs() <= self.params.rest_speed
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.resting = true;
        }
        self.value()
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}
