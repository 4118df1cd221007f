//! Critically damped spring driven by discrete kicks
//!
//! Wheel, touch and key input arrive as instantaneous kicks on the spring's
//! position. Between kicks the spring pulls back to zero and goes idle once
//! it has settled, so a host only schedules frames while it is moving.

use serde::{Deserialize, Serialize};

use crate::tuning::SpringTuning;

/// Whether the spring wants animation frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpringPhase {
    /// At exactly zero, nothing to animate
    #[default]
    Idle,
    /// Displaced or moving
    Kicked,
}

/// Saturating map of `y` into `(-limit * softness, limit * softness)`.
///
/// Zero at zero, odd, strictly increasing in `|y|`. A non-positive limit or
/// softness maps everything to zero.
pub fn rubber(y: f32, limit: f32, softness: f32) -> f32 {
    let k = limit * softness;
    if !(k > 0.0) || y == 0.0 {
        return 0.0;
    }
    // Ratio first so huge finite inputs cannot overflow
    let mag = y.abs();
    y.signum() * k * (mag / (k + mag))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubberSpring {
    pub tuning: SpringTuning,
    position: f32,
    velocity: f32,
    /// Timestamp of the previous frame, cleared on rest and suspend
    last_frame_ms: Option<f64>,
    phase: SpringPhase,
    /// Largest |position| since the spring last rested
    peak: f32,
}

impl RubberSpring {
    pub fn new(tuning: SpringTuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
            position: 0.0,
            velocity: 0.0,
            last_frame_ms: None,
            phase: SpringPhase::Idle,
            peak: 0.0,
        }
    }

    /// Push the spring by `delta` and return the new raw position.
    ///
    /// Input is attenuated as the spring nears its range and the result is
    /// clamped to the raw limit. Residual velocity is discarded.
    pub fn kick(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() {
            log::warn!("Ignoring non-finite kick {}", delta);
            return self.position;
        }

        let crowd = if self.tuning.max_range > 0.0 {
            (self.position.abs() / self.tuning.max_range).min(1.0)
        } else {
            1.0
        };
        let attenuated = delta / (1.0 + self.tuning.crowding * crowd);
        // `tuning` is public; NaN or negative limits collapse to zero
        let limit = self.tuning.raw_limit().max(0.0);

        self.position = (self.position + attenuated).clamp(-limit, limit);
        self.velocity = 0.0;
        self.phase = SpringPhase::Kicked;
        self.peak = self.peak.max(self.position.abs());
        self.position
    }

    /// Advance by `dt` seconds (clamped to `max_dt`).
    ///
    /// Returns true while the spring still wants frames.
    pub fn step(&mut self, dt: f32) -> bool {
        if self.phase == SpringPhase::Idle {
            return false;
        }

        let dt = dt.clamp(0.0, self.tuning.max_dt);
        let accel = -self.tuning.stiffness * self.position - self.tuning.damping() * self.velocity;
        self.velocity += accel * dt;
        self.position += self.velocity * dt;

        if self.position.abs() < self.tuning.position_epsilon
            && self.velocity.abs() < self.tuning.velocity_epsilon
        {
            self.settle();
        }
        self.is_active()
    }

    /// Display-refresh entry point; `now_ms` is the frame timestamp.
    ///
    /// The first frame after a kick or a suspend measures no time.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if self.phase == SpringPhase::Idle {
            self.last_frame_ms = None;
            return false;
        }

        let dt = match self.last_frame_ms {
            Some(prev) => ((now_ms - prev).max(0.0) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.step(dt)
    }

    /// Forget the frame clock (page hidden)
    pub fn suspend(&mut self) {
        self.last_frame_ms = None;
    }

    fn settle(&mut self) {
        self.position = 0.0;
        self.velocity = 0.0;
        self.last_frame_ms = None;
        self.phase = SpringPhase::Idle;
        self.peak = 0.0;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == SpringPhase::Kicked
    }

    pub fn phase(&self) -> SpringPhase {
        self.phase
    }

    /// Raw position
    pub fn raw(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Compressed position for visuals
    pub fn display(&self) -> f32 {
        rubber(self.position, self.tuning.max_range, self.tuning.softness)
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }
}

impl Default for RubberSpring {
    fn default() -> Self {
        Self::new(SpringTuning::default())
    }
}
