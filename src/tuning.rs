//! Data-driven physics constants
//!
//! Gameplay tuning is kept apart from user preferences (see `settings`). Every
//! field has a default, so a JSON document only needs the values it changes.

use serde::{Deserialize, Serialize};

/// Skill labels shown on the bumpers, assigned cyclically
pub const SKILL_LABELS: [&str; 10] = [
    "TypeScript",
    "React",
    "Node.js",
    "Express",
    "MongoDB",
    "PostgreSQL",
    "Tailwind",
    "Docker",
    "Git",
    "AWS",
];

/// How bumpers are placed on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BumperLayout {
    /// Fixed grid filtered by an occupancy mask
    #[default]
    Grid,
    /// Seeded rejection sampling in two lanes above the flippers
    Scattered { seed: u64 },
}

/// Pinball table tuning. Ball values are per-frame at `consts::FRAME_DT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PinballTuning {
    /// Added to vy every frame
    pub gravity: f32,
    /// Velocity multiplier every frame (slightly below 1)
    pub friction: f32,
    pub ball_radius: f32,
    /// Spawn point offset from the top-right playfield corner
    pub spawn_inset: f32,
    pub spawn_velocity: [f32; 2],
    /// Ball speed limit per frame; below the ball diameter so walls cannot be skipped
    pub max_ball_speed: f32,
    pub wall_restitution: f32,

    /// Restitution while a flipper swings toward its active angle
    pub flipper_strike_restitution: f32,
    /// Speed added along the contact normal when a swinging flipper connects
    pub flipper_kick: f32,
    pub flipper_length: f32,
    pub flipper_thickness: f32,
    /// Side-relative angles (radians, positive = tip down)
    pub flipper_rest_angle: f32,
    pub flipper_active_angle: f32,
    /// Radians per second
    pub flipper_max_speed: f32,
    /// Flipper pivot height above the bottom edge
    pub flipper_bottom_offset: f32,

    pub bumper_radius: f32,
    pub bumper_restitution: f32,
    /// Outward speed added on an active strike
    pub bumper_kick: f32,
    /// Seconds a struck bumper stays lit
    pub bumper_lit_duration: f32,
    /// Seconds before a struck bumper can kick again
    pub bumper_cooldown: f32,
    pub bumper_layout: BumperLayout,

    /// Inner margin from the canvas edge
    pub margin: f32,
    /// Ramp start as a fraction of table height
    pub ramp_start_ratio: f32,
    /// Horizontal distance between the flipper pivots
    pub drain_gap: f32,
    /// Platform width outside each flipper pivot
    pub platform_width: f32,
    /// How far below the bottom edge the ball must fall before respawning
    pub drain_margin: f32,
}

impl Default for PinballTuning {
    fn default() -> Self {
        Self {
            gravity: 0.32,
            friction: 0.9992,
            ball_radius: 9.0,
            spawn_inset: 60.0,
            spawn_velocity: [-3.0, 0.0],
            max_ball_speed: 16.0,
            wall_restitution: 0.92,

            flipper_strike_restitution: 1.4,
            flipper_kick: 8.0,
            flipper_length: 110.0,
            flipper_thickness: 14.0,
            flipper_rest_angle: 0.5,
            flipper_active_angle: -0.45,
            flipper_max_speed: 18.0,
            flipper_bottom_offset: 90.0,

            bumper_radius: 18.0,
            bumper_restitution: 1.0,
            bumper_kick: 2.2,
            bumper_lit_duration: 0.8,
            bumper_cooldown: 0.12,
            bumper_layout: BumperLayout::Grid,

            margin: 24.0,
            ramp_start_ratio: 0.62,
            drain_gap: 260.0,
            platform_width: 40.0,
            drain_margin: 60.0,
        }
    }
}

/// Rubber spring tuning (mass is fixed at 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringTuning {
    /// Visual travel limit in pixels
    pub max_range: f32,
    /// Raw accumulator clamp as a multiple of `max_range`
    pub raw_limit_factor: f32,
    /// Spring constant K
    pub stiffness: f32,
    /// 1.0 = critical damping
    pub damping_ratio: f32,
    /// Crowding attenuation strength k
    pub crowding: f32,
    /// Rubber mapping softness a
    pub softness: f32,
    pub position_epsilon: f32,
    pub velocity_epsilon: f32,
    /// Longest integration step (seconds)
    pub max_dt: f32,
}

impl Default for SpringTuning {
    fn default() -> Self {
        Self {
            max_range: 200.0,
            raw_limit_factor: 4.0,
            stiffness: 90.0,
            damping_ratio: 1.0,
            crowding: 1.4,
            softness: 0.55,
            position_epsilon: 0.8,
            velocity_epsilon: 6.0,
            max_dt: 0.05,
        }
    }
}

impl SpringTuning {
    /// Damping coefficient C = 2 * sqrt(K * m) * zeta, with m = 1
    pub fn damping(&self) -> f32 {
        2.0 * self.stiffness.sqrt() * self.damping_ratio
    }

    pub fn raw_limit(&self) -> f32 {
        self.max_range * self.raw_limit_factor
    }

    /// Replace values that would stall or break the integrator with defaults
    pub fn sanitized(mut self) -> Self {
        let sd = SpringTuning::default();
        let s = &mut self;
        check("spring.maxRange", &mut s.max_range, sd.max_range, positive);
        check("spring.rawLimitFactor", &mut s.raw_limit_factor, sd.raw_limit_factor, |v: f32| {
            v.is_finite() && v >= 1.0
        });
        check("spring.stiffness", &mut s.stiffness, sd.stiffness, positive);
        check("spring.dampingRatio", &mut s.damping_ratio, sd.damping_ratio, positive);
        check("spring.crowding", &mut s.crowding, sd.crowding, non_negative);
        check("spring.softness", &mut s.softness, sd.softness, positive);
        check("spring.positionEpsilon", &mut s.position_epsilon, sd.position_epsilon, positive);
        check("spring.velocityEpsilon", &mut s.velocity_epsilon, sd.velocity_epsilon, positive);
        check("spring.maxDt", &mut s.max_dt, sd.max_dt, positive);
        self
    }
}

/// Section navigation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavTuning {
    /// |mapped| above this requests a neighbouring section
    pub threshold: f32,
    /// Rubber limit used to map raw kicks
    pub limit: f32,
    pub softness: f32,
    /// Mapped changes smaller than this are ignored
    pub min_change: f32,
    /// Milliseconds a transition blocks further requests
    pub unlock_ms: f64,
    /// Milliseconds after the last kick before the offset clears
    pub return_ms: f64,
}

impl Default for NavTuning {
    fn default() -> Self {
        Self {
            threshold: 300.0,
            limit: 1000.0,
            softness: 0.6,
            min_change: 10.0,
            unlock_ms: 700.0,
            return_ms: 200.0,
        }
    }
}

/// Kick sizes produced by the input adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputTuning {
    pub wheel_kick: f32,
    pub touch_kick: f32,
    pub key_kick: f32,
    /// Touch moves shorter than this (px) are ignored
    pub touch_noise: f32,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            wheel_kick: 70.0,
            touch_kick: 70.0,
            key_kick: 90.0,
            touch_noise: 2.0,
        }
    }
}

/// Complete tuning document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    pub pinball: PinballTuning,
    pub spring: SpringTuning,
    pub nav: NavTuning,
    pub input: InputTuning,
}

/// Replace `value` with `fallback` unless `ok(value)`, logging the field name
fn check<T: Copy + std::fmt::Debug>(name: &str, value: &mut T, fallback: T, ok: impl Fn(T) -> bool) {
    if !ok(*value) {
        log::warn!("tuning: {} = {:?} out of range, using {:?}", name, value, fallback);
        *value = fallback;
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl Tuning {
    /// Parse a JSON tuning document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Replace values that would break the simulations with defaults
    pub fn sanitized(mut self) -> Self {
        let pd = PinballTuning::default();
        let p = &mut self.pinball;
        check("pinball.gravity", &mut p.gravity, pd.gravity, |v: f32| v.is_finite());
        check("pinball.friction", &mut p.friction, pd.friction, |v: f32| v > 0.0 && v <= 1.0);
        check("pinball.ballRadius", &mut p.ball_radius, pd.ball_radius, positive);
        check("pinball.maxBallSpeed", &mut p.max_ball_speed, pd.max_ball_speed, positive);
        check("pinball.wallRestitution", &mut p.wall_restitution, pd.wall_restitution, non_negative);
        check(
            "pinball.flipperStrikeRestitution",
            &mut p.flipper_strike_restitution,
            pd.flipper_strike_restitution,
            non_negative,
        );
        check("pinball.flipperKick", &mut p.flipper_kick, pd.flipper_kick, non_negative);
        check("pinball.flipperLength", &mut p.flipper_length, pd.flipper_length, positive);
        check("pinball.flipperThickness", &mut p.flipper_thickness, pd.flipper_thickness, positive);
        check("pinball.flipperMaxSpeed", &mut p.flipper_max_speed, pd.flipper_max_speed, positive);
        check("pinball.bumperRadius", &mut p.bumper_radius, pd.bumper_radius, positive);
        check("pinball.bumperRestitution", &mut p.bumper_restitution, pd.bumper_restitution, non_negative);
        check("pinball.bumperLitDuration", &mut p.bumper_lit_duration, pd.bumper_lit_duration, non_negative);
        check("pinball.bumperCooldown", &mut p.bumper_cooldown, pd.bumper_cooldown, non_negative);
        check("pinball.margin", &mut p.margin, pd.margin, non_negative);
        check("pinball.rampStartRatio", &mut p.ramp_start_ratio, pd.ramp_start_ratio, |v: f32| {
            v > 0.0 && v < 1.0
        });
        check("pinball.drainGap", &mut p.drain_gap, pd.drain_gap, positive);
        check("pinball.drainMargin", &mut p.drain_margin, pd.drain_margin, non_negative);

        self.spring = self.spring.sanitized();

        let nd = NavTuning::default();
        let n = &mut self.nav;
        check("nav.threshold", &mut n.threshold, nd.threshold, positive);
        check("nav.limit", &mut n.limit, nd.limit, positive);
        check("nav.softness", &mut n.softness, nd.softness, positive);
        check("nav.minChange", &mut n.min_change, nd.min_change, non_negative);

        self
    }
}
