//! Table state and entity types
//!
//! One ball, static walls, skill bumpers and two flippers. Positions are in
//! canvas pixels with +y pointing down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::{closest_point_on_segment, resolve_circle_circle, resolve_circle_segment};
use super::layout::TableLayout;
use crate::tuning::PinballTuning;

/// Upper bound on sweep slices per flipper step
const MAX_SWEEP_SLICES: u32 = 16;

/// Something that happened during a tick, for HUD/audio hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An active bumper was struck
    BumperHit { label: String },
    /// The ball fell out of the table and was respawned
    Drained,
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    /// Gravity, damping, speed cap, then explicit Euler (all per frame)
    pub fn integrate(&mut self, gravity: f32, friction: f32, max_speed: f32) {
        self.vel.y += gravity;
        self.vel *= friction;
        self.vel = self.vel.clamp_length_max(max_speed);
        self.pos += self.vel;
    }

    /// Bounce off a segment whose half-thickness is `half_thickness`
    pub fn bounce_off_segment(&mut self, a: Vec2, b: Vec2, half_thickness: f32, restitution: f32) -> bool {
        resolve_circle_segment(
            &mut self.pos,
            &mut self.vel,
            a,
            b,
            self.radius + half_thickness,
            restitution,
        )
    }

    /// Bounce off a static circle; returns the contact normal
    pub fn bounce_off_circle(&mut self, center: Vec2, radius: f32, restitution: f32) -> Option<Vec2> {
        resolve_circle_circle(
            &mut self.pos,
            &mut self.vel,
            self.radius + radius,
            center,
            restitution,
        )
    }
}

/// A static wall or ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub a: Vec2,
    pub b: Vec2,
}

impl Wall {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }
}

/// A circular skill bumper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bumper {
    pub pos: Vec2,
    pub radius: f32,
    pub label: String,
    /// Showing strike feedback
    pub lit: bool,
    /// Table time at which `lit` clears
    pub lit_until: f32,
    /// Can kick and relight
    pub active: bool,
    /// Table time at which an inactive bumper re-arms
    pub active_at: f32,
}

impl Bumper {
    pub fn new(pos: Vec2, radius: f32, label: impl Into<String>) -> Self {
        Self {
            pos,
            radius,
            label: label.into(),
            lit: false,
            lit_until: 0.0,
            active: true,
            active_at: 0.0,
        }
    }

    /// Whether the bumper shows as lit at table time `now`
    #[inline]
    pub fn is_lit_at(&self, now: f32) -> bool {
        self.lit && now < self.lit_until
    }

    /// Expire lit and cooldown timers
    pub fn update_timers(&mut self, now: f32) {
        if self.lit && now >= self.lit_until {
            self.lit = false;
        }
        if !self.active && now >= self.active_at {
            self.active = true;
        }
    }

    /// Collide the ball against this bumper at table time `now`.
    ///
    /// Always solid. When active, a hit also kicks the ball outward, lights the
    /// bumper for `bumper_lit_duration` and starts the cooldown. Returns true
    /// only for such an active strike.
    pub fn strike(&mut self, ball: &mut Ball, now: f32, tuning: &PinballTuning) -> bool {
        let Some(normal) = ball.bounce_off_circle(self.pos, self.radius, tuning.bumper_restitution) else {
            return false;
        };
        if !self.active {
            return false;
        }

        ball.vel += normal * tuning.bumper_kick;
        self.lit = true;
        self.lit_until = now + tuning.bumper_lit_duration;
        self.active = false;
        self.active_at = now + tuning.bumper_cooldown;
        true
    }
}

/// Which flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

impl FlipperSide {
    /// +1 when the flipper extends toward +x from its pivot
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            FlipperSide::Left => 1.0,
            FlipperSide::Right => -1.0,
        }
    }
}

/// An actuated flipper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flipper {
    pub side: FlipperSide,
    pub pivot: Vec2,
    pub length: f32,
    pub thickness: f32,
    /// Side-relative angle (positive = tip below pivot)
    pub angle: f32,
    pub rest_angle: f32,
    pub active_angle: f32,
    /// Radians per second, signed toward the last movement
    pub angular_velocity: f32,
    /// Angle before the latest step; contact is swept from here
    pub swept_from: f32,
    /// Radians per second
    pub max_angular_speed: f32,
    /// Input held
    pub pressed: bool,
}

impl Flipper {
    pub fn new(side: FlipperSide, pivot: Vec2, length: f32, tuning: &PinballTuning) -> Self {
        Self {
            side,
            pivot,
            length,
            thickness: tuning.flipper_thickness,
            angle: tuning.flipper_rest_angle,
            rest_angle: tuning.flipper_rest_angle,
            active_angle: tuning.flipper_active_angle,
            angular_velocity: 0.0,
            swept_from: tuning.flipper_rest_angle,
            max_angular_speed: tuning.flipper_max_speed,
            pressed: false,
        }
    }

    /// Angle the flipper is driving toward
    #[inline]
    pub fn target_angle(&self) -> f32 {
        if self.pressed {
            self.active_angle
        } else {
            self.rest_angle
        }
    }

    /// Move toward the target by at most `max_angular_speed * dt`
    pub fn step(&mut self, dt: f32) {
        self.swept_from = self.angle;
        let target = self.target_angle();
        let delta = target - self.angle;
        let max_delta = self.max_angular_speed * dt;

        let moved = if delta.abs() <= max_delta {
            self.angle = target;
            delta
        } else {
            let clamped = delta.clamp(-max_delta, max_delta);
            self.angle += clamped;
            clamped
        };
        self.angular_velocity = if dt > 0.0 { moved / dt } else { 0.0 };
    }

    /// True while swinging from rest toward the active angle
    pub fn is_striking(&self) -> bool {
        let toward_active = (self.active_angle - self.rest_angle).signum();
        self.angular_velocity * toward_active > 0.0
    }

    /// Angle in world space (radians from +x, +y down)
    pub fn world_angle(&self) -> f32 {
        self.world_angle_of(self.angle)
    }

    fn world_angle_of(&self, angle: f32) -> f32 {
        match self.side {
            FlipperSide::Left => angle,
            FlipperSide::Right => std::f32::consts::PI - angle,
        }
    }

    /// Tip position for the current angle
    pub fn tip(&self) -> Vec2 {
        self.tip_at(self.angle)
    }

    fn tip_at(&self, angle: f32) -> Vec2 {
        self.pivot + Vec2::from_angle(self.world_angle_of(angle)) * self.length
    }

    /// Collide the ball with every pose swept by the latest step.
    ///
    /// The swing is cut into slices that each move the tip less than the
    /// contact reach, so a fast flipper cannot pass through a resting ball.
    /// A striking flipper also adds `flipper_kick` along the final contact
    /// normal, once per step.
    pub fn collide(&self, ball: &mut Ball, tuning: &PinballTuning) -> bool {
        let striking = self.is_striking();
        let restitution = if striking {
            tuning.flipper_strike_restitution
        } else {
            tuning.wall_restitution
        };
        let half = self.thickness * 0.5;
        let reach = (ball.radius + half).max(1.0);
        let swing = self.angle - self.swept_from;
        let travel = swing.abs() * self.length;
        let slices = ((travel / reach) as u32 + 1).min(MAX_SWEEP_SLICES);

        let mut contact = None;
        for i in 1..=slices {
            let angle = self.swept_from + swing * (i as f32 / slices as f32);
            let tip = self.tip_at(angle);
            if ball.bounce_off_segment(self.pivot, tip, half, restitution) {
                contact = Some(closest_point_on_segment(ball.pos, self.pivot, tip).normal);
            }
        }

        match contact {
            Some(normal) => {
                if striking {
                    ball.vel += normal * tuning.flipper_kick;
                }
                true
            }
            None => false,
        }
    }
}

/// Complete table state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub width: f32,
    pub height: f32,
    /// Simulation clock in seconds
    pub time: f32,
    pub ball: Ball,
    pub walls: Vec<Wall>,
    pub bumpers: Vec<Bumper>,
    /// Left then right
    pub flippers: Vec<Flipper>,
    pub spawn: Vec2,
    pub tuning: PinballTuning,
    /// Label of the most recently struck bumper
    pub last_hit: Option<String>,
    /// Events raised by the latest tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl Table {
    /// Build a table for a `width` x `height` canvas
    pub fn new(width: f32, height: f32, tuning: PinballTuning) -> Self {
        let layout = TableLayout::build(width, height, &tuning);
        let ball = Ball::new(layout.spawn, Vec2::from(tuning.spawn_velocity), tuning.ball_radius);
        log::info!(
            "Table {}x{}: {} walls, {} bumpers",
            width,
            height,
            layout.walls.len(),
            layout.bumpers.len()
        );

        Self {
            width,
            height,
            time: 0.0,
            ball,
            walls: layout.walls,
            bumpers: layout.bumpers,
            flippers: layout.flippers,
            spawn: layout.spawn,
            tuning,
            last_hit: None,
            events: Vec::new(),
        }
    }

    /// Rebuild geometry for a new canvas size and respawn the ball.
    ///
    /// Flipper input state carries over so a held key stays held.
    pub fn relayout(&mut self, width: f32, height: f32) {
        let layout = TableLayout::build(width, height, &self.tuning);
        let pressed: Vec<(FlipperSide, bool)> =
            self.flippers.iter().map(|f| (f.side, f.pressed)).collect();

        self.width = width;
        self.height = height;
        self.walls = layout.walls;
        self.bumpers = layout.bumpers;
        self.flippers = layout.flippers;
        self.spawn = layout.spawn;
        for (side, held) in pressed {
            self.set_flipper_pressed(side, held);
        }
        self.respawn();
        log::info!("Table relayout {}x{}", width, height);
    }

    /// Put the ball back at the spawn point with the spawn velocity
    pub fn respawn(&mut self) {
        self.ball.pos = self.spawn;
        self.ball.vel = Vec2::from(self.tuning.spawn_velocity);
    }

    /// Hold or release a flipper
    pub fn set_flipper_pressed(&mut self, side: FlipperSide, pressed: bool) {
        for flipper in self.flippers.iter_mut().filter(|f| f.side == side) {
            flipper.pressed = pressed;
        }
    }

    pub fn flipper(&self, side: FlipperSide) -> Option<&Flipper> {
        self.flippers.iter().find(|f| f.side == side)
    }

    /// Lowest y the ball may reach before it counts as drained
    pub fn drain_line(&self) -> f32 {
        self.height + self.tuning.drain_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> PinballTuning {
        PinballTuning::default()
    }

    #[test]
    fn test_ball_integrate_order() {
        let mut ball = Ball::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), 9.0);
        ball.integrate(0.5, 0.5, 100.0);
        // (vy + g) * f, then position
        assert_eq!(ball.vel, Vec2::new(1.0, 0.25));
        assert_eq!(ball.pos, Vec2::new(1.0, 0.25));
    }

    #[test]
    fn test_ball_speed_capped_before_move() {
        let mut ball = Ball::new(Vec2::ZERO, Vec2::new(30.0, -40.0), 9.0);
        ball.integrate(0.0, 1.0, 10.0);
        assert!((ball.vel.length() - 10.0).abs() < 1e-4);
        assert!((ball.vel - Vec2::new(6.0, -8.0)).length() < 1e-4);
        assert_eq!(ball.pos, ball.vel);
    }

    #[test]
    fn test_bumper_lit_window() {
        let t = tuning();
        let mut bumper = Bumper::new(Vec2::new(100.0, 100.0), 18.0, "Rust");
        let mut ball = Ball::new(Vec2::new(80.0, 100.0), Vec2::new(4.0, 0.0), 9.0);
        let hit_at = 2.0;

        assert!(bumper.strike(&mut ball, hit_at, &t));
        assert!(bumper.is_lit_at(hit_at));
        assert!(bumper.is_lit_at(hit_at + t.bumper_lit_duration - 0.01));
        assert!(!bumper.is_lit_at(hit_at + t.bumper_lit_duration));

        bumper.update_timers(hit_at + t.bumper_lit_duration * 0.5);
        assert!(bumper.lit);
        bumper.update_timers(hit_at + t.bumper_lit_duration);
        assert!(!bumper.lit);
        assert!(!bumper.is_lit_at(hit_at + 10.0));
    }

    #[test]
    fn test_bumper_cooldown_blocks_retrigger() {
        let t = tuning();
        let mut bumper = Bumper::new(Vec2::new(100.0, 100.0), 18.0, "Rust");
        let mut ball = Ball::new(Vec2::new(80.0, 100.0), Vec2::new(4.0, 0.0), 9.0);
        assert!(bumper.strike(&mut ball, 0.0, &t));
        assert!(!bumper.active);

        // Pushed back into contact during the cooldown: solid, but no kick
        ball.pos = Vec2::new(80.0, 100.0);
        ball.vel = Vec2::new(4.0, 0.0);
        assert!(!bumper.strike(&mut ball, 0.05, &t));
        assert!((ball.vel.x + 4.0).abs() < 1e-5);
        assert!(ball.pos.distance(bumper.pos) >= 27.0 - 1e-3);

        bumper.update_timers(t.bumper_cooldown);
        assert!(bumper.active);
        ball.pos = Vec2::new(80.0, 100.0);
        ball.vel = Vec2::new(4.0, 0.0);
        assert!(bumper.strike(&mut ball, t.bumper_cooldown, &t));
    }

    #[test]
    fn test_bumper_kick_adds_outward_speed() {
        let t = tuning();
        let mut bumper = Bumper::new(Vec2::new(100.0, 100.0), 18.0, "Rust");
        let mut ball = Ball::new(Vec2::new(80.0, 100.0), Vec2::new(4.0, 0.0), 9.0);
        bumper.strike(&mut ball, 0.0, &t);
        assert!((ball.vel.x + 4.0 * t.bumper_restitution + t.bumper_kick).abs() < 1e-4);
    }

    #[test]
    fn test_flipper_rate_limited() {
        let t = tuning();
        let mut flipper = Flipper::new(FlipperSide::Left, Vec2::ZERO, 100.0, &t);
        flipper.pressed = true;
        let dt = 1.0 / 60.0;
        let before = flipper.angle;
        flipper.step(dt);
        assert!((before - flipper.angle - t.flipper_max_speed * dt).abs() < 1e-5);
        assert!(flipper.is_striking());

        for _ in 0..60 {
            flipper.step(dt);
        }
        assert_eq!(flipper.angle, t.flipper_active_angle);
        assert_eq!(flipper.angular_velocity, 0.0);
        assert!(!flipper.is_striking());

        flipper.pressed = false;
        flipper.step(dt);
        assert!(!flipper.is_striking());
        assert!(flipper.angular_velocity > 0.0);
    }

    #[test]
    fn test_flippers_mirror() {
        let t = tuning();
        let left = Flipper::new(FlipperSide::Left, Vec2::new(-50.0, 0.0), 100.0, &t);
        let right = Flipper::new(FlipperSide::Right, Vec2::new(50.0, 0.0), 100.0, &t);
        let lt = left.tip();
        let rt = right.tip();
        assert!(lt.x > -50.0 && rt.x < 50.0);
        assert!((lt.x + rt.x).abs() < 1e-4);
        assert!((lt.y - rt.y).abs() < 1e-4);
        // Rest angle droops toward the drain
        assert!(lt.y > 0.0);
    }

    #[test]
    fn test_striking_flipper_boosts_ball() {
        let t = tuning();
        let mut flipper = Flipper::new(FlipperSide::Left, Vec2::ZERO, 100.0, &t);
        flipper.pressed = true;
        flipper.step(1.0 / 60.0);

        // Ball falling onto the middle of the flipper from above
        let mid = (flipper.pivot + flipper.tip()) * 0.5;
        let up = Vec2::new(flipper.tip().y, -flipper.tip().x).normalize();
        let mut ball = Ball::new(mid + up * 12.0, -up * 3.0, 9.0);
        assert!(flipper.collide(&mut ball, &t));
        let vn = ball.vel.dot(up);
        assert!((vn - 3.0 * t.flipper_strike_restitution - t.flipper_kick).abs() < 1e-3);
    }

    #[test]
    fn test_resting_flipper_adds_no_energy() {
        let t = tuning();
        let flipper = Flipper::new(FlipperSide::Left, Vec2::ZERO, 100.0, &t);
        let mid = (flipper.pivot + flipper.tip()) * 0.5;
        let up = Vec2::new(flipper.tip().y, -flipper.tip().x).normalize();
        let mut ball = Ball::new(mid + up * 12.0, -up * 3.0, 9.0);
        assert!(flipper.collide(&mut ball, &t));
        assert!((ball.vel.dot(up) - 3.0 * t.wall_restitution).abs() < 1e-3);
    }

    #[test]
    fn test_sweep_catches_ball_the_tip_jumps_over() {
        let t = tuning();
        let mut flipper = Flipper::new(FlipperSide::Left, Vec2::ZERO, 100.0, &t);
        let dir = (flipper.tip() - flipper.pivot).normalize();
        let up = Vec2::new(dir.y, -dir.x);
        let start = dir * 90.0 + up * 16.0;

        flipper.pressed = true;
        flipper.step(1.0 / 60.0);
        // The final pose alone has already passed the ball
        let end = closest_point_on_segment(start, flipper.pivot, flipper.tip());
        assert!(end.normal.dot(up) < 0.0);

        let mut ball = Ball::new(start, Vec2::ZERO, 9.0);
        assert!(flipper.collide(&mut ball, &t));
        let after = closest_point_on_segment(ball.pos, flipper.pivot, flipper.tip());
        assert!(after.normal.dot(up) > 0.0);
        assert!(ball.vel.dot(up) > 0.0);
    }

    #[test]
    fn test_table_relayout_keeps_held_flipper() {
        let mut table = Table::new(800.0, 1200.0, tuning());
        table.set_flipper_pressed(FlipperSide::Right, true);
        table.ball.pos = Vec2::new(1.0, 1.0);
        table.relayout(1024.0, 768.0);

        assert_eq!(table.width, 1024.0);
        assert!(table.flipper(FlipperSide::Right).unwrap().pressed);
        assert!(!table.flipper(FlipperSide::Left).unwrap().pressed);
        assert_eq!(table.ball.pos, table.spawn);
    }
}
