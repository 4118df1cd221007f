//! Fixed timestep table tick
//!
//! Advances the table by one frame in a fixed order: ball integration,
//! flippers, walls, bumpers, flipper contact, drain. Flipper input is state on
//! the table (`Table::set_flipper_pressed`) and is read here, never reset.

use super::state::{GameEvent, Table};

/// Advance the table by one fixed timestep
pub fn tick(table: &mut Table, dt: f32) {
    table.events.clear();

    let tuning = &table.tuning;
    let now = table.time;

    // Gravity, damping, speed cap, Euler
    table
        .ball
        .integrate(tuning.gravity, tuning.friction, tuning.max_ball_speed);

    for flipper in &mut table.flippers {
        flipper.step(dt);
    }

    for wall in &table.walls {
        table
            .ball
            .bounce_off_segment(wall.a, wall.b, 0.0, tuning.wall_restitution);
    }

    for bumper in &mut table.bumpers {
        bumper.update_timers(now);
        if bumper.strike(&mut table.ball, now, tuning) {
            log::debug!("Bumper hit: {}", bumper.label);
            table.last_hit = Some(bumper.label.clone());
            table.events.push(GameEvent::BumperHit {
                label: bumper.label.clone(),
            });
        }
    }

    // Swept from the pre-step angle to the post-step endpoints
    for flipper in &table.flippers {
        flipper.collide(&mut table.ball, tuning);
    }

    if table.ball.pos.y > table.drain_line() {
        log::debug!("Ball drained at x={:.1}", table.ball.pos.x);
        table.respawn();
        table.events.push(GameEvent::Drained);
    }

    table.time += dt;
}
