//! Tessellation of table snapshots into triangles
//!
//! Output stays in table pixels; the pipeline maps to NDC.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::{Vertex, colors, contrast};
use crate::settings::Settings;
use crate::sim::snapshot::{FlipperView, TableSnapshot};

/// Drawn thickness of walls and ramps
pub const WALL_THICKNESS: f32 = 4.0;
/// Glow ring width around lit bumpers
const GLOW_WIDTH: f32 = 6.0;
/// Radius of the label marker dot, relative to the bumper radius
const LABEL_MARK_RATIO: f32 = 0.25;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);
    fan(&mut vertices, center, radius, 0.0, 2.0 * PI, color, segments);
    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let inner1 = center + Vec2::from_angle(theta1) * inner_radius;
        let outer1 = center + Vec2::from_angle(theta1) * outer_radius;
        let inner2 = center + Vec2::from_angle(theta2) * inner_radius;
        let outer2 = center + Vec2::from_angle(theta2) * outer_radius;

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Generate vertices for a segment with round caps (walls, flippers).
///
/// `segments` is the detail of a full circle; each cap gets half.
pub fn capsule(a: Vec2, b: Vec2, thickness: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let half = thickness * 0.5;
    let cap_segments = (segments / 2).max(2);
    let mut vertices = Vec::with_capacity(6 + (cap_segments * 6) as usize);

    let dir = (b - a).normalize_or(Vec2::X);
    let perp = dir.perp() * half;

    // Body
    let (a1, a2, b1, b2) = (a + perp, a - perp, b + perp, b - perp);
    vertices.push(Vertex::new(a1.x, a1.y, color));
    vertices.push(Vertex::new(a2.x, a2.y, color));
    vertices.push(Vertex::new(b1.x, b1.y, color));

    vertices.push(Vertex::new(b1.x, b1.y, color));
    vertices.push(Vertex::new(a2.x, a2.y, color));
    vertices.push(Vertex::new(b2.x, b2.y, color));

    // Caps face away from the body
    let heading = dir.to_angle();
    fan(&mut vertices, b, half, heading - PI / 2.0, PI, color, cap_segments);
    fan(&mut vertices, a, half, heading + PI / 2.0, PI, color, cap_segments);

    vertices
}

/// Triangle fan over `span` radians starting at `start`
fn fan(
    out: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    start: f32,
    span: f32,
    color: [f32; 4],
    segments: u32,
) {
    for i in 0..segments {
        let theta1 = start + (i as f32 / segments as f32) * span;
        let theta2 = start + ((i + 1) as f32 / segments as f32) * span;
        let p1 = center + Vec2::from_angle(theta1) * radius;
        let p2 = center + Vec2::from_angle(theta2) * radius;

        out.push(Vertex::new(center.x, center.y, color));
        out.push(Vertex::new(p1.x, p1.y, color));
        out.push(Vertex::new(p2.x, p2.y, color));
    }
}

fn flipper_capsule(flipper: &FlipperView, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let (tx, ty) = flipper.tip();
    capsule(
        Vec2::new(flipper.pivot_x, flipper.pivot_y),
        Vec2::new(tx, ty),
        flipper.thickness,
        color,
        segments,
    )
}

/// All triangles for one frame, back to front
pub fn build_vertices(snapshot: &TableSnapshot, settings: &Settings) -> Vec<Vertex> {
    let segments = settings.quality.circle_segments();
    let (wall_color, flipper_color, bumper_color, lit_color) = if settings.high_contrast {
        (contrast::WALL, contrast::FLIPPER, contrast::BUMPER, contrast::BUMPER_LIT)
    } else {
        (colors::WALL, colors::FLIPPER, colors::BUMPER, colors::BUMPER_LIT)
    };

    let mut vertices = Vec::new();

    for wall in &snapshot.walls {
        vertices.extend(capsule(
            Vec2::new(wall.x1, wall.y1),
            Vec2::new(wall.x2, wall.y2),
            WALL_THICKNESS,
            wall_color,
            segments,
        ));
    }

    for bumper in &snapshot.bumpers {
        let center = Vec2::new(bumper.x, bumper.y);
        if bumper.is_lit && settings.effective_glow() {
            vertices.extend(ring(
                center,
                bumper.r,
                bumper.r + GLOW_WIDTH,
                colors::BUMPER_GLOW,
                segments,
            ));
        }
        let color = if bumper.is_lit { lit_color } else { bumper_color };
        vertices.extend(circle(center, bumper.r, color, segments));
        if settings.show_labels {
            vertices.extend(circle(
                center,
                bumper.r * LABEL_MARK_RATIO,
                colors::LABEL_MARK,
                segments / 2,
            ));
        }
    }

    for flipper in &snapshot.flippers {
        vertices.extend(flipper_capsule(flipper, flipper_color, segments));
    }

    vertices.extend(circle(
        Vec2::new(snapshot.ball.x, snapshot.ball.y),
        snapshot.ball.r,
        colors::BALL,
        segments,
    ));

    vertices
}
