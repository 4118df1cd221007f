//! Collision detection and response for straight segments and circles
//!
//! Every wall, ramp and flipper on the table is a line segment; every bumper is
//! a circle. These routines move a circle out of overlap and reflect the normal
//! part of its velocity, scaled by a restitution that may exceed 1 for surfaces
//! that inject energy (flipper strikes, bumper kicks).

use glam::Vec2;

/// Floor for squared segment lengths
pub const SEGMENT_EPSILON: f32 = 1e-6;
/// Distances below this count as "on the surface" and use a fallback normal
pub const CONTACT_EPSILON: f32 = 1e-5;

/// Result of projecting a point onto a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Closest point on the segment
    pub closest: Vec2,
    /// Unit vector from `closest` toward the point
    pub normal: Vec2,
    /// Euclidean distance from the point to `closest`
    pub distance: f32,
    /// Projection parameter along a->b, clamped to [0, 1]
    pub t: f32,
}

/// Project `point` onto segment `a`-`b`.
///
/// Never produces NaN: a zero-length segment is treated as the point `a`, and a
/// point lying on the segment gets the segment's perpendicular as its normal
/// (or -Y, "up" on the table, when the segment is degenerate too).
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> SegmentProjection {
    let ab = b - a;
    let len_sq = ab.length_squared().max(SEGMENT_EPSILON);
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    let offset = point - closest;
    let distance = offset.length();

    let normal = if distance > CONTACT_EPSILON {
        offset / distance
    } else {
        let perp = Vec2::new(-ab.y, ab.x);
        if perp.length_squared() > SEGMENT_EPSILON {
            perp.normalize()
        } else {
            Vec2::NEG_Y
        }
    };

    SegmentProjection {
        closest,
        normal,
        distance,
        t,
    }
}

/// Reflect the normal component of `vel`: v' = v - (1 + r)(v.n)n when moving into the surface
#[inline]
pub fn reflect_normal(vel: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = vel.dot(normal);
    if vn < 0.0 {
        vel - (1.0 + restitution) * vn * normal
    } else {
        vel
    }
}

/// Resolve a moving circle against a segment.
///
/// `effective_radius` is the circle radius plus half the segment's thickness.
/// Returns false (and touches nothing) when the pair is already separated.
pub fn resolve_circle_segment(
    pos: &mut Vec2,
    vel: &mut Vec2,
    a: Vec2,
    b: Vec2,
    effective_radius: f32,
    restitution: f32,
) -> bool {
    let proj = closest_point_on_segment(*pos, a, b);
    if proj.distance >= effective_radius {
        return false;
    }

    let mut normal = proj.normal;
    // Centre on the line: push back against the direction of travel
    if proj.distance <= CONTACT_EPSILON && vel.dot(normal) > 0.0 {
        normal = -normal;
    }

    *pos += normal * (effective_radius - proj.distance);
    *vel = reflect_normal(*vel, normal, restitution);
    true
}

/// Resolve a moving circle against a static circle at `center`.
///
/// `combined_radius` is the sum of both radii. Returns the contact normal
/// (pointing from `center` toward the moving circle) on collision.
pub fn resolve_circle_circle(
    pos: &mut Vec2,
    vel: &mut Vec2,
    combined_radius: f32,
    center: Vec2,
    restitution: f32,
) -> Option<Vec2> {
    let offset = *pos - center;
    let distance = offset.length();
    if distance >= combined_radius {
        return None;
    }

    let normal = if distance > CONTACT_EPSILON {
        offset / distance
    } else {
        Vec2::NEG_Y
    };

    *pos = center + normal * combined_radius;
    *vel = reflect_normal(*vel, normal, restitution);
    Some(normal)
}
