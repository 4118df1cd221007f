//! Table geometry from canvas size
//!
//! Everything here runs once per layout pass (mount and resize), never per
//! frame. Identical sizes and tuning always give identical tables.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Bumper, Flipper, FlipperSide, Wall};
use crate::tuning::{BumperLayout, PinballTuning, SKILL_LABELS};

/// Bumper occupancy pattern (rows top to bottom)
pub const BUMPER_MASK: [[bool; 5]; 4] = [
    [false, true, false, true, false],
    [true, false, true, false, true],
    [false, true, false, true, false],
    [true, false, true, false, true],
];

/// Vertical band of the bumper grid, as fractions of table height
const GRID_TOP: f32 = 0.18;
const GRID_BOTTOM: f32 = 0.52;
/// Horizontal inset of the grid, as a fraction of playfield width
const GRID_INSET: f32 = 0.12;

/// Scattered layout: lane centres, band, jitter and spacing
const LANE_LEFT: f32 = 0.35;
const LANE_RIGHT: f32 = 0.65;
const SCATTER_TOP: f32 = 0.55;
const SCATTER_BOTTOM: f32 = 0.82;
const SCATTER_JITTER: f32 = 34.0;
const SCATTER_SPACING: f32 = 2.2;
const FLIPPER_KEEP_OUT: f32 = 120.0;
const SCATTER_TRIES_PER_BUMPER: usize = 50;

/// Static geometry for one canvas size
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub walls: Vec<Wall>,
    /// Left then right
    pub flippers: Vec<Flipper>,
    pub bumpers: Vec<Bumper>,
    pub spawn: Vec2,
}

impl TableLayout {
    pub fn build(width: f32, height: f32, tuning: &PinballTuning) -> Self {
        let m = tuning.margin;
        let inner_w = (width - 2.0 * m).max(0.0);
        let cx = width * 0.5;

        let flipper_y = (height - tuning.flipper_bottom_offset).max(height * 0.75);
        let gap = tuning.drain_gap.min(inner_w * 0.6);
        let flipper_length = tuning.flipper_length.min(gap * 0.45);
        let left_pivot = Vec2::new(cx - gap * 0.5, flipper_y);
        let right_pivot = Vec2::new(cx + gap * 0.5, flipper_y);

        let flippers = vec![
            Flipper::new(FlipperSide::Left, left_pivot, flipper_length, tuning),
            Flipper::new(FlipperSide::Right, right_pivot, flipper_length, tuning),
        ];

        let walls = build_walls(width, height, flipper_y, left_pivot, right_pivot, tuning);
        // Keep the spawn point between the side walls on narrow canvases
        let (lo, hi) = (m + tuning.ball_radius, width - m - tuning.ball_radius);
        let spawn_x = if lo <= hi {
            (width - m - tuning.spawn_inset).clamp(lo, hi)
        } else {
            cx
        };
        let spawn = Vec2::new(spawn_x, m + tuning.spawn_inset);

        let bumpers = match tuning.bumper_layout {
            BumperLayout::Grid => grid_bumpers(width, height, tuning),
            BumperLayout::Scattered { seed } => {
                scattered_bumpers(width, height, &[left_pivot, right_pivot], seed, tuning)
            }
        };

        Self {
            walls,
            flippers,
            bumpers,
            spawn,
        }
    }
}

/// Side verticals, top cap, two ramps and two platforms flanking the drain
fn build_walls(
    width: f32,
    height: f32,
    flipper_y: f32,
    left_pivot: Vec2,
    right_pivot: Vec2,
    tuning: &PinballTuning,
) -> Vec<Wall> {
    let m = tuning.margin;
    let ramp_y = (height * tuning.ramp_start_ratio).min(flipper_y - 1.0);
    let left_outer = Vec2::new((left_pivot.x - tuning.platform_width).max(m), flipper_y);
    let right_outer = Vec2::new((right_pivot.x + tuning.platform_width).min(width - m), flipper_y);

    vec![
        // Verticals
        Wall::new(Vec2::new(m, m), Vec2::new(m, ramp_y)),
        Wall::new(Vec2::new(width - m, m), Vec2::new(width - m, ramp_y)),
        // Top cap
        Wall::new(Vec2::new(m, m), Vec2::new(width - m, m)),
        // Ramps toward the drain
        Wall::new(Vec2::new(m, ramp_y), left_outer),
        Wall::new(Vec2::new(width - m, ramp_y), right_outer),
        // Platforms under the flipper pivots
        Wall::new(left_outer, left_pivot),
        Wall::new(right_outer, right_pivot),
    ]
}

/// Bumpers on the masked grid, labels assigned cyclically
pub fn grid_bumpers(width: f32, height: f32, tuning: &PinballTuning) -> Vec<Bumper> {
    let rows = BUMPER_MASK.len();
    let cols = BUMPER_MASK[0].len();

    let inner_w = (width - 2.0 * tuning.margin).max(0.0);
    let left = tuning.margin + inner_w * GRID_INSET;
    let grid_w = inner_w * (1.0 - 2.0 * GRID_INSET);
    let top = height * GRID_TOP;
    let grid_h = height * (GRID_BOTTOM - GRID_TOP);
    let cell_w = grid_w / cols as f32;
    let cell_h = grid_h / rows as f32;
    let radius = tuning.bumper_radius.min(cell_w.min(cell_h) * 0.35);

    let mut bumpers = Vec::new();
    for (row, cells) in BUMPER_MASK.iter().enumerate() {
        for (col, &occupied) in cells.iter().enumerate() {
            if !occupied {
                continue;
            }
            let pos = Vec2::new(
                left + (col as f32 + 0.5) * cell_w,
                top + (row as f32 + 0.5) * cell_h,
            );
            let label = SKILL_LABELS[bumpers.len() % SKILL_LABELS.len()];
            bumpers.push(Bumper::new(pos, radius, label));
        }
    }
    bumpers
}

/// Seeded rejection sampling in two lanes above the flippers.
///
/// Keeps bumpers `2.2 r` apart and away from the flipper pivots; may return
/// fewer bumpers than the grid when the canvas is too small.
pub fn scattered_bumpers(
    width: f32,
    height: f32,
    pivots: &[Vec2],
    seed: u64,
    tuning: &PinballTuning,
) -> Vec<Bumper> {
    let count = BUMPER_MASK.iter().flatten().filter(|&&cell| cell).count();
    let radius = tuning.bumper_radius;
    let min_gap = radius * SCATTER_SPACING;
    let y_min = height * SCATTER_TOP;
    let y_max = height * SCATTER_BOTTOM;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut bumpers: Vec<Bumper> = Vec::with_capacity(count);
    let mut tries = 0;

    while bumpers.len() < count && tries < count * SCATTER_TRIES_PER_BUMPER {
        tries += 1;

        let lane = if rng.random::<bool>() { LANE_LEFT } else { LANE_RIGHT };
        let x = width * lane + (rng.random::<f32>() - 0.5) * SCATTER_JITTER * 2.0;
        let y = y_min + rng.random::<f32>() * (y_max - y_min);
        let pos = Vec2::new(x, y);

        let crowded = bumpers.iter().any(|b| b.pos.distance(pos) < min_gap);
        let near_flipper = pivots.iter().any(|p| p.distance(pos) < FLIPPER_KEEP_OUT);
        if crowded || near_flipper {
            continue;
        }

        let label = SKILL_LABELS[bumpers.len() % SKILL_LABELS.len()];
        bumpers.push(Bumper::new(pos, radius, label));
    }

    if bumpers.len() < count {
        log::warn!("Scattered layout placed {}/{} bumpers", bumpers.len(), count);
    }
    bumpers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::closest_point_on_segment;

    #[test]
    fn test_grid_is_deterministic() {
        let tuning = PinballTuning::default();
        let a = TableLayout::build(1280.0, 900.0, &tuning);
        let b = TableLayout::build(1280.0, 900.0, &tuning);
        assert_eq!(a.bumpers.len(), 10);
        for (x, y) in a.bumpers.iter().zip(&b.bumpers) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.label, y.label);
        }
    }

    #[test]
    fn test_grid_labels_cycle_in_order() {
        let bumpers = grid_bumpers(1000.0, 1000.0, &PinballTuning::default());
        for (i, bumper) in bumpers.iter().enumerate() {
            assert_eq!(bumper.label, SKILL_LABELS[i % SKILL_LABELS.len()]);
        }
        // First row of the mask has its bumpers in columns 1 and 3
        assert!(bumpers[0].pos.y == bumpers[1].pos.y);
        assert!(bumpers[0].pos.x < bumpers[1].pos.x);
    }

    #[test]
    fn test_grid_bumpers_do_not_overlap() {
        let bumpers = grid_bumpers(400.0, 500.0, &PinballTuning::default());
        for (i, a) in bumpers.iter().enumerate() {
            for b in &bumpers[i + 1..] {
                assert!(a.pos.distance(b.pos) > a.radius + b.radius);
            }
        }
    }

    #[test]
    fn test_walls_shape() {
        let tuning = PinballTuning::default();
        let layout = TableLayout::build(800.0, 1200.0, &tuning);
        assert_eq!(layout.walls.len(), 7);

        let left = &layout.flippers[0];
        let right = &layout.flippers[1];
        assert_eq!(left.side, FlipperSide::Left);
        assert!((left.pivot.x + right.pivot.x - 800.0).abs() < 1e-4);
        assert_eq!(left.pivot.y, right.pivot.y);

        // Platforms end at the pivots
        assert_eq!(layout.walls[5].b, left.pivot);
        assert_eq!(layout.walls[6].b, right.pivot);

        // Resting flippers leave a drain the ball can fall through
        let tip_gap = right.tip().x - left.tip().x;
        assert!(tip_gap > 2.0 * tuning.ball_radius);
    }

    #[test]
    fn test_spawn_clear_of_geometry() {
        let tuning = PinballTuning::default();
        let layout = TableLayout::build(800.0, 1200.0, &tuning);
        for wall in &layout.walls {
            let proj = closest_point_on_segment(layout.spawn, wall.a, wall.b);
            assert!(proj.distance > tuning.ball_radius);
        }
        for bumper in &layout.bumpers {
            assert!(bumper.pos.distance(layout.spawn) > bumper.radius + tuning.ball_radius);
        }
    }

    #[test]
    fn test_small_canvas_stays_finite() {
        let tuning = PinballTuning::default();
        let layout = TableLayout::build(120.0, 160.0, &tuning);
        assert!(layout.walls.iter().all(|w| w.a.is_finite() && w.b.is_finite()));
        assert!(layout.flippers.iter().all(|f| f.length > 0.0 && f.tip().is_finite()));
        assert!(layout.bumpers.iter().all(|b| b.radius > 0.0));

        let r = tuning.ball_radius;
        for width in [100.0, 120.0, 200.0] {
            let layout = TableLayout::build(width, 160.0, &tuning);
            assert!(layout.spawn.x >= tuning.margin + r);
            assert!(layout.spawn.x <= width - tuning.margin - r);
        }
    }

    #[test]
    fn test_scattered_is_seeded() {
        let tuning = PinballTuning::default();
        let pivots = [Vec2::new(270.0, 1110.0), Vec2::new(530.0, 1110.0)];
        let a = scattered_bumpers(800.0, 1200.0, &pivots, 42, &tuning);
        let b = scattered_bumpers(800.0, 1200.0, &pivots, 42, &tuning);
        assert!(!a.is_empty());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.pos, y.pos);
        }

        let min_gap = tuning.bumper_radius * SCATTER_SPACING;
        for (i, p) in a.iter().enumerate() {
            for q in &a[i + 1..] {
                assert!(p.pos.distance(q.pos) >= min_gap);
            }
            for pivot in &pivots {
                assert!(p.pos.distance(*pivot) >= FLIPPER_KEEP_OUT);
            }
        }
    }

    #[test]
    fn test_scattered_layout_selected_by_tuning() {
        let tuning = PinballTuning {
            bumper_layout: BumperLayout::Scattered { seed: 9 },
            ..PinballTuning::default()
        };
        let layout = TableLayout::build(800.0, 1200.0, &tuning);
        let y_min = 1200.0 * SCATTER_TOP;
        assert!(layout.bumpers.iter().all(|b| b.pos.y >= y_min));
    }
}
