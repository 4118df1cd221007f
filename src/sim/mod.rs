//! Pinball simulation module
//!
//! All table logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (walls, then bumpers, then flippers)
//! - No rendering or platform dependencies

pub mod geom;
pub mod layout;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use geom::{SegmentProjection, closest_point_on_segment, resolve_circle_circle, resolve_circle_segment};
pub use layout::TableLayout;
pub use snapshot::{BallView, BumperView, FlipperView, RubberSnapshot, TableSnapshot, WallView};
pub use state::{Ball, Bumper, Flipper, FlipperSide, GameEvent, Table, Wall};
pub use tick::tick;
