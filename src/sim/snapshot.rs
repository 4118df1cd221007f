//! Render-facing views of simulation state
//!
//! Flat, camelCase-serialized structs so a presentation layer (the wgpu
//! renderer here, or JS through JSON) never touches the entity types.

use serde::{Deserialize, Serialize};

use super::state::Table;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BumperView {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub is_lit: bool,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipperView {
    pub pivot_x: f32,
    pub pivot_y: f32,
    /// World-space angle in radians
    pub angle: f32,
    pub length: f32,
    pub thickness: f32,
}

impl FlipperView {
    /// Tip position derived from pivot, angle and length
    pub fn tip(&self) -> (f32, f32) {
        (
            self.pivot_x + self.angle.cos() * self.length,
            self.pivot_y + self.angle.sin() * self.length,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallView {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Everything needed to draw one frame of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub width: f32,
    pub height: f32,
    pub ball: BallView,
    pub bumpers: Vec<BumperView>,
    pub flippers: Vec<FlipperView>,
    pub walls: Vec<WallView>,
    pub last_hit: Option<String>,
}

/// Spring output for one rubber region
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubberSnapshot {
    /// Compressed offset for visuals
    pub display_displacement: f32,
    /// Accumulated position that drives navigation
    pub raw_displacement: f32,
}

impl Table {
    pub fn snapshot(&self) -> TableSnapshot {
        let now = self.time;
        TableSnapshot {
            width: self.width,
            height: self.height,
            ball: BallView {
                x: self.ball.pos.x,
                y: self.ball.pos.y,
                r: self.ball.radius,
            },
            bumpers: self
                .bumpers
                .iter()
                .map(|b| BumperView {
                    x: b.pos.x,
                    y: b.pos.y,
                    r: b.radius,
                    is_lit: b.is_lit_at(now),
                    label: b.label.clone(),
                })
                .collect(),
            flippers: self
                .flippers
                .iter()
                .map(|f| FlipperView {
                    pivot_x: f.pivot.x,
                    pivot_y: f.pivot.y,
                    angle: f.world_angle(),
                    length: f.length,
                    thickness: f.thickness,
                })
                .collect(),
            walls: self
                .walls
                .iter()
                .map(|w| WallView {
                    x1: w.a.x,
                    y1: w.a.y,
                    x2: w.b.x,
                    y2: w.b.y,
                })
                .collect(),
            last_hit: self.last_hit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PinballTuning;

    #[test]
    fn test_snapshot_mirrors_table() {
        let table = Table::new(800.0, 1200.0, PinballTuning::default());
        let snap = table.snapshot();
        assert_eq!(snap.bumpers.len(), table.bumpers.len());
        assert_eq!(snap.walls.len(), table.walls.len());
        assert_eq!(snap.ball.x, table.ball.pos.x);

        for (view, flipper) in snap.flippers.iter().zip(&table.flippers) {
            let (tx, ty) = view.tip();
            let tip = flipper.tip();
            assert!((tx - tip.x).abs() < 1e-3 && (ty - tip.y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_snapshot_json_is_camel_case() {
        let mut table = Table::new(800.0, 1200.0, PinballTuning::default());
        table.last_hit = Some("Rust".into());
        let json = serde_json::to_string(&table.snapshot()).unwrap();
        assert!(json.contains("\"isLit\""));
        assert!(json.contains("\"pivotX\""));
        assert!(json.contains("\"lastHit\":\"Rust\""));

        let rubber = serde_json::to_string(&RubberSnapshot {
            display_displacement: 1.0,
            raw_displacement: 2.0,
        })
        .unwrap();
        assert_eq!(rubber, r#"{"displayDisplacement":1.0,"rawDisplacement":2.0}"#);
    }
}
