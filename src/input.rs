//! Browser input mapped onto the simulation cores
//!
//! Pure functions over key codes and deltas so the mapping is testable
//! without a DOM. Sign convention for kicks: moving toward the next section
//! (wheel down, finger up, ArrowDown) is negative.

use crate::sim::{FlipperSide, Table};
use crate::tuning::InputTuning;

/// Logical input actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    FlipLeft,
    FlipRight,
    ScrollNext,
    ScrollPrev,
}

/// Map a `KeyboardEvent.code` to an action
pub fn key_action(code: &str, shift: bool) -> Option<InputAction> {
    match code {
        "ArrowLeft" | "KeyA" => Some(InputAction::FlipLeft),
        "ArrowRight" | "KeyD" => Some(InputAction::FlipRight),
        "Space" if shift => Some(InputAction::ScrollPrev),
        "ArrowDown" | "PageDown" | "Space" => Some(InputAction::ScrollNext),
        "ArrowUp" | "PageUp" => Some(InputAction::ScrollPrev),
        _ => None,
    }
}

/// Fixed kick for a wheel event; `None` for a zero delta
pub fn wheel_kick(delta_y: f64, tuning: &InputTuning) -> Option<f32> {
    if delta_y > 0.0 {
        Some(-tuning.wheel_kick)
    } else if delta_y < 0.0 {
        Some(tuning.wheel_kick)
    } else {
        None
    }
}

/// Kick for a scroll key; flip actions do not kick
pub fn key_kick(action: InputAction, tuning: &InputTuning) -> Option<f32> {
    match action {
        InputAction::ScrollNext => Some(-tuning.key_kick),
        InputAction::ScrollPrev => Some(tuning.key_kick),
        InputAction::FlipLeft | InputAction::FlipRight => None,
    }
}

/// Hold or release a flipper from a flip action; returns false for other actions
pub fn apply_flip(table: &mut Table, action: InputAction, pressed: bool) -> bool {
    let side = match action {
        InputAction::FlipLeft => FlipperSide::Left,
        InputAction::FlipRight => FlipperSide::Right,
        InputAction::ScrollNext | InputAction::ScrollPrev => return false,
    };
    table.set_flipper_pressed(side, pressed);
    true
}

/// Converts a single-finger drag into discrete kicks
#[derive(Debug, Clone, Default)]
pub struct TouchDrag {
    last_y: Option<f32>,
}

impl TouchDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, y: f32) {
        self.last_y = Some(y);
    }

    /// Kick for a move to `y`, re-anchoring when one is produced
    pub fn update(&mut self, y: f32, tuning: &InputTuning) -> Option<f32> {
        let Some(last) = self.last_y else {
            self.last_y = Some(y);
            return None;
        };

        // Finger moving up scrolls toward the next section
        let moved = last - y;
        if moved.abs() < tuning.touch_noise {
            return None;
        }
        self.last_y = Some(y);
        Some(-moved.signum() * tuning.touch_kick)
    }

    pub fn end(&mut self) {
        self.last_y = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PinballTuning;

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_action("ArrowLeft", false), Some(InputAction::FlipLeft));
        assert_eq!(key_action("KeyA", false), Some(InputAction::FlipLeft));
        assert_eq!(key_action("ArrowRight", false), Some(InputAction::FlipRight));
        assert_eq!(key_action("KeyD", true), Some(InputAction::FlipRight));
        assert_eq!(key_action("PageDown", false), Some(InputAction::ScrollNext));
        assert_eq!(key_action("Space", false), Some(InputAction::ScrollNext));
        assert_eq!(key_action("Space", true), Some(InputAction::ScrollPrev));
        assert_eq!(key_action("ArrowUp", false), Some(InputAction::ScrollPrev));
        assert_eq!(key_action("KeyQ", false), None);
    }

    #[test]
    fn test_kick_signs_agree() {
        let t = InputTuning::default();
        let wheel_down = wheel_kick(120.0, &t).unwrap();
        let key_down = key_kick(InputAction::ScrollNext, &t).unwrap();
        let mut drag = TouchDrag::new();
        drag.start(500.0);
        let finger_up = drag.update(440.0, &t).unwrap();

        assert!(wheel_down < 0.0 && key_down < 0.0 && finger_up < 0.0);
        assert_eq!(wheel_kick(-3.0, &t), Some(t.wheel_kick));
        assert_eq!(wheel_kick(0.0, &t), None);
        assert_eq!(key_kick(InputAction::FlipLeft, &t), None);
    }

    #[test]
    fn test_touch_noise_and_reanchor() {
        let t = InputTuning::default();
        let mut drag = TouchDrag::new();
        assert_eq!(drag.update(100.0, &t), None);

        assert_eq!(drag.update(101.0, &t), None);
        assert_eq!(drag.update(110.0, &t), Some(t.touch_kick));
        // Anchored at 110 now
        assert_eq!(drag.update(111.0, &t), None);

        drag.end();
        assert_eq!(drag.update(50.0, &t), None);
    }

    #[test]
    fn test_apply_flip() {
        let mut table = Table::new(800.0, 1200.0, PinballTuning::default());
        let held = |table: &Table, side: FlipperSide| table.flipper(side).is_some_and(|f| f.pressed);

        assert!(apply_flip(&mut table, InputAction::FlipRight, true));
        assert!(held(&table, FlipperSide::Right) && !held(&table, FlipperSide::Left));
        assert!(!apply_flip(&mut table, InputAction::ScrollNext, true));
        assert!(held(&table, FlipperSide::Right));
        assert!(apply_flip(&mut table, InputAction::FlipRight, false));
        assert!(!held(&table, FlipperSide::Right));
    }
}
