//! Folio Sim - simulation cores behind a portfolio site
//!
//! Core modules:
//! - `sim`: Pinball table (geometry, entities, layout, per-frame tick)
//! - `rubber`: Spring-displacement "rubber scroll" engine and section navigation
//! - `input`: Keyboard/wheel/touch mapping into core calls
//! - `renderer`: WebGPU drawing of table snapshots
//! - `tuning`: Data-driven physics constants
//! - `settings`: Persisted user preferences

pub mod input;
pub mod renderer;
pub mod rubber;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Loop configuration constants
pub mod consts {
    /// Fixed pinball timestep. Ball physics is tuned in per-frame units at this rate.
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum pinball steps per display frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest display-frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;
}
