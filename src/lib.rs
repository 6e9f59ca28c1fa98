//! Sweet Slice - swipe-to-slice dessert arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, physics, slicing, game state)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Viewport sizing and device detection
//! - `persistence`: LocalStorage-backed key/value storage
//! - `tuning`: Data-driven game balance

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{ItemSize, QualityPreset, Settings};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the browser (seconds)
    pub const MAX_FRAME_DT: f32 = 0.04;

    /// Reference frame length that velocities are expressed in (ms)
    pub const FRAME_MS: f32 = 16.6;

    /// Most points the blade trail keeps
    pub const MAX_BLADE_POINTS: usize = 20;

    /// Item scale on phones and small touch devices
    pub const COMPACT_ITEM_SCALE: f32 = 0.6;

    /// Particle cap when settings do not override it
    pub const DEFAULT_MAX_PARTICLES: usize = 500;

    /// Upper bounds of what the GPU buffers can hold
    pub const MAX_RENDER_ITEMS: usize = 64;
    pub const MAX_RENDER_PARTICLES: usize = 192;
}

/// Convert a step length in seconds to reference-frame units
#[inline]
pub fn frame_factor(dt: f32) -> f32 {
    dt * 1000.0 / consts::FRAME_MS
}
