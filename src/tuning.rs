//! Data-driven game balance
//!
//! Every gameplay constant lives here so balance can be tweaked from JSON
//! without touching the simulation. Velocities and accelerations are in
//! reference-frame units (see [`crate::consts::FRAME_MS`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid range for {name}: {min} > {max}")]
    InvalidRange { name: &'static str, min: f32, max: f32 },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f32 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("max_misses must be at least 1")]
    NoMissesAllowed,
}

/// Inclusive-exclusive float range used for random rolls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Map a unit roll in [0, 1) onto the range
    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    fn check(&self, name: &'static str) -> Result<(), TuningError> {
        if self.min > self.max {
            return Err(TuningError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Game balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Spawn pacing ===
    /// Spawn interval at the start of a run (ms)
    pub spawn_interval_ms: f32,
    /// Interval floor (ms)
    pub min_spawn_interval_ms: f32,
    /// Interval multiplier applied after every spawn
    pub spawn_decay: f32,
    /// Chance a launch is a bomb
    pub bomb_chance: f32,
    /// Chance a launch is extra fast
    pub extra_chance: f32,
    /// Speed multiplier for extra fast launches
    pub extra_speed_mult: f32,

    // === Launch ===
    /// Horizontal inset from either screen edge (px)
    pub spawn_margin: f32,
    /// Launch height above the bottom edge (px)
    pub spawn_inset: f32,
    /// Launch angle in radians (screen y points down, so negative is up)
    pub launch_angle: Range,
    /// Launch speed (px per frame)
    pub launch_speed: Range,
    /// Initial rotation (radians)
    pub spin: Range,

    // === Physics ===
    /// Downward acceleration (px per frame²)
    pub gravity: f32,
    /// Horizontal velocity retained per frame
    pub drag: f32,
    /// Rotation added per frame, signed by horizontal direction
    pub spin_rate: f32,
    /// Distance below the bottom edge before an item is discarded (px)
    pub despawn_margin: f32,
    /// Fraction of gravity applied to particles
    pub particle_gravity_scale: f32,

    // === Items ===
    /// Treat radius before device scaling (px)
    pub treat_radius: f32,
    /// Bomb radius before device scaling (px)
    pub bomb_radius: f32,
    /// Horizontal offset of each half from the cut center (px)
    pub piece_offset: f32,
    /// Horizontal kick given to each half (px per frame)
    pub piece_kick: f32,
    /// Upward kick given to both halves (px per frame)
    pub piece_lift: f32,

    // === Rules ===
    /// Misses allowed before the run ends
    pub max_misses: u32,
    /// Consecutive slices per multiplier step
    pub combo_step: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            spawn_interval_ms: 800.0,
            min_spawn_interval_ms: 350.0,
            spawn_decay: 0.995,
            bomb_chance: 0.12,
            extra_chance: 0.15,
            extra_speed_mult: 1.5,

            spawn_margin: 80.0,
            spawn_inset: 90.0,
            launch_angle: Range::new(-PI * 0.9, -PI * 0.4),
            launch_speed: Range::new(8.0, 13.0),
            spin: Range::new(-0.1, 0.1),

            gravity: 0.18,
            drag: 0.999,
            spin_rate: 0.01,
            despawn_margin: 60.0,
            particle_gravity_scale: 0.04,

            treat_radius: 80.0,
            bomb_radius: 50.0,
            piece_offset: 15.0,
            piece_kick: 3.0,
            piece_lift: 2.0,

            max_misses: 3,
            combo_step: 3,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning table; missing fields take default values
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check that every value is usable by the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("spawn_interval_ms", self.spawn_interval_ms)?;
        positive("min_spawn_interval_ms", self.min_spawn_interval_ms)?;
        Range::new(self.min_spawn_interval_ms, self.spawn_interval_ms)
            .check("spawn_interval_ms")?;
        probability("spawn_decay", self.spawn_decay)?;
        probability("bomb_chance", self.bomb_chance)?;
        probability("extra_chance", self.extra_chance)?;
        probability("drag", self.drag)?;
        positive("extra_speed_mult", self.extra_speed_mult)?;

        self.launch_angle.check("launch_angle")?;
        self.launch_speed.check("launch_speed")?;
        self.spin.check("spin")?;

        positive("treat_radius", self.treat_radius)?;
        positive("bomb_radius", self.bomb_radius)?;

        if self.max_misses == 0 {
            return Err(TuningError::NoMissesAllowed);
        }
        if self.combo_step == 0 {
            return Err(TuningError::NotPositive {
                name: "combo_step",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::InvalidProbability { name, value })
    }
}
