//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (items stay in spawn order)
//! - No rendering or platform dependencies

pub mod blade;
pub mod collision;
pub mod effects;
pub mod spawn;
pub mod state;
pub mod tick;

pub use blade::{Blade, BladeInput, BladePoint};
pub use collision::{closest_point_on_segment, first_cutting_segment, segment_intersects_circle};
pub use state::{
    GameEvent, GamePhase, GameState, Item, ItemKind, Particle, ParticleKind, PieceSide, TreatKind,
};
pub use tick::{TickInput, tick};
