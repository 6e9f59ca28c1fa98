//! Particle bursts and treat splitting

use glam::Vec2;

use super::state::{GameState, Item, ItemKind, Particle, ParticleKind, PieceSide, TreatKind};
use crate::tuning::Range;

const JUICE_COUNT: usize = 20;
const SPARK_COUNT: usize = 40;

/// Splatter from a freshly cut treat
pub fn juice_burst(state: &mut GameState, pos: Vec2, kind: TreatKind) {
    for _ in 0..JUICE_COUNT {
        let jitter = state.roll(Range::new(-8.0, 8.0));
        let vel = Vec2::new(
            state.roll(Range::new(-4.0, 4.0)),
            state.roll(Range::new(-6.0, 2.0)),
        );
        let life_ms = state.roll(Range::new(400.0, 900.0));
        let size = state.roll(Range::new(2.0, 5.0));
        push_particle(
            state,
            Particle {
                pos: pos + Vec2::new(0.0, jitter),
                vel,
                age_ms: 0.0,
                life_ms,
                size,
                kind: ParticleKind::Juice(kind),
            },
        );
    }
}

/// Bomb blast
pub fn explosion_burst(state: &mut GameState, pos: Vec2) {
    for _ in 0..SPARK_COUNT {
        let vel = Vec2::new(
            state.roll(Range::new(-6.0, 6.0)),
            state.roll(Range::new(-6.0, 6.0)),
        );
        let life_ms = state.roll(Range::new(600.0, 1200.0));
        let size = state.roll(Range::new(2.0, 4.0));
        push_particle(
            state,
            Particle {
                pos,
                vel,
                age_ms: 0.0,
                life_ms,
                size,
                kind: ParticleKind::Spark,
            },
        );
    }
    state.shake = 1.0;
    state.flash = 1.0;
}

/// Replace a cut treat with two halves flying apart
pub fn split_treat(state: &mut GameState, treat: &Item) {
    let ItemKind::Treat(of) = treat.kind else {
        return;
    };
    let offset = state.tuning.piece_offset;
    let kick = state.tuning.piece_kick;
    let lift = state.tuning.piece_lift;

    for side in [PieceSide::Left, PieceSide::Right] {
        let id = state.next_entity_id();
        state.items.push(Item {
            id,
            kind: ItemKind::Piece { of, side },
            pos: treat.pos + Vec2::new(offset * side.sign(), 0.0),
            vel: treat.vel + Vec2::new(kick * side.sign(), -lift),
            radius: treat.radius * 0.5,
            rot: treat.rot,
            sliced: false,
        });
    }
}

/// Add a particle, dropping the oldest ones past the cap
fn push_particle(state: &mut GameState, particle: Particle) {
    if state.max_particles == 0 {
        return;
    }
    state.particles.push(particle);
    let excess = state.particles.len().saturating_sub(state.max_particles);
    if excess > 0 {
        state.particles.drain(..excess);
    }
}
