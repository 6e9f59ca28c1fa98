//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use super::blade::BladeInput;
use super::collision::first_cutting_segment;
use super::effects::{explosion_burst, juice_burst, split_treat};
use super::spawn::advance_spawner;
use super::state::{GameEvent, GamePhase, GameState, ItemKind};
use crate::frame_factor;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start (or restart) a run
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Pointer activity since the last tick, in arrival order
    pub blade: Vec<BladeInput>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.start {
        state.start();
    }
    if input.pause {
        state.toggle_pause();
    }

    // Blade input is accepted in every phase so the trail still draws
    apply_blade(state, &input.blade);

    match state.phase {
        GamePhase::Playing => {}
        GamePhase::GameOver => {
            // Let the blast play out under the game over overlay
            update_particles(state, dt);
            decay_feedback(state, dt);
            return;
        }
        GamePhase::Title | GamePhase::Paused => return,
    }

    state.time_ms += (dt * 1000.0) as f64;
    decay_feedback(state, dt);

    advance_spawner(state, dt * 1000.0);
    update_items(state, dt);
    if state.phase != GamePhase::Playing {
        return;
    }
    update_particles(state, dt);
    slice_check(state);
}

fn apply_blade(state: &mut GameState, inputs: &[BladeInput]) {
    let now = state.time_ms;
    for input in inputs {
        match *input {
            BladeInput::Press { pointer_id, pos } => state.blade.press(pointer_id, pos, now),
            BladeInput::Drag { pointer_id, pos } => state.blade.drag(pointer_id, pos, now),
            BladeInput::Release { pointer_id } => {
                if state.blade.release(pointer_id) {
                    state.break_combo();
                }
            }
        }
    }
}

/// Integrate items, discard the ones that fell away, and count misses
fn update_items(state: &mut GameState, dt: f32) {
    let f = frame_factor(dt);
    let floor = state.floor();
    let tuning = &state.tuning;
    let mut missed = 0u32;

    state.items.retain_mut(|item| {
        if item.sliced {
            return false;
        }
        item.integrate(tuning, f);
        if item.is_below(floor) {
            if item.kind.counts_as_miss() {
                missed += 1;
            }
            return false;
        }
        true
    });

    for _ in 0..missed {
        state.misses += 1;
        state.break_combo();
        state.events.push(GameEvent::Missed {
            misses: state.misses,
        });
        log::debug!("Missed ({}/{})", state.misses, state.tuning.max_misses);
        if state.misses >= state.tuning.max_misses {
            state.end_game();
            break;
        }
    }
}

fn update_particles(state: &mut GameState, dt: f32) {
    let dt_ms = dt * 1000.0;
    let f = frame_factor(dt);
    let gravity = state.tuning.gravity * state.tuning.particle_gravity_scale;

    state.particles.retain_mut(|p| {
        p.age_ms += dt_ms;
        if p.age_ms > p.life_ms {
            return false;
        }
        p.vel.y += gravity * f;
        p.pos += p.vel * f;
        true
    });
}

fn decay_feedback(state: &mut GameState, dt: f32) {
    state.shake = (state.shake - dt * 2.5).max(0.0);
    state.flash = (state.flash - dt * 3.0).max(0.0);
}

/// Cut everything the blade crosses this step
fn slice_check(state: &mut GameState) {
    if state.blade.len() < 2 {
        return;
    }
    let segments: Vec<_> = state.blade.segments().collect();

    // Pieces appended while cutting sit past `count` and are never visited
    let count = state.items.len();
    for index in 0..count {
        let item = &state.items[index];
        if item.sliced || !item.kind.is_sliceable() {
            continue;
        }
        if first_cutting_segment(&segments, item.pos, item.radius).is_none() {
            continue;
        }

        state.items[index].sliced = true;
        let item = state.items[index].clone();
        match item.kind {
            ItemKind::Bomb => {
                explosion_burst(state, item.pos);
                state.events.push(GameEvent::BombDetonated { pos: item.pos });
                state.end_game();
                return;
            }
            ItemKind::Treat(kind) => {
                let points = kind.points() * state.multiplier();
                state.score += points as u64;
                state.combo += 1;
                state.best_combo = state.best_combo.max(state.combo);
                juice_burst(state, item.pos, kind);
                split_treat(state, &item);
                state.events.push(GameEvent::Sliced {
                    kind,
                    points,
                    combo: state.combo,
                    pos: item.pos,
                });
                log::debug!("Sliced {:?} for {} (combo {})", kind, points, state.combo);
            }
            ItemKind::Piece { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::spawn::launch;
    use crate::sim::state::{Item, Particle, ParticleKind, TreatKind};
    use crate::tuning::Tuning;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Tuning::default(), Vec2::new(800.0, 600.0), 1.0);
        state.start();
        state.drain_events();
        state
    }

    fn place(state: &mut GameState, kind: ItemKind, pos: Vec2) -> u32 {
        let id = state.next_entity_id();
        let radius = match kind {
            ItemKind::Bomb => state.bomb_radius(),
            _ => state.treat_radius(),
        };
        state.items.push(Item {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            radius,
            rot: 0.0,
            sliced: false,
        });
        id
    }

    fn swipe(from: Vec2, to: Vec2) -> TickInput {
        TickInput {
            blade: vec![
                BladeInput::Press { pointer_id: 1, pos: from },
                BladeInput::Drag { pointer_id: 1, pos: to },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_title_does_not_advance() {
        let mut state = GameState::new(1, Tuning::default(), Vec2::new(800.0, 600.0), 1.0);
        for _ in 0..240 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.time_ms, 0.0);
        assert!(state.items.is_empty());

        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = playing(2);
        launch(&mut state, false, false);
        let before = state.items[0].pos;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.items[0].pos, before);

        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_ne!(state.items[0].pos, before);
    }

    #[test]
    fn test_slicing_treat_scores_and_splits() {
        let mut state = playing(3);
        let center = Vec2::new(400.0, 300.0);
        place(&mut state, ItemKind::Treat(TreatKind::Cake), center);

        tick(
            &mut state,
            &swipe(Vec2::new(250.0, 300.0), Vec2::new(550.0, 300.0)),
            SIM_DT,
        );

        assert_eq!(state.score, 12);
        assert_eq!(state.combo, 1);
        assert_eq!(state.particles.len(), 20);
        let pieces = state
            .items
            .iter()
            .filter(|i| matches!(i.kind, ItemKind::Piece { .. }))
            .count();
        assert_eq!(pieces, 2);
        assert!(state.items[0].sliced);

        let events = state.drain_events();
        assert!(matches!(
            events.as_slice(),
            [GameEvent::Sliced { kind: TreatKind::Cake, points: 12, combo: 1, .. }]
        ));

        // Cut treat is gone next step, pieces remain and cannot be cut
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.score, 12);
    }

    #[test]
    fn test_swipe_missing_treat_does_nothing() {
        let mut state = playing(4);
        place(&mut state, ItemKind::Treat(TreatKind::Donut), Vec2::new(400.0, 300.0));
        tick(
            &mut state,
            &swipe(Vec2::new(100.0, 100.0), Vec2::new(700.0, 100.0)),
            SIM_DT,
        );
        assert_eq!(state.score, 0);
        assert!(!state.items[0].sliced);
    }

    #[test]
    fn test_combo_multiplier() {
        let mut state = playing(5);
        for i in 0..7 {
            place(
                &mut state,
                ItemKind::Treat(TreatKind::Cupcake),
                Vec2::new(50.0 + i as f32 * 100.0, 300.0),
            );
        }
        tick(
            &mut state,
            &swipe(Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0)),
            SIM_DT,
        );
        // 3 at x1, 3 at x2, 1 at x3
        assert_eq!(state.score, 10 * 3 + 20 * 3 + 30);
        assert_eq!(state.combo, 7);
        assert_eq!(state.best_combo, 7);
    }

    #[test]
    fn test_release_resets_combo() {
        let mut state = playing(6);
        place(&mut state, ItemKind::Treat(TreatKind::Cake), Vec2::new(400.0, 300.0));
        tick(
            &mut state,
            &swipe(Vec2::new(250.0, 300.0), Vec2::new(550.0, 300.0)),
            SIM_DT,
        );
        assert_eq!(state.combo, 1);

        let release = TickInput {
            blade: vec![BladeInput::Release { pointer_id: 1 }],
            ..Default::default()
        };
        tick(&mut state, &release, SIM_DT);
        assert_eq!(state.combo, 0);
        assert_eq!(state.best_combo, 1);
        assert!(state.blade.is_empty());
    }

    #[test]
    fn test_bomb_ends_game() {
        let mut state = playing(7);
        place(&mut state, ItemKind::Bomb, Vec2::new(300.0, 300.0));
        place(&mut state, ItemKind::Treat(TreatKind::Cake), Vec2::new(500.0, 300.0));
        tick(
            &mut state,
            &swipe(Vec2::new(200.0, 300.0), Vec2::new(600.0, 300.0)),
            SIM_DT,
        );
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0, "processing stops at the bomb");
        assert_eq!(state.particles.len(), 40);

        let events = state.drain_events();
        assert!(matches!(events[0], GameEvent::BombDetonated { .. }));
        assert!(matches!(events[1], GameEvent::GameOver { score: 0, .. }));
    }

    #[test]
    fn test_falling_treat_is_a_miss() {
        let mut state = playing(8);
        place(&mut state, ItemKind::Treat(TreatKind::Donut), Vec2::new(400.0, 745.0));
        place(&mut state, ItemKind::Bomb, Vec2::new(200.0, 900.0));
        state.combo = 2;
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.misses, 1);
        assert_eq!(state.combo, 0);
        assert!(state.items.is_empty());
        assert_eq!(state.drain_events(), vec![GameEvent::Missed { misses: 1 }]);
    }

    #[test]
    fn test_third_miss_ends_game() {
        let mut state = playing(9);
        state.misses = 2;
        place(&mut state, ItemKind::Treat(TreatKind::Cake), Vec2::new(100.0, 800.0));
        place(&mut state, ItemKind::Treat(TreatKind::Cake), Vec2::new(300.0, 800.0));
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.misses, 3);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.shake > 0.0);
        assert!(state.flash > 0.0);
    }

    #[test]
    fn test_pieces_do_not_count_as_misses() {
        let mut state = playing(10);
        place(
            &mut state,
            ItemKind::Piece {
                of: TreatKind::Cake,
                side: crate::sim::state::PieceSide::Left,
            },
            Vec2::new(400.0, 900.0),
        );
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.misses, 0);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_particles_expire() {
        let mut state = playing(11);
        juice_burst(&mut state, Vec2::new(400.0, 300.0), TreatKind::Cake);
        // Longest juice life is 900 ms
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_particle_gravity_is_scaled_down() {
        let mut state = playing(21);
        state.particles.push(Particle {
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::new(1.0, 0.0),
            age_ms: 0.0,
            life_ms: 10_000.0,
            size: 3.0,
            kind: ParticleKind::Spark,
        });
        tick(&mut state, &TickInput::default(), SIM_DT);

        let f = frame_factor(SIM_DT);
        let expected_vy = 0.18 * 0.04 * f;
        let p = &state.particles[0];
        assert!((p.vel.y - expected_vy).abs() < 1e-6);
        assert!((p.pos.y - (300.0 + expected_vy * f)).abs() < 1e-4);
        assert!((p.pos.x - (400.0 + f)).abs() < 1e-4);
    }

    #[test]
    fn test_game_over_freezes_items() {
        let mut state = playing(12);
        launch(&mut state, false, false);
        state.end_game();
        let before = state.items[0].pos;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.items[0].pos, before);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = playing(99999);
        let mut state2 = playing(99999);

        let inputs = [
            swipe(Vec2::new(0.0, 400.0), Vec2::new(800.0, 200.0)),
            TickInput {
                blade: vec![BladeInput::Drag {
                    pointer_id: 1,
                    pos: Vec2::new(400.0, 500.0),
                }],
                ..Default::default()
            },
            TickInput {
                blade: vec![BladeInput::Release { pointer_id: 1 }],
                ..Default::default()
            },
        ];

        for step in 0..2400 {
            let input = if step % 40 < inputs.len() {
                inputs[step % 40].clone()
            } else {
                TickInput::default()
            };
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.spawned, state2.spawned);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.misses, state2.misses);
        assert_eq!(state1.items.len(), state2.items.len());
        for (a, b) in state1.items.iter().zip(&state2.items) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.pos, b.pos);
        }
    }

    #[test]
    fn test_restored_snapshot_continues_identically() {
        let mut state = playing(4242);
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let json = serde_json::to_string(&state).unwrap();
        let mut restored: GameState = serde_json::from_str(&json).unwrap();

        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            tick(&mut restored, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.spawned, restored.spawned);
        assert_eq!(state.items.len(), restored.items.len());
        assert_eq!(state.misses, restored.misses);
    }
}
