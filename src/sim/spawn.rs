//! Spawn pacing and launch
//!
//! One item is thrown each time the spawn timer passes the current
//! interval; the interval shrinks a little after every throw.

use glam::Vec2;

use super::state::{GameState, Item, ItemKind, TreatKind};

/// Advance the spawn timer by `dt_ms`. Returns the launched item's id, if any.
pub fn advance_spawner(state: &mut GameState, dt_ms: f32) -> Option<u32> {
    state.spawn_timer_ms += dt_ms;
    if state.spawn_timer_ms <= state.spawn_interval_ms {
        return None;
    }
    state.spawn_timer_ms = 0.0;

    let bomb = state.chance(state.tuning.bomb_chance);
    let extra = state.chance(state.tuning.extra_chance);
    let id = launch(state, bomb, extra);

    state.spawn_interval_ms = (state.spawn_interval_ms * state.tuning.spawn_decay)
        .max(state.tuning.min_spawn_interval_ms);
    Some(id)
}

/// Throw a single treat or bomb from the bottom of the play area
pub fn launch(state: &mut GameState, bomb: bool, extra: bool) -> u32 {
    let margin = state.tuning.spawn_margin;
    let width = state.arena.x;
    let x = if width > margin * 2.0 {
        margin + state.roll_unit() * (width - margin * 2.0)
    } else {
        width / 2.0
    };
    let y = state.arena.y - state.tuning.spawn_inset;

    let angle = state.roll(state.tuning.launch_angle);
    let speed_mult = if extra { state.tuning.extra_speed_mult } else { 1.0 };
    let speed = state.roll(state.tuning.launch_speed) * speed_mult;
    let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
    let rot = state.roll(state.tuning.spin);

    let (kind, radius) = if bomb {
        (ItemKind::Bomb, state.bomb_radius())
    } else {
        let treat = TreatKind::ALL[state.pick(TreatKind::ALL.len())];
        (ItemKind::Treat(treat), state.treat_radius())
    };

    let id = state.next_entity_id();
    state.items.push(Item {
        id,
        kind,
        pos: Vec2::new(x, y),
        vel,
        radius,
        rot,
        sliced: false,
    });
    state.spawned += 1;
    log::debug!(
        "Spawned {:?} #{} at x={:.0} speed={:.1}{}",
        kind,
        id,
        x,
        speed,
        if extra { " (fast)" } else { "" }
    );
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn playing(seed: u64) -> GameState {
        let mut s = GameState::new(seed, Tuning::default(), Vec2::new(800.0, 600.0), 1.0);
        s.start();
        s
    }

    #[test]
    fn test_no_spawn_before_interval() {
        let mut s = playing(1);
        assert_eq!(advance_spawner(&mut s, 800.0), None);
        assert!(s.items.is_empty());
        assert!(advance_spawner(&mut s, 1.0).is_some());
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.spawn_timer_ms, 0.0);
    }

    #[test]
    fn test_interval_decays_to_floor() {
        let mut s = playing(2);
        let mut last = s.spawn_interval_ms;
        for _ in 0..400 {
            if advance_spawner(&mut s, last + 1.0).is_some() {
                assert!(s.spawn_interval_ms <= last);
                assert!(s.spawn_interval_ms >= 350.0);
                last = s.spawn_interval_ms;
            }
        }
        assert_eq!(s.spawn_interval_ms, 350.0);
    }

    #[test]
    fn test_first_decay_step() {
        let mut s = playing(3);
        advance_spawner(&mut s, 801.0);
        assert!((s.spawn_interval_ms - 796.0).abs() < 1e-3);
    }

    #[test]
    fn test_launch_goes_up_from_bottom() {
        let mut s = playing(4);
        for _ in 0..200 {
            launch(&mut s, false, false);
        }
        for item in &s.items {
            assert!(item.pos.x >= 80.0 && item.pos.x <= 720.0);
            assert_eq!(item.pos.y, 510.0);
            assert!(item.vel.y < 0.0, "launch must head upward");
            let speed = item.vel.length();
            assert!((8.0 - 1e-3..=13.0 + 1e-3).contains(&speed));
            assert!(item.rot.abs() <= 0.1 + 1e-6);
            assert!(matches!(item.kind, ItemKind::Treat(_)));
            assert_eq!(item.radius, 80.0);
        }
    }

    #[test]
    fn test_extra_launch_is_faster() {
        let mut s = playing(5);
        launch(&mut s, true, true);
        let bomb = &s.items[0];
        assert_eq!(bomb.kind, ItemKind::Bomb);
        assert_eq!(bomb.radius, 50.0);
        let speed = bomb.vel.length();
        assert!((12.0 - 1e-3..=19.5 + 1e-3).contains(&speed));
    }

    #[test]
    fn test_narrow_arena_launches_from_center() {
        let mut s = playing(6);
        s.resize(Vec2::new(120.0, 600.0));
        launch(&mut s, false, false);
        assert_eq!(s.items[0].pos.x, 60.0);
    }

    #[test]
    fn test_bomb_rate_is_roughly_twelve_percent() {
        let mut s = playing(7);
        let mut bombs = 0;
        for _ in 0..5000 {
            advance_spawner(&mut s, 1000.0);
        }
        for item in &s.items {
            if item.kind == ItemKind::Bomb {
                bombs += 1;
            }
        }
        let rate = bombs as f32 / s.items.len() as f32;
        assert!((0.09..0.15).contains(&rate), "bomb rate {rate}");
    }

    #[test]
    fn test_extra_fast_launches_are_rare() {
        let mut s = playing(8);
        for _ in 0..5000 {
            advance_spawner(&mut s, 1000.0);
        }
        // Base speed tops out at 13; only 1.5x launches exceed it
        let fast = s.items.iter().filter(|i| i.vel.length() > 13.0 + 1e-3).count();
        let rate = fast as f32 / s.items.len() as f32;
        // 0.15 * (19.5 - 13) / (19.5 - 12)
        assert!((0.10..0.16).contains(&rate), "fast rate {rate}");
        assert!(s.items.iter().all(|i| i.vel.length() <= 19.5 + 1e-3));
    }
}
