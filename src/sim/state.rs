//! Game state and core simulation types
//!
//! All state that must be reproduced for determinism lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::blade::Blade;
use crate::consts::DEFAULT_MAX_PARTICLES;
use crate::tuning::{Range, Tuning};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Nothing started yet, title overlay is up
    Title,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended (bomb or too many misses)
    GameOver,
}

/// Sliceable desserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreatKind {
    Cupcake,
    Cake,
    Donut,
    Croissant,
}

impl TreatKind {
    pub const ALL: [TreatKind; 4] = [
        TreatKind::Cupcake,
        TreatKind::Cake,
        TreatKind::Donut,
        TreatKind::Croissant,
    ];

    /// Base points for slicing this treat
    pub fn points(self) -> u32 {
        match self {
            TreatKind::Cupcake => 10,
            TreatKind::Cake => 12,
            TreatKind::Donut => 9,
            TreatKind::Croissant => 10,
        }
    }
}

/// Which half of a sliced treat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceSide {
    Left,
    Right,
}

impl PieceSide {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            PieceSide::Left => -1.0,
            PieceSide::Right => 1.0,
        }
    }
}

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Treat(TreatKind),
    Bomb,
    /// Half of a sliced treat, purely decorative
    Piece { of: TreatKind, side: PieceSide },
}

impl ItemKind {
    /// Whether the blade can cut this item
    pub fn is_sliceable(&self) -> bool {
        !matches!(self, ItemKind::Piece { .. })
    }

    /// Whether dropping this item off screen costs a miss
    pub fn counts_as_miss(&self) -> bool {
        matches!(self, ItemKind::Treat(_))
    }
}

/// A launched object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub kind: ItemKind,
    /// Screen position (CSS px, y down)
    pub pos: Vec2,
    /// Velocity (px per reference frame)
    pub vel: Vec2,
    pub radius: f32,
    /// Rotation (radians)
    pub rot: f32,
    /// Cut this step; removed on the next integration pass
    pub sliced: bool,
}

impl Item {
    /// Advance by `f` reference frames
    pub fn integrate(&mut self, tuning: &Tuning, f: f32) {
        self.vel.y += tuning.gravity * f;
        self.pos += self.vel * f;
        self.vel.x *= tuning.drag.powf(f);
        let spin_dir = if self.vel.x > 0.0 { 1.0 } else { -1.0 };
        self.rot += tuning.spin_rate * f * spin_dir;
    }

    /// True once the item has fully dropped below the play area
    pub fn is_below(&self, floor: f32) -> bool {
        self.pos.y - self.radius > floor
    }
}

/// Particle looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Splatter from a sliced treat
    Juice(TreatKind),
    /// Bomb blast spark
    Spark,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age_ms: f32,
    pub life_ms: f32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Remaining opacity, 1 when fresh, 0 when expired
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age_ms / self.life_ms).clamp(0.0, 1.0)
    }
}

/// Things the frontend reacts to (audio, leaderboard, HUD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    Sliced {
        kind: TreatKind,
        points: u32,
        combo: u32,
        pos: Vec2,
    },
    BombDetonated {
        pos: Vec2,
    },
    Missed {
        misses: u32,
    },
    GameOver {
        score: u64,
        best_combo: u32,
    },
}

/// Feedback when a run ends without a bomb
const END_SHAKE: f32 = 0.4;
const END_FLASH: f32 = 0.25;

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Balance table
    pub tuning: Tuning,
    /// Play area size (CSS px)
    pub arena: Vec2,
    /// Device-dependent size multiplier for treats and bombs
    pub item_scale: f32,
    /// Current phase
    pub phase: GamePhase,
    pub score: u64,
    pub misses: u32,
    /// Consecutive slices in the current swipe
    pub combo: u32,
    /// Longest combo this run
    pub best_combo: u32,
    /// Simulated time while playing (ms)
    pub time_ms: f64,
    /// Time since the last spawn (ms)
    pub spawn_timer_ms: f32,
    /// Current spawn interval (ms)
    pub spawn_interval_ms: f32,
    /// Items launched this run
    pub spawned: u32,
    /// Active items (treats, bombs, pieces)
    pub items: Vec<Item>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    /// Particle cap, set from quality settings
    pub max_particles: usize,
    /// Player swipe trail
    pub blade: Blade,
    /// Screen shake intensity (0-1), decays over time
    pub shake: f32,
    /// White flash intensity (0-1), decays over time
    pub flash: f32,
    /// Events not yet consumed by the frontend
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a title-screen state for an arena of the given size
    pub fn new(seed: u64, tuning: Tuning, arena: Vec2, item_scale: f32) -> Self {
        let spawn_interval_ms = tuning.spawn_interval_ms;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            arena,
            item_scale,
            phase: GamePhase::Title,
            score: 0,
            misses: 0,
            combo: 0,
            best_combo: 0,
            time_ms: 0.0,
            spawn_timer_ms: 0.0,
            spawn_interval_ms,
            spawned: 0,
            items: Vec::new(),
            particles: Vec::new(),
            max_particles: DEFAULT_MAX_PARTICLES,
            blade: Blade::default(),
            shake: 0.0,
            flash: 0.0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a fresh run (works from any phase)
    pub fn start(&mut self) {
        self.items.clear();
        self.particles.clear();
        self.blade.clear();
        self.score = 0;
        self.misses = 0;
        self.combo = 0;
        self.best_combo = 0;
        self.time_ms = 0.0;
        self.spawn_timer_ms = 0.0;
        self.spawn_interval_ms = self.tuning.spawn_interval_ms;
        self.spawned = 0;
        self.shake = 0.0;
        self.flash = 0.0;
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::Started);
        log::info!("Run started (seed {})", self.seed);
    }

    /// Toggle between Playing and Paused; other phases are left alone
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }

    /// End the run
    pub fn end_game(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        // A bomb blast has already set full feedback
        self.shake = self.shake.max(END_SHAKE);
        self.flash = self.flash.max(END_FLASH);
        self.events.push(GameEvent::GameOver {
            score: self.score,
            best_combo: self.best_combo,
        });
        log::info!(
            "Game over: score {}, misses {}, best combo {}",
            self.score,
            self.misses,
            self.best_combo
        );
    }

    /// Update the play area after a window resize
    pub fn resize(&mut self, arena: Vec2) {
        self.arena = arena;
    }

    /// Current treat radius after device scaling
    pub fn treat_radius(&self) -> f32 {
        self.tuning.treat_radius * self.item_scale
    }

    /// Current bomb radius after device scaling
    pub fn bomb_radius(&self) -> f32 {
        self.tuning.bomb_radius * self.item_scale
    }

    /// Score multiplier for the next slice
    pub fn multiplier(&self) -> u32 {
        1 + self.combo / self.tuning.combo_step
    }

    /// Lowest y an item may reach before it is discarded
    pub fn floor(&self) -> f32 {
        self.arena.y + self.tuning.despawn_margin
    }

    /// Reset the streak (miss or blade lifted)
    pub fn break_combo(&mut self) {
        self.combo = 0;
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Uniform roll in [0, 1)
    pub fn roll_unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform roll over a tuning range
    pub fn roll(&mut self, range: Range) -> f32 {
        range.lerp(self.roll_unit())
    }

    /// Weighted coin flip
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.random::<f32>() < p
    }

    /// Uniform index below `len`
    pub fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, Tuning::default(), Vec2::new(800.0, 600.0), 1.0)
    }

    #[test]
    fn test_new_state_is_title() {
        let s = state();
        assert_eq!(s.phase, GamePhase::Title);
        assert_eq!(s.spawn_interval_ms, 800.0);
        assert!(s.items.is_empty());
    }

    #[test]
    fn test_start_resets_run() {
        let mut s = state();
        s.start();
        s.score = 120;
        s.misses = 2;
        s.combo = 4;
        s.spawn_interval_ms = 400.0;
        s.end_game();

        s.start();
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.score, 0);
        assert_eq!(s.misses, 0);
        assert_eq!(s.combo, 0);
        assert_eq!(s.spawn_interval_ms, 800.0);
    }

    #[test]
    fn test_pause_does_not_resume_finished_game() {
        let mut s = state();
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::Title);

        s.start();
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::Paused);
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::Playing);

        s.end_game();
        s.toggle_pause();
        assert_eq!(s.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_end_game_emits_once() {
        let mut s = state();
        s.start();
        s.drain_events();
        s.end_game();
        s.end_game();
        let events = s.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::GameOver { .. }));
    }

    #[test]
    fn test_multiplier_steps_every_three() {
        let mut s = state();
        for (combo, expected) in [(0, 1), (2, 1), (3, 2), (5, 2), (6, 3)] {
            s.combo = combo;
            assert_eq!(s.multiplier(), expected);
        }
    }

    #[test]
    fn test_item_scale_applies_to_radii() {
        let mut s = state();
        s.item_scale = 0.6;
        assert!((s.treat_radius() - 48.0).abs() < 1e-4);
        assert!((s.bomb_radius() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_piece_is_not_sliceable() {
        let piece = ItemKind::Piece {
            of: TreatKind::Donut,
            side: PieceSide::Left,
        };
        assert!(!piece.is_sliceable());
        assert!(!piece.counts_as_miss());
        assert!(ItemKind::Bomb.is_sliceable());
        assert!(!ItemKind::Bomb.counts_as_miss());
        assert!(ItemKind::Treat(TreatKind::Cake).counts_as_miss());
    }

    #[test]
    fn test_item_integrate_gravity_and_drag() {
        let tuning = Tuning::default();
        let mut item = Item {
            id: 1,
            kind: ItemKind::Bomb,
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::new(2.0, -10.0),
            radius: 50.0,
            rot: 0.0,
            sliced: false,
        };
        item.integrate(&tuning, 1.0);
        assert!((item.vel.y - (-9.82)).abs() < 1e-4);
        assert!((item.pos.x - 102.0).abs() < 1e-4);
        assert!((item.pos.y - 90.18).abs() < 1e-4);
        assert!((item.vel.x - 1.998).abs() < 1e-4);
        assert!(item.rot > 0.0);
    }

    fn drifting(vel: Vec2) -> Item {
        Item {
            id: 1,
            kind: ItemKind::Treat(TreatKind::Cupcake),
            pos: Vec2::new(100.0, 100.0),
            vel,
            radius: 80.0,
            rot: 0.0,
            sliced: false,
        }
    }

    #[test]
    fn test_spin_without_horizontal_motion_turns_negative() {
        let tuning = Tuning::default();
        let mut item = drifting(Vec2::new(0.0, -5.0));
        item.integrate(&tuning, 1.0);
        assert!((item.rot - (-0.01)).abs() < 1e-6);

        let mut item = drifting(Vec2::new(-1.0, -5.0));
        item.integrate(&tuning, 1.0);
        assert!(item.rot < 0.0);
    }

    #[test]
    fn test_drag_matches_across_step_sizes() {
        let tuning = Tuning::default();
        let mut whole = drifting(Vec2::new(5.0, 0.0));
        whole.integrate(&tuning, 1.0);

        let mut halves = drifting(Vec2::new(5.0, 0.0));
        halves.integrate(&tuning, 0.5);
        halves.integrate(&tuning, 0.5);

        assert!((whole.vel.x - 5.0 * 0.999).abs() < 1e-5);
        assert!((whole.vel.x - halves.vel.x).abs() < 1e-5);
        assert!((whole.rot - halves.rot).abs() < 1e-6);
    }

    #[test]
    fn test_end_game_without_bomb_gives_mild_feedback() {
        let mut s = state();
        s.start();
        s.end_game();
        assert_eq!(s.shake, END_SHAKE);
        assert_eq!(s.flash, END_FLASH);

        // Full blast feedback is kept
        s.start();
        s.shake = 1.0;
        s.flash = 1.0;
        s.end_game();
        assert_eq!(s.shake, 1.0);
        assert_eq!(s.flash, 1.0);
    }

    #[test]
    fn test_particle_alpha_fades() {
        let mut p = Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            age_ms: 0.0,
            life_ms: 400.0,
            size: 3.0,
            kind: ParticleKind::Spark,
        };
        assert_eq!(p.alpha(), 1.0);
        p.age_ms = 200.0;
        assert!((p.alpha() - 0.5).abs() < 1e-6);
        p.age_ms = 600.0;
        assert_eq!(p.alpha(), 0.0);
    }
}
