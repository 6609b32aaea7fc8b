/// Session: the complete state of a running game.
///
/// ## Ownership
///
/// The session owns the grid and every entity collection. A level
/// transition replaces them wholesale: a new `Grid` is built, bags come
/// from the level builder, enemies and bullets start empty. Nothing is
/// reverted in place.
///
/// ## Modes
///
/// ```text
///   Normal ⇄ Bonus                 (enter_bonus / bonus timer runs out)
///   Normal | Bonus → LevelComplete (no emerald left on the grid)
///   LevelComplete  → Normal        (hold expires, next level exists)
///   any            → GameOver      (every player out, or last level done)
/// ```
///
/// The session never touches the terminal, the filesystem or audio.
/// `advance` returns an ordered list of effects for the shell.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{RulesConfig, SpeedConfig};
use crate::domain::ai::AiMode;
use crate::domain::difficulty::{DifficultyProfile, Spawner};
use crate::domain::entity::{Bullet, Enemy, FrameInput, GoldBag, Player, PlayerId};
use crate::domain::grid::{Grid, GRID_HEIGHT, GRID_WIDTH};
use crate::domain::ledger::Ledger;
use super::event::Effect;
use super::level::{self, PlacementReport};
use super::step;

/// Respawn cells, indexed by `PlayerId::index`.
pub const PLAYER_SPAWNS: [(usize, usize); 2] = [(5, 5), (7, 5)];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameMode {
    Normal,
    /// Enemies flee. No gameplay event enters it; see `enter_bonus`.
    #[cfg_attr(not(test), allow(dead_code))]
    Bonus,
    LevelComplete,
    GameOver,
}

pub struct Session {
    // ── Level ──
    pub grid: Grid,
    pub level: u32,
    pub profile: DifficultyProfile,
    pub placement: (PlacementReport, PlacementReport), // emeralds, bags

    // ── Entities ──
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub bags: Vec<GoldBag>,
    pub bullets: Vec<Bullet>,
    pub spawner: Spawner,

    // ── Progress ──
    pub mode: GameMode,
    pub bonus_timer: f32,
    pub level_complete_timer: f32,
    pub tick: u64,

    // ── Tuning ──
    pub speed: SpeedConfig,
    pub rules: RulesConfig,

    rng: ChaCha8Rng,
}

// ── Construction ──

impl Session {
    /// Start a game at level 1 with one or two players.
    pub fn new(two_players: bool, speed: SpeedConfig, rules: RulesConfig) -> Self {
        let rng = match rules.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut session = Session::empty(two_players, speed, rules, rng);
        session.load_level(1);
        session.grant_start_invulnerability();
        session
    }

    /// Start on a prepared grid.
    #[cfg(test)]
    pub fn with_grid(
        grid: Grid,
        bags: Vec<GoldBag>,
        two_players: bool,
        speed: SpeedConfig,
        rules: RulesConfig,
    ) -> Self {
        let seed = rules.seed.unwrap_or(0);
        let mut session = Session::empty(two_players, speed, rules, ChaCha8Rng::seed_from_u64(seed));
        let (w, h) = (grid.width(), grid.height());
        session.spawner = Spawner::new(
            w.saturating_sub(2),
            2.min(h.saturating_sub(1)),
            session.speed.spawn_delay_secs,
        );
        session.grid = grid;
        session.bags = bags;
        session.grant_start_invulnerability();
        session
    }

    fn grant_start_invulnerability(&mut self) {
        for p in &mut self.players {
            p.invulnerable = self.speed.invulnerable_secs;
        }
    }

    fn empty(two_players: bool, speed: SpeedConfig, rules: RulesConfig, rng: ChaCha8Rng) -> Self {
        let count = if two_players { 2 } else { 1 };
        let players = [PlayerId::P1, PlayerId::P2]
            .into_iter()
            .take(count)
            .map(|id| {
                Player::new(
                    id,
                    PLAYER_SPAWNS[id.index()],
                    speed.weapon_cooldown_secs,
                    Ledger::new(rules.start_lives, rules.extra_life_score),
                )
            })
            .collect();
        let spawn = level::enemy_spawn(GRID_WIDTH, GRID_HEIGHT);

        Session {
            grid: Grid::new(GRID_WIDTH, GRID_HEIGHT),
            level: 1,
            profile: DifficultyProfile::for_level(1),
            placement: (
                PlacementReport { requested: 0, placed: 0 },
                PlacementReport { requested: 0, placed: 0 },
            ),
            players,
            enemies: Vec::new(),
            bags: Vec::new(),
            bullets: Vec::new(),
            spawner: Spawner::new(spawn.0, spawn.1, speed.spawn_delay_secs),
            mode: GameMode::Normal,
            bonus_timer: 0.0,
            level_complete_timer: 0.0,
            tick: 0,
            speed,
            rules,
            rng,
        }
    }
}

// ── Level transitions ──

impl Session {
    /// Build level `level` and reset everything level-scoped.
    /// Scores, lives and enemy ids carry over.
    pub fn load_level(&mut self, level: u32) {
        self.level = level;
        self.profile = DifficultyProfile::for_level(level);
        let layout = level::build_level(&self.profile, GRID_WIDTH, GRID_HEIGHT, &mut self.rng);

        self.grid = layout.grid;
        self.bags = layout.bags;
        self.placement = (layout.emeralds, layout.gold_bags);
        self.enemies.clear();
        self.bullets.clear();
        self.spawner.x = layout.spawn.0;
        self.spawner.y = layout.spawn.1;
        self.spawner.reset();

        for p in &mut self.players {
            p.reset_to_spawn();
            p.invulnerable = 0.0;
            if !p.ledger.is_out() {
                p.body.alive = true;
            }
        }

        self.mode = GameMode::Normal;
        self.bonus_timer = 0.0;
        self.level_complete_timer = 0.0;
        log::info!(
            "level {} started: {} enemies, {} at once, step every {:.2}s",
            level, self.profile.enemy_total, self.profile.max_concurrent, self.profile.move_delay,
        );
    }

    pub fn has_next_level(&self) -> bool {
        self.level < self.rules.max_level
    }
}

// ── Queries / control ──

impl Session {
    /// Advance one tick. See `step::advance` for the ordering.
    pub fn advance(&mut self, dt: f32, input: &FrameInput) -> Vec<Effect> {
        step::advance(self, dt, input)
    }

    /// Enemies flee for `duration` seconds. Ignored outside normal play.
    #[cfg(test)]
    pub fn enter_bonus(&mut self, duration: f32) {
        if matches!(self.mode, GameMode::Normal | GameMode::Bonus) {
            self.mode = GameMode::Bonus;
            self.bonus_timer = duration;
            log::debug!("bonus mode for {duration:.1}s");
        }
    }

    pub fn ai_mode(&self) -> AiMode {
        if self.mode == GameMode::Bonus { AiMode::Flee } else { AiMode::Pursue }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn score(&self, id: PlayerId) -> u32 {
        self.player(id).map_or(0, |p| p.ledger.score.points())
    }

    pub fn alive_enemies(&self) -> u32 {
        self.enemies.iter().filter(|e| e.body.alive).count() as u32
    }
}
