/// Level-indexed difficulty and the enemy spawner.
///
/// | level | enemies | concurrent | move delay | emeralds | bags |
/// |-------|---------|------------|------------|----------|------|
/// | 1     | 5       | 2          | 0.30 s     | 40       | 5    |
/// | 2     | 6       | 3          | 0.28 s     | 50       | 7    |
/// | 4     | 8       | 4          | 0.24 s     | 70       | 11   |
/// | 10    | 14      | 7          | 0.12 s     | 130      | 23   |
///
/// Levels are 1-based. Move delay bottoms out at `MIN_MOVE_DELAY`.

use super::entity::Enemy;

const BASE_ENEMIES: u32 = 5;
const BASE_MOVE_DELAY: f32 = 0.30;
const MOVE_DELAY_STEP: f32 = 0.02;
const MIN_MOVE_DELAY: f32 = 0.10;
const BASE_EMERALDS: usize = 40;
const EMERALDS_PER_LEVEL: usize = 10;
const BASE_BAGS: usize = 5;
const BAGS_PER_LEVEL: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct DifficultyProfile {
    pub level: u32,
    pub enemy_total: u32,
    pub max_concurrent: u32,
    pub move_delay: f32,
    pub emeralds: usize,
    pub gold_bags: usize,
}

impl DifficultyProfile {
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let n = level - 1;
        let enemy_total = BASE_ENEMIES + n;
        DifficultyProfile {
            level,
            enemy_total,
            max_concurrent: max_concurrent(level, enemy_total),
            move_delay: (BASE_MOVE_DELAY - MOVE_DELAY_STEP * n as f32).max(MIN_MOVE_DELAY),
            emeralds: BASE_EMERALDS + EMERALDS_PER_LEVEL * n as usize,
            gold_bags: BASE_BAGS + BAGS_PER_LEVEL * n as usize,
        }
    }
}

/// Slowly growing cap on simultaneous enemies, never above the level total.
pub fn max_concurrent(level: u32, enemy_total: u32) -> u32 {
    (2 + level / 2).min(enemy_total)
}

// ── Spawner ──

/// Emits enemies at a fixed cell on a fixed cadence.
#[derive(Clone, Debug)]
pub struct Spawner {
    pub x: usize,
    pub y: usize,
    pub delay: f32,
    pub timer: f32,
    pub spawned_total: u32,
    next_id: u32,
}

impl Spawner {
    pub fn new(x: usize, y: usize, delay: f32) -> Self {
        Spawner { x, y, delay, timer: 0.0, spawned_total: 0, next_id: 1 }
    }

    /// New level: same cadence, counters cleared. Ids keep counting.
    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.spawned_total = 0;
    }

    /// Advance the cadence and spawn if allowed.
    pub fn tick(&mut self, dt: f32, alive: u32, profile: &DifficultyProfile) -> Option<Enemy> {
        self.timer += dt;
        if alive >= profile.max_concurrent { return None; }
        if self.spawned_total >= profile.enemy_total { return None; }
        if self.timer < self.delay { return None; }

        self.timer = 0.0;
        self.spawned_total += 1;
        let enemy = Enemy::new(self.next_id, self.x, self.y);
        self.next_id += 1;
        Some(enemy)
    }
}
