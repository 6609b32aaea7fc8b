/// Entities: Player, Enemy, GoldBag, Bullet.
///
/// Players and enemies share a `Mover` component (position, facing, alive)
/// and are told apart by `ActorKind`, which is all the movement rules need.
/// Every entity carries a stable id assigned at creation.

use std::fmt;

use super::ledger::Ledger;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// BFS expansion order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Boolean intents for one player for one tick.
/// `text` and `backspace` only matter to name-entry screens.
#[derive(Clone, Debug, Default)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub pause: bool,
    pub backspace: bool,
    pub text: Option<String>,
}

impl InputSnapshot {
    /// Held direction. Several keys at once resolve up, down, left, right.
    pub fn direction(&self) -> Option<Direction> {
        [
            (self.up, Direction::Up),
            (self.down, Direction::Down),
            (self.left, Direction::Left),
            (self.right, Direction::Right),
        ]
        .into_iter()
        .find_map(|(held, dir)| held.then_some(dir))
    }
}

/// Input for both players for one tick.
#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub primary: InputSnapshot,
    pub secondary: InputSnapshot,
}

impl FrameInput {
    pub fn for_player(&self, id: PlayerId) -> &InputSnapshot {
        match id {
            PlayerId::P1 => &self.primary,
            PlayerId::P2 => &self.secondary,
        }
    }
}

// ── Actors ──

/// Position + facing + liveness, shared by players and enemies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mover {
    pub x: usize,
    pub y: usize,
    pub facing: Option<Direction>,
    pub alive: bool,
}

impl Mover {
    pub fn new(x: usize, y: usize) -> Self {
        Mover { x, y, facing: None, alive: true }
    }

    pub fn at(&self, x: usize, y: usize) -> bool {
        self.x == x && self.y == y
    }

    pub fn manhattan(&self, x: usize, y: usize) -> usize {
        self.x.abs_diff(x) + self.y.abs_diff(y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyForm {
    /// Tunnel-bound.
    Nobbin,
    /// Digs through dirt and emeralds.
    Hobbin,
}

impl EnemyForm {
    pub fn toggled(self) -> Self {
        match self {
            EnemyForm::Nobbin => EnemyForm::Hobbin,
            EnemyForm::Hobbin => EnemyForm::Nobbin,
        }
    }

    /// Traversal predicate for the pathfinder and the movement resolver.
    pub fn can_enter(self, tile: super::tile::Tile) -> bool {
        match self {
            EnemyForm::Nobbin => tile.is_open(),
            EnemyForm::Hobbin => tile.is_open() || tile.is_diggable(),
        }
    }
}

/// What kind of actor is moving. Decides movement legality.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKind {
    Player,
    Enemy(EnemyForm),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum PlayerId {
    P1,
    P2,
}

impl PlayerId {
    pub fn index(self) -> usize {
        match self {
            PlayerId::P1 => 0,
            PlayerId::P2 => 1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::P1 => f.write_str("p1"),
            PlayerId::P2 => f.write_str("p2"),
        }
    }
}

/// Fire cooldown. Ready when `remaining <= 0`.
#[derive(Clone, Debug)]
pub struct Weapon {
    pub cooldown: f32,
    pub remaining: f32,
}

impl Weapon {
    pub fn new(cooldown: f32) -> Self {
        Weapon { cooldown, remaining: 0.0 }
    }

    pub fn ready(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Start the cooldown. Returns false if still cooling down.
    pub fn trigger(&mut self) -> bool {
        if !self.ready() { return false; }
        self.remaining = self.cooldown;
        true
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub body: Mover,
    pub spawn: (usize, usize),
    pub move_cooldown: f32,
    pub invulnerable: f32, // seconds left; collisions are skipped while > 0
    pub weapon: Weapon,
    pub ledger: Ledger,
}

impl Player {
    pub fn new(id: PlayerId, spawn: (usize, usize), weapon_cooldown: f32, ledger: Ledger) -> Self {
        Player {
            id,
            body: Mover::new(spawn.0, spawn.1),
            spawn,
            move_cooldown: 0.0,
            invulnerable: 0.0,
            weapon: Weapon::new(weapon_cooldown),
            ledger,
        }
    }

    /// Back to the spawn cell, timers cleared.
    pub fn reset_to_spawn(&mut self) {
        self.body.x = self.spawn.0;
        self.body.y = self.spawn.1;
        self.body.facing = None;
        self.move_cooldown = 0.0;
        self.weapon.reset();
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    /// Still in the game: alive now, or lives left to come back with.
    pub fn in_play(&self) -> bool {
        self.body.alive && !self.ledger.is_out()
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: u32,
    pub body: Mover,
    pub form: EnemyForm,
    pub form_timer: f32, // time spent in the current form
    pub move_timer: f32, // time since the last step
}

impl Enemy {
    pub fn new(id: u32, x: usize, y: usize) -> Self {
        Enemy {
            id,
            body: Mover::new(x, y),
            form: EnemyForm::Nobbin,
            form_timer: 0.0,
            move_timer: 0.0,
        }
    }
}

// ── Gold bags ──

/// `Stable → Falling → Gold`. `Gold` is a walkable pile that no longer
/// lives on the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BagState {
    Stable,
    Falling,
    Gold,
}

#[derive(Clone, Debug)]
pub struct GoldBag {
    pub id: String,
    pub x: usize,
    pub y: usize,
    pub prev_y: usize, // row before the last fall step, for crush spans
    pub state: BagState,
    pub collected: bool,
    pub fall_timer: f32,
}

impl GoldBag {
    pub fn new(id: impl Into<String>, x: usize, y: usize) -> Self {
        GoldBag {
            id: id.into(),
            x,
            y,
            prev_y: y,
            state: BagState::Stable,
            collected: false,
            fall_timer: 0.0,
        }
    }

    pub fn is_falling(&self) -> bool {
        !self.collected && self.state == BagState::Falling
    }

    /// Rows swept during the current fall step, inclusive.
    pub fn crush_span(&self) -> (usize, usize) {
        (self.prev_y.min(self.y), self.prev_y.max(self.y))
    }
}

// ── Bullets ──

#[derive(Clone, Debug)]
pub struct Bullet {
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
    pub age: f32,
    pub life_time: f32,
    pub step_timer: f32,
    pub owner: PlayerId,
}

impl Bullet {
    pub fn new(x: usize, y: usize, direction: Direction, life_time: f32, owner: PlayerId) -> Self {
        Bullet { x, y, direction, age: 0.0, life_time, step_timer: 0.0, owner }
    }

    pub fn expired(&self) -> bool {
        self.age >= self.life_time
    }
}
