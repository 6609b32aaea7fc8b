/// Movement and tile-interaction rules, truth-table driven.
///
/// ## Movement Truth Table
///
/// ┌──────────────────────────┬───────────┬──────────────────────┐
/// │ Condition                 │ Allow?    │ Side effect          │
/// ├──────────────────────────┼───────────┼──────────────────────┤
/// │ Dest out of bounds        │ DENY      │ none                 │
/// │ Player, dest Dirt         │ ALLOW     │ Dirt → Tunnel        │
/// │ Player, any other dest    │ ALLOW     │ none                 │
/// │ Enemy, form can enter     │ ALLOW     │ none (digging is a   │
/// │                           │           │ separate pass)       │
/// │ Enemy, otherwise          │ DENY      │ none                 │
/// └──────────────────────────┴───────────┴──────────────────────┘
///
/// A successful move commits position and facing. A denied move changes
/// nothing.
///
/// ## Tile Interaction (player only, after a successful move)
///
/// ┌──────────────┬──────────────────────────────┐
/// │ Entered tile  │ Result                       │
/// ├──────────────┼──────────────────────────────┤
/// │ Emerald       │ → Tunnel, ScoreEvent::Emerald│
/// │ anything else │ nothing (bags: bag system)   │
/// └──────────────┴──────────────────────────────┘

use super::entity::{ActorKind, Direction, Mover};
use super::grid::Grid;
use super::tile::Tile;

/// Discrete scoring events. Point values live in the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScoreEvent {
    Emerald,
    BulletKill,
    GoldPile,
    Crush,
}

impl ScoreEvent {
    pub fn points(self) -> u32 {
        match self {
            ScoreEvent::Emerald => 100,
            ScoreEvent::BulletKill => 250,
            ScoreEvent::GoldPile => 500,
            ScoreEvent::Crush => 250,
        }
    }
}

/// Is `kind` allowed to occupy a cell holding `tile`?
pub fn can_enter(kind: ActorKind, tile: Tile) -> bool {
    match kind {
        ActorKind::Player => true,
        ActorKind::Enemy(form) => form.can_enter(tile),
    }
}

/// Apply one grid step. See the truth table above.
pub fn try_move(mover: &mut Mover, kind: ActorKind, dir: Direction, grid: &mut Grid) -> bool {
    let Some((nx, ny)) = grid.neighbor(mover.x, mover.y, dir) else {
        return false;
    };
    let target = grid.get(nx, ny);
    if !can_enter(kind, target) {
        return false;
    }
    if kind == ActorKind::Player && target == Tile::Dirt {
        grid.set(nx, ny, Tile::Tunnel);
    }
    mover.x = nx;
    mover.y = ny;
    mover.facing = Some(dir);
    true
}

/// Resolve what the player picks up on the cell it just entered.
pub fn enter_tile(grid: &mut Grid, x: usize, y: usize) -> Option<ScoreEvent> {
    if grid.get(x, y) == Tile::Emerald {
        grid.set(x, y, Tile::Tunnel);
        return Some(ScoreEvent::Emerald);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EnemyForm;

    const NOBBIN: ActorKind = ActorKind::Enemy(EnemyForm::Nobbin);
    const HOBBIN: ActorKind = ActorKind::Enemy(EnemyForm::Hobbin);

    // ── Player ──

    #[test]
    fn player_digs_dirt_on_entry() {
        let mut g = Grid::from_rows(&["..#"]);
        let mut m = Mover::new(1, 0);
        assert!(try_move(&mut m, ActorKind::Player, Direction::Right, &mut g));
        assert_eq!((m.x, m.y), (2, 0));
        assert_eq!(m.facing, Some(Direction::Right));
        assert_eq!(g.get(2, 0), Tile::Tunnel);
    }

    #[test]
    fn player_blocked_only_by_edge() {
        let mut g = Grid::from_rows(&["#*$"]);
        let mut m = Mover::new(0, 0);
        assert!(!try_move(&mut m, ActorKind::Player, Direction::Left, &mut g));
        assert!(!try_move(&mut m, ActorKind::Player, Direction::Up, &mut g));
        assert_eq!((m.x, m.y), (0, 0));
        assert_eq!(m.facing, None);

        // Emerald and bag cells are entered without mutation here
        assert!(try_move(&mut m, ActorKind::Player, Direction::Right, &mut g));
        assert_eq!(g.get(1, 0), Tile::Emerald);
        assert!(try_move(&mut m, ActorKind::Player, Direction::Right, &mut g));
        assert_eq!(g.get(2, 0), Tile::GoldBag);
    }

    // ── Enemies ──

    #[test]
    fn nobbin_stays_in_tunnels() {
        let mut g = Grid::from_rows(&[
            "#.#",
            "#.*",
        ]);
        let mut m = Mover::new(1, 0);
        assert!(!try_move(&mut m, NOBBIN, Direction::Left, &mut g));
        assert!(try_move(&mut m, NOBBIN, Direction::Down, &mut g));
        assert!(!try_move(&mut m, NOBBIN, Direction::Right, &mut g));
        assert_eq!((m.x, m.y), (1, 1));
        assert_eq!(m.facing, Some(Direction::Down));
    }

    #[test]
    fn hobbin_moves_without_digging() {
        let mut g = Grid::from_rows(&["#.$"]);
        let mut m = Mover::new(1, 0);
        assert!(try_move(&mut m, HOBBIN, Direction::Left, &mut g));
        assert_eq!(g.get(0, 0), Tile::Dirt); // digging is dig_on_enter's job
        assert!(try_move(&mut m, HOBBIN, Direction::Right, &mut g));
        assert!(!try_move(&mut m, HOBBIN, Direction::Right, &mut g));
        assert_eq!(m.x, 1);
    }

    // ── Tile interaction ──

    #[test]
    fn emerald_becomes_tunnel_with_score() {
        let mut g = Grid::from_rows(&["*."]);
        assert_eq!(enter_tile(&mut g, 0, 0), Some(ScoreEvent::Emerald));
        assert_eq!(g.get(0, 0), Tile::Tunnel);
        assert_eq!(enter_tile(&mut g, 0, 0), None);
        assert_eq!(enter_tile(&mut g, 1, 0), None);
    }

    #[test]
    fn bag_tile_is_not_a_pickup_here() {
        let mut g = Grid::from_rows(&["$"]);
        assert_eq!(enter_tile(&mut g, 0, 0), None);
        assert_eq!(g.get(0, 0), Tile::GoldBag);
    }

    #[test]
    fn point_values() {
        assert_eq!(ScoreEvent::Emerald.points(), 100);
        assert_eq!(ScoreEvent::BulletKill.points(), 250);
        assert_eq!(ScoreEvent::GoldPile.points(), 500);
        assert_eq!(ScoreEvent::Crush.points(), 250);
    }
}
