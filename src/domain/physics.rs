/// Gold bag physics: falling, pushing and crushing.
///
/// ## Bag lifecycle
///
/// ```text
///   Stable ──(tunnel below)──▶ Falling ──(floor below)──▶ Gold
///     │                          │                          │
///     └────────── collected (terminal, from any state) ─────┘
/// ```
///
/// Grid bookkeeping: a `Stable` or `Falling` bag marks its cell `GoldBag`.
/// A `Gold` pile lives only in the bag list; its cell is `Tunnel`.
///
/// ## Fall Truth Table (per tick, per uncollected bag)
/// ┌──────────────────────────────┬──────────────────────────────────┐
/// │ Condition                     │ Effect                           │
/// ├──────────────────────────────┼──────────────────────────────────┤
/// │ Stable, below is Tunnel       │ → Falling, prev_y = y, timer = 0 │
/// │ Stable, otherwise             │ none                             │
/// │ Falling, timer < delay        │ timer += dt                      │
/// │ Falling, timer ≥ delay,       │ cell → Tunnel, prev_y = y, y+1,  │
/// │   below is Tunnel             │ new cell → GoldBag               │
/// │ Falling, timer ≥ delay,       │ → Gold, cell → Tunnel            │
/// │   below is anything else      │ (bottom edge counts as floor)    │
/// │ Gold                          │ none, ever                       │
/// └──────────────────────────────┴──────────────────────────────────┘
///
/// The fall-start check and the first fall step never happen in the same
/// tick, so a bag hangs for one full delay before dropping.

use super::entity::{BagState, Direction, Enemy, GoldBag};
use super::grid::Grid;
use super::tile::Tile;

/// Default seconds between fall steps; matches the player's move cadence.
pub const FALL_DELAY: f32 = 0.12;

/// Something that happened to a bag during `update_bags`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BagEvent {
    StartedFalling { id: String },
    Fell { id: String, x: usize, y: usize },
    Landed { id: String, x: usize, y: usize },
}

fn below_is_tunnel(grid: &Grid, x: usize, y: usize) -> bool {
    grid.kind_at(x as i32, y as i32 + 1) == Some(Tile::Tunnel)
}

/// Advance fall detection and fall steps for every bag.
pub fn update_bags(bags: &mut [GoldBag], grid: &mut Grid, dt: f32, fall_delay: f32) -> Vec<BagEvent> {
    let mut events = Vec::new();
    for bag in bags.iter_mut().filter(|b| !b.collected) {
        match bag.state {
            BagState::Stable => {
                if below_is_tunnel(grid, bag.x, bag.y) {
                    bag.state = BagState::Falling;
                    bag.prev_y = bag.y;
                    bag.fall_timer = 0.0;
                    events.push(BagEvent::StartedFalling { id: bag.id.clone() });
                }
            }
            BagState::Falling => {
                bag.fall_timer += dt;
                if bag.fall_timer < fall_delay { continue; }
                bag.fall_timer = 0.0;
                if below_is_tunnel(grid, bag.x, bag.y) {
                    grid.set(bag.x, bag.y, Tile::Tunnel);
                    bag.prev_y = bag.y;
                    bag.y += 1;
                    grid.set(bag.x, bag.y, Tile::GoldBag);
                    events.push(BagEvent::Fell { id: bag.id.clone(), x: bag.x, y: bag.y });
                } else {
                    bag.state = BagState::Gold;
                    grid.set(bag.x, bag.y, Tile::Tunnel);
                    events.push(BagEvent::Landed { id: bag.id.clone(), x: bag.x, y: bag.y });
                }
            }
            BagState::Gold => {}
        }
    }
    events
}

/// Shove a stable bag one cell sideways into a tunnel.
/// Anything else returns false and changes nothing.
pub fn try_push(bag: &mut GoldBag, dir: Direction, grid: &mut Grid) -> bool {
    if !dir.is_horizontal() { return false; }
    if bag.collected || bag.state != BagState::Stable { return false; }
    let Some((nx, ny)) = grid.neighbor(bag.x, bag.y, dir) else {
        return false;
    };
    if grid.get(nx, ny) != Tile::Tunnel { return false; }

    grid.set(bag.x, bag.y, Tile::Tunnel);
    grid.set(nx, ny, Tile::GoldBag);
    bag.x = nx;
    true
}

/// Is `enemy` inside the rows swept by this falling bag?
pub fn crushes(bag: &GoldBag, enemy: &Enemy) -> bool {
    if !bag.is_falling() || !enemy.body.alive { return false; }
    let (top, bottom) = bag.crush_span();
    enemy.body.x == bag.x && (top..=bottom).contains(&enemy.body.y)
}

/// Index of the first uncollected bag at `(x, y)` in `state`.
pub fn bag_at(bags: &[GoldBag], x: usize, y: usize, state: BagState) -> Option<usize> {
    bags.iter().position(|b| !b.collected && b.state == state && b.x == x && b.y == y)
}
