/// Enemy AI: BFS pathfinding, form toggling and hobbin digging.
///
/// Two modes:
///   1. **Pursue**: BFS toward the target's cell (normal play).
///   2. **Flee**: BFS toward the target reflected through the enemy,
///      `enemy + (enemy - target)`. Used while bonus mode runs.
///
/// The search re-runs at every decision tick with no caching. Neighbors
/// expand in `Direction::ALL` order (up, down, left, right) so ties between
/// equally short paths resolve the same way every time.
///
/// Form legality (`EnemyForm::can_enter`) is checked on every candidate
/// cell, so a nobbin only ever searches the tunnel network.

use std::collections::VecDeque;

use super::entity::{Direction, Enemy, EnemyForm};
use super::grid::Grid;
use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AiMode {
    Pursue,
    Flee,
}

// ── Pathfinder ──

/// Where the enemy wants to end up. May lie outside the grid in flee mode.
fn goal_for(enemy: &Enemy, target: (usize, usize), mode: AiMode) -> (i32, i32) {
    let (tx, ty) = (target.0 as i32, target.1 as i32);
    match mode {
        AiMode::Pursue => (tx, ty),
        AiMode::Flee => {
            let (ex, ey) = (enemy.body.x as i32, enemy.body.y as i32);
            (ex + (ex - tx), ey + (ey - ty))
        }
    }
}

/// Next step for `enemy`, or `None` if the goal is unreachable under its
/// form's traversal rules (or it is already standing on it).
pub fn decide(enemy: &Enemy, target: (usize, usize), grid: &Grid, mode: AiMode) -> Option<Direction> {
    let (gx, gy) = goal_for(enemy, target, mode);
    if !grid.in_bounds(gx, gy) { return None; }
    let goal = (gx as usize, gy as usize);
    let start = (enemy.body.x, enemy.body.y);
    if goal == start { return None; }

    let came_from = search(grid, enemy.form, start, goal)?;
    first_step(&came_from, grid.width(), start, goal)
}

/// Breadth-first search. Returns the predecessor map if `goal` was reached.
fn search(
    grid: &Grid,
    form: EnemyForm,
    start: (usize, usize),
    goal: (usize, usize),
) -> Option<Vec<Option<(usize, usize)>>> {
    let w = grid.width();
    let mut visited = vec![false; w * grid.height()];
    let mut came_from: Vec<Option<(usize, usize)>> = vec![None; w * grid.height()];
    visited[start.1 * w + start.0] = true;

    let mut queue: VecDeque<(usize, usize)> = VecDeque::with_capacity(256);
    queue.push_back(start);

    while let Some((cx, cy)) = queue.pop_front() {
        if (cx, cy) == goal { return Some(came_from); }

        for dir in Direction::ALL {
            let Some((nx, ny)) = grid.neighbor(cx, cy, dir) else { continue };
            let idx = ny * w + nx;
            if visited[idx] { continue; }
            if !form.can_enter(grid.get(nx, ny)) { continue; }
            visited[idx] = true;
            came_from[idx] = Some((cx, cy));
            queue.push_back((nx, ny));
        }
    }
    None
}

/// Walk the predecessor chain back from `goal` to the cell right after `start`.
fn first_step(
    came_from: &[Option<(usize, usize)>],
    width: usize,
    start: (usize, usize),
    goal: (usize, usize),
) -> Option<Direction> {
    let mut cur = goal;
    loop {
        let prev = came_from[cur.1 * width + cur.0]?;
        if prev == start { break; }
        cur = prev;
    }
    let dx = cur.0 as i32 - start.0 as i32;
    let dy = cur.1 as i32 - start.1 as i32;
    Direction::from_delta(dx, dy)
}

// ── Form controller ──

/// Seconds an enemy stays in each form before toggling.
#[derive(Clone, Copy, Debug)]
pub struct FormTimings {
    pub nobbin: f32,
    pub hobbin: f32,
}

impl FormTimings {
    fn duration(&self, form: EnemyForm) -> f32 {
        match form {
            EnemyForm::Nobbin => self.nobbin,
            EnemyForm::Hobbin => self.hobbin,
        }
    }
}

/// Advance the form timer. Returns true if the form toggled this call.
pub fn update_form(enemy: &mut Enemy, dt: f32, timings: &FormTimings) -> bool {
    enemy.form_timer += dt;
    if enemy.form_timer >= timings.duration(enemy.form) {
        enemy.form = enemy.form.toggled();
        enemy.form_timer = 0.0;
        return true;
    }
    false
}

// ── Digging ──

/// A hobbin eats the tile it stands on. No score. Returns true on mutation.
pub fn dig_on_enter(enemy: &Enemy, grid: &mut Grid) -> bool {
    if enemy.form != EnemyForm::Hobbin { return false; }
    let (x, y) = (enemy.body.x, enemy.body.y);
    if grid.get(x, y).is_eaten_by_hobbin() {
        grid.set(x, y, Tile::Tunnel);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ActorKind;
    use crate::domain::rules;

    fn enemy_at(x: usize, y: usize, form: EnemyForm) -> Enemy {
        let mut e = Enemy::new(1, x, y);
        e.form = form;
        e
    }

    // ── BFS ──

    #[test]
    fn straight_tunnel_points_at_goal() {
        let g = Grid::from_rows(&[
            "#######",
            "#.....#",
            "#######",
        ]);
        for ex in 1..=5 {
            for tx in 1..=5 {
                let e = enemy_at(ex, 1, EnemyForm::Nobbin);
                let d = decide(&e, (tx, 1), &g, AiMode::Pursue);
                let expected = if tx > ex {
                    Some(Direction::Right)
                } else if tx < ex {
                    Some(Direction::Left)
                } else {
                    None
                };
                assert_eq!(d, expected, "enemy x={ex} target x={tx}");
            }
        }
    }

    #[test]
    fn takes_the_shorter_branch() {
        // Row 1 is blocked by dirt between the shafts. From (1,1) the upper
        // route to (5,1) is 6 steps and the lower one 8; reversed for (5,3).
        let g = Grid::from_rows(&[
            "#.....#",
            "#.###.#",
            "#.###.#",
            "#.....#",
            "#######",
        ]);
        let e = enemy_at(1, 1, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (5, 1), &g, AiMode::Pursue), Some(Direction::Up));
        assert_eq!(decide(&e, (5, 3), &g, AiMode::Pursue), Some(Direction::Down));
    }

    #[test]
    fn tie_break_follows_neighbor_order() {
        // Up and Right both lead to (2,0) in two steps; Up expands first.
        let g = Grid::from_rows(&[
            "...",
            "...",
        ]);
        let e = enemy_at(1, 1, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (2, 0), &g, AiMode::Pursue), Some(Direction::Up));
    }

    #[test]
    fn nobbin_without_tunnel_never_moves() {
        let mut g = Grid::from_rows(&[
            "#####",
            "#####",
            "##.##",
            "#####",
            "#.###",
        ]);
        let mut e = enemy_at(2, 2, EnemyForm::Nobbin);
        for _ in 0..5 {
            let d = decide(&e, (1, 4), &g, AiMode::Pursue);
            assert_eq!(d, None);
            if let Some(d) = d {
                rules::try_move(&mut e.body, ActorKind::Enemy(e.form), d, &mut g);
            }
        }
        assert_eq!((e.body.x, e.body.y), (2, 2));
    }

    #[test]
    fn spawn_marker_is_not_a_tunnel() {
        // Only neighbour is the marker
        let g = Grid::from_rows(&["#S.S#"]);
        let e = enemy_at(2, 0, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (1, 0), &g, AiMode::Pursue), None);

        let g = Grid::from_rows(&["##S.#"]);
        let e = enemy_at(3, 0, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (2, 0), &g, AiMode::Pursue), None);
        let e = enemy_at(3, 0, EnemyForm::Hobbin);
        assert_eq!(decide(&e, (2, 0), &g, AiMode::Pursue), None);
    }

    #[test]
    fn enemy_can_leave_the_spawn_cell() {
        let g = Grid::from_rows(&["#S..#"]);
        let e = enemy_at(1, 0, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (3, 0), &g, AiMode::Pursue), Some(Direction::Right));
    }

    #[test]
    fn hobbin_paths_through_dirt_but_not_bags() {
        let g = Grid::from_rows(&[
            ".#*.",
            "$$$$",
        ]);
        let e = enemy_at(0, 0, EnemyForm::Hobbin);
        assert_eq!(decide(&e, (3, 0), &g, AiMode::Pursue), Some(Direction::Right));
        let g = Grid::from_rows(&[".$."]);
        let e = enemy_at(0, 0, EnemyForm::Hobbin);
        assert_eq!(decide(&e, (2, 0), &g, AiMode::Pursue), None);
    }

    #[test]
    fn unreachable_target_is_none() {
        let g = Grid::from_rows(&["..#.."]);
        let e = enemy_at(0, 0, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (4, 0), &g, AiMode::Pursue), None);
    }

    #[test]
    fn flee_heads_for_the_reflected_cell() {
        let g = Grid::from_rows(&[
            "#########",
            "#.......#",
            "#########",
        ]);
        // target at x=3, enemy at x=5 → goal x=7
        let e = enemy_at(5, 1, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (3, 1), &g, AiMode::Flee), Some(Direction::Right));
        // reflected goal off the grid → stay put
        let e = enemy_at(6, 1, EnemyForm::Nobbin);
        assert_eq!(decide(&e, (1, 1), &g, AiMode::Flee), None);
    }

    // ── Forms ──

    #[test]
    fn form_toggles_on_its_own_timer() {
        let t = FormTimings { nobbin: 1.0, hobbin: 0.5 };
        let mut e = enemy_at(0, 0, EnemyForm::Nobbin);
        assert!(!update_form(&mut e, 0.5, &t));
        assert!(update_form(&mut e, 0.5, &t));
        assert_eq!(e.form, EnemyForm::Hobbin);
        assert_eq!(e.form_timer, 0.0);
        assert!(!update_form(&mut e, 0.25, &t));
        assert!(update_form(&mut e, 0.25, &t));
        assert_eq!(e.form, EnemyForm::Nobbin);
    }

    // ── Digging ──

    #[test]
    fn hobbin_digs_dirt_once() {
        let mut g = Grid::from_rows(&[".#"]);
        let mut e = enemy_at(0, 0, EnemyForm::Hobbin);
        assert!(!dig_on_enter(&e, &mut g)); // already tunnel

        assert!(rules::try_move(&mut e.body, ActorKind::Enemy(e.form), Direction::Right, &mut g));
        assert!(dig_on_enter(&e, &mut g));
        assert_eq!(g.get(1, 0), Tile::Tunnel);

        // leave and come back: no second mutation
        assert!(rules::try_move(&mut e.body, ActorKind::Enemy(e.form), Direction::Left, &mut g));
        assert!(!dig_on_enter(&e, &mut g));
        assert!(rules::try_move(&mut e.body, ActorKind::Enemy(e.form), Direction::Right, &mut g));
        assert!(!dig_on_enter(&e, &mut g));
        assert_eq!(g.count(Tile::Tunnel), 2);
    }

    #[test]
    fn hobbin_eats_emeralds_and_bags_nobbin_eats_nothing() {
        let mut g = Grid::from_rows(&["*$"]);
        let e = enemy_at(0, 0, EnemyForm::Hobbin);
        assert!(dig_on_enter(&e, &mut g));
        let e = enemy_at(1, 0, EnemyForm::Hobbin);
        assert!(dig_on_enter(&e, &mut g));
        assert_eq!(g.count(Tile::Tunnel), 2);

        let mut g = Grid::from_rows(&["#"]);
        let e = enemy_at(0, 0, EnemyForm::Nobbin);
        assert!(!dig_on_enter(&e, &mut g));
        assert_eq!(g.get(0, 0), Tile::Dirt);
    }
}
