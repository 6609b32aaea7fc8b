/// Weapons and bullets.
///
/// A bullet starts on the firer's cell and advances one cell per step
/// (`step_delay` seconds) in a straight line. Per step:
///
/// ┌──────────────────────────────┬──────────────────────────────┐
/// │ Condition (in order)          │ Result                       │
/// ├──────────────────────────────┼──────────────────────────────┤
/// │ age ≥ life_time               │ removed                      │
/// │ next cell out of bounds       │ removed                      │
/// │ next cell Dirt / GoldBag      │ removed                      │
/// │ alive enemy on next cell      │ moves, kills it, removed     │
/// │ otherwise                     │ moves                        │
/// └──────────────────────────────┴──────────────────────────────┘
///
/// Age advances every tick; movement only when the step timer expires.

use super::entity::{Bullet, Enemy, Player, PlayerId};
use super::grid::Grid;

/// Fixed lifetime ceiling for a bullet, seconds.
pub const BULLET_LIFE: f32 = 0.8;

/// One enemy killed by one bullet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kill {
    pub enemy_id: u32,
    pub x: usize,
    pub y: usize,
    pub owner: PlayerId,
}

/// Fire if the weapon is ready and the player faces somewhere.
pub fn fire(player: &mut Player, life_time: f32) -> Option<Bullet> {
    if !player.body.alive { return None; }
    let dir = player.body.facing?;
    if !player.weapon.trigger() { return None; }
    Some(Bullet::new(player.body.x, player.body.y, dir, life_time, player.id))
}

/// Advance every bullet. Spent bullets are removed; kills are returned in
/// bullet order, at most one per bullet.
pub fn update_bullets(
    bullets: &mut Vec<Bullet>,
    grid: &Grid,
    enemies: &mut [Enemy],
    dt: f32,
    step_delay: f32,
) -> Vec<Kill> {
    let mut kills = Vec::new();
    bullets.retain_mut(|b| {
        b.age += dt;
        if b.expired() { return false; }

        b.step_timer += dt;
        if b.step_timer < step_delay { return true; }
        b.step_timer = 0.0;

        let Some((nx, ny)) = grid.neighbor(b.x, b.y, b.direction) else {
            return false;
        };
        if grid.get(nx, ny).stops_bullets() { return false; }
        b.x = nx;
        b.y = ny;

        if let Some(e) = enemies.iter_mut().find(|e| e.body.alive && e.body.at(nx, ny)) {
            e.body.alive = false;
            kills.push(Kill { enemy_id: e.id, x: nx, y: ny, owner: b.owner });
            return false;
        }
        true
    });
    kills
}
