/// The tick function: advances the session by `dt` seconds.
///
/// Processing order:
///   1. Timers (move cooldowns, weapons, invulnerability, bonus)
///   2. Level-complete countdown; while holding nothing else runs
///   3. Emerald check: none left → enter LevelComplete, stop
///   4. Player 1 move / dig / pickup / fire
///   5. Player 2 move / dig / pickup / fire
///   6. Enemy spawn
///   7. Enemy AI: form timer, move timer, BFS, step, hobbin digging
///   8. Bullets (movement, tile/enemy collision, lifetime) + kill score
///   9. Player vs. enemy contact (skipped while invulnerable)
///  10. Game-over check
///  11. Gold-bag physics
///  12. Gold-bag interactions (pickups, enemies eating gold, crush)
///  13. Cleanup: drop dead enemies and collected bags
///
/// Every pass sees the grid as left by the passes before it: enemy BFS sees
/// player digging from this tick but not this tick's bag falls.

use crate::domain::ai;
use crate::domain::combat;
use crate::domain::entity::{ActorKind, BagState, FrameInput, Player, PlayerId};
use crate::domain::physics;
use crate::domain::rules::{self, ScoreEvent};
use crate::domain::tile::Tile;
use super::event::{Effect, SceneRequest, SoundCue};
use super::world::{GameMode, Session};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance(s: &mut Session, dt: f32, input: &FrameInput) -> Vec<Effect> {
    if s.mode == GameMode::GameOver { return vec![]; }

    let mut effects: Vec<Effect> = Vec::new();
    s.tick += 1;

    resolve_timers(s, dt);

    if s.mode == GameMode::LevelComplete {
        resolve_level_complete(s, dt, &mut effects);
        return effects;
    }
    if !s.grid.contains(Tile::Emerald) {
        s.mode = GameMode::LevelComplete;
        s.level_complete_timer = s.speed.level_complete_secs;
        log::info!("level {} cleared", s.level);
        return effects;
    }

    for i in 0..s.players.len() {
        resolve_player(s, i, input, &mut effects);
    }
    resolve_spawns(s, dt);
    resolve_enemies(s, dt);
    resolve_bullets(s, dt, &mut effects);
    resolve_contact(s);
    if resolve_game_over(s, &mut effects) { return effects; }
    resolve_bag_physics(s, dt);
    resolve_bag_interactions(s, &mut effects);
    cleanup(s);

    effects
}

// ══════════════════════════════════════════════════════════════
// Timers / level progress
// ══════════════════════════════════════════════════════════════

fn resolve_timers(s: &mut Session, dt: f32) {
    for p in &mut s.players {
        p.move_cooldown = (p.move_cooldown - dt).max(0.0);
        p.invulnerable = (p.invulnerable - dt).max(0.0);
        p.weapon.tick(dt);
    }

    if s.mode == GameMode::Bonus {
        s.bonus_timer -= dt;
        if s.bonus_timer <= 0.0 {
            s.bonus_timer = 0.0;
            s.mode = GameMode::Normal;
            log::debug!("bonus mode over");
        }
    }
}

fn resolve_level_complete(s: &mut Session, dt: f32, effects: &mut Vec<Effect>) {
    s.level_complete_timer -= dt;
    if s.level_complete_timer > 0.0 { return; }

    if s.has_next_level() {
        s.load_level(s.level + 1);
    } else {
        log::info!("final level {} done", s.level);
        end_game(s, effects);
    }
}

fn end_game(s: &mut Session, effects: &mut Vec<Effect>) {
    s.mode = GameMode::GameOver;
    let score_p1 = s.score(PlayerId::P1);
    let score_p2 = s.score(PlayerId::P2);
    log::info!("game over: p1={score_p1} p2={score_p2}");
    effects.push(Effect::Scene(SceneRequest::GameOver { score_p1, score_p2 }));
}

/// Credit `event` to a player and log the extra life if it earned one.
fn award(p: &mut Player, event: ScoreEvent) {
    if p.ledger.award(event) {
        log::info!("{} earned an extra life ({} now)", p.id, p.ledger.lives.count());
    }
}

// ══════════════════════════════════════════════════════════════
// Players
// ══════════════════════════════════════════════════════════════

fn resolve_player(s: &mut Session, i: usize, input: &FrameInput, effects: &mut Vec<Effect>) {
    let snap = input.for_player(s.players[i].id);
    let p = &mut s.players[i];
    if !p.body.alive { return; }

    if p.move_cooldown <= 0.0 {
        if let Some(dir) = snap.direction() {
            p.body.facing = Some(dir);

            // Walking sideways into a stable bag shoves it first
            if dir.is_horizontal() {
                if let Some((tx, ty)) = s.grid.neighbor(p.body.x, p.body.y, dir) {
                    if let Some(b) = physics::bag_at(&s.bags, tx, ty, BagState::Stable) {
                        physics::try_push(&mut s.bags[b], dir, &mut s.grid);
                    }
                }
            }

            if rules::try_move(&mut p.body, ActorKind::Player, dir, &mut s.grid) {
                p.move_cooldown = s.speed.player_move_secs;
                if let Some(event) = rules::enter_tile(&mut s.grid, p.body.x, p.body.y) {
                    award(p, event);
                    effects.push(Effect::Sound(SoundCue::Pickup));
                }
            }
        }
    }

    if snap.fire {
        if let Some(bullet) = combat::fire(p, s.speed.bullet_life_secs) {
            s.bullets.push(bullet);
            effects.push(Effect::Sound(SoundCue::Shot));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_spawns(s: &mut Session, dt: f32) {
    let alive = s.alive_enemies();
    if let Some(enemy) = s.spawner.tick(dt, alive, &s.profile) {
        log::debug!(
            "enemy {} spawned ({}/{})",
            enemy.id, s.spawner.spawned_total, s.profile.enemy_total,
        );
        s.enemies.push(enemy);
    }
}

fn resolve_enemies(s: &mut Session, dt: f32) {
    let timings = s.speed.form_timings();
    let mode = s.ai_mode();
    let delay = s.profile.move_delay;
    let targets: Vec<(usize, usize)> = s.players.iter()
        .filter(|p| p.body.alive)
        .map(|p| (p.body.x, p.body.y))
        .collect();

    for e in s.enemies.iter_mut().filter(|e| e.body.alive) {
        if ai::update_form(e, dt, &timings) {
            log::debug!("enemy {} is now {:?}", e.id, e.form);
        }

        e.move_timer += dt;
        if e.move_timer < delay { continue; }
        e.move_timer = 0.0;

        // Closest alive player, first one on ties
        let Some(target) = targets.iter().copied().min_by_key(|&(x, y)| e.body.manhattan(x, y)) else {
            continue;
        };
        if let Some(dir) = ai::decide(e, target, &s.grid, mode) {
            if rules::try_move(&mut e.body, ActorKind::Enemy(e.form), dir, &mut s.grid) {
                ai::dig_on_enter(e, &mut s.grid);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Bullets
// ══════════════════════════════════════════════════════════════

fn resolve_bullets(s: &mut Session, dt: f32, effects: &mut Vec<Effect>) {
    let kills = combat::update_bullets(
        &mut s.bullets, &s.grid, &mut s.enemies, dt, s.speed.bullet_step_secs,
    );
    for kill in kills {
        if let Some(p) = s.players.iter_mut().find(|p| p.id == kill.owner) {
            award(p, ScoreEvent::BulletKill);
        }
        log::debug!("enemy {} shot by {}", kill.enemy_id, kill.owner);
        effects.push(Effect::Sound(SoundCue::Explosion));
        effects.push(Effect::Explosion { x: kill.x, y: kill.y });
    }
}

// ══════════════════════════════════════════════════════════════
// Contact / game over
// ══════════════════════════════════════════════════════════════

fn resolve_contact(s: &mut Session) {
    for i in 0..s.players.len() {
        let p = &s.players[i];
        if !p.body.alive || p.is_invulnerable() { continue; }
        let (px, py) = (p.body.x, p.body.y);
        if s.enemies.iter().any(|e| e.body.alive && e.body.at(px, py)) {
            player_hit(s, i);
        }
    }
}

/// One life lost: respawn with invulnerability, or out for good.
fn player_hit(s: &mut Session, i: usize) {
    let invulnerable = s.speed.invulnerable_secs;
    let p = &mut s.players[i];
    if p.ledger.lives.lose_life() {
        p.reset_to_spawn();
        p.invulnerable = invulnerable;
        s.bullets.clear();
        log::info!("{} caught, {} lives left", p.id, p.ledger.lives.count());
    } else {
        p.body.alive = false;
        log::info!("{} is out of lives", p.id);
    }
}

fn resolve_game_over(s: &mut Session, effects: &mut Vec<Effect>) -> bool {
    let all_out = s.players.iter().all(|p| !p.body.alive && !p.is_invulnerable());
    if all_out {
        end_game(s, effects);
    }
    all_out
}

// ══════════════════════════════════════════════════════════════
// Gold bags
// ══════════════════════════════════════════════════════════════

fn resolve_bag_physics(s: &mut Session, dt: f32) {
    for event in physics::update_bags(&mut s.bags, &mut s.grid, dt, s.speed.fall_delay_secs) {
        log::trace!("{event:?}");
    }
}

fn resolve_bag_interactions(s: &mut Session, effects: &mut Vec<Effect>) {
    for bag in s.bags.iter_mut().filter(|b| !b.collected) {
        match bag.state {
            BagState::Stable => {
                // Walking onto a resting bag takes it, no points
                if s.players.iter().any(|p| p.body.alive && p.body.at(bag.x, bag.y)) {
                    bag.collected = true;
                    if s.grid.get(bag.x, bag.y) == Tile::GoldBag {
                        s.grid.set(bag.x, bag.y, Tile::Tunnel);
                    }
                    effects.push(Effect::Sound(SoundCue::Pickup));
                }
            }
            BagState::Gold => {
                if let Some(p) = s.players.iter_mut().find(|p| p.body.alive && p.body.at(bag.x, bag.y)) {
                    bag.collected = true;
                    award(p, ScoreEvent::GoldPile);
                    effects.push(Effect::Sound(SoundCue::Pickup));
                } else if s.enemies.iter().any(|e| e.body.alive && e.body.at(bag.x, bag.y)) {
                    bag.collected = true;
                    log::debug!("gold {} eaten", bag.id);
                }
            }
            BagState::Falling => {
                for e in s.enemies.iter_mut() {
                    if !physics::crushes(bag, e) { continue; }
                    e.body.alive = false;
                    if let Some(p1) = s.players.first_mut() {
                        award(p1, ScoreEvent::Crush);
                    }
                    log::debug!("enemy {} crushed by {}", e.id, bag.id);
                    effects.push(Effect::Sound(SoundCue::Explosion));
                    effects.push(Effect::Explosion { x: e.body.x, y: e.body.y });
                }
            }
        }
    }
}

fn cleanup(s: &mut Session) {
    s.enemies.retain(|e| e.body.alive);
    s.bags.retain(|b| !b.collected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Bullet, Direction, Enemy, EnemyForm, GoldBag, InputSnapshot};
    use crate::domain::grid::Grid;

    const DT: f32 = 0.25;

    /// Quarter-second timers so float sums stay exact.
    fn config(lives: u32) -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.speed.player_move_secs = 0.25;
        cfg.speed.fall_delay_secs = 0.25;
        cfg.speed.bullet_step_secs = 0.25;
        cfg.speed.bullet_life_secs = 1.0;
        cfg.speed.weapon_cooldown_secs = 1.0;
        cfg.speed.invulnerable_secs = 0.5;
        cfg.speed.level_complete_secs = 0.5;
        cfg.speed.spawn_delay_secs = 1000.0;
        cfg.speed.nobbin_secs = 1000.0;
        cfg.speed.hobbin_secs = 1000.0;
        cfg.rules.start_lives = lives;
        cfg.rules.max_level = 3;
        cfg.rules.seed = Some(1);
        cfg
    }

    fn session(rows: &[&str], bags: Vec<GoldBag>, lives: u32) -> Session {
        let cfg = config(lives);
        Session::with_grid(Grid::from_rows(rows), bags, false, cfg.speed, cfg.rules)
    }

    fn held(dir: Direction) -> FrameInput {
        let mut snap = InputSnapshot::default();
        match dir {
            Direction::Up => snap.up = true,
            Direction::Down => snap.down = true,
            Direction::Left => snap.left = true,
            Direction::Right => snap.right = true,
        }
        FrameInput { primary: snap, ..Default::default() }
    }

    fn fire() -> FrameInput {
        FrameInput {
            primary: InputSnapshot { fire: true, ..Default::default() },
            ..Default::default()
        }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    /// Two-player session: P1 spawns at (5,5), P2 at (7,5).
    fn duo(rows: &[&str], bags: Vec<GoldBag>, lives: u32) -> Session {
        let cfg = config(lives);
        Session::with_grid(Grid::from_rows(rows), bags, true, cfg.speed, cfg.rules)
    }

    /// Open corridor along row 5.
    const LANE: [&str; 7] = [
        "*##########",
        "###########",
        "###########",
        "###########",
        "###########",
        "...........",
        "###########",
    ];

    /// Player 1 spawns at (5,5). The emerald at (0,0) keeps the level alive.
    const ROOM: [&str; 7] = [
        "*##########",
        "###########",
        "###########",
        "###########",
        "###########",
        "#####......",
        "###########",
    ];

    // ── Level completion ──

    #[test]
    fn level_completes_the_tick_after_the_last_emerald() {
        let mut s = session(&[
            "###########",
            "###########",
            "###########",
            "###########",
            "###########",
            "#####.*....",
            "###########",
        ], vec![], 3);

        s.advance(DT, &held(Direction::Right));
        assert_eq!(s.players[0].body.x, 6);
        assert_eq!(s.score(PlayerId::P1), 100);
        assert!(!s.grid.contains(Tile::Emerald));
        assert_eq!(s.mode, GameMode::Normal);

        s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::LevelComplete);
    }

    #[test]
    fn clearing_four_emeralds_advances_the_level() {
        let mut s = session(&[
            "###########",
            "###########",
            "###########",
            "###########",
            "###########",
            "#####.****.",
            "###########",
        ], vec![], 1);

        for step in 1..=4 {
            s.advance(DT, &held(Direction::Right));
            assert_eq!(s.players[0].body.x, 5 + step);
        }
        assert_eq!(s.score(PlayerId::P1), 400);
        assert_eq!(s.mode, GameMode::Normal);

        s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::LevelComplete);

        // input is ignored while holding
        s.advance(DT, &held(Direction::Left));
        assert_eq!(s.level, 1);
        assert_eq!(s.players[0].body.x, 9);

        s.advance(DT, &idle());
        assert_eq!(s.level, 2);
        assert_eq!(s.mode, GameMode::Normal);
        assert!(s.grid.count(Tile::Emerald) > 4);
        assert!(!s.bags.is_empty());
        assert_eq!((s.players[0].body.x, s.players[0].body.y), (5, 5));
        assert_eq!(s.score(PlayerId::P1), 400);
        assert!(s.enemies.is_empty() && s.bullets.is_empty());
    }

    #[test]
    fn last_level_ends_the_game() {
        let mut s = session(&ROOM, vec![], 3);
        s.level = 3;
        s.grid.set(0, 0, Tile::Tunnel);
        s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::LevelComplete);
        s.advance(DT, &idle());
        let effects = s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::GameOver);
        assert_eq!(
            effects,
            vec![Effect::Scene(SceneRequest::GameOver { score_p1: 0, score_p2: 0 })],
        );
        assert!(s.advance(DT, &idle()).is_empty());
    }

    // ── Players ──

    #[test]
    fn player_digs_and_respects_move_cooldown() {
        let mut s = session(&ROOM, vec![], 3);
        s.speed.player_move_secs = 0.5;
        s.advance(DT, &held(Direction::Down));
        assert_eq!((s.players[0].body.x, s.players[0].body.y), (5, 6));
        assert_eq!(s.grid.get(5, 6), Tile::Tunnel);
        s.advance(DT, &held(Direction::Up)); // cooling down
        assert_eq!(s.players[0].body.y, 6);
        s.advance(DT, &held(Direction::Up));
        assert_eq!(s.players[0].body.y, 5);
    }

    #[test]
    fn shot_kills_enemy_and_credits_owner() {
        let mut s = session(&ROOM, vec![], 3);
        s.profile.move_delay = 1000.0;
        s.players[0].body.facing = Some(Direction::Right);
        s.enemies.push(Enemy::new(42, 8, 5));

        let effects = s.advance(DT, &fire());
        assert_eq!(effects, vec![Effect::Sound(SoundCue::Shot)]);
        assert_eq!(s.bullets[0].x, 6);
        s.advance(DT, &idle());
        let effects = s.advance(DT, &idle());
        assert_eq!(
            effects,
            vec![Effect::Sound(SoundCue::Explosion), Effect::Explosion { x: 8, y: 5 }],
        );
        assert!(s.enemies.is_empty());
        assert!(s.bullets.is_empty());
        assert_eq!(s.score(PlayerId::P1), 250);
    }

    #[test]
    fn weapon_cooldown_limits_fire_rate() {
        let mut s = session(&ROOM, vec![], 3);
        s.players[0].body.facing = Some(Direction::Right);
        s.advance(DT, &fire());
        s.advance(DT, &fire());
        assert_eq!(s.bullets.len(), 1);
    }

    // ── Contact ──

    /// Player walled in at (5,5) with an enemy on the same cell.
    const PIT: [&str; 7] = [
        "*##########",
        "###########",
        "###########",
        "###########",
        "###########",
        "#####.#####",
        "###########",
    ];

    #[test]
    fn contact_waits_for_invulnerability_then_respawns() {
        let mut s = session(&PIT, vec![], 2);
        s.enemies.push(Enemy::new(1, 5, 5));

        s.advance(DT, &idle()); // 0.5 → 0.25, still protected
        assert_eq!(s.players[0].ledger.lives.count(), 2);

        s.advance(DT, &idle()); // 0.25 → 0, caught
        let p = &s.players[0];
        assert_eq!(p.ledger.lives.count(), 1);
        assert!(p.body.alive);
        assert!(p.is_invulnerable());
        assert_eq!((p.body.x, p.body.y), (5, 5));
        assert_eq!(s.mode, GameMode::Normal);
    }

    #[test]
    fn losing_the_last_life_ends_the_game() {
        let mut s = session(&PIT, vec![], 1);
        s.enemies.push(Enemy::new(1, 5, 5));
        assert!(s.advance(DT, &idle()).is_empty());
        let effects = s.advance(DT, &idle());
        assert!(!s.players[0].body.alive);
        assert_eq!(s.mode, GameMode::GameOver);
        assert_eq!(
            effects,
            vec![Effect::Scene(SceneRequest::GameOver { score_p1: 0, score_p2: 0 })],
        );
    }

    #[test]
    fn game_continues_while_one_player_remains() {
        let cfg = config(1);
        let mut s = Session::with_grid(Grid::from_rows(&PIT), vec![], true, cfg.speed, cfg.rules);
        s.players[1].body.x = 0;
        s.players[1].body.y = 6;
        s.enemies.push(Enemy::new(1, 5, 5));
        s.advance(DT, &idle());
        s.advance(DT, &idle());
        assert!(!s.players[0].body.alive);
        assert!(s.players[1].body.alive);
        assert_eq!(s.mode, GameMode::Normal);
    }

    // ── Two players ──

    #[test]
    fn each_player_reads_its_own_controls() {
        let mut s = duo(&LANE, vec![], 3);
        let input = FrameInput {
            primary: InputSnapshot { left: true, ..Default::default() },
            secondary: InputSnapshot { right: true, ..Default::default() },
        };
        s.advance(DT, &input);
        assert_eq!(s.players[0].body.x, 4);
        assert_eq!(s.players[1].body.x, 8);
    }

    #[test]
    fn second_players_shot_scores_for_them() {
        let mut s = duo(&LANE, vec![], 3);
        s.profile.move_delay = 1000.0;
        s.players[1].body.facing = Some(Direction::Right);
        s.enemies.push(Enemy::new(3, 9, 5));

        let input = FrameInput {
            secondary: InputSnapshot { fire: true, ..Default::default() },
            ..Default::default()
        };
        assert_eq!(s.advance(DT, &input), vec![Effect::Sound(SoundCue::Shot)]);
        assert_eq!(s.bullets[0].owner, PlayerId::P2);
        s.advance(DT, &idle());
        s.advance(DT, &idle());
        assert!(s.enemies.is_empty());
        assert_eq!(s.score(PlayerId::P2), 250);
        assert_eq!(s.score(PlayerId::P1), 0);
    }

    #[test]
    fn enemy_chases_the_nearer_player() {
        let mut s = duo(&LANE, vec![], 3);
        s.profile.move_delay = 0.25;
        s.players[1].body.x = 2;
        s.enemies.push(Enemy::new(1, 4, 5));
        s.advance(DT, &idle());
        // P1 at 5 is one away, P2 at 2 is two away
        assert_eq!(s.enemies[0].body.x, 5);

        let mut s = duo(&LANE, vec![], 3);
        s.profile.move_delay = 0.25;
        s.players[0].body.x = 10;
        s.players[1].body.x = 2;
        s.enemies.push(Enemy::new(1, 5, 5));
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 4);
    }

    #[test]
    fn equal_distance_goes_to_player_one() {
        let mut s = duo(&LANE, vec![], 3);
        s.profile.move_delay = 0.25;
        s.players[1].body.x = 1;
        s.enemies.push(Enemy::new(1, 3, 5));
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 4);
    }

    #[test]
    fn dead_players_are_not_chased() {
        let mut s = duo(&LANE, vec![], 3);
        s.profile.move_delay = 0.25;
        s.players[0].body.alive = false;
        s.players[1].body.x = 0;
        s.enemies.push(Enemy::new(1, 3, 5));
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 2);
    }

    #[test]
    fn respawn_clears_bullets_in_flight() {
        let mut s = session(&PIT, vec![], 2);
        s.speed.bullet_step_secs = 1000.0;
        s.bullets.push(Bullet::new(0, 0, Direction::Right, 100.0, PlayerId::P1));
        s.enemies.push(Enemy::new(1, 5, 5));

        s.advance(DT, &idle());
        assert_eq!(s.bullets.len(), 1);
        s.advance(DT, &idle()); // caught and respawned
        assert_eq!(s.players[0].ledger.lives.count(), 1);
        assert!(s.bullets.is_empty());
    }

    // ── Enemies ──

    #[test]
    fn spawner_respects_concurrency_cap() {
        let mut cfg = config(3);
        cfg.speed.spawn_delay_secs = 0.25;
        let mut s = Session::with_grid(Grid::from_rows(&ROOM), vec![], false, cfg.speed, cfg.rules);
        for _ in 0..6 {
            s.advance(DT, &idle());
        }
        assert_eq!(s.enemies.len(), s.profile.max_concurrent as usize);
        assert_eq!((s.enemies[0].body.x, s.enemies[0].body.y), (9, 2));
        let ids: Vec<u32> = s.enemies.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn enemy_steps_toward_player_on_its_cadence() {
        let mut s = session(&ROOM, vec![], 3);
        s.profile.move_delay = 0.5;
        s.enemies.push(Enemy::new(1, 10, 5));
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 10);
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 9);
        assert_eq!(s.enemies[0].body.facing, Some(Direction::Left));
    }

    #[test]
    fn bonus_mode_sends_enemies_away() {
        let mut s = session(&ROOM, vec![], 3);
        s.profile.move_delay = 0.25;
        s.enemies.push(Enemy::new(1, 7, 5));
        s.enter_bonus(10.0);
        s.advance(DT, &idle());
        assert_eq!(s.enemies[0].body.x, 8);
        assert_eq!(s.mode, GameMode::Bonus);
    }

    #[test]
    fn bonus_mode_times_out() {
        let mut s = session(&ROOM, vec![], 3);
        s.enter_bonus(0.5);
        s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::Bonus);
        s.advance(DT, &idle());
        assert_eq!(s.mode, GameMode::Normal);
    }

    #[test]
    fn hobbin_digs_toward_player() {
        let mut s = session(&ROOM, vec![], 3);
        s.profile.move_delay = 0.25;
        let mut e = Enemy::new(1, 5, 2);
        e.form = EnemyForm::Hobbin;
        s.enemies.push(e);
        s.advance(DT, &idle());
        assert_eq!((s.enemies[0].body.x, s.enemies[0].body.y), (5, 3));
        assert_eq!(s.grid.get(5, 3), Tile::Tunnel);
        assert_eq!(s.score(PlayerId::P1), 0);
    }

    // ── Gold bags ──

    #[test]
    fn push_moves_bag_into_tunnel() {
        let mut rows = ROOM;
        rows[5] = "#####.$....";
        let mut s = session(&rows, vec![GoldBag::new("g0_1", 6, 5)], 3);
        s.advance(DT, &held(Direction::Right));
        assert_eq!(s.players[0].body.x, 6);
        assert_eq!(s.bags[0].x, 7);
        assert_eq!(s.grid.get(6, 5), Tile::Tunnel);
        assert_eq!(s.grid.get(7, 5), Tile::GoldBag);
        assert!(!s.bags[0].collected);
    }

    #[test]
    fn blocked_push_lets_the_player_take_the_bag() {
        let mut rows = ROOM;
        rows[5] = "#####.$####";
        let mut s = session(&rows, vec![GoldBag::new("g0_1", 6, 5)], 3);
        let effects = s.advance(DT, &held(Direction::Right));
        assert_eq!(s.players[0].body.x, 6);
        assert!(s.bags.is_empty());
        assert_eq!(s.grid.get(6, 5), Tile::Tunnel);
        assert_eq!(s.score(PlayerId::P1), 0);
        assert_eq!(effects, vec![Effect::Sound(SoundCue::Pickup)]);
    }

    #[test]
    fn gold_pile_is_worth_points() {
        let mut bag = GoldBag::new("g0_1", 6, 5);
        bag.state = BagState::Gold;
        let mut s = session(&ROOM, vec![bag], 3);
        s.advance(DT, &held(Direction::Right));
        assert!(s.bags.is_empty());
        assert_eq!(s.score(PlayerId::P1), 500);
    }

    #[test]
    fn enemies_eat_gold_piles() {
        let mut bag = GoldBag::new("g0_1", 9, 5);
        bag.state = BagState::Gold;
        let mut s = session(&ROOM, vec![bag], 3);
        s.profile.move_delay = 1000.0;
        s.enemies.push(Enemy::new(1, 9, 5));
        s.advance(DT, &idle());
        assert!(s.bags.is_empty());
        assert_eq!(s.score(PlayerId::P1), 0);
    }

    #[test]
    fn falling_bag_crushes_enemy_below() {
        let mut s = session(&[
            "*##########",
            "###$#######",
            "###.#######",
            "###.#######",
            "###########",
            "#####.#####",
            "###########",
        ], vec![GoldBag::new("g0_1", 3, 1)], 3);
        s.profile.move_delay = 1000.0;
        s.enemies.push(Enemy::new(5, 3, 3));

        s.advance(DT, &idle()); // starts falling, span [1,1]
        assert_eq!(s.bags[0].state, BagState::Falling);
        s.advance(DT, &idle()); // y = 2, span [1,2]
        assert_eq!(s.enemies.len(), 1);
        let effects = s.advance(DT, &idle()); // y = 3, span [2,3]
        assert!(s.enemies.is_empty());
        assert_eq!(s.score(PlayerId::P1), 250);
        assert!(effects.contains(&Effect::Explosion { x: 3, y: 3 }));

        s.advance(DT, &idle()); // dirt below: lands
        assert_eq!(s.bags[0].state, BagState::Gold);
        assert_eq!(s.grid.get(3, 3), Tile::Tunnel);
    }

    #[test]
    fn crush_points_go_to_player_one() {
        let mut s = duo(&[
            "*##########",
            "###$#######",
            "###.#######",
            "###.#######",
            "###########",
            "#####.#####",
            "###########",
        ], vec![GoldBag::new("g0_1", 3, 1)], 3);
        s.profile.move_delay = 1000.0;
        s.enemies.push(Enemy::new(5, 3, 2));

        s.advance(DT, &idle()); // starts falling
        s.advance(DT, &idle()); // y = 2, crushes
        assert!(s.enemies.is_empty());
        assert_eq!(s.score(PlayerId::P1), 250);
        assert_eq!(s.score(PlayerId::P2), 0);
    }
}
