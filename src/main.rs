/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context;

use config::GameConfig;
use sim::event::{Effect, SceneRequest};
use sim::highscores::HighScores;
use sim::world::Session;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{Renderer, View};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "digger.log";

/// Ticks an explosion stays on screen.
const FLASH_TICKS: u32 = 12;

enum Screen {
    Title,
    Playing { session: Box<Session>, paused: bool },
    GameOver { score_p1: u32, score_p2: Option<u32>, rank: Option<usize> },
}

struct Flash {
    x: usize,
    y: usize,
    ticks_left: u32,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = GameConfig::load();
    let mut scores = HighScores::load_or_default(&config.highscore_file);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal setup failed")?;

    let sound = SoundEngine::new();
    let result = game_loop(&mut renderer, sound.as_ref(), &config, &mut scores);

    renderer.cleanup().context("terminal cleanup failed")?;
    result?;

    println!();
    if let Some(best) = scores.top().first() {
        println!("Best so far: {} with {} points", best.name, best.score);
    }
    println!("Thanks for digging!");
    Ok(())
}

/// The terminal belongs to the renderer, so log lines go to a file.
fn init_logging() {
    let path = config::data_dir().join(LOG_FILE);
    let env = env_logger::Env::default().default_filter_or("info");
    match File::create(&path) {
        Ok(file) => env_logger::Builder::from_env(env)
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init(),
        Err(e) => eprintln!("logging disabled, cannot open {}: {e}", path.display()),
    }
}

fn game_loop(
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    scores: &mut HighScores,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let dt = tick_rate.as_secs_f32();
    let mut last_tick = Instant::now();
    let mut screen = Screen::Title;
    let mut flashes: Vec<Flash> = Vec::new();
    let mut muted = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() {
            break;
        }
        if kb.mute_pressed() {
            muted = !muted;
            log::info!("sound {}", if muted { "muted" } else { "on" });
        }
        let audible = sound.filter(|_| !muted);

        let mut frame = kb.frame_input();
        gp.merge_into(&mut frame.primary);

        let next = match &mut screen {
            Screen::Title => kb
                .start_pressed()
                .or_else(|| gp.confirm_pressed().then_some(false))
                .map(|two| start_game(two, config)),

            Screen::Playing { session, paused } => {
                if frame.primary.pause {
                    *paused = !*paused;
                    log::debug!("paused: {paused}");
                }
                let mut next = None;
                let two_players = session.players.len() > 1;
                if !*paused && last_tick.elapsed() >= tick_rate {
                    last_tick = Instant::now();
                    flashes.retain_mut(|f| {
                        f.ticks_left -= 1;
                        f.ticks_left > 0
                    });
                    for effect in session.advance(dt, &frame) {
                        let after = apply_effect(effect, two_players, audible, &mut flashes, scores, config);
                        next = next.or(after);
                    }
                }
                next
            }

            Screen::GameOver { .. } => {
                (kb.confirm_pressed() || gp.confirm_pressed()).then_some(Screen::Title)
            }
        };
        if let Some(next) = next {
            flashes.clear();
            screen = next;
        }

        let spots: Vec<(usize, usize)> = flashes.iter().map(|f| (f.x, f.y)).collect();
        let view = match &screen {
            Screen::Title => View::Title { scores: &*scores },
            Screen::Playing { session, paused } => View::Play {
                session: session.as_ref(),
                paused: *paused,
                explosions: &spots,
            },
            Screen::GameOver { score_p1, score_p2, rank } => View::GameOver {
                score_p1: *score_p1,
                score_p2: *score_p2,
                scores: &*scores,
                rank: *rank,
            },
        };
        renderer.render(&view).context("drawing frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn start_game(two_players: bool, config: &GameConfig) -> Screen {
    log::info!("new game, {} player(s)", if two_players { 2 } else { 1 });
    let session = Session::new(two_players, config.speed.clone(), config.rules.clone());
    Screen::Playing { session: Box::new(session), paused: false }
}

/// Route one effect to its collaborator. Returns the next screen on game over.
fn apply_effect(
    effect: Effect,
    two_players: bool,
    sound: Option<&SoundEngine>,
    flashes: &mut Vec<Flash>,
    scores: &mut HighScores,
    config: &GameConfig,
) -> Option<Screen> {
    match effect {
        Effect::Sound(cue) => {
            if let Some(sfx) = sound {
                sfx.play(cue);
            }
            None
        }
        Effect::Explosion { x, y } => {
            flashes.push(Flash { x, y, ticks_left: FLASH_TICKS });
            None
        }
        Effect::Scene(request @ SceneRequest::GameOver { score_p1, score_p2 }) => {
            log::debug!("scene change: {}", request.scene_id());
            let score_p2 = two_players.then_some(score_p2);
            Some(finish_game(score_p1, score_p2, scores, config))
        }
    }
}

/// Record the finished game and build the game-over screen.
fn finish_game(score_p1: u32, score_p2: Option<u32>, scores: &mut HighScores, config: &GameConfig) -> Screen {
    let now = SystemTime::now();

    let mut rank = scores.record(score_p1, now);
    if let Some(p2) = score_p2 {
        let p2_rank = scores.record(p2, now);
        // Highlight whichever entry sits higher
        rank = match (rank, p2_rank) {
            (Some(r1), Some(r2)) if r2 <= r1 => Some(r2),
            (None, r2) => r2,
            (r1, _) => r1,
        };
    }

    if let Err(e) = scores.save(&config.highscore_file) {
        log::warn!("{e}");
    }
    Screen::GameOver { score_p1, score_p2, rank }
}
