/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/digger`. Falls back to sensible defaults if the file is
/// missing or incomplete; a broken file is reported and ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::ai::FormTimings;
use crate::domain::{combat, physics};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub highscore_file: PathBuf,
}

/// Every gameplay timer, in seconds unless noted.
#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_move_secs: f32,
    pub fall_delay_secs: f32,
    pub bullet_life_secs: f32,
    pub bullet_step_secs: f32,
    pub weapon_cooldown_secs: f32,
    pub invulnerable_secs: f32,   // after session start and every respawn
    pub level_complete_secs: f32, // hold before the next level
    pub spawn_delay_secs: f32,
    pub nobbin_secs: f32,
    pub hobbin_secs: f32,
}

impl SpeedConfig {
    pub fn form_timings(&self) -> FormTimings {
        FormTimings { nobbin: self.nobbin_secs, hobbin: self.hobbin_secs }
    }
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub start_lives: u32,
    pub extra_life_score: u32,
    pub max_level: u32,
    pub seed: Option<u64>, // fixed level generation when set
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub fire: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_move")]
    player_move_secs: f32,
    #[serde(default = "default_fall_delay")]
    fall_delay_secs: f32,
    #[serde(default = "default_bullet_life")]
    bullet_life_secs: f32,
    #[serde(default = "default_bullet_step")]
    bullet_step_secs: f32,
    #[serde(default = "default_weapon_cooldown")]
    weapon_cooldown_secs: f32,
    #[serde(default = "default_invulnerable")]
    invulnerable_secs: f32,
    #[serde(default = "default_level_complete")]
    level_complete_secs: f32,
    #[serde(default = "default_spawn_delay")]
    spawn_delay_secs: f32,
    #[serde(default = "default_nobbin")]
    nobbin_secs: f32,
    #[serde(default = "default_hobbin")]
    hobbin_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_start_lives")]
    start_lives: u32,
    #[serde(default = "default_extra_life")]
    extra_life_score: u32,
    #[serde(default = "default_max_level")]
    max_level: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_fire")]
    fire: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_highscore_file")]
    highscore_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_player_move() -> f32 { 0.12 }
fn default_fall_delay() -> f32 { physics::FALL_DELAY }
fn default_bullet_life() -> f32 { combat::BULLET_LIFE }
fn default_bullet_step() -> f32 { 0.03 }
fn default_weapon_cooldown() -> f32 { 2.0 }
fn default_invulnerable() -> f32 { 0.7 }
fn default_level_complete() -> f32 { 2.0 }
fn default_spawn_delay() -> f32 { 0.8 }
fn default_nobbin() -> f32 { 6.0 }
fn default_hobbin() -> f32 { 3.0 }

fn default_start_lives() -> u32 { 3 }
fn default_extra_life() -> u32 { 20_000 }
fn default_max_level() -> u32 { 10 }

fn default_fire() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_highscore_file() -> String { "highscores.toml".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_move_secs: default_player_move(),
            fall_delay_secs: default_fall_delay(),
            bullet_life_secs: default_bullet_life(),
            bullet_step_secs: default_bullet_step(),
            weapon_cooldown_secs: default_weapon_cooldown(),
            invulnerable_secs: default_invulnerable(),
            level_complete_secs: default_level_complete(),
            spawn_delay_secs: default_spawn_delay(),
            nobbin_secs: default_nobbin(),
            hobbin_secs: default_hobbin(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            start_lives: default_start_lives(),
            extra_life_score: default_extra_life(),
            max_level: default_max_level(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            fire: default_fire(),
            pause: default_pause(),
            confirm: default_confirm(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { highscore_file: default_highscore_file() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), Path::new("."))
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/digger`. Missing file or keys fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig::from_toml(toml_cfg, &data_dir())
    }

    /// Parse config text. Relative file paths resolve against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, ConfigError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, base))
    }

    fn from_toml(t: TomlConfig, base: &Path) -> Self {
        let highscore_file = PathBuf::from(&t.general.highscore_file);
        let highscore_file = if highscore_file.is_absolute() {
            highscore_file
        } else {
            base.join(highscore_file)
        };

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms.max(1),
                player_move_secs: t.speed.player_move_secs,
                fall_delay_secs: t.speed.fall_delay_secs,
                bullet_life_secs: t.speed.bullet_life_secs,
                bullet_step_secs: t.speed.bullet_step_secs,
                weapon_cooldown_secs: t.speed.weapon_cooldown_secs,
                invulnerable_secs: t.speed.invulnerable_secs,
                level_complete_secs: t.speed.level_complete_secs,
                spawn_delay_secs: t.speed.spawn_delay_secs,
                nobbin_secs: t.speed.nobbin_secs,
                hobbin_secs: t.speed.hobbin_secs,
            },
            rules: RulesConfig {
                start_lives: t.rules.start_lives.max(1),
                extra_life_score: t.rules.extra_life_score,
                max_level: t.rules.max_level.max(1),
                seed: t.rules.seed,
            },
            gamepad: GamepadConfig {
                fire: t.gamepad.fire,
                pause: t.gamepad.pause,
                confirm: t.gamepad.confirm,
            },
            highscore_file,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/digger");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Writable directory for high scores and the log file.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory, if writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_digger");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/digger");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    Ok(toml::from_str::<TomlConfig>(&text)?)
}

/// First config.toml found wins. Errors are logged and defaults used.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match read_toml(&path) {
            Ok(cfg) => {
                log::info!("loaded {}", path.display());
                return cfg;
            }
            Err(e @ ConfigError::Parse(_)) => {
                log::warn!("{e}; using default settings");
                return TomlConfig::default();
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    TomlConfig::default()
}
