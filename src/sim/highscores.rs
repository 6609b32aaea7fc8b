/// High-score table: the ten best finished games.
///
/// ## File format (TOML)
///
/// ```text
///   games_played = 12
///
///   [[entry]]
///   name = "GAME07"
///   score = 4350
///   date = "03/11/2026"
///   time = "21:40"
/// ```
///
/// Entries are kept sorted by score, highest first; on equal scores the
/// older entry stays ahead. Names come from a running game counter that
/// never resets, so a name stays unique even after its entry drops out.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TABLE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("high-score file is corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode high scores: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub date: String, // DD/MM/YYYY
    pub time: String, // HH:MM, UTC
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    #[serde(default)]
    pub games_played: u32,
    #[serde(default, rename = "entry")]
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// Read the table. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(HighScores::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|source| StoreError::Read { path: path.to_path_buf(), source })?;
        let mut table: HighScores = toml::from_str(&text)?;
        table.normalize();
        Ok(table)
    }

    /// `load`, but any failure is logged and yields an empty table.
    pub fn load_or_default(path: &Path) -> Self {
        HighScores::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; starting with an empty high-score table");
            HighScores::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| StoreError::Write { path: path.to_path_buf(), source })?;
            }
        }
        std::fs::write(path, text)
            .map_err(|source| StoreError::Write { path: path.to_path_buf(), source })
    }

    /// Add a finished game. Returns its rank (0-based) if it made the table.
    pub fn record(&mut self, score: u32, now: SystemTime) -> Option<usize> {
        self.games_played += 1;
        let (date, time) = format_timestamp(now);
        let entry = ScoreEntry {
            name: format!("GAME{:02}", self.games_played),
            score,
            date,
            time,
        };

        // After every equal or higher score already in the table
        let rank = self.entries.iter().take_while(|e| e.score >= score).count();
        if rank >= TABLE_SIZE {
            return None;
        }
        self.entries.insert(rank, entry);
        self.entries.truncate(TABLE_SIZE);
        Some(rank)
    }

    pub fn top(&self) -> &[ScoreEntry] {
        &self.entries
    }

    fn normalize(&mut self) {
        // stable: hand-edited ties keep file order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(TABLE_SIZE);
        self.games_played = self.games_played.max(self.entries.len() as u32);
    }
}

// ── Timestamps ──

/// `(DD/MM/YYYY, HH:MM)` in UTC.
fn format_timestamp(now: SystemTime) -> (String, String) {
    let secs = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (y, m, d) = civil_from_days(days);
    (
        format!("{d:02}/{m:02}/{y:04}"),
        format!("{:02}:{:02}", rem / 3600, rem % 3600 / 60),
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}
