//! File-backed persistence for levels and high scores.
//!
//! Layout under the data root:
//!
//! ```text
//! <root>/high-scores.md
//! <root>/levels/level-1.json
//! <root>/levels/level-2.json
//! ```

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::highscores::{parse_markdown, to_markdown, HighScoreEntry};
use crate::level::{level_number, load_level_from_path, LevelFile, LevelSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    Invalid(String),
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            StoreError::Invalid(msg) => write!(f, "invalid: {msg}"),
            StoreError::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub trait LevelSource {
    /// Valid levels only, ordered by level number.
    fn list_levels(&self) -> Result<Vec<LevelSummary>, StoreError>;
    fn fetch_level(&self, level_id: &str) -> Result<LevelFile, StoreError>;
}

pub trait HighScoreStore {
    /// Never fails: a missing or unreadable file is an empty table.
    fn load_high_scores(&self) -> Vec<HighScoreEntry>;
    fn save_high_scores(&self, entries: &[HighScoreEntry]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn levels_dir(&self) -> PathBuf {
        self.root.join("levels")
    }

    pub fn high_scores_path(&self) -> PathBuf {
        self.root.join("high-scores.md")
    }
}

impl LevelSource for DataDir {
    fn list_levels(&self) -> Result<Vec<LevelSummary>, StoreError> {
        let dir = self.levels_dir();
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to read levels dir {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut levels: Vec<(u32, LevelSummary)> = Vec::new();
        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            let Some(number) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|_| path.extension().is_some_and(|ext| ext == "json"))
                .and_then(level_number)
            else {
                continue;
            };
            match load_level_from_path(&path) {
                Ok(level) => levels.push((number, LevelSummary::from(&level))),
                Err(e) => log::warn!("Skipping level file: {e}"),
            }
        }
        levels.sort_by_key(|(number, _)| *number);
        Ok(levels.into_iter().map(|(_, summary)| summary).collect())
    }

    fn fetch_level(&self, level_id: &str) -> Result<LevelFile, StoreError> {
        if level_number(level_id).is_none() {
            return Err(StoreError::NotFound(format!("level '{level_id}'")));
        }
        let path = self.levels_dir().join(format!("{level_id}.json"));
        if !path.is_file() {
            return Err(StoreError::NotFound(format!("level '{level_id}'")));
        }
        let level = load_level_from_path(&path).map_err(StoreError::Invalid)?;
        if level.level_id != level_id {
            return Err(StoreError::Invalid(format!(
                "{} declares levelId '{}'",
                path.display(),
                level.level_id
            )));
        }
        Ok(level)
    }
}

impl HighScoreStore for DataDir {
    fn load_high_scores(&self) -> Vec<HighScoreEntry> {
        let path = self.high_scores_path();
        match fs::read_to_string(&path) {
            Ok(raw) => parse_markdown(&raw),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    log::error!("Failed to read high scores {}: {e}", path.display());
                }
                Vec::new()
            }
        }
    }

    fn save_high_scores(&self, entries: &[HighScoreEntry]) -> Result<(), StoreError> {
        let path = self.high_scores_path();
        fs::create_dir_all(&self.root).map_err(|e| {
            StoreError::Io(format!("Failed to create {}: {e}", self.root.display()))
        })?;
        fs::write(&path, to_markdown(entries))
            .map_err(|e| StoreError::Io(format!("Failed to write {}: {e}", path.display())))
    }
}
