//! Persistence of the best level reached across sessions.
//!
//! The record is a single integer. Failures never reach the player: a missing
//! or unreadable record counts as level 0, and a failed write is logged and
//! skipped.

use crate::debug_log;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "divisor-quiz";
const SCORE_FILE_NAME: &str = "highest_level";

pub trait ScoreStore {
    /// Best level persisted so far, or 0 when there is none.
    fn load(&self) -> u32;

    /// Persist `level`. Callers only call this with a new record.
    fn save(&mut self, level: u32);
}

/// Default score file location under the platform's local data directory.
#[must_use]
pub fn default_score_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(SCORE_FILE_NAME))
}

/// Read the best level from `path`.
///
/// A missing file is `Ok(None)`; contents that are not a non-negative integer
/// are an `InvalidData` error.
pub fn read_best_level(path: &Path) -> io::Result<Option<u32>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    contents
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write `level` to `path`, creating parent directories as needed.
pub fn write_best_level(path: &Path, level: u32) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{level}\n"))
}

/// Score store backed by a small text file.
///
/// With no path (no data directory on this platform) the store is inert:
/// loads return 0 and saves are dropped.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: Option<PathBuf>,
}

impl FileScoreStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Store at `path` if given, otherwise at [`default_score_path`].
    pub fn at_or_default(path: Option<PathBuf>) -> Self {
        Self::new(path.or_else(default_score_path))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> u32 {
        let Some(path) = &self.path else {
            debug_log!("No score path available, best level defaults to 0");
            return 0;
        };
        match read_best_level(path) {
            Ok(Some(level)) => level,
            Ok(None) => {
                debug_log!("No score file at {}", path.display());
                0
            }
            Err(e) => {
                log::warn!("Could not read score file {}: {e}", path.display());
                0
            }
        }
    }

    fn save(&mut self, level: u32) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_best_level(path, level) {
            log::warn!("Could not write score file {}: {e}", path.display());
        }
    }
}

/// In-memory store, also recording every save in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    best: u32,
    saves: Vec<u32>,
}

impl MemoryScoreStore {
    pub fn with_best(best: u32) -> Self {
        Self {
            best,
            saves: Vec::new(),
        }
    }

    pub fn saves(&self) -> &[u32] {
        &self.saves
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> u32 {
        self.best
    }

    fn save(&mut self, level: u32) {
        self.best = level;
        self.saves.push(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("divisor-quiz-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_loads_zero() {
        let path = temp_path("missing_score");
        let _ = fs::remove_file(&path);
        let store = FileScoreStore::new(Some(path));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("saved_score");
        let mut store = FileScoreStore::new(Some(path.clone()));
        store.save(17);
        assert_eq!(store.load(), 17);
        assert_eq!(read_best_level(&path).unwrap(), Some(17));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_loads_zero() {
        let path = temp_path("garbage_score");
        write_best_level(&path, 0).unwrap();
        fs::write(&path, "not a number").unwrap();

        assert!(read_best_level(&path).is_err());
        assert_eq!(FileScoreStore::new(Some(path.clone())).load(), 0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_surrounding_whitespace_is_accepted() {
        let path = temp_path("padded_score");
        write_best_level(&path, 0).unwrap();
        fs::write(&path, "  23 \n").unwrap();
        assert_eq!(FileScoreStore::new(Some(path.clone())).load(), 23);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_path_is_skipped() {
        // A directory cannot be overwritten as a file
        let dir = temp_path("score_dir");
        fs::create_dir_all(&dir).unwrap();
        let mut store = FileScoreStore::new(Some(dir.clone()));
        store.save(5);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_pathless_store_is_inert() {
        let mut store = FileScoreStore::new(None);
        store.save(9);
        assert_eq!(store.load(), 0);
        assert!(store.path().is_none());
    }

    #[test]
    fn test_memory_store_records_saves() {
        let mut store = MemoryScoreStore::with_best(3);
        assert_eq!(store.load(), 3);
        store.save(4);
        store.save(5);
        assert_eq!(store.load(), 5);
        assert_eq!(store.saves(), &[4, 5]);
    }
}
