//! Local board persistence, one JSON document per key under the
//! per-user data directory. This is the client-side channel; the
//! universe store's shotlist document is a separate, uncoordinated one.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{Board, ShotlistError};

/// Storage key the board autosaves under.
pub const DEFAULT_BOARD_KEY: &str = "shotlists";

pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("promptdeck")
}

pub struct BoardStore {
    dir: PathBuf,
}

impl BoardStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn open_default() -> Self {
        Self::new(app_data_dir())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Loads the board stored under `key`. A missing or malformed
    /// document yields `None` so the caller's in-memory board stays as
    /// it was; the corrupt payload is never applied.
    pub fn load(&self, key: &str) -> Option<Board> {
        let path = self.path_for(key);
        let data = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(board) => Some(board),
            Err(err) => {
                warn!("ignoring malformed board document {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Whole-document overwrite of the board stored under `key`.
    pub fn save(&self, key: &str, board: &Board) -> Result<(), ShotlistError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(board)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }

    pub fn clear(&self, key: &str) -> Result<(), ShotlistError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
