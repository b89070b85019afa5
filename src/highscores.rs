//! Persist the high score as plain decimal text (XDG config or ~/.config/blocktui).

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "blocktui";
const FILENAME: &str = "highscore";
/// Used when neither XDG_CONFIG_HOME nor HOME is set.
const FALLBACK_FILENAME: &str = "highscore.txt";

/// Default record path: `$XDG_CONFIG_HOME/blocktui/highscore`, else `~/.config/blocktui/highscore`.
pub fn default_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => Some(PathBuf::from(xdg)),
        _ => std::env::var("HOME")
            .ok()
            .filter(|h| !h.is_empty())
            .map(|h| PathBuf::from(h).join(".config")),
    };
    base.map_or_else(
        || PathBuf::from(FALLBACK_FILENAME),
        |b| b.join(APP_DIR).join(FILENAME),
    )
}

/// A single stored high score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScoreFile {
    path: PathBuf,
}

impl HighScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored score, or 0 if the file is missing, unreadable or not a number.
    pub fn load(&self) -> u32 {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read high score");
                return 0;
            }
        };
        content.trim().parse().unwrap_or_else(|_| {
            warn!(path = %self.path.display(), "malformed high score, starting from 0");
            0
        })
    }

    /// Overwrite the stored score. Creates the parent directory if needed.
    pub fn save(&self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, score.to_string())
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
