//! Tracked-paths persistence: the flat list of project roots known across runs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LocportError;
use crate::DOTFILE;

/// Directory under the platform data dir holding locport's state.
pub const APP_DIR: &str = "locport";

/// File name of the tracked-paths list inside [`APP_DIR`].
pub const INDEX_FILE: &str = "index";

/// Default production store location: `<data_local_dir>/locport/index`.
/// Tests should not touch this — construct the store over a temp dir.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Reads and writes the tracked-paths file.
///
/// The file is plain UTF-8, one absolute project-root directory per line,
/// newline-joined. `save` writes project *directories*; `load` rebuilds
/// registration-file paths by appending [`DOTFILE`] to each.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(APP_DIR).join(INDEX_FILE),
        }
    }

    /// Location of the tracked-paths file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the tracked registration-file paths. Lines are trimmed and blank
    /// lines dropped. A missing or unreadable file is an empty list, not an
    /// error — nothing has been indexed yet.
    #[must_use]
    pub fn load(&self) -> Vec<PathBuf> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            debug!(path = %self.path.display(), "no tracked-paths file, starting empty");
            return Vec::new();
        };
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Path::new(line).join(DOTFILE))
            .collect()
    }

    /// Write the project-root directories, one per line, creating the parent
    /// directory on first save.
    pub fn save(&self, roots: &[PathBuf]) -> Result<(), LocportError> {
        let write_err = |source| LocportError::StoreWrite {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&self.path, body).map_err(write_err)?;
        debug!(path = %self.path.display(), count = roots.len(), "saved tracked paths");
        Ok(())
    }
}
