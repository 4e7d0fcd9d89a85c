use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found; set $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.statdeck/` directory layout.
///
/// Use `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct StatdeckPaths {
    statdeck_dir: PathBuf,
}

impl StatdeckPaths {
    /// Resolve paths from the user's home directory (`~/.statdeck`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            statdeck_dir: home.join(".statdeck"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(statdeck_dir: PathBuf) -> Self {
        Self { statdeck_dir }
    }

    /// The base `~/.statdeck` directory.
    pub fn statdeck_dir(&self) -> &Path {
        &self.statdeck_dir
    }

    pub fn user_config(&self) -> PathBuf {
        self.statdeck_dir.join("config.toml")
    }

    /// Directory for saved dashboard snapshots (`statdeck snapshot --save`).
    pub fn snapshots_dir(&self) -> PathBuf {
        self.statdeck_dir.join("snapshots")
    }

    // --- Project-relative paths ---

    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".statdeck").join("config.toml")
    }
}
