//! Platform directories for config and snapshots.

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};

/// Application paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config: PathBuf,
    /// Root for persisted cache snapshots.
    pub data: PathBuf,
}

impl AppPaths {
    #[must_use]
    pub fn new() -> Self {
        if let Some(dirs) = ProjectDirs::from("dev", "matchday", "matchday") {
            Self {
                config: dirs.config_dir().to_path_buf(),
                data: dirs.data_dir().to_path_buf(),
            }
        } else {
            let home = BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/matchday"),
                data: home.join(".local/share/matchday"),
            }
        }
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.data.join("snapshots")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
