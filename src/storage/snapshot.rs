//! Crash-safe snapshot files backing the persisted freshness caches.
//!
//! A snapshot is the last successfully refreshed value of one cache domain.
//! It is written only after a successful refresh, via temp file + fsync +
//! rename, so a crash at any point leaves either the previous snapshot or the
//! new one on disk, never a mixture.
//!
//! Reads degrade gracefully: a missing or corrupt file is "no prior value".

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Durable mirror of a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot<T> {
    pub payload: T,
    /// Epoch seconds of the refresh that produced `payload`.
    pub last_fetch: i64,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub last_source: Option<String>,
}

impl<T> PersistedSnapshot<T> {
    /// Snapshot captured now.
    pub fn new(payload: T, last_source: Option<String>) -> Self {
        Self {
            payload,
            last_fetch: Utc::now().timestamp(),
            last_error: None,
            last_source,
        }
    }

    /// Capture time as a UTC timestamp; out-of-range values map to the epoch.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.last_fetch, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Load a snapshot. Missing or unparsable files yield `None`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Option<PersistedSnapshot<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read snapshot");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load snapshot");
            None
        }
    }
}

/// Persist a snapshot atomically.
pub fn save<T: Serialize>(path: &Path, snapshot: &PersistedSnapshot<T>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_vec(snapshot)?;
    write_atomic(path, &content)?;
    Ok(())
}

/// Sibling temp path used by [`save`]: `<path>.tmp`.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path(path);
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

/// Directory of snapshot files for one cache domain.
///
/// Unkeyed domains use `<prefix>.json`; keyed domains (teams per league,
/// standings per league and season) use `<prefix>_<key>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// File backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        if safe.is_empty() {
            self.dir.join(format!("{}.json", self.prefix))
        } else {
            self.dir.join(format!("{}_{safe}.json", self.prefix))
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<PersistedSnapshot<T>> {
        load(&self.path_for(key))
    }

    pub fn save<T: Serialize>(&self, key: &str, snapshot: &PersistedSnapshot<T>) -> Result<()> {
        save(&self.path_for(key), snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("games.json");
        let snapshot = PersistedSnapshot::new(vec![1, 2, 3], Some("https://a".into()));

        save(&path, &snapshot).unwrap();
        let loaded: PersistedSnapshot<Vec<i32>> = load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn no_temp_file_left() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("teams.json");
        save(&path, &PersistedSnapshot::new("x", None)).unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_ref().unwrap().file_name(), "teams.json");
    }

    #[test]
    fn missing_file_is_no_prior_value() {
        let tmp = TempDir::new().unwrap();
        assert!(load::<String>(&tmp.path().join("absent.json")).is_none());
    }

    #[test]
    #[traced_test]
    fn corrupt_file_is_logged_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("games.json");
        std::fs::write(&path, b"{\"payload\": [1, 2").unwrap();

        assert!(load::<Vec<i32>>(&path).is_none());
        assert!(logs_contain("Failed to load snapshot"));
    }

    #[test]
    fn crash_before_rename_keeps_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("standings.json");
        save(&path, &PersistedSnapshot::new("old", None)).unwrap();
        let before = std::fs::read(&path).unwrap();

        // Simulate a writer killed after the temp write but before rename.
        std::fs::write(temp_path(&path), b"{\"payload\":\"new\",\"lastFe").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
        let loaded: PersistedSnapshot<String> = load(&path).unwrap();
        assert_eq!(loaded.payload, "old");

        // The next save replaces the leftover temp file.
        save(&path, &PersistedSnapshot::new("new", None)).unwrap();
        assert!(!temp_path(&path).exists());
        assert_eq!(load::<String>(&path).unwrap().payload, "new");
    }

    #[test]
    fn store_paths_per_key() {
        let store = SnapshotStore::new("/data", "standings");
        assert_eq!(store.path_for("nfl:2024"), PathBuf::from("/data/standings_nfl_2024.json"));
        assert_eq!(store.path_for(""), PathBuf::from("/data/standings.json"));
    }

    #[test]
    fn captured_at_matches_last_fetch() {
        let snap = PersistedSnapshot {
            payload: (),
            last_fetch: 1_700_000_000,
            last_error: None,
            last_source: None,
        };
        assert_eq!(snap.captured_at().timestamp(), 1_700_000_000);
    }
}
