//! Test utilities for matchday.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use matchday::test_utils::*;
//!
//! let record = make_test_match("chiefs-bills", "american-football", "Chiefs vs Bills");
//! let dir = TestDir::new();
//! let config = make_test_config("http://127.0.0.1:9", dir.path());
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};

use crate::core::models::{RawMatch, RawSource, RawTeam, RawTeams};
use crate::storage::config::Config;

// =============================================================================
// Test Data Factories
// =============================================================================

/// A source entry as listed upstream.
#[must_use]
pub fn make_test_source(source: &str, id: &str) -> RawSource {
    RawSource {
        source: Some(source.to_string()),
        id: Some(id.to_string()),
    }
}

/// A match record that started `started_mins_ago` minutes ago.
///
/// Negative values put the start in the future.
#[must_use]
pub fn make_test_match_at(
    id: &str,
    category: &str,
    title: &str,
    started_mins_ago: i64,
) -> RawMatch {
    let date = Utc::now() - TimeDelta::minutes(started_mins_ago);
    let (away, home) = title
        .split_once(" vs ")
        .map_or((None, None), |(a, h)| (Some(a.trim()), Some(h.trim())));
    let team = |name: Option<&str>| {
        name.map(|n| RawTeam {
            name: Some(n.to_string()),
            badge: Some(format!("{}-badge", n.to_lowercase().replace(' ', "-"))),
            logo: None,
        })
    };

    RawMatch {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        category: Some(category.to_string()),
        date: Some(date.timestamp_millis()),
        poster: Some(format!("/api/images/poster/{id}.webp")),
        popular: false,
        sources: vec![
            make_test_source("delta", &format!("{id}-delta")),
            make_test_source("admin", &format!("{id}-admin")),
        ],
        teams: Some(RawTeams {
            home: team(home),
            away: team(away),
        }),
    }
}

/// A match record that started ten minutes ago.
#[must_use]
pub fn make_test_match(id: &str, category: &str, title: &str) -> RawMatch {
    make_test_match_at(id, category, title, 10)
}

/// A bare record with no sources, teams or poster.
#[must_use]
pub fn make_test_match_minimal(id: &str, category: &str, title: &str) -> RawMatch {
    RawMatch {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        category: Some(category.to_string()),
        date: Some(Utc::now().timestamp_millis()),
        ..RawMatch::default()
    }
}

/// Serialize records the way the match directory returns them.
#[must_use]
pub fn make_test_match_list(records: &[RawMatch]) -> Value {
    serde_json::to_value(records).unwrap_or_else(|_| json!([]))
}

/// A config whose every upstream points at `base` and whose snapshots land
/// under `data_dir`.
///
/// Retries are reduced to a single attempt with a short backoff so failure
/// paths stay fast.
#[must_use]
pub fn make_test_config(base: &str, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.upstream.api_bases = vec![base.to_string()];
    config.upstream.retry_count = 1;
    config.upstream.backoff_base_ms = 5;
    config.upstream.timeout_secs = 2;
    config.health.embed_base = format!("{base}/embed");
    config.players.core_api_base = format!("{base}/core");
    config.players.site_api_base = format!("{base}/site");
    config.players.workers = 4;
    config.games.image_base = base.to_string();
    config.storage.data_dir = Some(data_dir.to_path_buf());
    config
}

/// A config file exercising every section.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[server]
port = 9100
bind = "127.0.0.1"

[upstream]
api_bases = ["https://primary.example/api", "https://backup.example/api"]
timeout_secs = 5
retry_count = 2

[cache]
games_ttl_secs = 15
games_stale_secs = 300

[health]
max_checks = 4
source_preference = ["admin", "delta"]

[players]
workers = 8
"#
    .to_string()
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// ```rust,ignore
/// use matchday::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config.toml", "[server]\nport = 9100");
/// assert!(dir.file_exists("config.toml"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file, including parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string parses as JSON and return the value.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {{
        let json = $json;
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            ),
        }
    }};
}
