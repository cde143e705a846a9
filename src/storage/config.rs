//! Configuration file loading and resolution.
//!
//! Loads `config.toml` from the platform config directory (see
//! [`AppPaths`]) or from `MATCHDAY_CONFIG` / `--config`.
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `MATCHDAY_CONFIG`: config file path
//! - `MATCHDAY_PORT`: listen port
//! - `MATCHDAY_API_BASES`: comma-separated match directory base URLs
//! - `MATCHDAY_DATA_DIR`: snapshot root
//! - `MATCHDAY_TIMEOUT`: per-attempt timeout in seconds
//! - `MATCHDAY_RETRY_COUNT`: attempts per fetch
//! - `MATCHDAY_MAX_HEALTH_CHECKS`: live probes per request
//! - `MATCHDAY_PLAYER_WORKERS`: player fan-out width
//! - `MATCHDAY_EMBED_BASE`: stream embed base URL
//! - `MATCHDAY_CORE_API_BASE`, `MATCHDAY_SITE_API_BASE`: stats provider bases

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::freshness::CachePolicy;
use crate::core::health::DEFAULT_SOURCE_PREFERENCE;
use crate::core::http::{DEFAULT_BACKOFF_BASE, DEFAULT_RETRY_COUNT, DEFAULT_USER_AGENT, RetryPolicy};
use crate::error::{MatchdayError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_CONFIG: &str = "MATCHDAY_CONFIG";
pub const ENV_PORT: &str = "MATCHDAY_PORT";
pub const ENV_API_BASES: &str = "MATCHDAY_API_BASES";
pub const ENV_DATA_DIR: &str = "MATCHDAY_DATA_DIR";
pub const ENV_TIMEOUT: &str = "MATCHDAY_TIMEOUT";
pub const ENV_RETRY_COUNT: &str = "MATCHDAY_RETRY_COUNT";
pub const ENV_MAX_HEALTH_CHECKS: &str = "MATCHDAY_MAX_HEALTH_CHECKS";
pub const ENV_PLAYER_WORKERS: &str = "MATCHDAY_PLAYER_WORKERS";
pub const ENV_EMBED_BASE: &str = "MATCHDAY_EMBED_BASE";
pub const ENV_CORE_API_BASE: &str = "MATCHDAY_CORE_API_BASE";
pub const ENV_SITE_API_BASE: &str = "MATCHDAY_SITE_API_BASE";

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_API_BASES: &[&str] = &["https://streamed.pk/api", "https://streamed.su/api"];
pub const DEFAULT_EMBED_BASE: &str = "https://embedsports.top/embed";
pub const DEFAULT_IMAGE_BASE: &str = "https://streamed.pk";
pub const DEFAULT_CORE_API_BASE: &str = "https://sports.core.api.espn.com/v2/sports";
pub const DEFAULT_SITE_API_BASE: &str = "https://site.api.espn.com/apis";

// =============================================================================
// File sections
// =============================================================================

/// Application configuration as read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub health: HealthConfig,
    pub players: PlayersConfig,
    pub games: GamesConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Match directory bases, tried in order.
    pub api_bases: Vec<String>,
    pub timeout_secs: u64,
    pub retry_count: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_bases: DEFAULT_API_BASES.iter().map(ToString::to_string).collect(),
            timeout_secs: 10,
            retry_count: DEFAULT_RETRY_COUNT,
            backoff_base_ms: u64::try_from(DEFAULT_BACKOFF_BASE.as_millis()).unwrap_or(600),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// TTL and stale windows in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub games_ttl_secs: u64,
    pub games_stale_secs: u64,
    pub teams_ttl_secs: u64,
    pub teams_stale_secs: u64,
    pub standings_ttl_secs: u64,
    pub standings_stale_secs: u64,
    pub stats_ttl_secs: u64,
    pub leaders_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            games_ttl_secs: 30,
            games_stale_secs: 600,
            teams_ttl_secs: 43_200,
            teams_stale_secs: 604_800,
            standings_ttl_secs: 1_800,
            standings_stale_secs: 21_600,
            stats_ttl_secs: 60,
            leaders_ttl_secs: 900,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn games_policy(&self) -> CachePolicy {
        CachePolicy::from_secs(self.games_ttl_secs, self.games_stale_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub ttl_secs: u64,
    /// Live probes allowed per inbound request.
    pub max_checks: usize,
    pub embed_base: String,
    pub source_preference: Vec<String>,
    pub probe_concurrency: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            max_checks: 10,
            embed_base: DEFAULT_EMBED_BASE.to_string(),
            source_preference: DEFAULT_SOURCE_PREFERENCE
                .iter()
                .map(ToString::to_string)
                .collect(),
            probe_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    pub core_api_base: String,
    pub site_api_base: String,
    pub workers: usize,
    pub index_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    pub stats_ttl_secs: u64,
    pub page_ttl_secs: u64,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            core_api_base: DEFAULT_CORE_API_BASE.to_string(),
            site_api_base: DEFAULT_SITE_API_BASE.to_string(),
            workers: 12,
            index_ttl_secs: 3_600,
            profile_ttl_secs: 3_600,
            stats_ttl_secs: 900,
            page_ttl_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub live_max_age_secs: i64,
    pub ended_grace_secs: i64,
    pub image_base: String,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            live_max_age_secs: 14_400,
            ended_grace_secs: 21_600,
            image_base: DEFAULT_IMAGE_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot root. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the default config path. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// The file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// The file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            MatchdayError::Config(format!("Invalid config file {}: {e}", path.display()))
        })
    }

    /// Write to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| MatchdayError::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`MatchdayError::ConfigInvalid`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String, message: &str| {
            Err(MatchdayError::ConfigInvalid {
                key: key.to_string(),
                value,
                message: message.to_string(),
            })
        };

        let timeout = self.upstream.timeout_secs;
        if !(1..=300).contains(&timeout) {
            return invalid(
                "upstream.timeout_secs",
                timeout.to_string(),
                "must be between 1 and 300 seconds",
            );
        }
        if self.upstream.retry_count == 0 {
            return invalid("upstream.retry_count", "0".into(), "must be at least 1");
        }
        if self.upstream.api_bases.iter().all(|b| b.trim().is_empty()) {
            return invalid("upstream.api_bases", "[]".into(), "at least one base URL is required");
        }
        if self.players.workers == 0 {
            return invalid("players.workers", "0".into(), "must be at least 1");
        }
        if self.health.probe_concurrency == 0 {
            return invalid("health.probe_concurrency", "0".into(), "must be at least 1");
        }
        let windows = [
            ("cache.games_stale_secs", self.cache.games_ttl_secs, self.cache.games_stale_secs),
            ("cache.teams_stale_secs", self.cache.teams_ttl_secs, self.cache.teams_stale_secs),
            (
                "cache.standings_stale_secs",
                self.cache.standings_ttl_secs,
                self.cache.standings_stale_secs,
            ),
        ];
        for (key, ttl, stale) in windows {
            if stale < ttl {
                return invalid(
                    key,
                    stale.to_string(),
                    "stale window must not be shorter than the TTL",
                );
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.upstream.retry_count,
            backoff_base: Duration::from_millis(self.upstream.backoff_base_ms),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
        }
    }

    /// Snapshot directory: `<data_dir>/snapshots`.
    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().data)
            .join("snapshots")
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    ConfigFile,
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Source of the values operators most often override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub file: ConfigSource,
    pub port: ConfigSource,
    pub bind: ConfigSource,
    pub api_bases: ConfigSource,
    pub data_dir: ConfigSource,
    pub timeout: ConfigSource,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Configuration after merging CLI, env, file and defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub path: PathBuf,
    pub sources: ConfigSources,
}

impl ResolvedConfig {
    /// Resolve and validate.
    ///
    /// # Errors
    ///
    /// Invalid config file, unparseable env override or failed validation.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        Self::resolve_with(cli, |key| std::env::var(key).ok())
    }

    /// Resolve with an injectable env lookup.
    ///
    /// # Errors
    ///
    /// See [`ResolvedConfig::resolve`].
    pub fn resolve_with<E>(cli: &CliOverrides, env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut sources = ConfigSources::default();

        let path = if let Some(path) = &cli.config_path {
            sources.file = ConfigSource::Cli;
            path.clone()
        } else if let Some(path) = env(ENV_CONFIG) {
            sources.file = ConfigSource::Env;
            PathBuf::from(path)
        } else {
            Config::config_path()
        };

        let file_present = path.exists();
        let mut config = Config::load_from(&path)?;
        let from_file = if file_present {
            ConfigSource::ConfigFile
        } else {
            ConfigSource::Default
        };
        sources.port = from_file;
        sources.bind = from_file;
        sources.api_bases = from_file;
        sources.data_dir = from_file;
        sources.timeout = from_file;

        if let Some(port) = env(ENV_PORT) {
            config.server.port = parse_env(ENV_PORT, &port)?;
            sources.port = ConfigSource::Env;
        }
        if let Some(bases) = env(ENV_API_BASES) {
            config.upstream.api_bases = bases
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(ToString::to_string)
                .collect();
            sources.api_bases = ConfigSource::Env;
        }
        if let Some(dir) = env(ENV_DATA_DIR) {
            config.storage.data_dir = Some(PathBuf::from(dir));
            sources.data_dir = ConfigSource::Env;
        }
        if let Some(timeout) = env(ENV_TIMEOUT) {
            config.upstream.timeout_secs = parse_env(ENV_TIMEOUT, &timeout)?;
            sources.timeout = ConfigSource::Env;
        }
        if let Some(count) = env(ENV_RETRY_COUNT) {
            config.upstream.retry_count = parse_env(ENV_RETRY_COUNT, &count)?;
        }
        if let Some(checks) = env(ENV_MAX_HEALTH_CHECKS) {
            config.health.max_checks = parse_env(ENV_MAX_HEALTH_CHECKS, &checks)?;
        }
        if let Some(workers) = env(ENV_PLAYER_WORKERS) {
            config.players.workers = parse_env(ENV_PLAYER_WORKERS, &workers)?;
        }
        if let Some(base) = env(ENV_EMBED_BASE) {
            config.health.embed_base = base;
        }
        if let Some(base) = env(ENV_CORE_API_BASE) {
            config.players.core_api_base = base;
        }
        if let Some(base) = env(ENV_SITE_API_BASE) {
            config.players.site_api_base = base;
        }

        if let Some(port) = cli.port {
            config.server.port = port;
            sources.port = ConfigSource::Cli;
        }
        if let Some(bind) = &cli.bind {
            config.server.bind.clone_from(bind);
            sources.bind = ConfigSource::Cli;
        }

        config.validate()?;
        Ok(Self {
            config,
            path,
            sources,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| MatchdayError::ConfigInvalid {
        key: key.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}
