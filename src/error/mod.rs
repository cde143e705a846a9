//! Error types for matchday.
//!
//! Uses `thiserror` for structured error types that map to exit codes and
//! HTTP outcomes.
//!
//! ## Error Taxonomy
//!
//! - **Network**: a single attempt failed (non-2xx, timeout, transport). These
//!   are transient and retried by the fetch layer.
//! - **Upstream**: every retry and every base URL was exhausted, or the payload
//!   could not be parsed.
//! - **Lookup**: a season, event or entity could not be resolved. Never retried.
//! - **Input**: malformed slug, source or parameter. Rejected before any
//!   network call.
//! - **Configuration**: config file parsing or validation.
//! - **Internal**: I/O, serialization and unclassified errors.
//!
//! Each error has a stable error code (e.g., `MD-U001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A single fetch attempt failed.
    Network,
    /// Upstream exhausted or returned garbage.
    Upstream,
    /// Requested resource does not exist.
    Lookup,
    /// Caller supplied bad input.
    Input,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Upstream => "Upstream error",
            Self::Lookup => "Lookup error",
            Self::Input => "Input error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Network => "N",
            Self::Upstream => "U",
            Self::Lookup => "L",
            Self::Input => "I",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Malformed arguments or unsupported league
    InvalidInput = 2,
    /// Config file could not be parsed or validated
    ConfigError = 3,
    /// Upstream unreachable after retries
    Upstream = 4,
    /// Season, event or entity not found
    NotFound = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for matchday operations.
#[derive(Error, Debug)]
pub enum MatchdayError {
    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// Request exceeded the per-attempt timeout.
    #[error("request timeout after {seconds}s for {url}")]
    Timeout { url: String, seconds: u64 },

    /// Transport failure (DNS, connect, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Upstream errors (Category: Upstream)
    // ==========================================================================
    /// Every attempt against the target failed.
    #[error("upstream unavailable after {attempts} attempt(s) for {target}: {message}")]
    UpstreamUnavailable {
        target: String,
        attempts: u32,
        status: Option<u16>,
        message: String,
    },

    /// Upstream payload did not have the expected shape.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Lookup errors (Category: Lookup)
    // ==========================================================================
    /// Entity addressed by slug or id does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// No season candidate resolved for the league.
    #[error("season {season} not found for {league}")]
    SeasonNotFound { league: String, season: String },

    /// Scoreboard had no event for the requested matchup.
    #[error("no {league} event matches the requested teams")]
    EventNotFound { league: String },

    /// Season resolved but the player index came back empty.
    #[error("no players available for {league} season {season}")]
    PlayersNotFound { league: String, season: String },

    // ==========================================================================
    // Input errors (Category: Input)
    // ==========================================================================
    /// Parameter failed validation.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// League is not one of the configured leagues.
    #[error("unsupported league: {0}")]
    UnsupportedLeague(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatchdayError {
    /// Map error to a CLI exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput { .. } | Self::UnsupportedLeague(_) => ExitCode::InvalidInput,
            Self::Config(_) | Self::ConfigInvalid { .. } => ExitCode::ConfigError,
            Self::Http { .. }
            | Self::Timeout { .. }
            | Self::Network(_)
            | Self::UpstreamUnavailable { .. }
            | Self::ParseResponse(_) => ExitCode::Upstream,
            Self::NotFound { .. }
            | Self::SeasonNotFound { .. }
            | Self::EventNotFound { .. }
            | Self::PlayersNotFound { .. } => ExitCode::NotFound,
            Self::Toml(_) => ExitCode::ConfigError,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { .. } | Self::Timeout { .. } | Self::Network(_) => ErrorCategory::Network,
            Self::UpstreamUnavailable { .. } | Self::ParseResponse(_) => ErrorCategory::Upstream,
            Self::NotFound { .. }
            | Self::SeasonNotFound { .. }
            | Self::EventNotFound { .. }
            | Self::PlayersNotFound { .. } => ErrorCategory::Lookup,
            Self::InvalidInput { .. } | Self::UnsupportedLeague(_) => ErrorCategory::Input,
            Self::Config(_) | Self::ConfigInvalid { .. } | Self::Toml(_) => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `MD-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Http { .. } => "MD-N001",
            Self::Timeout { .. } => "MD-N002",
            Self::Network(_) => "MD-N099",

            Self::UpstreamUnavailable { .. } => "MD-U001",
            Self::ParseResponse(_) => "MD-U002",

            Self::NotFound { .. } => "MD-L001",
            Self::SeasonNotFound { .. } => "MD-L002",
            Self::EventNotFound { .. } => "MD-L003",
            Self::PlayersNotFound { .. } => "MD-L004",

            Self::InvalidInput { .. } => "MD-I001",
            Self::UnsupportedLeague(_) => "MD-I002",

            Self::Config(_) => "MD-C001",
            Self::ConfigInvalid { .. } => "MD-C002",
            Self::Toml(_) => "MD-C003",

            Self::Io(_) => "MD-X001",
            Self::Json(_) => "MD-X002",
            Self::Other(_) => "MD-X099",
        }
    }

    /// Returns whether another attempt might succeed.
    ///
    /// Any non-2xx counts: upstream 404s during season rollover turn into
    /// 200s minutes later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Network(_)
        )
    }

    /// HTTP status of the last upstream response, if there was one.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::UpstreamUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the upstream answered 404.
    #[must_use]
    pub const fn is_upstream_not_found(&self) -> bool {
        matches!(self.upstream_status(), Some(404))
    }

    /// HTTP status used when this error reaches a route handler.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Lookup => 404,
            ErrorCategory::Input => 400,
            ErrorCategory::Network | ErrorCategory::Upstream => 502,
            ErrorCategory::Configuration | ErrorCategory::Internal => 500,
        }
    }

    /// Snake-case error identifier for JSON error payloads.
    #[must_use]
    pub const fn api_code(&self) -> &'static str {
        match self {
            Self::Http { .. }
            | Self::Timeout { .. }
            | Self::Network(_)
            | Self::UpstreamUnavailable { .. }
            | Self::ParseResponse(_) => "upstream_unavailable",
            Self::NotFound { .. } => "not_found",
            Self::SeasonNotFound { .. } => "season_not_found",
            Self::EventNotFound { .. } => "event_not_found",
            Self::PlayersNotFound { .. } => "players_not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnsupportedLeague(_) => "unsupported_league",
            Self::Config(_) | Self::ConfigInvalid { .. } | Self::Toml(_) => "configuration_error",
            Self::Io(_) | Self::Json(_) | Self::Other(_) => "internal_error",
        }
    }
}

/// Result type alias for matchday operations.
pub type Result<T> = std::result::Result<T, MatchdayError>;
