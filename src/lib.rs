//! matchday - resilient aggregator for live sports events, stream health and
//! player statistics.
//!
//! Upstream match directories and stats providers are fronted by freshness
//! caches with stale fallback; the results are served over HTTP and the CLI.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod server;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::App;
pub use error::{ExitCode, MatchdayError, Result};
