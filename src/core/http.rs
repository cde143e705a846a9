//! HTTP client utilities.
//!
//! Provides the shared client and the bounded-retry, multi-base JSON fetcher
//! every upstream call goes through.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;

use crate::error::{MatchdayError, Result};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of attempts per URL.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(600);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("matchday/", env!("CARGO_PKG_VERSION"));

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| MatchdayError::Network(e.to_string()))
}

/// Retry schedule for one logical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_base: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_COUNT,
            backoff_base: DEFAULT_BACKOFF_BASE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Sleep after the zero-based attempt `attempt` fails: `base * 2^attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// JSON fetcher with per-attempt timeouts, exponential backoff and base failover.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// # Errors
    ///
    /// Returns error if the underlying client cannot be built.
    pub fn new(policy: RetryPolicy, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(policy.timeout, user_agent)?,
            policy,
        })
    }

    /// Shared client, reused by the stream prober.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch untyped JSON.
    ///
    /// # Errors
    ///
    /// See [`Fetcher::fetch_json`].
    pub async fn fetch_value(&self, url: &str) -> Result<serde_json::Value> {
        self.fetch_json(url).await
    }

    /// Fetch and decode JSON, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`MatchdayError::UpstreamUnavailable`] once every attempt has
    /// failed, carrying the last message and HTTP status.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let attempts = self.policy.attempts.max(1);
        let mut made = 0;
        let mut last_error = None;

        for attempt in 0..attempts {
            made += 1;
            match self.attempt(url).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    tracing::warn!(url, attempt = made, error = %e, "Fetch attempt failed");
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(escalate(url, made, last_error))
    }

    /// Try each base in order and return the first success with its base.
    ///
    /// # Errors
    ///
    /// Returns the last base's error when every base fails, or a config error
    /// when `bases` is empty.
    pub async fn fetch_from_first_available<T: DeserializeOwned>(
        &self,
        bases: &[String],
        path: &str,
    ) -> Result<(T, String)> {
        let mut last_error = None;
        for base in bases {
            let url = join_url(base, path);
            match self.fetch_json(&url).await {
                Ok(payload) => return Ok((payload, base.clone())),
                Err(e) => {
                    tracing::warn!(base = %base, path, error = %e, "Upstream base failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| MatchdayError::Config("no upstream base URLs configured".into())))
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let timeout = self.policy.timeout;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, &e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MatchdayError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(url, &e, timeout)
            } else {
                MatchdayError::ParseResponse(format!("{url}: {e}"))
            }
        })
    }
}

fn transport_error(url: &str, err: &reqwest::Error, timeout: Duration) -> MatchdayError {
    if err.is_timeout() {
        MatchdayError::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        MatchdayError::Network(err.to_string())
    }
}

fn escalate(url: &str, attempts: u32, last_error: Option<MatchdayError>) -> MatchdayError {
    match last_error {
        Some(e) => MatchdayError::UpstreamUnavailable {
            target: url.to_string(),
            attempts,
            status: e.upstream_status(),
            message: e.to_string(),
        },
        None => MatchdayError::UpstreamUnavailable {
            target: url.to_string(),
            attempts,
            status: None,
            message: "no attempt was made".into(),
        },
    }
}

/// `base` + `path` with exactly one slash between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            attempts: 4,
            backoff_base: Duration::from_millis(600),
            timeout: DEFAULT_TIMEOUT,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(600));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2400));
    }

    #[test]
    fn join_handles_slashes() {
        assert_eq!(join_url("https://a/api/", "/matches/live"), "https://a/api/matches/live");
        assert_eq!(join_url("https://a/api", "matches/all"), "https://a/api/matches/all");
    }

    #[test]
    fn escalation_keeps_last_status() {
        let err = escalate(
            "https://a/x",
            3,
            Some(MatchdayError::Http {
                url: "https://a/x".into(),
                status: 404,
            }),
        );
        assert!(err.is_upstream_not_found());
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn default_user_agent_names_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("matchday/"));
    }
}
