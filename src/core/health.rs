//! Stream source health probing, per-request probe budgets and ranking.
//!
//! A probe is a HEAD against the embed URL of a source, falling back to a
//! ranged GET when HEAD is rejected or fails without a status. Results are
//! cached process-wide; the number of live probes one inbound request may
//! trigger is capped by a [`Budget`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::header::{ACCEPT, RANGE};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};

use crate::core::freshness::{CachePolicy, FreshnessCache};
use crate::core::models::Source;
use crate::util::sanitize_slug;

/// Stream id used for cached health lookups.
pub const DEFAULT_STREAM: u32 = 1;

/// Error attached when the request ran out of live probes.
pub const BUDGET_EXHAUSTED: &str = "budget_exhausted";

/// Error attached when the source or slug sanitizes to nothing.
pub const INVALID_SOURCE_OR_SLUG: &str = "invalid_source_or_slug";

/// Default source preference, best first.
pub const DEFAULT_SOURCE_PREFERENCE: &[&str] =
    &["admin", "delta", "charlie", "echo", "golf", "alpha", "bravo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Unknown,
}

impl HealthStatus {
    /// Sort weight: up before unknown before down.
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Unknown => 1,
            Self::Down => 2,
        }
    }
}

/// Outcome of one probe of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub http_status: Option<u16>,
    pub latency_ms: Option<u64>,
    pub checked_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl HealthRecord {
    /// Synthetic record for sources skipped because the budget ran out.
    #[must_use]
    pub fn budget_exhausted() -> Self {
        Self {
            status: HealthStatus::Unknown,
            http_status: None,
            latency_ms: None,
            checked_at: None,
            error: Some(BUDGET_EXHAUSTED.to_string()),
        }
    }

    fn invalid_target() -> Self {
        Self {
            status: HealthStatus::Unknown,
            http_status: None,
            latency_ms: None,
            checked_at: Some(Utc::now()),
            error: Some(INVALID_SOURCE_OR_SLUG.to_string()),
        }
    }

    fn from_probe(outcome: ProbeOutcome) -> Self {
        Self {
            status: classify_health(outcome.status),
            http_status: outcome.status,
            latency_ms: Some(outcome.latency_ms),
            checked_at: Some(Utc::now()),
            error: outcome.error,
        }
    }
}

/// Map a probe's HTTP status to a health status.
///
/// 401 and 403 are access restrictions, not proof of an outage.
#[must_use]
pub const fn classify_health(http_status: Option<u16>) -> HealthStatus {
    match http_status {
        None | Some(401 | 403) => HealthStatus::Unknown,
        Some(code) if code < 400 => HealthStatus::Up,
        Some(_) => HealthStatus::Down,
    }
}

/// Raw result of [`Prober::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Live probes allowed while serving one inbound request.
///
/// The counter only ever decreases and never goes below zero.
#[derive(Debug)]
pub struct Budget {
    remaining: AtomicUsize,
}

impl Budget {
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
        }
    }

    /// Take one probe from the budget; false when exhausted.
    pub fn try_take(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Issues liveness probes against embed URLs.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    embed_base: String,
}

impl Prober {
    pub fn new(client: Client, embed_base: impl Into<String>) -> Self {
        Self {
            client,
            embed_base: embed_base.into(),
        }
    }

    /// HEAD `url`, retrying once with a ranged GET on 405 or a status-less failure.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let head = self.attempt(url, Method::HEAD).await;
        if head.status.is_none() || head.status == Some(405) {
            return self.attempt(url, Method::GET).await;
        }
        head
    }

    /// Probe `{embed_base}/{source}/{slug}/{stream}`.
    ///
    /// Returns an `unknown` record without touching the network when the
    /// source or slug sanitizes to nothing.
    pub async fn check_source(&self, source: &str, slug: &str, stream: u32) -> HealthRecord {
        let safe_source = sanitize_slug(source);
        let safe_slug = sanitize_slug(slug);
        if safe_source.is_empty() || safe_slug.is_empty() {
            return HealthRecord::invalid_target();
        }
        let url = format!(
            "{}/{safe_source}/{safe_slug}/{stream}",
            self.embed_base.trim_end_matches('/')
        );
        HealthRecord::from_probe(self.probe(&url).await)
    }

    async fn attempt(&self, url: &str, method: Method) -> ProbeOutcome {
        let start = Instant::now();
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "text/html,application/xhtml+xml");
        if method == Method::GET {
            request = request.header(RANGE, "bytes=0-1024");
        }
        let result = request.send().await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(response) => ProbeOutcome {
                status: Some(response.status().as_u16()),
                latency_ms,
                error: None,
            },
            Err(e) => ProbeOutcome {
                status: e.status().map(|s| s.as_u16()),
                latency_ms,
                error: Some(e.to_string()),
            },
        };
        tracing::debug!(
            url,
            method = %method,
            status = ?outcome.status,
            latency_ms,
            "Probed stream source"
        );
        outcome
    }
}

/// Process-wide health checking: prober, record cache and ranking preference.
pub struct SourceHealth {
    prober: Prober,
    cache: FreshnessCache<HealthRecord>,
    preference: Vec<String>,
    concurrency: usize,
}

impl SourceHealth {
    #[must_use]
    pub fn new(prober: Prober, ttl_secs: u64, preference: Vec<String>, concurrency: usize) -> Self {
        Self {
            prober,
            cache: FreshnessCache::new("health", CachePolicy::ttl_only(ttl_secs)),
            preference,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub const fn prober(&self) -> &Prober {
        &self.prober
    }

    #[must_use]
    pub fn preference(&self) -> &[String] {
        &self.preference
    }

    /// Attach a health record to every source.
    ///
    /// Budget decisions are made in input order; the granted live probes then
    /// run concurrently and are written back by position. A source listed
    /// twice shares one probe.
    pub async fn annotate(&self, sources: &[Source], budget: &Budget) -> Vec<Source> {
        let mut annotated = Vec::with_capacity(sources.len());
        let mut pending: Vec<(usize, String, String, String)> = Vec::new();
        let mut repeats: Vec<(usize, String)> = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            let mut entry = Source::new(source.source.clone(), source.id.clone());
            let key = entry.health_key(DEFAULT_STREAM);
            if let Some(hit) = self.cache.get(&key) {
                entry.health = Some((*hit.value).clone());
            } else if pending.iter().any(|(_, k, _, _)| *k == key) {
                repeats.push((index, key));
            } else if budget.try_take() {
                pending.push((index, key, entry.source.clone(), entry.id.clone()));
            } else {
                entry.health = Some(HealthRecord::budget_exhausted());
            }
            annotated.push(entry);
        }

        if pending.is_empty() {
            return annotated;
        }

        let workers = pending.len().min(self.concurrency);
        let probed: Vec<(usize, String, HealthRecord)> = stream::iter(pending)
            .map(|(index, key, name, id)| async move {
                let record = self.prober.check_source(&name, &id, DEFAULT_STREAM).await;
                (index, key, record)
            })
            .buffered(workers)
            .collect()
            .await;

        for (index, key, record) in &probed {
            self.cache.insert(key, record.clone());
            annotated[*index].health = Some(record.clone());
        }
        for (index, key) in repeats {
            annotated[index].health = probed
                .iter()
                .find(|(_, k, _)| *k == key)
                .map(|(_, _, record)| record.clone());
        }
        annotated
    }

    /// Annotate then rank.
    pub async fn annotate_and_rank(&self, sources: &[Source], budget: &Budget) -> Vec<Source> {
        let annotated = self.annotate(sources, budget).await;
        rank(annotated, &self.preference)
    }
}

/// Stable sort by `(health score, preference index)`.
///
/// Sources without a record score as unknown; names missing from
/// `preference` sort after every listed name.
#[must_use]
pub fn rank(mut sources: Vec<Source>, preference: &[String]) -> Vec<Source> {
    sources.sort_by_key(|source| {
        let health = source
            .health
            .as_ref()
            .map_or(HealthStatus::Unknown, |h| h.status)
            .score();
        let preferred = preference
            .iter()
            .position(|name| *name == source.source)
            .unwrap_or(preference.len());
        (health, preferred)
    });
    sources
}

/// [`DEFAULT_SOURCE_PREFERENCE`] as owned strings.
#[must_use]
pub fn default_preference() -> Vec<String> {
    DEFAULT_SOURCE_PREFERENCE
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_status(name: &str, status: HealthStatus) -> Source {
        let mut source = Source::new(name, format!("{name}-id"));
        source.health = Some(HealthRecord {
            status,
            http_status: None,
            latency_ms: None,
            checked_at: None,
            error: None,
        });
        source
    }

    #[test]
    fn classify_health_rules() {
        assert_eq!(classify_health(None), HealthStatus::Unknown);
        assert_eq!(classify_health(Some(200)), HealthStatus::Up);
        assert_eq!(classify_health(Some(302)), HealthStatus::Up);
        assert_eq!(classify_health(Some(401)), HealthStatus::Unknown);
        assert_eq!(classify_health(Some(403)), HealthStatus::Unknown);
        assert_eq!(classify_health(Some(404)), HealthStatus::Down);
        assert_eq!(classify_health(Some(503)), HealthStatus::Down);
    }

    #[test]
    fn healthy_source_outranks_preferred_one() {
        let ranked = rank(
            vec![
                with_status("bravo", HealthStatus::Up),
                with_status("admin", HealthStatus::Down),
            ],
            &default_preference(),
        );
        assert_eq!(ranked[0].source, "bravo");
    }

    #[test]
    fn preference_breaks_ties_and_unlisted_sort_last() {
        let ranked = rank(
            vec![
                Source::new("zulu", "1"),
                Source::new("alpha", "2"),
                Source::new("admin", "3"),
                Source::new("yankee", "4"),
            ],
            &default_preference(),
        );
        let names: Vec<_> = ranked.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["admin", "alpha", "zulu", "yankee"]);
    }

    #[test]
    fn missing_record_scores_as_unknown() {
        let ranked = rank(
            vec![
                with_status("admin", HealthStatus::Down),
                Source::new("delta", "x"),
            ],
            &default_preference(),
        );
        assert_eq!(ranked[0].source, "delta");
    }

    #[test]
    fn budget_never_goes_negative() {
        let budget = Budget::new(2);
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(!budget.try_take());
        assert!(!budget.try_take());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn budget_exhausted_record_shape() {
        let value = serde_json::to_value(HealthRecord::budget_exhausted()).unwrap();
        assert_eq!(value["status"], "unknown");
        assert!(value["httpStatus"].is_null());
        assert!(value["latencyMs"].is_null());
        assert!(value["checkedAt"].is_null());
        assert_eq!(value["error"], "budget_exhausted");
    }

    #[tokio::test]
    async fn repeated_source_is_checked_once() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/admin/x/1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/delta/y/1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let health = SourceHealth::new(
            Prober::new(Client::new(), server.uri()),
            60,
            default_preference(),
            4,
        );
        let budget = Budget::new(2);
        let sources = vec![
            Source::new("admin", "x"),
            Source::new("admin", "x"),
            Source::new("delta", "y"),
        ];
        let annotated = health.annotate(&sources, &budget).await;

        assert_eq!(budget.remaining(), 0);
        assert!(annotated.iter().all(|s| {
            s.health.as_ref().map(|h| h.status) == Some(HealthStatus::Up)
        }));
    }

    #[tokio::test]
    async fn invalid_target_skips_network() {
        let prober = Prober::new(Client::new(), "http://127.0.0.1:9");
        let record = prober.check_source("!!!", "slug", 1).await;
        assert_eq!(record.status, HealthStatus::Unknown);
        assert_eq!(record.error.as_deref(), Some(INVALID_SOURCE_OR_SLUG));
        assert!(record.checked_at.is_some());
    }
}
