//! Match directory feed: live and full match lists with base failover.

use std::path::Path;

use serde_json::Value;

use crate::core::freshness::{CachePolicy, CacheStatus, Cached, Fetched, FreshnessCache};
use crate::core::http::Fetcher;
use crate::core::models::{MatchDirectory, parse_match_list};
use crate::error::Result;
use crate::storage::snapshot::SnapshotStore;

pub const LIVE_PATH: &str = "/matches/live";
pub const ALL_PATH: &str = "/matches/all";

const CACHE_KEY: &str = "";

/// Fetches and caches the match directory.
pub struct MatchFeed {
    fetcher: Fetcher,
    bases: Vec<String>,
    cache: FreshnessCache<MatchDirectory>,
}

impl MatchFeed {
    #[must_use]
    pub fn new(fetcher: Fetcher, bases: Vec<String>, policy: CachePolicy) -> Self {
        Self {
            fetcher,
            bases,
            cache: FreshnessCache::new("games", policy),
        }
    }

    /// Feed whose cache survives restarts as `games_cache.json` in `dir`.
    #[must_use]
    pub fn persisted(
        fetcher: Fetcher,
        bases: Vec<String>,
        policy: CachePolicy,
        dir: &Path,
    ) -> Self {
        let store = SnapshotStore::new(dir, "games_cache");
        Self {
            fetcher,
            bases,
            cache: FreshnessCache::persisted("games", policy, store),
        }
    }

    #[must_use]
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// The directory, refreshed when older than the TTL.
    ///
    /// # Errors
    ///
    /// The upstream error when both lists cannot be fetched and no cached
    /// directory is within the stale window.
    pub async fn directory(&self, force: bool) -> Result<Cached<MatchDirectory>> {
        let refresh = || self.fetch();
        if force {
            self.cache.force_refresh(CACHE_KEY, refresh).await
        } else {
            self.cache.get_or_refresh(CACHE_KEY, refresh).await
        }
    }

    /// Last fetch, error and base for `/health`.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        self.cache.status(CACHE_KEY)
    }

    async fn fetch(&self) -> Result<Fetched<MatchDirectory>> {
        let ((live, live_base), (all, all_base)) = tokio::try_join!(
            self.fetcher
                .fetch_from_first_available::<Value>(&self.bases, LIVE_PATH),
            self.fetcher
                .fetch_from_first_available::<Value>(&self.bases, ALL_PATH),
        )?;
        let directory = MatchDirectory {
            live: parse_match_list(live),
            all: parse_match_list(all),
        };
        tracing::debug!(
            live = directory.live.len(),
            all = directory.all.len(),
            base = %live_base,
            "Match directory refreshed"
        );
        let base = if live_base.is_empty() { all_base } else { live_base };
        Ok(Fetched::new(directory).with_source(base))
    }
}
