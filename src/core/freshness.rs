//! Freshness cache: get-or-refresh with a TTL and a stale-on-failure window.
//!
//! Every cached domain (games, teams, standings, player index, profiles,
//! stats, rendered pages) is one [`FreshnessCache`] instance owned by the
//! application and handed to the components that use it.
//!
//! # Semantics
//!
//! - An entry is *fresh* while `age <= ttl`; fresh entries are served without
//!   calling upstream.
//! - Otherwise the refresh function runs. Success replaces the entry wholesale
//!   (and persists it when the cache has a [`SnapshotStore`]).
//! - On failure, an entry with `age <= stale_ttl` is served with `stale = true`
//!   and the error recorded; anything older propagates the error.
//!
//! Locks guard only map reads and swaps. Refresh functions always run with no
//! lock held, so concurrent callers on the same expired key may each refresh;
//! readers never observe a partially replaced value.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;
use crate::storage::snapshot::{PersistedSnapshot, SnapshotStore};
use crate::util::time::age_secs;

/// TTL and stale window for one cache domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub stale_ttl: Duration,
}

impl CachePolicy {
    #[must_use]
    pub const fn from_secs(ttl: u64, stale_ttl: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl),
            stale_ttl: Duration::from_secs(stale_ttl),
        }
    }

    /// Policy with no stale window: expired entries never survive a failure.
    #[must_use]
    pub const fn ttl_only(ttl: u64) -> Self {
        Self::from_secs(ttl, ttl)
    }

    #[must_use]
    pub const fn is_fresh(&self, age_secs: u64) -> bool {
        age_secs <= self.ttl.as_secs()
    }

    /// Usable only as a fallback after a failed refresh.
    #[must_use]
    pub const fn is_usable_stale(&self, age_secs: u64) -> bool {
        age_secs > self.ttl.as_secs() && age_secs <= self.stale_ttl.as_secs()
    }
}

/// Result of a successful refresh, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct Fetched<V> {
    pub value: V,
    pub source: Option<String>,
}

impl<V> Fetched<V> {
    pub const fn new(value: V) -> Self {
        Self { value, source: None }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A value served by the cache together with its provenance.
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub captured_at: DateTime<Utc>,
    pub age_secs: u64,
    /// True when no refresh happened on this call.
    pub from_cache: bool,
    /// True when served past TTL because the refresh failed.
    pub stale: bool,
    pub last_error: Option<String>,
    pub source: Option<String>,
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            captured_at: self.captured_at,
            age_secs: self.age_secs,
            from_cache: self.from_cache,
            stale: self.stale,
            last_error: self.last_error.clone(),
            source: self.source.clone(),
        }
    }
}

/// Bookkeeping exposed by `/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub last_fetch: Option<i64>,
    pub last_error: Option<String>,
    pub last_source: Option<String>,
    pub age_secs: Option<u64>,
}

struct CacheEntry<V> {
    value: Arc<V>,
    captured_at: DateTime<Utc>,
    source: Option<String>,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            captured_at: self.captured_at,
            source: self.source.clone(),
        }
    }
}

struct Slot<V> {
    entry: Option<CacheEntry<V>>,
    last_error: Option<String>,
}

/// Keyed get-or-refresh cache with optional snapshot persistence.
pub struct FreshnessCache<V> {
    name: &'static str,
    policy: CachePolicy,
    slots: RwLock<HashMap<String, Slot<V>>>,
    store: Option<SnapshotStore>,
    hydrated: Mutex<HashSet<String>>,
    writer: Mutex<()>,
}

impl<V> FreshnessCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// In-memory cache.
    #[must_use]
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        Self {
            name,
            policy,
            slots: RwLock::new(HashMap::new()),
            store: None,
            hydrated: Mutex::new(HashSet::new()),
            writer: Mutex::new(()),
        }
    }

    /// Cache mirrored to snapshot files; hydrates lazily from disk per key.
    #[must_use]
    pub fn persisted(name: &'static str, policy: CachePolicy, store: SnapshotStore) -> Self {
        Self {
            store: Some(store),
            ..Self::new(name, policy)
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Fresh value for `key`, if any. Never calls upstream.
    pub fn get(&self, key: &str) -> Option<Cached<V>> {
        let now = Utc::now();
        self.current(key)
            .filter(|entry| self.policy.is_fresh(age_secs(entry.captured_at, now)))
            .map(|entry| self.hit(entry, now, false, None))
    }

    /// Current value regardless of age.
    pub fn peek(&self, key: &str) -> Option<Cached<V>> {
        let now = Utc::now();
        let stale_check = self.policy;
        self.current(key).map(|entry| {
            let stale = !stale_check.is_fresh(age_secs(entry.captured_at, now));
            let error = self.last_error(key);
            self.hit(entry, now, stale, error)
        })
    }

    /// Serve a fresh entry, else refresh with stale fallback.
    pub async fn get_or_refresh<F, Fut>(&self, key: &str, refresh: F) -> Result<Cached<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<V>>>,
    {
        self.resolve(key, false, refresh).await
    }

    /// Refresh regardless of freshness, still falling back to a usable entry.
    pub async fn force_refresh<F, Fut>(&self, key: &str, refresh: F) -> Result<Cached<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<V>>>,
    {
        self.resolve(key, true, refresh).await
    }

    /// Run `refresh` and store its value. Failures are recorded and returned.
    pub async fn refresh<F, Fut>(&self, key: &str, refresh: F) -> Result<Cached<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<V>>>,
    {
        match refresh().await {
            Ok(fetched) => Ok(self.store_value(key, fetched)),
            Err(err) => {
                self.record_error(key, err.to_string());
                Err(err)
            }
        }
    }

    async fn resolve<F, Fut>(&self, key: &str, force: bool, refresh: F) -> Result<Cached<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<V>>>,
    {
        let now = Utc::now();
        let current = self.current(key);

        if !force
            && let Some(entry) = &current
            && self.policy.is_fresh(age_secs(entry.captured_at, now))
        {
            tracing::trace!(cache = self.name, key, "Cache hit");
            return Ok(self.hit(entry.clone(), now, false, None));
        }

        match self.refresh(key, refresh).await {
            Ok(cached) => Ok(cached),
            Err(err) => {
                let Some(entry) = current else {
                    return Err(err);
                };
                let age = age_secs(entry.captured_at, now);
                if age > self.policy.stale_ttl.as_secs() {
                    tracing::warn!(
                        cache = self.name,
                        key,
                        age_secs = age,
                        error = %err,
                        "Refresh failed and cached value is beyond the stale window"
                    );
                    return Err(err);
                }
                let stale = self.policy.is_usable_stale(age);
                tracing::warn!(
                    cache = self.name,
                    key,
                    age_secs = age,
                    stale,
                    error = %err,
                    "Refresh failed; serving cached value"
                );
                Ok(self.hit(entry, now, stale, Some(err.to_string())))
            }
        }
    }

    /// Replace a value with a derived one, keeping its capture time.
    ///
    /// Used when a lazily computed part (e.g. the position index) is folded
    /// into an already cached value.
    pub fn amend<F>(&self, key: &str, derive: F) -> Option<Arc<V>>
    where
        F: FnOnce(&V) -> V,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let entry = slots.get_mut(key)?.entry.as_mut()?;
        let value = Arc::new(derive(&entry.value));
        entry.value = Arc::clone(&value);
        Some(value)
    }

    /// Store a value obtained outside of a refresh function.
    pub fn insert(&self, key: &str, value: V) -> Cached<V> {
        self.store_value(key, Fetched::new(value))
    }

    /// Insert a value as if it had been refreshed at `captured_at`.
    pub fn seed(&self, key: &str, value: V, captured_at: DateTime<Utc>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(
            key.to_string(),
            Slot {
                entry: Some(CacheEntry {
                    value: Arc::new(value),
                    captured_at,
                    source: None,
                }),
                last_error: None,
            },
        );
        self.mark_hydrated(key);
    }

    /// Last fetch time, last error and source for `key`.
    pub fn status(&self, key: &str) -> CacheStatus {
        let now = Utc::now();
        let entry = self.current(key);
        CacheStatus {
            last_fetch: entry.as_ref().map(|e| e.captured_at.timestamp()),
            last_error: self.last_error(key),
            last_source: entry.as_ref().and_then(|e| e.source.clone()),
            age_secs: entry.as_ref().map(|e| age_secs(e.captured_at, now)),
        }
    }

    fn hit(
        &self,
        entry: CacheEntry<V>,
        now: DateTime<Utc>,
        stale: bool,
        last_error: Option<String>,
    ) -> Cached<V> {
        Cached {
            age_secs: age_secs(entry.captured_at, now),
            value: entry.value,
            captured_at: entry.captured_at,
            from_cache: true,
            stale,
            last_error,
            source: entry.source,
        }
    }

    fn current(&self, key: &str) -> Option<CacheEntry<V>> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = slots.get(key).and_then(|slot| slot.entry.as_ref()) {
                return Some(entry.clone());
            }
        }
        self.hydrate(key)
    }

    fn hydrate(&self, key: &str) -> Option<CacheEntry<V>> {
        let store = self.store.as_ref()?;
        if !self.mark_hydrated(key) {
            return None;
        }
        let snapshot = store.load::<V>(key)?;
        tracing::debug!(
            cache = self.name,
            key,
            last_fetch = snapshot.last_fetch,
            "Hydrated from snapshot"
        );
        let entry = CacheEntry {
            captured_at: snapshot.captured_at(),
            value: Arc::new(snapshot.payload),
            source: snapshot.last_source,
        };
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(key.to_string()).or_insert(Slot {
            entry: None,
            last_error: snapshot.last_error,
        });
        Some(slot.entry.get_or_insert(entry).clone())
    }

    /// Returns true the first time `key` is marked.
    fn mark_hydrated(&self, key: &str) -> bool {
        self.hydrated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    fn store_value(&self, key: &str, fetched: Fetched<V>) -> Cached<V> {
        let entry = CacheEntry {
            value: Arc::new(fetched.value),
            captured_at: Utc::now(),
            source: fetched.source,
        };

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.mark_hydrated(key);
        {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            slots.insert(
                key.to_string(),
                Slot {
                    entry: Some(entry.clone()),
                    last_error: None,
                },
            );
        }
        if let Some(store) = &self.store {
            let snapshot = PersistedSnapshot {
                payload: &*entry.value,
                last_fetch: entry.captured_at.timestamp(),
                last_error: None,
                last_source: entry.source.clone(),
            };
            if let Err(e) = store.save(key, &snapshot) {
                tracing::warn!(cache = self.name, key, error = %e, "Failed to persist snapshot");
            }
        }

        Cached {
            value: entry.value,
            captured_at: entry.captured_at,
            age_secs: 0,
            from_cache: false,
            stale: false,
            last_error: None,
            source: entry.source,
        }
    }

    fn record_error(&self, key: &str, message: String) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(key.to_string())
            .or_insert(Slot {
                entry: None,
                last_error: None,
            })
            .last_error = Some(message);
    }

    fn last_error(&self, key: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.last_error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchdayError;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn upstream_down() -> MatchdayError {
        MatchdayError::UpstreamUnavailable {
            target: "https://upstream".into(),
            attempts: 3,
            status: Some(503),
            message: "HTTP 503".into(),
        }
    }

    fn ago(secs: i64) -> DateTime<Utc> {
        Utc::now() - ChronoDuration::seconds(secs)
    }

    #[test]
    fn policy_boundaries() {
        let p = CachePolicy::from_secs(30, 600);
        assert!(p.is_fresh(30));
        assert!(!p.is_fresh(31));
        assert!(!p.is_usable_stale(30));
        assert!(p.is_usable_stale(31));
        assert!(p.is_usable_stale(600));
        assert!(!p.is_usable_stale(601));
    }

    #[tokio::test]
    async fn fresh_entry_skips_refresh() {
        let cache = FreshnessCache::new("games", CachePolicy::from_secs(30, 600));
        cache.seed("k", "cached".to_string(), ago(5));
        let calls = AtomicUsize::new(0);

        let got = cache
            .get_or_refresh("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::new("new".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(*got.value, "cached");
        assert!(got.from_cache);
        assert!(!got.stale);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_entry_refreshes() {
        let cache = FreshnessCache::new("games", CachePolicy::from_secs(30, 600));
        cache.seed("k", "old".to_string(), ago(45));

        let got = cache
            .get_or_refresh("k", || async {
                Ok(Fetched::new("new".to_string()).with_source("https://a"))
            })
            .await
            .unwrap();

        assert_eq!(*got.value, "new");
        assert!(!got.from_cache);
        assert_eq!(got.age_secs, 0);
        assert_eq!(got.source.as_deref(), Some("https://a"));
    }

    #[tokio::test]
    async fn failed_refresh_within_stale_window_serves_stale() {
        let cache = FreshnessCache::new("games", CachePolicy::from_secs(30, 600));
        cache.seed("k", "old".to_string(), ago(45));

        let got = cache
            .get_or_refresh("k", || async { Err(upstream_down()) })
            .await
            .unwrap();

        assert_eq!(*got.value, "old");
        assert!(got.stale);
        assert!(got.age_secs >= 45);
        assert!(got.last_error.unwrap().contains("503"));
        assert!(cache.status("k").last_error.is_some());
    }

    #[tokio::test]
    async fn failed_refresh_beyond_stale_window_propagates() {
        let cache = FreshnessCache::new("games", CachePolicy::from_secs(30, 40));
        cache.seed("k", "old".to_string(), ago(45));

        let err = cache
            .get_or_refresh("k", || async { Err(upstream_down()) })
            .await
            .unwrap_err();

        assert!(matches!(err, MatchdayError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn failed_refresh_without_prior_value_propagates() {
        let cache: FreshnessCache<String> =
            FreshnessCache::new("teams", CachePolicy::from_secs(30, 600));
        assert!(
            cache
                .get_or_refresh("k", || async { Err(upstream_down()) })
                .await
                .is_err()
        );
        assert!(cache.status("k").last_error.is_some());
    }

    #[tokio::test]
    async fn forced_refresh_failure_keeps_fresh_value_not_stale() {
        let cache = FreshnessCache::new("games", CachePolicy::from_secs(30, 600));
        cache.seed("k", "cached".to_string(), ago(5));

        let got = cache
            .force_refresh("k", || async { Err(upstream_down()) })
            .await
            .unwrap();

        assert_eq!(*got.value, "cached");
        assert!(!got.stale);
        assert!(got.last_error.is_some());
    }

    #[tokio::test]
    async fn refresh_persists_and_new_instance_hydrates() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), "teams");
        let cache =
            FreshnessCache::persisted("teams", CachePolicy::from_secs(60, 600), store.clone());

        cache
            .get_or_refresh("nfl", || async {
                Ok(Fetched::new(vec!["BUF".to_string()]).with_source("https://espn"))
            })
            .await
            .unwrap();
        assert!(store.path_for("nfl").exists());

        let restarted: FreshnessCache<Vec<String>> =
            FreshnessCache::persisted("teams", CachePolicy::from_secs(60, 600), store);
        let got = restarted.get("nfl").expect("hydrated from snapshot");
        assert_eq!(*got.value, vec!["BUF".to_string()]);
        assert!(got.from_cache);
        assert_eq!(restarted.status("nfl").last_source.as_deref(), Some("https://espn"));
    }

    #[tokio::test]
    async fn failed_refresh_does_not_touch_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), "games");
        let cache =
            FreshnessCache::persisted("games", CachePolicy::from_secs(0, 600), store.clone());
        cache
            .refresh("", || async { Ok(Fetched::new(1_u32)) })
            .await
            .unwrap();
        let before = std::fs::read(store.path_for("")).unwrap();

        let _ = cache.refresh("", || async { Err(upstream_down()) }).await;

        assert_eq!(std::fs::read(store.path_for("")).unwrap(), before);
    }

    #[test]
    fn amend_keeps_capture_time() {
        let cache = FreshnessCache::new("index", CachePolicy::ttl_only(3600));
        let captured = ago(100);
        cache.seed("nfl:current", vec![1, 2], captured);

        let amended = cache.amend("nfl:current", |v| {
            let mut v = v.clone();
            v.push(3);
            v
        });

        assert_eq!(*amended.unwrap(), vec![1, 2, 3]);
        let peeked = cache.peek("nfl:current").unwrap();
        assert_eq!(*peeked.value, vec![1, 2, 3]);
        assert_eq!(peeked.captured_at, captured);
        assert!(cache.amend("missing", Clone::clone).is_none());
    }

    #[test]
    fn get_ignores_expired_entries() {
        let cache = FreshnessCache::new("stats", CachePolicy::ttl_only(60));
        cache.seed("k", 1_u8, ago(61));
        assert!(cache.get("k").is_none());
        assert!(cache.peek("k").unwrap().stale);
    }

    #[test]
    fn blocking_callers_can_drive_refresh() {
        let cache = FreshnessCache::new("stats", CachePolicy::ttl_only(60));
        let refresh = cache.get_or_refresh("k", || async { Ok(Fetched::new(7_u8)) });
        let got = tokio_test::block_on(refresh).unwrap();
        assert_eq!(*got.value, 7);
    }
}
