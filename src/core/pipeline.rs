//! Player aggregation pipeline.
//!
//! Walks season -> teams -> rosters -> athletes -> statistics over the
//! reference graph with bounded fan-out, and renders one page of athletes (or
//! one leader category) into schema-driven rows.
//!
//! Every fan-out runs through `buffered(n)` with `n = min(workers, items)`,
//! so rows come back in input order regardless of completion order. A failed
//! roster, profile, team or statistics fetch is logged and skipped; it never
//! fails the aggregate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::freshness::{CachePolicy, Cached, Fetched, FreshnessCache};
use crate::core::league::League;
use crate::core::refs::{
    AthletePayload, CoreApi, LeaderEntryPayload, LeadersPayload, RefLink, SeasonSelector,
    TeamPayload, extract_id_from_ref, normalize_ref,
};
use crate::core::schema::{
    StatMode, StatSchema, StatisticsPayload, TableView, extract_row, leader_schema, table_schema,
};
use crate::error::{MatchdayError, Result};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 50;
pub const MIN_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 200;
pub const DEFAULT_LEADER_LIMIT: usize = 5;
pub const MAX_LEADER_LIMIT: usize = 25;
pub const DEFAULT_SEASON_TYPE: &str = "2";
pub const DEFAULT_WORKERS: usize = 8;

// =============================================================================
// Query parameters
// =============================================================================

/// `page=`: at least 1, defaulting to 1.
#[must_use]
pub fn parse_page(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PAGE)
        .max(1)
}

/// `perPage=`: clamped to `10..=200`, defaulting to 50.
#[must_use]
pub fn parse_per_page(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(MIN_PER_PAGE, MAX_PER_PAGE)
}

/// `limit=` for leaders: clamped to `1..=25`, defaulting to 5.
#[must_use]
pub fn parse_leader_limit(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LEADER_LIMIT)
        .clamp(1, MAX_LEADER_LIMIT)
}

/// `position=` filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PositionFilter {
    All,
    /// Uppercased position abbreviation.
    Only(String),
}

impl PositionFilter {
    /// Empty, `all`, `any` and `all positions` mean no filter.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        let raw = value.map(str::trim).unwrap_or_default();
        match raw.to_lowercase().as_str() {
            "" | "all" | "any" | "all positions" => Self::All,
            _ => Self::Only(raw.to_uppercase()),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(position) => position,
        }
    }
}

/// One `/players` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerQuery {
    pub league: League,
    pub season: SeasonSelector,
    pub view: TableView,
    pub mode: StatMode,
    pub position: PositionFilter,
    pub page: usize,
    pub per_page: usize,
}

impl PlayerQuery {
    #[must_use]
    pub const fn new(league: League) -> Self {
        Self {
            league,
            season: SeasonSelector::Current,
            view: TableView::Standard,
            mode: StatMode::Hitting,
            position: PositionFilter::All,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    fn index_key(&self) -> String {
        format!("{}:{}", self.league.key(), self.season.key())
    }

    /// `league:season:view:mode:position:page:perPage`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.league.key(),
            self.season.key(),
            self.view.as_str(),
            self.mode.as_str(),
            self.position.key(),
            self.page,
            self.per_page
        )
    }
}

/// One `/leaders` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadersQuery {
    pub league: League,
    pub season: SeasonSelector,
    pub season_type: String,
    pub limit: usize,
    pub mode: StatMode,
}

impl LeadersQuery {
    #[must_use]
    pub fn new(league: League) -> Self {
        Self {
            league,
            season: SeasonSelector::Current,
            season_type: DEFAULT_SEASON_TYPE.to_string(),
            limit: DEFAULT_LEADER_LIMIT,
            mode: StatMode::Hitting,
        }
    }

    /// `league:season:type:limit:mode`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.league.key(),
            self.season.key(),
            self.season_type,
            self.limit,
            self.mode.as_str()
        )
    }
}

// =============================================================================
// Index
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerIndexEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSource {
    #[serde(default)]
    pub teams: Option<String>,
}

/// Every athlete rostered in one season.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIndex {
    pub season: String,
    pub athletes: Vec<PlayerIndexEntry>,
    /// Built on the first position-filtered request; `None` until then.
    #[serde(default)]
    pub position_index: Option<BTreeMap<String, Vec<PlayerIndexEntry>>>,
    #[serde(default)]
    pub source: IndexSource,
}

impl PlayerIndex {
    #[must_use]
    pub fn with_positions(&self, positions: BTreeMap<String, Vec<PlayerIndexEntry>>) -> Self {
        Self {
            position_index: Some(positions),
            ..self.clone()
        }
    }

    /// Entries matching `filter`, in index order.
    #[must_use]
    pub fn entries(&self, filter: &PositionFilter) -> &[PlayerIndexEntry] {
        match filter {
            PositionFilter::All => &self.athletes,
            PositionFilter::Only(position) => self
                .position_index
                .as_ref()
                .and_then(|positions| positions.get(position))
                .map_or(&[], Vec::as_slice),
        }
    }
}

fn entry_order(entry: &PlayerIndexEntry) -> (u8, u64, &str) {
    match entry.id.as_deref().and_then(|id| id.parse::<u64>().ok()) {
        Some(id) => (0, id, ""),
        None => (1, 0, entry.reference.as_str()),
    }
}

/// Merge roster ref lists into deduplicated, ordered index entries.
///
/// Athletes are keyed by their numeric id, else by the raw ref. Entries sort
/// by numeric id; entries without one follow, ordered by ref.
#[must_use]
pub fn merge_rosters<I>(rosters: I) -> Vec<PlayerIndexEntry>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for reference in rosters.into_iter().flatten() {
        let reference = normalize_ref(&reference);
        if reference.is_empty() {
            continue;
        }
        let id = extract_id_from_ref(&reference, "athletes");
        let key = id.clone().unwrap_or_else(|| reference.clone());
        if !seen.insert(key) {
            continue;
        }
        entries.push(PlayerIndexEntry {
            id,
            reference,
            position: None,
        });
    }
    entries.sort_by(|a, b| entry_order(a).cmp(&entry_order(b)));
    entries
}

/// Slice of entries for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice {
    pub entries: Vec<PlayerIndexEntry>,
    pub total: usize,
    /// Requested page clamped to `1..=max_page`.
    pub page: usize,
    pub start_rank: usize,
}

/// Take page `page` of `entries`, clamping past-the-end pages to the last one.
#[must_use]
pub fn select_page(entries: &[PlayerIndexEntry], page: usize, per_page: usize) -> PageSlice {
    let per_page = per_page.max(1);
    let total = entries.len();
    let max_page = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, max_page);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);
    PageSlice {
        entries: entries.get(start..end).unwrap_or_default().to_vec(),
        total,
        page,
        start_rank: start + 1,
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Athlete fields the tables need, distilled from the athlete resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub short_name: Option<String>,
    pub headshot: Option<String>,
    pub position: Option<String>,
    pub team_ref: Option<String>,
    pub stats_ref: Option<String>,
}

impl From<AthletePayload> for PlayerProfile {
    fn from(payload: AthletePayload) -> Self {
        let position = payload
            .position
            .and_then(|p| p.abbreviation.or(p.short_name).or(p.name));
        let headshot = match payload.headshot {
            Some(Value::Object(map)) => map.get("href").and_then(Value::as_str).map(String::from),
            Some(Value::String(href)) => Some(href),
            _ => None,
        };
        Self {
            id: payload.id,
            short_name: payload.short_name.or_else(|| payload.display_name.clone()),
            display_name: payload.display_name.or(payload.full_name),
            headshot,
            position,
            team_ref: payload.team.as_ref().and_then(RefLink::url),
            stats_ref: payload.statistics.as_ref().and_then(RefLink::url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AthleteSummary {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub short_name: Option<String>,
    pub headshot: Option<String>,
    pub position: Option<String>,
}

impl From<&PlayerProfile> for AthleteSummary {
    fn from(profile: &PlayerProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            short_name: profile.short_name.clone(),
            headshot: profile.headshot.clone(),
            position: profile.position.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: Option<String>,
    pub abbreviation: Option<String>,
    pub display_name: Option<String>,
    pub logo: Option<String>,
}

impl From<&TeamPayload> for TeamSummary {
    fn from(team: &TeamPayload) -> Self {
        Self {
            id: team.id.clone(),
            abbreviation: team.abbreviation.clone(),
            display_name: team.display_name.clone(),
            logo: team.best_logo(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRow {
    pub rank: usize,
    pub athlete: Option<AthleteSummary>,
    pub team: Option<TeamSummary>,
    pub stats: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnHeader {
    pub key: String,
    pub label: String,
}

fn column_headers(schema: &StatSchema) -> Vec<ColumnHeader> {
    schema
        .columns
        .iter()
        .map(|c| ColumnHeader {
            key: c.key.to_string(),
            label: c.label.to_string(),
        })
        .collect()
}

/// Provenance block of a table response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta<S> {
    pub source: S,
    pub cache_age_sec: u64,
    pub stale: bool,
    pub from_cache: bool,
}

impl<S> TableMeta<S> {
    fn stamp<V>(&mut self, cached: &Cached<V>) {
        if cached.from_cache {
            self.cache_age_sec = cached.age_secs;
            self.from_cache = true;
        }
        self.stale |= cached.stale;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerTableBody {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<PlayerRow>,
}

/// `/players` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTable {
    pub league: League,
    pub season: String,
    pub view: TableView,
    /// Only MLB distinguishes modes.
    pub mode: Option<StatMode>,
    pub position: String,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub table: PlayerTableBody,
    pub meta: TableMeta<IndexSource>,
}

impl PlayerTable {
    /// The payload with its meta reflecting how `cached` was served.
    #[must_use]
    pub fn served(cached: &Cached<Self>) -> Self {
        let mut table = cached.value.as_ref().clone();
        table.meta.stamp(cached);
        table
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderCategorySummary {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub abbreviation: Option<String>,
    pub leaders: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderTableBody {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<PlayerRow>,
    pub category: Option<String>,
}

/// `/leaders` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadersTable {
    pub league: League,
    pub season: String,
    pub season_type: String,
    pub limit: usize,
    pub mode: StatMode,
    pub categories: Vec<LeaderCategorySummary>,
    pub table: Option<LeaderTableBody>,
    pub meta: TableMeta<Option<String>>,
}

impl LeadersTable {
    #[must_use]
    pub fn served(cached: &Cached<Self>) -> Self {
        let mut table = cached.value.as_ref().clone();
        table.meta.stamp(cached);
        table
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// TTLs (seconds) and pool size for the player pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub workers: usize,
    pub index_ttl: u64,
    pub profile_ttl: u64,
    pub stats_ttl: u64,
    pub page_ttl: u64,
    pub leaders_ttl: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            index_ttl: 3600,
            profile_ttl: 3600,
            stats_ttl: 900,
            page_ttl: 120,
            leaders_ttl: 900,
        }
    }
}

pub struct PlayerPipeline {
    api: CoreApi,
    workers: usize,
    index: FreshnessCache<PlayerIndex>,
    profiles: FreshnessCache<PlayerProfile>,
    teams: FreshnessCache<TeamPayload>,
    stats: FreshnessCache<StatisticsPayload>,
    pages: FreshnessCache<PlayerTable>,
    leaders: FreshnessCache<LeadersTable>,
}

impl PlayerPipeline {
    #[must_use]
    pub fn new(api: CoreApi, options: PipelineOptions) -> Self {
        Self {
            api,
            workers: options.workers.max(1),
            index: FreshnessCache::new("player_index", CachePolicy::ttl_only(options.index_ttl)),
            profiles: FreshnessCache::new(
                "player_profile",
                CachePolicy::ttl_only(options.profile_ttl),
            ),
            teams: FreshnessCache::new("player_team", CachePolicy::ttl_only(options.profile_ttl)),
            stats: FreshnessCache::new("player_stats", CachePolicy::ttl_only(options.stats_ttl)),
            pages: FreshnessCache::new("player_page", CachePolicy::ttl_only(options.page_ttl)),
            leaders: FreshnessCache::new("leaders", CachePolicy::ttl_only(options.leaders_ttl)),
        }
    }

    #[must_use]
    pub const fn api(&self) -> &CoreApi {
        &self.api
    }

    fn pool_size(&self, items: usize) -> usize {
        self.workers.min(items).max(1)
    }

    /// Player table for one page, served from the page cache when fresh.
    ///
    /// # Errors
    ///
    /// `SeasonNotFound` or `PlayersNotFound` when the season has no athletes,
    /// or the upstream error when the index cannot be built.
    pub async fn player_table(
        &self,
        query: &PlayerQuery,
        force: bool,
    ) -> Result<Cached<PlayerTable>> {
        let key = query.cache_key();
        let build = || self.build_table(query);
        if force {
            self.pages.force_refresh(&key, build).await
        } else {
            self.pages.get_or_refresh(&key, build).await
        }
    }

    async fn build_table(&self, query: &PlayerQuery) -> Result<Fetched<PlayerTable>> {
        let index = self.player_index(query.league, &query.season).await?;
        let mut current = Arc::clone(&index.value);
        if matches!(query.position, PositionFilter::Only(_)) {
            current = self.with_position_index(&query.index_key(), current).await;
        }

        let slice = select_page(current.entries(&query.position), query.page, query.per_page);
        let schema = table_schema(query.league, query.mode, query.view);
        let rows = self.build_rows(&slice, schema).await;

        tracing::debug!(
            league = %query.league,
            season = %current.season,
            page = slice.page,
            rows = rows.len(),
            "Built player table"
        );

        let table = PlayerTable {
            league: query.league,
            season: current.season.clone(),
            view: query.view,
            mode: (query.league == League::Mlb).then_some(query.mode),
            position: query.position.key().to_string(),
            page: slice.page,
            per_page: query.per_page,
            total: slice.total,
            table: PlayerTableBody {
                columns: column_headers(schema),
                rows,
            },
            meta: TableMeta {
                source: current.source.clone(),
                cache_age_sec: index.age_secs,
                stale: index.stale,
                from_cache: index.from_cache,
            },
        };
        let mut fetched = Fetched::new(table);
        if let Some(url) = &current.source.teams {
            fetched = fetched.with_source(url.clone());
        }
        Ok(fetched)
    }

    async fn build_rows(&self, slice: &PageSlice, schema: &'static StatSchema) -> Vec<PlayerRow> {
        let start_rank = slice.start_rank;
        stream::iter(slice.entries.iter().cloned().enumerate())
            .map(|(offset, entry)| async move {
                self.build_row(start_rank + offset, &entry, schema).await
            })
            .buffered(self.pool_size(slice.entries.len()))
            .filter_map(std::future::ready)
            .collect()
            .await
    }

    /// Row for one athlete, or `None` when the profile cannot be resolved.
    async fn build_row(
        &self,
        rank: usize,
        entry: &PlayerIndexEntry,
        schema: &'static StatSchema,
    ) -> Option<PlayerRow> {
        let profile = self.profile(&entry.reference).await?;
        let team = match profile.team_ref.as_deref() {
            Some(reference) => self.team(reference).await,
            None => None,
        };
        let stats = match profile.stats_ref.as_deref() {
            Some(reference) => self.statistics(reference).await,
            None => None,
        };
        let categories = stats.as_deref().map_or(&[][..], StatisticsPayload::categories);
        Some(PlayerRow {
            rank,
            athlete: Some(AthleteSummary::from(profile.as_ref())),
            team: team.as_deref().map(TeamSummary::from),
            stats: extract_row(categories, schema),
        })
    }

    /// Season player index, cached per `league:season`.
    ///
    /// # Errors
    ///
    /// See [`PlayerPipeline::player_table`].
    pub async fn player_index(
        &self,
        league: League,
        season: &SeasonSelector,
    ) -> Result<Cached<PlayerIndex>> {
        let key = format!("{}:{}", league.key(), season.key());
        self.index
            .get_or_refresh(&key, || self.resolve_index(league, season))
            .await
    }

    async fn resolve_index(
        &self,
        league: League,
        season: &SeasonSelector,
    ) -> Result<Fetched<PlayerIndex>> {
        let candidates = self.api.season_candidates(league, season).await?;
        if candidates.is_empty() {
            return Err(season_not_found(league, season));
        }

        let mut last_error: Option<MatchdayError> = None;
        for year in candidates {
            match self.build_index(league, &year).await {
                Ok(index) if !index.athletes.is_empty() => {
                    tracing::info!(
                        league = %league,
                        season = %year,
                        athletes = index.athletes.len(),
                        "Built player index"
                    );
                    let source = index.source.teams.clone().unwrap_or_default();
                    return Ok(Fetched::new(index).with_source(source));
                }
                Ok(_) => {
                    tracing::debug!(league = %league, season = %year, "Season has no athletes");
                }
                Err(e) if e.is_upstream_not_found() => {
                    if !season.is_current() {
                        return Err(season_not_found(league, season));
                    }
                    tracing::debug!(
                        league = %league,
                        season = %year,
                        "Season not found; trying next"
                    );
                    last_error = Some(e);
                }
                Err(e) if e.upstream_status().is_some() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        league = %league,
                        season = %year,
                        error = %e,
                        "Failed to build player index; trying next season"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) if e.is_upstream_not_found() => season_not_found(league, season),
            Some(e) => e,
            None => MatchdayError::PlayersNotFound {
                league: league.key().to_string(),
                season: season.key().to_string(),
            },
        })
    }

    /// Build the index for one season year.
    ///
    /// A roster that fails to load is skipped.
    ///
    /// # Errors
    ///
    /// Fails only when the season's team list cannot be fetched.
    pub async fn build_index(&self, league: League, year: &str) -> Result<PlayerIndex> {
        let (team_refs, url) = self.api.team_refs(league, year).await?;
        let team_ids: Vec<String> = team_refs
            .iter()
            .filter_map(|r| extract_id_from_ref(r, "teams"))
            .collect();

        let rosters: Vec<Vec<String>> = stream::iter(team_ids.iter().cloned())
            .map(|team_id| async move {
                match self.api.roster_refs(league, year, &team_id).await {
                    Ok(refs) => refs,
                    Err(e) => {
                        tracing::warn!(
                            league = %league,
                            season = year,
                            team_id = %team_id,
                            error = %e,
                            "Failed to fetch roster; skipping team"
                        );
                        Vec::new()
                    }
                }
            })
            .buffered(self.pool_size(team_ids.len()))
            .collect()
            .await;

        Ok(PlayerIndex {
            season: year.to_string(),
            athletes: merge_rosters(rosters),
            position_index: None,
            source: IndexSource { teams: Some(url) },
        })
    }

    /// Index with its position map, building and caching the map on first use.
    async fn with_position_index(&self, key: &str, index: Arc<PlayerIndex>) -> Arc<PlayerIndex> {
        if index.position_index.is_some() {
            return index;
        }

        let resolved: Vec<PlayerIndexEntry> = stream::iter(index.athletes.iter().cloned())
            .map(|entry| async move {
                if entry.position.is_some() {
                    return entry;
                }
                let position = self
                    .profile(&entry.reference)
                    .await
                    .and_then(|p| p.position.clone());
                PlayerIndexEntry { position, ..entry }
            })
            .buffered(self.pool_size(index.athletes.len()))
            .collect()
            .await;

        let mut positions: BTreeMap<String, Vec<PlayerIndexEntry>> = BTreeMap::new();
        for entry in resolved {
            if let Some(position) = entry.position.as_deref().map(str::to_uppercase) {
                positions.entry(position).or_default().push(entry);
            }
        }
        tracing::debug!(key, positions = positions.len(), "Built position index");

        match self
            .index
            .amend(key, |current| current.with_positions(positions.clone()))
        {
            Some(amended) => amended,
            None => Arc::new(index.with_positions(positions)),
        }
    }

    /// Season leaders, served from the leaders cache when fresh.
    ///
    /// # Errors
    ///
    /// `SeasonNotFound` when no candidate season has leaders, or the upstream
    /// error.
    pub async fn leaders(&self, query: &LeadersQuery, force: bool) -> Result<Cached<LeadersTable>> {
        let key = query.cache_key();
        let build = || self.build_leaders(query);
        if force {
            self.leaders.force_refresh(&key, build).await
        } else {
            self.leaders.get_or_refresh(&key, build).await
        }
    }

    async fn build_leaders(&self, query: &LeadersQuery) -> Result<Fetched<LeadersTable>> {
        let candidates = self.api.season_candidates(query.league, &query.season).await?;

        let mut found = None;
        for year in candidates {
            let url = self.api.leaders_url(query.league, &year, &query.season_type);
            match self.api.resource::<LeadersPayload>(&url).await {
                Ok(payload) => {
                    found = Some((year, url, payload));
                    break;
                }
                Err(e) if e.is_upstream_not_found() && query.season.is_current() => {
                    tracing::debug!(
                        league = %query.league,
                        season = %year,
                        "No leaders; trying next season"
                    );
                }
                Err(e) if e.is_upstream_not_found() => break,
                Err(e) => return Err(e),
            }
        }
        let Some((season, url, payload)) = found else {
            return Err(season_not_found(query.league, &query.season));
        };

        let schema = leader_schema(query.league, query.mode);
        let wanted = schema.leader_category.map(|c| c.trim().to_lowercase());
        let primary = payload
            .categories
            .iter()
            .find(|c| {
                c.name.as_deref().map(|n| n.trim().to_lowercase()) == wanted && wanted.is_some()
            })
            .or_else(|| payload.categories.first());

        let categories = payload
            .categories
            .iter()
            .map(|c| LeaderCategorySummary {
                name: c.name.clone(),
                display_name: c.display_name.clone().or_else(|| c.short_display_name.clone()),
                abbreviation: c.abbreviation.clone(),
                leaders: Vec::new(),
            })
            .collect();

        let table = match primary {
            Some(category) => {
                let entries: Vec<LeaderEntryPayload> =
                    category.leaders.iter().take(query.limit).cloned().collect();
                let pool = self.pool_size(entries.len());
                let rows: Vec<PlayerRow> = stream::iter(entries.into_iter().enumerate())
                    .map(|(offset, entry)| async move {
                        self.build_leader_row(offset + 1, &entry, schema).await
                    })
                    .buffered(pool)
                    .collect()
                    .await;
                (!rows.is_empty() && !schema.columns.is_empty()).then(|| LeaderTableBody {
                    columns: column_headers(schema),
                    rows,
                    category: category.name.clone(),
                })
            }
            None => None,
        };

        let leaders = LeadersTable {
            league: query.league,
            season,
            season_type: query.season_type.clone(),
            limit: query.limit,
            mode: query.mode,
            categories,
            table,
            meta: TableMeta {
                source: Some(url.clone()),
                cache_age_sec: 0,
                stale: false,
                from_cache: false,
            },
        };
        Ok(Fetched::new(leaders).with_source(url))
    }

    async fn build_leader_row(
        &self,
        rank: usize,
        entry: &LeaderEntryPayload,
        schema: &'static StatSchema,
    ) -> PlayerRow {
        let athlete = match entry.athlete.as_ref().and_then(RefLink::url) {
            Some(reference) => self.profile(&reference).await,
            None => None,
        };
        let mut team = match entry.team.as_ref().and_then(RefLink::url) {
            Some(reference) => self.team(&reference).await,
            None => None,
        };
        if team.is_none()
            && let Some(reference) = athlete.as_ref().and_then(|a| a.team_ref.clone())
        {
            team = self.team(&reference).await;
        }
        let stats = match entry.statistics.as_ref().and_then(RefLink::url) {
            Some(reference) => self.statistics(&reference).await,
            None => None,
        };
        let categories = stats.as_deref().map_or(&[][..], StatisticsPayload::categories);
        PlayerRow {
            rank,
            athlete: athlete.as_deref().map(AthleteSummary::from),
            team: team.as_deref().map(TeamSummary::from),
            stats: extract_row(categories, schema),
        }
    }

    async fn profile(&self, reference: &str) -> Option<Arc<PlayerProfile>> {
        self.lookup(&self.profiles, reference, <PlayerProfile as From<AthletePayload>>::from)
            .await
    }

    async fn team(&self, reference: &str) -> Option<Arc<TeamPayload>> {
        self.lookup(&self.teams, reference, std::convert::identity::<TeamPayload>)
            .await
    }

    async fn statistics(&self, reference: &str) -> Option<Arc<StatisticsPayload>> {
        self.lookup(&self.stats, reference, std::convert::identity::<StatisticsPayload>)
            .await
    }

    /// Resolve `reference` through `cache`; failures yield `None`.
    async fn lookup<P, V>(
        &self,
        cache: &FreshnessCache<V>,
        reference: &str,
        convert: fn(P) -> V,
    ) -> Option<Arc<V>>
    where
        P: DeserializeOwned,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let reference = normalize_ref(reference);
        if reference.is_empty() {
            return None;
        }
        let result = cache
            .get_or_refresh(&reference, || async {
                let payload: P = self.api.resource(&reference).await?;
                Ok(Fetched::new(convert(payload)))
            })
            .await;
        match result {
            Ok(cached) => Some(cached.value),
            Err(e) => {
                tracing::debug!(
                    cache = cache.name(),
                    key = %reference,
                    error = %e,
                    "Resource unavailable"
                );
                None
            }
        }
    }
}

fn season_not_found(league: League, season: &SeasonSelector) -> MatchdayError {
    MatchdayError::SeasonNotFound {
        league: league.key().to_string(),
        season: season.key().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Option<&str>, reference: &str) -> PlayerIndexEntry {
        PlayerIndexEntry {
            id: id.map(String::from),
            reference: reference.to_string(),
            position: None,
        }
    }

    #[test]
    fn query_parsing_clamps() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("x")), 1);
        assert_eq!(parse_page(Some("7")), 7);
        assert_eq!(parse_per_page(None), 50);
        assert_eq!(parse_per_page(Some("3")), 10);
        assert_eq!(parse_per_page(Some("500")), 200);
        assert_eq!(parse_leader_limit(Some("0")), 1);
        assert_eq!(parse_leader_limit(Some("99")), 25);
        assert_eq!(parse_leader_limit(None), 5);
    }

    #[test]
    fn position_filter_parsing() {
        assert_eq!(PositionFilter::parse(None), PositionFilter::All);
        assert_eq!(PositionFilter::parse(Some("All Positions")), PositionFilter::All);
        assert_eq!(PositionFilter::parse(Some("any")), PositionFilter::All);
        assert_eq!(
            PositionFilter::parse(Some(" qb ")),
            PositionFilter::Only("QB".into())
        );
    }

    #[test]
    fn cache_keys() {
        let mut query = PlayerQuery::new(League::Mlb);
        query.mode = StatMode::Pitching;
        query.position = PositionFilter::Only("SP".into());
        assert_eq!(query.cache_key(), "mlb:current:standard:pitching:SP:1:50");
        let leaders = LeadersQuery::new(League::Nba);
        assert_eq!(leaders.cache_key(), "nba:current:2:5:hitting");
    }

    #[test]
    fn merge_dedupes_and_orders() {
        let rosters = vec![
            vec![
                "http://core/athletes/30".to_string(),
                "https://core/athletes/4".to_string(),
            ],
            vec![
                "https://core/athletes/30".to_string(),
                "https://core/people/zed".to_string(),
                "https://core/people/abe".to_string(),
            ],
        ];
        let merged = merge_rosters(rosters);
        let refs: Vec<&str> = merged.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(
            refs,
            vec![
                "https://core/athletes/4",
                "https://core/athletes/30",
                "https://core/people/abe",
                "https://core/people/zed",
            ]
        );
        assert_eq!(merged[0].id.as_deref(), Some("4"));
        assert_eq!(merged[2].id, None);
    }

    #[test]
    fn page_selection_clamps_to_last_page() {
        let entries: Vec<PlayerIndexEntry> = (1..=25)
            .map(|i| entry(Some(&i.to_string()), &format!("r{i}")))
            .collect();
        let slice = select_page(&entries, 9, 10);
        assert_eq!(slice.page, 3);
        assert_eq!(slice.total, 25);
        assert_eq!(slice.start_rank, 21);
        assert_eq!(slice.entries.len(), 5);

        let empty = select_page(&[], 4, 10);
        assert_eq!(empty.page, 1);
        assert!(empty.entries.is_empty());
    }

    #[test]
    fn index_entries_by_position() {
        let index = PlayerIndex {
            season: "2024".into(),
            athletes: vec![entry(Some("1"), "a"), entry(Some("2"), "b")],
            position_index: None,
            source: IndexSource::default(),
        };
        assert_eq!(index.entries(&PositionFilter::All).len(), 2);
        assert!(index.entries(&PositionFilter::Only("QB".into())).is_empty());

        let mut positions = BTreeMap::new();
        positions.insert("QB".to_string(), vec![entry(Some("2"), "b")]);
        let with = index.with_positions(positions);
        assert_eq!(with.entries(&PositionFilter::Only("QB".into())).len(), 1);
        assert_eq!(with.athletes.len(), 2);
    }

    #[test]
    fn profile_from_payload() {
        let payload: AthletePayload = serde_json::from_value(serde_json::json!({
            "id": "15",
            "fullName": "Pat Example",
            "headshot": {"href": "https://img/15.png"},
            "position": {"shortName": "WR", "name": "Wide Receiver"},
            "team": {"$ref": "http://core/teams/3"},
            "statistics": {"$ref": "http://core/athletes/15/statistics"}
        }))
        .unwrap();
        let profile = PlayerProfile::from(payload);
        assert_eq!(profile.display_name.as_deref(), Some("Pat Example"));
        assert_eq!(profile.short_name, None);
        assert_eq!(profile.headshot.as_deref(), Some("https://img/15.png"));
        assert_eq!(profile.position.as_deref(), Some("WR"));
        assert_eq!(profile.team_ref.as_deref(), Some("https://core/teams/3"));
    }
}
