//! Site API: team directory, standings and per-game statistics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::freshness::{CachePolicy, Cached, Fetched, FreshnessCache};
use crate::core::http::{Fetcher, join_url};
use crate::core::league::League;
use crate::core::refs::{LogoPayload, append_query_param, de_opt_id, select_logo};
use crate::core::schema::StatEntry;
use crate::error::{MatchdayError, Result};
use crate::storage::snapshot::SnapshotStore;
use crate::util::normalize_team_name;
use crate::util::text::digits_only;

/// Cache lifetimes (seconds) for the site API domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteOptions {
    pub teams_ttl: u64,
    pub teams_stale: u64,
    pub standings_ttl: u64,
    pub standings_stale: u64,
    pub stats_ttl: u64,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            teams_ttl: 43_200,
            teams_stale: 604_800,
            standings_ttl: 1_800,
            standings_stale: 21_600,
            stats_ttl: 60,
        }
    }
}

// =============================================================================
// Upstream payloads
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteTeam {
    #[serde(default, deserialize_with = "de_opt_id")]
    id: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    short_display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    logos: Vec<LogoPayload>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    alternate_color: Option<String>,
    #[serde(default)]
    alternate_color2: Option<String>,
    #[serde(default)]
    alternate_color3: Option<String>,
    #[serde(default)]
    primary_color: Option<String>,
    #[serde(default)]
    secondary_color: Option<String>,
}

impl SiteTeam {
    fn display(&self) -> Option<String> {
        self.display_name
            .clone()
            .or_else(|| self.short_display_name.clone())
            .or_else(|| self.name.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TeamWrapper {
    #[serde(default)]
    team: Option<SiteTeam>,
}

#[derive(Debug, Default, Deserialize)]
struct LeagueTeams {
    #[serde(default)]
    teams: Vec<TeamWrapper>,
}

#[derive(Debug, Default, Deserialize)]
struct SportTeams {
    #[serde(default)]
    leagues: Vec<LeagueTeams>,
}

#[derive(Debug, Default, Deserialize)]
struct TeamsPayload {
    #[serde(default)]
    sports: Vec<SportTeams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandingsEntryPayload {
    #[serde(default)]
    team: Option<SiteTeam>,
    #[serde(default)]
    stats: Vec<StatEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandingsBlock {
    #[serde(default)]
    season_display_name: Option<String>,
    #[serde(default)]
    season: Option<Value>,
    #[serde(default)]
    season_type: Option<Value>,
    #[serde(default)]
    entries: Vec<StandingsEntryPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandingsGroupPayload {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(default)]
    children: Vec<StandingsGroupPayload>,
    #[serde(default)]
    standings: Option<StandingsBlock>,
}

impl StandingsGroupPayload {
    fn label(&self) -> Option<String> {
        self.short_name
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.abbreviation.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Competitor {
    #[serde(default)]
    team: Option<SiteTeam>,
}

#[derive(Debug, Default, Deserialize)]
struct Competition {
    #[serde(default)]
    competitors: Vec<Competitor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreboardEvent {
    #[serde(default, deserialize_with = "de_opt_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    competitions: Vec<Competition>,
}

#[derive(Debug, Default, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    events: Vec<ScoreboardEvent>,
}

// =============================================================================
// Output types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    pub id: Option<String>,
    pub abbreviation: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo: Option<String>,
    pub color: Option<String>,
    pub alternate_color: Option<String>,
    pub alternate_color2: Option<String>,
    pub alternate_color3: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<League>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamList {
    pub teams: Vec<TeamEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingTeam {
    pub id: Option<String>,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandingStats {
    pub wins: Option<Value>,
    pub losses: Option<Value>,
    pub ties: Option<Value>,
    pub ot_losses: Option<Value>,
    pub win_percent: Option<Value>,
    pub points: Option<Value>,
    pub games_behind: Option<Value>,
    pub streak: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandingsRow {
    pub team: StandingTeam,
    pub stats: StandingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandingsGroup {
    pub name: String,
    pub entries: Vec<StandingsRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub league: Option<String>,
    pub season: Option<String>,
    pub season_type: Option<Value>,
    pub groups: Vec<StandingsGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStatsMeta {
    pub source: Value,
    pub date: Option<String>,
    pub cache_age_sec: u64,
    pub stale: bool,
}

/// `/stats` payload: the summary sections of one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub event_id: String,
    pub league: League,
    pub header: Option<Value>,
    pub boxscore: Option<Value>,
    pub leaders: Option<Value>,
    pub injuries: Option<Value>,
    pub broadcasts: Option<Value>,
    pub game_info: Option<Value>,
    pub notes: Option<Value>,
    pub standings: Option<Value>,
    pub drives: Option<Value>,
    pub plays: Option<Value>,
    pub scoring_plays: Option<Value>,
    pub win_probability: Option<Value>,
    pub probability: Option<Value>,
    pub odds: Option<Value>,
    pub meta: GameStatsMeta,
}

impl GameStats {
    fn from_summary(
        event_id: String,
        league: League,
        date: Option<String>,
        summary: &Value,
    ) -> Self {
        let section = |key: &str| summary.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            event_id,
            league,
            header: section("header"),
            boxscore: section("boxscore"),
            leaders: section("leaders"),
            injuries: section("injuries"),
            broadcasts: section("broadcasts"),
            game_info: section("gameInfo"),
            notes: section("notes"),
            standings: section("standings"),
            drives: section("drives"),
            plays: section("plays"),
            scoring_plays: section("scoringPlays"),
            win_probability: section("winProbability").or_else(|| section("winprobability")),
            probability: section("probability"),
            odds: section("odds"),
            meta: GameStatsMeta {
                source: section("meta").unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                date,
                cache_age_sec: 0,
                stale: false,
            },
        }
    }

    /// The payload with its meta reflecting how `cached` was served.
    #[must_use]
    pub fn served(cached: &Cached<Self>) -> Self {
        let mut stats = cached.value.as_ref().clone();
        stats.meta.cache_age_sec = cached.age_secs;
        stats.meta.stale = cached.stale;
        stats
    }
}

/// Teams and standings rolled up across leagues.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup<T> {
    pub items: Vec<T>,
    pub cache_age_sec: u64,
    pub stale: bool,
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_teams(payload: TeamsPayload) -> Vec<TeamEntry> {
    payload
        .sports
        .into_iter()
        .flat_map(|sport| sport.leagues)
        .flat_map(|league| league.teams)
        .filter_map(|wrapper| wrapper.team)
        .filter_map(|team| {
            let abbreviation = team
                .abbreviation
                .as_deref()
                .filter(|a| !a.is_empty())?
                .to_uppercase();
            let name = team.display();
            let short_name = team
                .short_display_name
                .clone()
                .or_else(|| team.abbreviation.clone())
                .or_else(|| name.clone());
            Some(TeamEntry {
                logo: select_logo(&team.logos),
                id: team.id,
                abbreviation,
                name,
                short_name,
                color: team.color,
                alternate_color: team.alternate_color,
                alternate_color2: team.alternate_color2,
                alternate_color3: team.alternate_color3,
                primary_color: team.primary_color,
                secondary_color: team.secondary_color,
                league: None,
            })
        })
        .collect()
}

fn stat_value(stats: &[StatEntry], names: &[&str]) -> Option<Value> {
    stats
        .iter()
        .find(|s| s.name.as_deref().is_some_and(|n| names.contains(&n)))
        .and_then(|s| {
            s.display_value
                .clone()
                .map(Value::String)
                .or_else(|| s.value.clone())
        })
}

fn parse_standings_entries(entries: Vec<StandingsEntryPayload>) -> Vec<StandingsRow> {
    entries
        .into_iter()
        .map(|entry| {
            let team = entry.team.unwrap_or_default();
            let stats = &entry.stats;
            StandingsRow {
                team: StandingTeam {
                    name: team.display(),
                    logo: select_logo(&team.logos),
                    id: team.id,
                    abbreviation: team.abbreviation,
                },
                stats: StandingStats {
                    wins: stat_value(stats, &["wins"]),
                    losses: stat_value(stats, &["losses"]),
                    ties: stat_value(stats, &["ties"]),
                    ot_losses: stat_value(stats, &["otLosses", "overtimeLosses"]),
                    win_percent: stat_value(stats, &["winPercent", "pointsPercentage"]),
                    points: stat_value(stats, &["points"]),
                    games_behind: stat_value(stats, &["gamesBehind", "gamesBack"]),
                    streak: stat_value(stats, &["streak"]),
                },
            }
        })
        .collect()
}

fn parse_standings(payload: StandingsGroupPayload) -> Standings {
    let mut standings = Standings {
        league: payload.label(),
        ..Standings::default()
    };
    let mut add_group = |name: Option<String>, block: Option<StandingsBlock>| {
        let Some(block) = block else {
            return;
        };
        if standings.season.is_none() {
            standings.season = block.season_display_name.clone().or_else(|| {
                block.season.as_ref().map(|s| match s {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
            });
        }
        if standings.season_type.is_none() {
            standings.season_type = block.season_type.clone();
        }
        standings.groups.push(StandingsGroup {
            name: name.unwrap_or_else(|| "Standings".to_string()),
            entries: parse_standings_entries(block.entries),
        });
    };

    if payload.children.is_empty() {
        add_group(payload.label(), payload.standings);
    } else {
        for child in payload.children {
            add_group(child.label(), child.standings);
        }
    }
    standings
}

/// Scoreboard date: the first 8 digits, if there are 8.
#[must_use]
pub fn format_scoreboard_date(value: Option<&str>) -> Option<String> {
    let digits = digits_only(value?);
    (digits.len() >= 8).then(|| digits[..8].to_string())
}

/// Teams to look for on a scoreboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matchup {
    pub away: Option<String>,
    pub home: Option<String>,
    pub abbr_away: Option<String>,
    pub abbr_home: Option<String>,
}

impl Matchup {
    /// True when no team name or abbreviation is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.away, &self.home, &self.abbr_away, &self.abbr_home]
            .into_iter()
            .flatten()
            .all(|v| v.trim().is_empty())
    }

    fn abbreviations(&self) -> Vec<String> {
        [&self.abbr_away, &self.abbr_home]
            .into_iter()
            .flatten()
            .filter(|a| !a.trim().is_empty())
            .map(|a| a.trim().to_uppercase())
            .collect()
    }

    fn names(&self) -> Vec<String> {
        [&self.away, &self.home]
            .into_iter()
            .flatten()
            .map(|n| normalize_team_name(n))
            .filter(|n| !n.is_empty())
            .collect()
    }
}

fn is_subset(wanted: &[String], have: &[String]) -> bool {
    !wanted.is_empty() && wanted.iter().all(|w| have.contains(w))
}

fn match_score(
    wanted_abbrs: &[String],
    wanted_names: &[String],
    event: &ScoreboardEvent,
) -> (bool, usize) {
    let mut abbrs: Vec<String> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    if let Some(competition) = event.competitions.first() {
        for team in competition.competitors.iter().filter_map(|c| c.team.as_ref()) {
            if let Some(abbr) = team.abbreviation.as_deref().filter(|a| !a.is_empty()) {
                abbrs.push(abbr.to_uppercase());
            }
            for name in [
                &team.display_name,
                &team.short_display_name,
                &team.name,
                &team.location,
            ]
            .into_iter()
            .flatten()
            {
                let normalized = normalize_team_name(name);
                if !normalized.is_empty() && !names.contains(&normalized) {
                    names.push(normalized);
                }
            }
        }
    }

    if is_subset(wanted_abbrs, &abbrs) || is_subset(wanted_names, &names) {
        return (true, 0);
    }

    let mut score = wanted_abbrs.iter().filter(|a| abbrs.contains(a)).count() * 3;
    for target in wanted_names {
        for candidate in &names {
            if target == candidate {
                score += 3;
            } else if target.contains(candidate.as_str()) || candidate.contains(target.as_str()) {
                score += 2;
            }
        }
    }
    let label = normalize_team_name(
        event
            .short_name
            .as_deref()
            .or(event.name.as_deref())
            .unwrap_or_default(),
    );
    if !label.is_empty() {
        score += wanted_names.iter().filter(|t| label.contains(t.as_str())).count();
    }
    (false, score)
}

/// Locate the scoreboard event for `matchup`.
///
/// A full abbreviation or name match wins outright; otherwise the best scoring
/// event wins when it scores at least 2.
fn find_event<'a>(scoreboard: &'a Scoreboard, matchup: &Matchup) -> Option<&'a ScoreboardEvent> {
    let abbrs = matchup.abbreviations();
    let names = matchup.names();
    let mut best: Option<(&ScoreboardEvent, usize)> = None;
    for event in scoreboard.events.iter().filter(|e| !e.competitions.is_empty()) {
        let (exact, score) = match_score(&abbrs, &names, event);
        if exact {
            return Some(event);
        }
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((event, score));
        }
    }
    best.filter(|(_, score)| *score >= 2).map(|(event, _)| event)
}

// =============================================================================
// Client
// =============================================================================

pub struct SiteApi {
    fetcher: Fetcher,
    base: String,
    teams: FreshnessCache<TeamList>,
    standings: FreshnessCache<Standings>,
    stats: FreshnessCache<GameStats>,
}

impl SiteApi {
    /// Site client; teams and standings persist under `snapshot_dir` when given.
    pub fn new(
        fetcher: Fetcher,
        base: impl Into<String>,
        options: SiteOptions,
        snapshot_dir: Option<&std::path::Path>,
    ) -> Self {
        let teams_policy = CachePolicy::from_secs(options.teams_ttl, options.teams_stale);
        let standings_policy =
            CachePolicy::from_secs(options.standings_ttl, options.standings_stale);
        let (teams, standings) = match snapshot_dir {
            Some(dir) => (
                FreshnessCache::persisted("teams", teams_policy, SnapshotStore::new(dir, "teams")),
                FreshnessCache::persisted(
                    "standings",
                    standings_policy,
                    SnapshotStore::new(dir, "standings"),
                ),
            ),
            None => (
                FreshnessCache::new("teams", teams_policy),
                FreshnessCache::new("standings", standings_policy),
            ),
        };
        Self {
            fetcher,
            base: base.into(),
            teams,
            standings,
            stats: FreshnessCache::new("game_stats", CachePolicy::ttl_only(options.stats_ttl)),
        }
    }

    fn site_url(&self, league: League, resource: &str) -> String {
        join_url(
            &self.base,
            &format!("site/v2/sports/{}/{}/{resource}", league.sport(), league.key()),
        )
    }

    #[must_use]
    pub fn teams_url(&self, league: League) -> String {
        self.site_url(league, "teams")
    }

    #[must_use]
    pub fn standings_url(&self, league: League, season: Option<&str>) -> String {
        let url = join_url(
            &self.base,
            &format!("v2/sports/{}/{}/standings", league.sport(), league.key()),
        );
        match season {
            Some(season) => append_query_param(&url, "season", season),
            None => url,
        }
    }

    #[must_use]
    pub fn scoreboard_url(&self, league: League, date: Option<&str>) -> String {
        let url = self.site_url(league, "scoreboard");
        match date {
            Some(date) => append_query_param(&url, "dates", date),
            None => url,
        }
    }

    #[must_use]
    pub fn summary_url(&self, league: League, event_id: &str) -> String {
        append_query_param(&self.site_url(league, "summary"), "event", event_id)
    }

    /// Team directory for one league, tagged with the league.
    ///
    /// # Errors
    ///
    /// Upstream failure with no usable cached directory.
    pub async fn teams(&self, league: League, force: bool) -> Result<Cached<TeamList>> {
        let refresh = || async {
            let url = self.teams_url(league);
            let payload: TeamsPayload = self.fetcher.fetch_json(&url).await?;
            let teams = parse_teams(payload)
                .into_iter()
                .map(|team| TeamEntry {
                    league: Some(league),
                    ..team
                })
                .collect();
            Ok(Fetched::new(TeamList { teams }).with_source(url))
        };
        if force {
            self.teams.force_refresh(league.key(), refresh).await
        } else {
            self.teams.get_or_refresh(league.key(), refresh).await
        }
    }

    /// Teams of every league; leagues that fail are skipped.
    pub async fn all_teams(&self, force: bool) -> Rollup<TeamEntry> {
        let mut rollup = Rollup {
            items: Vec::new(),
            cache_age_sec: 0,
            stale: false,
        };
        for league in League::PRIORITY {
            match self.teams(league, force).await {
                Ok(cached) => {
                    rollup.items.extend(cached.value.teams.iter().cloned());
                    rollup.stale |= cached.stale;
                    rollup.cache_age_sec = rollup.cache_age_sec.max(cached.age_secs);
                }
                Err(e) => {
                    tracing::warn!(
                        league = %league,
                        error = %e,
                        "Teams unavailable; skipping league"
                    );
                }
            }
        }
        rollup
    }

    /// Standings for one league. Non-numeric seasons mean the current season.
    ///
    /// # Errors
    ///
    /// Upstream failure with no usable cached standings.
    pub async fn standings(
        &self,
        league: League,
        season: Option<&str>,
        force: bool,
    ) -> Result<Cached<Standings>> {
        let season = season_filter(season);
        let key = format!("{}:{}", league.key(), season.unwrap_or("current"));
        let refresh = || async {
            let url = self.standings_url(league, season);
            let payload: StandingsGroupPayload = self.fetcher.fetch_json(&url).await?;
            Ok(Fetched::new(parse_standings(payload)).with_source(url))
        };
        if force {
            self.standings.force_refresh(&key, refresh).await
        } else {
            self.standings.get_or_refresh(&key, refresh).await
        }
    }

    /// Standings of every league, each tagged with its league key.
    pub async fn all_standings(
        &self,
        season: Option<&str>,
        force: bool,
    ) -> Rollup<(League, Standings)> {
        let mut rollup = Rollup {
            items: Vec::new(),
            cache_age_sec: 0,
            stale: false,
        };
        for league in League::PRIORITY {
            match self.standings(league, season, force).await {
                Ok(cached) => {
                    rollup.items.push((league, cached.value.as_ref().clone()));
                    rollup.stale |= cached.stale;
                    rollup.cache_age_sec = rollup.cache_age_sec.max(cached.age_secs);
                }
                Err(e) => {
                    tracing::warn!(
                        league = %league,
                        error = %e,
                        "Standings unavailable; skipping league"
                    );
                }
            }
        }
        rollup
    }

    /// Summary statistics for the game matching `matchup`.
    ///
    /// # Errors
    ///
    /// `EventNotFound` when no scoreboard event matches, or the upstream error.
    pub async fn game_stats(
        &self,
        league: League,
        matchup: &Matchup,
        date: Option<&str>,
        force: bool,
    ) -> Result<Cached<GameStats>> {
        let date = format_scoreboard_date(date);
        let event_id = self.locate_event(league, matchup, date.as_deref()).await?;
        let key = format!("{}:{event_id}", league.key());
        let refresh = || async {
            let url = self.summary_url(league, &event_id);
            let summary: Value = self.fetcher.fetch_json(&url).await?;
            let stats = GameStats::from_summary(event_id.clone(), league, date.clone(), &summary);
            Ok(Fetched::new(stats).with_source(url))
        };
        if force {
            self.stats.force_refresh(&key, refresh).await
        } else {
            self.stats.get_or_refresh(&key, refresh).await
        }
    }

    async fn locate_event(
        &self,
        league: League,
        matchup: &Matchup,
        date: Option<&str>,
    ) -> Result<String> {
        let board: Scoreboard = self.fetcher.fetch_json(&self.scoreboard_url(league, date)).await?;
        if let Some(id) = find_event(&board, matchup).and_then(|e| e.id.clone()) {
            return Ok(id);
        }
        if date.is_some() {
            tracing::debug!(league = %league, "No dated scoreboard match; trying today's board");
            let board: Scoreboard = self
                .fetcher
                .fetch_json(&self.scoreboard_url(league, None))
                .await?;
            if let Some(id) = find_event(&board, matchup).and_then(|e| e.id.clone()) {
                return Ok(id);
            }
        }
        Err(MatchdayError::EventNotFound {
            league: league.key().to_string(),
        })
    }
}

/// Only all-digit seasons are passed upstream.
fn season_filter(season: Option<&str>) -> Option<&str> {
    season
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scoreboard(value: Value) -> Scoreboard {
        serde_json::from_value(value).unwrap()
    }

    fn event(id: &str, teams: &[(&str, &str)]) -> Value {
        let competitors: Vec<Value> = teams
            .iter()
            .map(|(abbr, name)| json!({"team": {"abbreviation": abbr, "displayName": name}}))
            .collect();
        json!({"id": id, "competitions": [{"competitors": competitors}]})
    }

    #[test]
    fn teams_require_abbreviation() {
        let payload: TeamsPayload = serde_json::from_value(json!({
            "sports": [{"leagues": [{"teams": [
                {"team": {"id": "1", "abbreviation": "buf", "displayName": "Buffalo Bills",
                          "logos": [{"href": "a", "width": 500, "height": 500}]}},
                {"team": {"id": "2", "displayName": "No Abbr"}},
                {"team": {"id": 3, "abbreviation": "MIA", "name": "Dolphins"}}
            ]}]}]
        }))
        .unwrap();
        let teams = parse_teams(payload);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].abbreviation, "BUF");
        assert_eq!(teams[0].short_name.as_deref(), Some("buf"));
        assert_eq!(teams[0].logo.as_deref(), Some("a"));
        assert_eq!(teams[1].id.as_deref(), Some("3"));
        assert_eq!(teams[1].name.as_deref(), Some("Dolphins"));
    }

    #[test]
    fn standings_from_children_groups() {
        let payload: StandingsGroupPayload = serde_json::from_value(json!({
            "name": "National Hockey League",
            "children": [
                {"name": "Eastern Conference", "standings": {
                    "seasonDisplayName": "2024-25",
                    "entries": [{
                        "team": {"id": "1", "displayName": "Bruins", "abbreviation": "BOS"},
                        "stats": [
                            {"name": "wins", "value": 40, "displayValue": "40"},
                            {"name": "overtimeLosses", "value": 5},
                            {"name": "pointsPercentage", "displayValue": ".600"}
                        ]
                    }]
                }},
                {"abbreviation": "WEST", "standings": {"season": 2025, "entries": []}}
            ]
        }))
        .unwrap();
        let standings = parse_standings(payload);
        assert_eq!(standings.league.as_deref(), Some("National Hockey League"));
        assert_eq!(standings.season.as_deref(), Some("2024-25"));
        assert_eq!(standings.groups.len(), 2);
        assert_eq!(standings.groups[1].name, "WEST");
        let stats = &standings.groups[0].entries[0].stats;
        assert_eq!(stats.wins, Some(json!("40")));
        assert_eq!(stats.ot_losses, Some(json!(5)));
        assert_eq!(stats.win_percent, Some(json!(".600")));
        assert_eq!(stats.ties, None);
    }

    #[test]
    fn standings_without_children_use_root() {
        let payload: StandingsGroupPayload = serde_json::from_value(json!({
            "shortName": "NFL",
            "standings": {"season": 2024, "entries": []}
        }))
        .unwrap();
        let standings = parse_standings(payload);
        assert_eq!(standings.groups.len(), 1);
        assert_eq!(standings.groups[0].name, "NFL");
        assert_eq!(standings.season.as_deref(), Some("2024"));
    }

    #[test]
    fn event_found_by_abbreviation_subset() {
        let board = scoreboard(json!({"events": [
            event("1", &[("NYJ", "New York Jets"), ("NE", "New England Patriots")]),
            event("2", &[("BUF", "Buffalo Bills"), ("MIA", "Miami Dolphins")])
        ]}));
        let matchup = Matchup {
            abbr_away: Some("buf".into()),
            abbr_home: Some("MIA".into()),
            ..Matchup::default()
        };
        assert_eq!(find_event(&board, &matchup).and_then(|e| e.id.as_deref()), Some("2"));
    }

    #[test]
    fn event_found_by_name_score() {
        let board = scoreboard(json!({"events": [
            event("7", &[("STL", "St. Louis Blues"), ("CHI", "Chicago Blackhawks")])
        ]}));
        let matchup = Matchup {
            away: Some("Saint Louis Blues".into()),
            home: Some("Chicago".into()),
            ..Matchup::default()
        };
        assert_eq!(find_event(&board, &matchup).and_then(|e| e.id.as_deref()), Some("7"));
    }

    #[test]
    fn weak_matches_are_rejected() {
        let board = scoreboard(json!({"events": [event("9", &[("LAL", "Los Angeles Lakers")])]}));
        let matchup = Matchup {
            abbr_away: Some("BOS".into()),
            abbr_home: Some("LAL".into()),
            ..Matchup::default()
        };
        // One shared abbreviation scores 3, which clears the threshold.
        assert!(find_event(&board, &matchup).is_some());

        let unrelated = Matchup {
            away: Some("Denver".into()),
            ..Matchup::default()
        };
        assert!(find_event(&board, &unrelated).is_none());
    }

    #[test]
    fn scoreboard_dates() {
        assert_eq!(format_scoreboard_date(Some("2024-10-06")).as_deref(), Some("20241006"));
        assert_eq!(format_scoreboard_date(Some("2024-10")), None);
        assert_eq!(format_scoreboard_date(None), None);
    }

    #[test]
    fn summary_sections() {
        let summary = json!({
            "header": {"id": "1"},
            "winprobability": [{"playId": "1"}],
            "meta": {"gp": 1}
        });
        let stats = GameStats::from_summary("1".into(), League::Nfl, None, &summary);
        assert!(stats.header.is_some());
        assert!(stats.boxscore.is_none());
        assert_eq!(stats.win_probability, Some(json!([{"playId": "1"}])));
        assert_eq!(stats.meta.source, json!({"gp": 1}));
    }

    #[test]
    fn seasons_must_be_numeric() {
        assert_eq!(season_filter(Some("2024")), Some("2024"));
        assert_eq!(season_filter(Some("2024-25")), None);
        assert_eq!(season_filter(Some(" ")), None);
    }
}
