//! Game assembly: classify raw matches, merge live and upcoming sets, rank
//! sources, filter, sort and resolve by slug.

use std::collections::HashSet;

use crate::core::health::{Budget, SourceHealth, rank};
use crate::core::league::{League, LeagueScope, classify, identify};
use crate::core::media::{poster_url, team_side};
use crate::core::models::{Game, GameTeams, MatchDirectory, RawMatch, Source};
use crate::util::{iso_from_ms, normalize_category, sanitize_slug};

/// Default source name when a match lists none.
pub const DEFAULT_SOURCE: &str = "admin";

/// Knobs for turning raw matches into games.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub live_max_age_secs: i64,
    pub ended_grace_secs: i64,
    pub image_base: String,
    pub preference: Vec<String>,
}

/// `filter=` on the games view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameFilter {
    #[default]
    All,
    Live,
    Upcoming,
}

impl GameFilter {
    /// Unknown values fall back to `all`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("live") => Self::Live,
            Some("upcoming") => Self::Upcoming,
            _ => Self::All,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Live => "live",
            Self::Upcoming => "upcoming",
        }
    }
}

/// Shape one raw match into a game.
///
/// Status flags are derived from `now_ms`: live needs the live flag and a start
/// within `live_max_age_secs`; ended means not live and started more than
/// `ended_grace_secs` ago.
#[must_use]
pub fn parse_match(
    record: &RawMatch,
    is_live: bool,
    league: League,
    now_ms: i64,
    options: &AssemblyOptions,
) -> Game {
    let match_id = record.match_id().unwrap_or_default().to_string();
    let title = record.title.clone().unwrap_or_default();
    let category = record.category_lower();
    let timestamp = record.date.unwrap_or(now_ms);

    let is_live_now = is_live && now_ms - timestamp <= options.live_max_age_secs * 1000;
    let is_upcoming = !is_live_now && timestamp > now_ms;
    let is_ended = !is_live_now && timestamp <= now_ms - options.ended_grace_secs * 1000;

    let mut sources: Vec<Source> = record
        .sources
        .iter()
        .filter_map(|raw| {
            let name = raw.source.as_deref().filter(|s| !s.is_empty())?;
            let id = raw.id.as_deref().filter(|s| !s.is_empty())?;
            Some(Source::new(name, id))
        })
        .collect();
    if sources.is_empty() && !match_id.is_empty() {
        sources.push(Source::new(DEFAULT_SOURCE, match_id.clone()));
    }
    let sources = rank(sources, &options.preference);
    let (slug, current_source) = sources.first().map_or_else(
        || (match_id.clone(), DEFAULT_SOURCE.to_string()),
        |best| (best.id.clone(), best.source.clone()),
    );

    let teams = record.teams.as_ref().and_then(|raw| {
        let home = team_side(&options.image_base, raw.home.as_ref());
        let away = team_side(&options.image_base, raw.away.as_ref());
        (home.is_some() || away.is_some()).then_some(GameTeams { home, away })
    });

    let id = if match_id.is_empty() {
        let fallback = sanitize_slug(&title);
        if fallback.is_empty() {
            format!("api_{now_ms}")
        } else {
            format!("api_{fallback}")
        }
    } else {
        format!("api_{match_id}")
    };

    Game {
        id,
        slug,
        poster: poster_url(&options.image_base, record.poster.as_deref()),
        sport: normalize_category(&category),
        game_time: iso_from_ms(timestamp),
        match_id,
        title,
        category,
        timestamp,
        is_live: is_live_now,
        is_upcoming,
        is_ended,
        is_popular: record.popular,
        sources,
        current_source,
        source: "api".to_string(),
        league,
        teams,
    }
}

/// Merge live and full lists for `scope`.
///
/// Entries of the full list already live are dropped. Each part is sorted by
/// timestamp and live games come first. For [`LeagueScope::All`] each record
/// is labelled with the first league that accepts it; unclassified records
/// are dropped.
#[must_use]
pub fn build_games(
    directory: &MatchDirectory,
    scope: LeagueScope,
    now_ms: i64,
    options: &AssemblyOptions,
) -> Vec<Game> {
    let league_of = |record: &RawMatch| match scope {
        LeagueScope::All => identify(record),
        LeagueScope::One(league) => classify(record, league.config()).then_some(league),
    };

    let live: Vec<(&RawMatch, League)> = directory
        .live
        .iter()
        .filter_map(|m| league_of(m).map(|l| (m, l)))
        .collect();
    let live_ids: HashSet<&str> = live.iter().filter_map(|(m, _)| m.match_id()).collect();

    let mut live_games: Vec<Game> = live
        .iter()
        .map(|(m, league)| parse_match(m, true, *league, now_ms, options))
        .collect();
    let mut upcoming_games: Vec<Game> = directory
        .all
        .iter()
        .filter(|m| m.match_id().is_none_or(|id| !live_ids.contains(id)))
        .filter_map(|m| league_of(m).map(|league| parse_match(m, false, league, now_ms, options)))
        .collect();

    live_games.sort_by_key(|g| g.timestamp);
    upcoming_games.sort_by_key(|g| g.timestamp);
    live_games.extend(upcoming_games);
    live_games
}

/// Annotate and re-rank every game's sources under one shared budget.
pub async fn apply_health(games: Vec<Game>, health: &SourceHealth, budget: &Budget) -> Vec<Game> {
    let mut updated = Vec::with_capacity(games.len());
    for mut game in games {
        let ranked = health.annotate_and_rank(&game.sources, budget).await;
        if let Some(best) = ranked.first() {
            game.slug.clone_from(&best.id);
            game.current_source.clone_from(&best.source);
        }
        game.sources = ranked;
        updated.push(game);
    }
    updated
}

#[must_use]
pub fn filter_games(games: Vec<Game>, filter: GameFilter) -> Vec<Game> {
    match filter {
        GameFilter::All => games,
        GameFilter::Live => games.into_iter().filter(|g| g.is_live).collect(),
        GameFilter::Upcoming => games
            .into_iter()
            .filter(|g| g.is_upcoming && !g.is_live)
            .collect(),
    }
}

/// Live first, then by timestamp; the all-leagues view groups by league priority first.
#[must_use]
pub fn sort_games(mut games: Vec<Game>, scope: LeagueScope) -> Vec<Game> {
    match scope {
        LeagueScope::All => {
            games.sort_by_key(|g| (g.league.priority(), !g.is_live, g.timestamp));
        }
        LeagueScope::One(_) => games.sort_by_key(|g| (!g.is_live, g.timestamp)),
    }
    games
}

/// Resolve a game by its slug, match id or any source id.
///
/// A source-id match returns a copy pointing at that source.
#[must_use]
pub fn find_game_by_slug(games: &[Game], slug: &str) -> Option<Game> {
    let wanted = sanitize_slug(slug);
    if wanted.is_empty() {
        return None;
    }
    for game in games {
        if wanted == sanitize_slug(&game.slug) || wanted == sanitize_slug(&game.match_id) {
            return Some(game.clone());
        }
        if let Some(source) = game.sources.iter().find(|s| sanitize_slug(&s.id) == wanted) {
            let mut specialized = game.clone();
            specialized.slug.clone_from(&source.id);
            specialized.current_source.clone_from(&source.source);
            return Some(specialized);
        }
    }
    None
}
