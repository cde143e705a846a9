//! Response envelopes shared by the HTTP routes and the CLI.

use serde::Serialize;

use crate::core::freshness::{CacheStatus, Cached};
use crate::core::health::HealthRecord;
use crate::core::league::League;
use crate::core::models::Game;
use crate::core::site::{Standings, TeamEntry};

/// Staleness fields every envelope carries.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    pub cache_age_sec: u64,
    pub stale: bool,
}

impl Freshness {
    #[must_use]
    pub const fn of<V>(cached: &Cached<V>) -> Self {
        Self {
            cache_age_sec: cached.age_secs,
            stale: cached.stale,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GamesMeta {
    pub count: usize,
    pub filter: &'static str,
    pub league: &'static str,
    #[serde(flatten)]
    pub freshness: Freshness,
    pub upstream_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GamesEnvelope {
    pub games: Vec<Game>,
    pub meta: GamesMeta,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameMeta {
    #[serde(flatten)]
    pub freshness: Freshness,
    pub upstream_base: Option<String>,
    pub league: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameEnvelope {
    pub game: Game,
    pub meta: GameMeta,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamsMeta {
    pub count: usize,
    pub league: String,
    #[serde(flatten)]
    pub freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamsEnvelope {
    pub teams: Vec<TeamEntry>,
    pub meta: TeamsMeta,
}

/// One league's standings in the all-leagues view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeagueStandings {
    pub league: League,
    #[serde(flatten)]
    pub standings: Standings,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandingsMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub league: String,
    pub season: String,
    #[serde(flatten)]
    pub freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_base: Option<String>,
}

/// `T` is [`Standings`] for one league, a list of [`LeagueStandings`] for all.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StandingsEnvelope<T> {
    pub standings: T,
    pub meta: StandingsMeta,
}

/// `/standings` body for one league or all of them.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StandingsResponse {
    One(StandingsEnvelope<Standings>),
    All(StandingsEnvelope<Vec<LeagueStandings>>),
}

/// `/health` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub status: &'static str,
    /// Null until the first successful fetch.
    pub cache_age_sec: Option<u64>,
    pub last_fetch: Option<i64>,
    pub last_error: Option<String>,
    pub upstream_base: Option<String>,
}

impl From<CacheStatus> for ServiceHealth {
    fn from(status: CacheStatus) -> Self {
        Self {
            status: "ok",
            cache_age_sec: status.age_secs,
            last_fetch: status.last_fetch,
            last_error: status.last_error,
            upstream_base: status.last_source,
        }
    }
}

/// `/streams/check` body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreamCheck {
    pub slug: String,
    pub source: String,
    pub stream: u32,
    pub health: HealthRecord,
}

/// JSON error payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            error: "not_found".to_string(),
            message: None,
        }
    }
}

impl From<&crate::error::MatchdayError> for ErrorBody {
    fn from(err: &crate::error::MatchdayError) -> Self {
        Self {
            error: err.api_code().to_string(),
            message: Some(err.to_string()),
        }
    }
}
