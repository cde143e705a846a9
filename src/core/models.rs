//! Core data models for match directory records and assembled games.
//!
//! Raw types mirror the match directory payloads loosely: every field is
//! optional and a record that fails to decode is dropped on its own, never
//! taking its siblings down with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::health::HealthRecord;
use crate::core::league::League;

// =============================================================================
// Raw match directory records
// =============================================================================

/// One candidate stream source as listed upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSource {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Team as listed on a match record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawTeam {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawTeams {
    #[serde(default)]
    pub home: Option<RawTeam>,
    #[serde(default)]
    pub away: Option<RawTeam>,
}

/// Match record from `/matches/live` or `/matches/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Start time in epoch milliseconds.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub sources: Vec<RawSource>,
    #[serde(default)]
    pub teams: Option<RawTeams>,
}

impl RawMatch {
    /// Non-empty id, if any.
    #[must_use]
    pub fn match_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Lowercased `"title id"`, the text the classifier searches.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.id.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }

    #[must_use]
    pub fn category_lower(&self) -> String {
        self.category.as_deref().unwrap_or_default().to_lowercase()
    }
}

/// Decode a match list, treating a non-array body as empty and skipping
/// records that do not decode.
#[must_use]
pub fn parse_match_list(body: Value) -> Vec<RawMatch> {
    let Value::Array(items) = body else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable match record");
                None
            }
        })
        .collect()
}

/// Live and full match lists captured together. This is the games cache value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchDirectory {
    pub live: Vec<RawMatch>,
    pub all: Vec<RawMatch>,
}

// =============================================================================
// Assembled games
// =============================================================================

/// A stream source attached to a game, identified by `(source, id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Source name, e.g. `admin` or `delta`.
    pub source: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthRecord>,
}

impl Source {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            health: None,
        }
    }

    /// Key for the health cache: `name:id:stream`.
    #[must_use]
    pub fn health_key(&self, stream: u32) -> String {
        format!("{}:{}:{stream}", self.source, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSide {
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameTeams {
    pub home: Option<TeamSide>,
    pub away: Option<TeamSide>,
}

/// A classified, ranked game ready for output.
///
/// The live/upcoming/ended flags are computed at assembly time from
/// `timestamp` and the wall clock; they are never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub match_id: String,
    pub slug: String,
    pub title: String,
    pub poster: Option<String>,
    pub category: String,
    pub sport: String,
    pub game_time: String,
    pub timestamp: i64,
    pub is_live: bool,
    pub is_upcoming: bool,
    pub is_ended: bool,
    pub is_popular: bool,
    pub sources: Vec<Source>,
    pub current_source: String,
    pub source: String,
    pub league: League,
    pub teams: Option<GameTeams>,
}
