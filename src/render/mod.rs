//! JSON rendering of response envelopes and errors.

pub mod envelope;

pub use envelope::{
    ErrorBody, Freshness, GameEnvelope, GameMeta, GamesEnvelope, GamesMeta, LeagueStandings,
    ServiceHealth, StandingsEnvelope, StandingsMeta, StandingsResponse, StreamCheck, TeamsEnvelope,
    TeamsMeta,
};

use crate::error::{MatchdayError, Result};

/// Render any envelope as JSON.
///
/// # Errors
///
/// Serialization failure.
pub fn render_json<T: serde::Serialize>(output: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(rendered)
}

/// Error line for stderr: the JSON error body, or `error [MD-xxxx]: message`.
#[must_use]
pub fn render_error(error: &MatchdayError, json: bool) -> String {
    if json {
        let body = ErrorBody::from(error);
        return serde_json::to_string(&body)
            .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", body.error));
    }
    format!("error [{}]: {error}", error.error_code())
}
