//! `games` and `check-stream` commands.

use crate::app::{App, GamesRequest};
use crate::cli::args::{CheckStreamArgs, GamesArgs};
use crate::core::assembly::GameFilter;
use crate::core::league::LeagueScope;
use crate::error::Result;
use crate::render::render_json;

/// Print the games envelope.
///
/// # Errors
///
/// Unsupported league, or the upstream error.
pub async fn execute(app: &App, args: &GamesArgs, pretty: bool) -> Result<()> {
    let request = GamesRequest {
        scope: LeagueScope::parse(Some(&args.league))?,
        filter: GameFilter::parse(Some(&args.filter)),
        include_health: args.health,
        force: args.force,
    };
    tracing::debug!(
        league = request.scope.key(),
        filter = request.filter.as_str(),
        "Assembling games"
    );
    let envelope = app.games(&request).await?;
    println!("{}", render_json(&envelope, pretty)?);
    Ok(())
}

/// Print a health record for one stream.
///
/// # Errors
///
/// Serialization failure only; probe failures are part of the record.
pub async fn check_stream(app: &App, args: &CheckStreamArgs, pretty: bool) -> Result<()> {
    let check = app.check_stream(&args.source, &args.slug, Some(args.stream)).await;
    println!("{}", render_json(&check.health, pretty)?);
    Ok(())
}
