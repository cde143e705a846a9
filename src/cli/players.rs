//! `players` command.

use crate::app::App;
use crate::cli::args::PlayersArgs;
use crate::core::pipeline::{PlayerQuery, PositionFilter, parse_page, parse_per_page};
use crate::core::refs::SeasonSelector;
use crate::core::schema::{StatMode, TableView};
use crate::error::Result;
use crate::render::render_json;

#[must_use]
pub fn query_from(args: &PlayersArgs, league: crate::core::league::League) -> PlayerQuery {
    PlayerQuery {
        season: SeasonSelector::parse(args.season.as_deref()),
        view: TableView::parse(args.view.as_deref()),
        mode: StatMode::parse(args.mode.as_deref()),
        position: PositionFilter::parse(args.position.as_deref()),
        page: parse_page(args.page.as_deref()),
        per_page: parse_per_page(args.per_page.as_deref()),
        ..PlayerQuery::new(league)
    }
}

/// Print one page of the player table.
///
/// # Errors
///
/// Unsupported league, season or players not found, or the upstream error.
pub async fn execute(app: &App, args: &PlayersArgs, pretty: bool) -> Result<()> {
    let query = query_from(args, args.league.parse()?);
    tracing::debug!(key = %query.cache_key(), "Building player table");
    let table = app.players(&query, args.force).await?;
    println!("{}", render_json(&table, pretty)?);
    Ok(())
}
