//! CLI argument parsing and command dispatch.

pub mod args;
pub mod games;
pub mod players;
pub mod serve;

pub use args::{Cli, Commands};

use crate::app::App;
use crate::error::Result;
use crate::storage::config::ResolvedConfig;

/// Resolve config, build the app and run the selected command.
///
/// # Errors
///
/// Configuration errors, or whatever the command returns.
pub async fn run(cli: Cli) -> Result<()> {
    let resolved = ResolvedConfig::resolve(&cli.overrides())?;
    tracing::debug!(
        path = %resolved.path.display(),
        file = %resolved.sources.file,
        port = %resolved.sources.port,
        "Configuration resolved"
    );
    let app = App::new(resolved.config)?;
    let pretty = cli.pretty;

    match cli.command {
        Commands::Serve(_) => serve::execute(app).await,
        Commands::Games(args) => games::execute(&app, &args, pretty).await,
        Commands::CheckStream(args) => games::check_stream(&app, &args, pretty).await,
        Commands::Players(args) => players::execute(&app, &args, pretty).await,
    }
}
