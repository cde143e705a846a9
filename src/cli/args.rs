//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::logging::LogLevel;
use crate::storage::config::{CliOverrides, ENV_CONFIG, ENV_PORT};

/// Matchday - live sports events, stream health and player stats.
#[derive(Parser, Debug)]
#[command(name = "matchday")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Config file path
    #[arg(long, value_name = "PATH", global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

impl Cli {
    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::from_arg)
    }

    /// Config overrides given on the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            config_path: self.config.clone(),
            ..CliOverrides::default()
        };
        if let Commands::Serve(args) = &self.command {
            overrides.port = args.port;
            overrides.bind.clone_from(&args.bind);
        }
        overrides
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Print assembled games as JSON
    Games(GamesArgs),

    /// Probe one stream source and print its health record
    CheckStream(CheckStreamArgs),

    /// Print one page of the player stats table
    Players(PlayersArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen port
    #[arg(long, value_name = "PORT", env = ENV_PORT)]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct GamesArgs {
    /// League key or "all"
    #[arg(long, default_value = "all")]
    pub league: String,

    /// all, live or upcoming
    #[arg(long, default_value = "all")]
    pub filter: String,

    /// Probe sources and rank them by health
    #[arg(long)]
    pub health: bool,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CheckStreamArgs {
    /// Source name, e.g. admin
    #[arg(long)]
    pub source: String,

    /// Stream slug
    #[arg(long)]
    pub slug: String,

    /// Stream number
    #[arg(long, default_value_t = 1)]
    pub stream: u32,
}

#[derive(Args, Debug)]
pub struct PlayersArgs {
    /// nfl, nba, mlb or nhl
    #[arg(long)]
    pub league: String,

    /// Season year or "current"
    #[arg(long)]
    pub season: Option<String>,

    /// Position abbreviation
    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub page: Option<String>,

    #[arg(long)]
    pub per_page: Option<String>,

    /// standard or expanded
    #[arg(long)]
    pub view: Option<String>,

    /// hitting or pitching (MLB)
    #[arg(long)]
    pub mode: Option<String>,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_become_overrides() {
        let cli = Cli::parse_from(["matchday", "serve", "--port", "9100", "--bind", "127.0.0.1"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(9100));
        assert_eq!(overrides.bind.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["matchday", "games", "--league", "nba", "--pretty", "-v"]);
        assert!(cli.pretty);
        assert!(cli.verbose);
        let Commands::Games(args) = cli.command else {
            panic!("expected games");
        };
        assert_eq!(args.league, "nba");
        assert_eq!(args.filter, "all");
    }

    #[test]
    fn check_stream_requires_source_and_slug() {
        assert!(Cli::try_parse_from(["matchday", "check-stream", "--slug", "x"]).is_err());
        let cli =
            Cli::try_parse_from(["matchday", "check-stream", "--source", "admin", "--slug", "x"])
                .unwrap();
        let Commands::CheckStream(args) = cli.command else {
            panic!("expected check-stream");
        };
        assert_eq!(args.stream, 1);
    }
}
