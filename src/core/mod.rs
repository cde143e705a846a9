//! Domain core: caches, upstream clients, classification, health and
//! aggregation.

pub mod assembly;
pub mod directory;
pub mod freshness;
pub mod health;
pub mod http;
pub mod league;
pub mod logging;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod refs;
pub mod schema;
pub mod site;

pub use assembly::{AssemblyOptions, GameFilter};
pub use directory::MatchFeed;
pub use freshness::{CachePolicy, Cached, FreshnessCache};
pub use health::{Budget, HealthRecord, HealthStatus, Prober, SourceHealth};
pub use http::{Fetcher, RetryPolicy};
pub use league::{League, LeagueScope};
pub use models::{Game, MatchDirectory, RawMatch, Source};
pub use pipeline::{LeadersQuery, PipelineOptions, PlayerPipeline, PlayerQuery};
pub use refs::{CoreApi, SeasonSelector};
pub use schema::{StatMode, TableView};
pub use site::{Matchup, SiteApi, SiteOptions};
