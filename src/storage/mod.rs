//! Configuration, platform paths and snapshot persistence.

pub mod config;
pub mod paths;
pub mod snapshot;

pub use config::{CliOverrides, Config, ConfigSource, ConfigSources, ResolvedConfig};
pub use paths::AppPaths;
pub use snapshot::{PersistedSnapshot, SnapshotStore};
