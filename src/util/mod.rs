//! Utility functions.

pub mod env;
pub mod text;
pub mod time;

pub use env::is_truthy;
pub use text::{normalize_category, normalize_team_name, percent_decode, sanitize_slug};
pub use time::{iso_from_ms, now_ms};
