//! Shared fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: mock upstream servers and payload builders
//! - `log_capture`: tracing capture for asserting on emitted logs

pub mod fixtures;
pub mod log_capture;
