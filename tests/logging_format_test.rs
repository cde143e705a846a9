//! Integration tests for logging format initialization.

use matchday::core::logging::{self, LogFormat, LogLevel, LogSettings};

#[test]
fn test_log_format_human() {
    logging::init(&LogSettings {
        level: LogLevel::Debug,
        format: LogFormat::Human,
        file: None,
    });
}

#[test]
fn test_log_format_json_then_reinit_is_noop() {
    let settings = LogSettings {
        level: LogLevel::Debug,
        format: LogFormat::Json,
        file: None,
    };
    logging::init(&settings);
    logging::init(&settings);
}

#[test]
fn test_json_output_flag_wins() {
    let settings = LogSettings::resolve(Some(LogLevel::Warn), true, true);
    assert_eq!(settings.format, LogFormat::Json);
    assert_eq!(settings.level, LogLevel::Debug);
}
