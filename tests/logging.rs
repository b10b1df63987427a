// tests/logging.rs
use taskplan::cli::LogLevel;
use taskplan::logging::{parse_level_str, resolve_level};
use tracing::Level;

#[test]
fn flag_wins_over_env_value() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
}

#[test]
fn env_value_is_used_without_flag() {
    assert_eq!(resolve_level(None, Some(" Warning ")), Level::WARN);
}

#[test]
fn unknown_or_missing_env_falls_back_to_info() {
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(parse_level_str("DEBUG"), Some(Level::DEBUG));
}
