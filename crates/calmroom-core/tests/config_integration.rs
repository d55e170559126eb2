//! Integration tests for loading and saving the configuration file.

use calmroom_core::{Config, ConfigError, CoreError};
use tempfile::tempdir;

#[test]
fn test_save_then_load_preserves_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut cfg = Config::default();
    cfg.set("pattern.tile_count", "6").unwrap();
    cfg.set("scramble.wrong_delay_ms", "500").unwrap();
    cfg.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.pattern.tile_count, 6);
    assert_eq!(loaded.scramble.wrong_delay_ms, 500);
    assert_eq!(loaded, cfg);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_garbage_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "tick_ms = \"fast\"").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, CoreError::Config(ConfigError::ParseFailed(_))));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[[breathing.phases]]\nlabel = \"Hold\"\nduration_ms = 0\n",
    )
    .unwrap();
    assert!(Config::load_from(&path).is_err());
}
