//! Integration tests for driver configuration files.

use offload_config::{ConfigError, DEFAULT_DELTA_FILE, DriverConfig, paths};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn save_then_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(paths::DRIVER_CONFIG_FILE);

    let config = DriverConfig::new("/vendor/etc/cal.acdb").with_ready_checks(5, 20);
    config.save(&path).unwrap();
    assert!(path.is_file());

    let loaded = DriverConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    loaded.validate().unwrap();
}

#[test]
fn load_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = DriverConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn hand_written_file_with_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(paths::DRIVER_CONFIG_FILE);
    std::fs::write(
        &path,
        r#"
calibration_files = ["/a.acdb", "/b.acdb"]
ready_check_interval_ms = 250
"#,
    )
    .unwrap();

    let config = DriverConfig::load(&path).unwrap();
    assert_eq!(
        config.calibration_files,
        vec![PathBuf::from("/a.acdb"), PathBuf::from("/b.acdb")]
    );
    assert_eq!(config.ready_check_interval_ms, 250);
    assert_eq!(config.delta_file, PathBuf::from(DEFAULT_DELTA_FILE));
    assert!(paths::find_in(&[dir.path().to_path_buf()]).is_some());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = DriverConfig::from_toml_str("calibration_files = [").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
}
