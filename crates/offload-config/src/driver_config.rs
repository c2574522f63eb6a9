//! Driver initialisation settings and their TOML file format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default location of the delta-calibration file.
pub const DEFAULT_DELTA_FILE: &str = "/data/audio/delta";

/// Settings consumed once when the graph driver is initialised.
///
/// # TOML Format
///
/// ```toml
/// calibration_files = ["/vendor/etc/acdbdata/acdb_cal.acdb"]
/// delta_file = "/data/audio/delta"
/// calibration_addr = 0
/// max_ready_checks = 1
/// ready_check_interval_ms = 100
/// ```
///
/// Every field except `calibration_files` has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverConfig {
    /// Calibration database files, in load order.
    pub calibration_files: Vec<PathBuf>,

    /// Delta-calibration file written back by tuning tools.
    #[serde(default = "default_delta_file")]
    pub delta_file: PathBuf,

    /// Shared-memory address of a preloaded calibration database (0 = none).
    #[serde(default)]
    pub calibration_addr: u64,

    /// How many times the driver probes the DSP for readiness.
    #[serde(default = "default_ready_checks")]
    pub max_ready_checks: u32,

    /// Delay between readiness probes in milliseconds.
    #[serde(default = "default_ready_interval")]
    pub ready_check_interval_ms: u32,
}

fn default_delta_file() -> PathBuf {
    PathBuf::from(DEFAULT_DELTA_FILE)
}

fn default_ready_checks() -> u32 {
    1
}

fn default_ready_interval() -> u32 {
    100
}

impl DriverConfig {
    /// Configuration with a single calibration database and default settings.
    pub fn new(calibration_file: impl Into<PathBuf>) -> Self {
        Self {
            calibration_files: vec![calibration_file.into()],
            delta_file: default_delta_file(),
            calibration_addr: 0,
            max_ready_checks: default_ready_checks(),
            ready_check_interval_ms: default_ready_interval(),
        }
    }

    /// Add another calibration database.
    pub fn with_calibration_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_files.push(path.into());
        self
    }

    /// Override the delta-calibration file.
    pub fn with_delta_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.delta_file = path.into();
        self
    }

    /// Override the readiness probe settings.
    pub fn with_ready_checks(mut self, max_checks: u32, interval_ms: u32) -> Self {
        self.max_ready_checks = max_checks;
        self.ready_check_interval_ms = interval_ms;
        self
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Check the configuration is usable by the driver.
    ///
    /// Does not touch the filesystem: calibration files are opened by the
    /// driver itself and may live on a partition that is not mounted yet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calibration_files.is_empty() {
            return Err(ConfigError::NoCalibrationFiles);
        }
        if let Some(empty) = self
            .calibration_files
            .iter()
            .position(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::invalid(
                "calibration_files",
                format!("entry {empty} is an empty path"),
            ));
        }
        if self.max_ready_checks == 0 {
            return Err(ConfigError::invalid("max_ready_checks", "must be at least 1"));
        }
        if self.max_ready_checks > 1 && self.ready_check_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "ready_check_interval_ms",
                "must be non-zero when probing more than once",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config = DriverConfig::from_toml_str(r#"calibration_files = ["/etc/cal.acdb"]"#)
            .expect("minimal config parses");
        assert_eq!(config.calibration_files, vec![PathBuf::from("/etc/cal.acdb")]);
        assert_eq!(config.delta_file, PathBuf::from(DEFAULT_DELTA_FILE));
        assert_eq!(config.calibration_addr, 0);
        assert_eq!(config.max_ready_checks, 1);
        assert_eq!(config.ready_check_interval_ms, 100);
    }

    #[test]
    fn missing_calibration_files_is_a_parse_error() {
        assert!(matches!(
            DriverConfig::from_toml_str("delta_file = \"/tmp/d\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn toml_string_round_trip() {
        let config = DriverConfig::new("/a.acdb")
            .with_calibration_file("/b.acdb")
            .with_delta_file("/tmp/delta")
            .with_ready_checks(3, 50);
        let text = config.to_toml_string().unwrap();
        assert_eq!(DriverConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn validate_rejects_empty_file_list() {
        let mut config = DriverConfig::new("/a.acdb");
        config.calibration_files.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoCalibrationFiles)));
    }

    #[test]
    fn validate_rejects_empty_path_entry() {
        let config = DriverConfig::new("/a.acdb").with_calibration_file("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("entry 1"), "got: {err}");
    }

    #[test]
    fn validate_ready_probe_settings() {
        assert!(DriverConfig::new("/a").with_ready_checks(0, 10).validate().is_err());
        assert!(DriverConfig::new("/a").with_ready_checks(2, 0).validate().is_err());
        assert!(DriverConfig::new("/a").with_ready_checks(1, 0).validate().is_ok());
    }
}
