//! Process configuration for the offload graph driver.
//!
//! The vendor graph runtime is initialised once per process with the list of
//! calibration database files, an optional delta-calibration file and a few
//! readiness-probe settings. This crate owns that configuration: its TOML file
//! format, validation and where it lives on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use offload_config::{DriverConfig, paths};
//!
//! // Load from the first location that has a config file
//! let config = match paths::find_driver_config() {
//!     Some(path) => DriverConfig::load(path).unwrap(),
//!     None => DriverConfig::new("/vendor/etc/acdbdata/acdb_cal.acdb"),
//! };
//! config.validate().unwrap();
//! ```

mod driver_config;
mod error;

/// Platform-specific configuration paths.
#[cfg(feature = "std")]
pub mod paths;

pub use driver_config::{DEFAULT_DELTA_FILE, DriverConfig};
pub use error::ConfigError;
