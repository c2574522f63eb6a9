//! Platform-specific paths for driver configuration.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/offload/` (Linux), `~/Library/Application Support/offload/` (macOS), `%APPDATA%\offload\` (Windows)
//! - **System config**: `/etc/offload/` (Linux and other Unix), `%PROGRAMDATA%\offload\` (Windows)
//!
//! The driver configuration file is `driver.toml` in either directory. User
//! configuration takes precedence.

use std::path::PathBuf;

const APP_NAME: &str = "offload";

/// File name of the driver configuration.
pub const DRIVER_CONFIG_FILE: &str = "driver.toml";

/// Per-user directory holding `driver.toml`; falls back to `./offload`
/// when the platform reports no config home.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Machine-wide directory consulted after the user one.
pub fn system_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData"))
            .join(APP_NAME)
    }
    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from("/etc").join(APP_NAME)
    }
}

/// Locates `driver.toml`, preferring the user directory over the system one.
pub fn find_driver_config() -> Option<PathBuf> {
    find_in(&[user_config_dir(), system_config_dir()])
}

/// First `driver.toml` found in `dirs`, in order.
pub fn find_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(DRIVER_CONFIG_FILE))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn user_config_dir_is_namespaced() {
        let dir = user_config_dir();
        assert!(dir.to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn find_in_respects_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join(DRIVER_CONFIG_FILE), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_in(&dirs),
            Some(second.path().join(DRIVER_CONFIG_FILE))
        );

        fs::write(first.path().join(DRIVER_CONFIG_FILE), "").unwrap();
        assert_eq!(find_in(&dirs), Some(first.path().join(DRIVER_CONFIG_FILE)));
    }

    #[test]
    fn find_in_ignores_directories_named_like_the_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(DRIVER_CONFIG_FILE)).unwrap();
        assert_eq!(find_in(&[dir.path().to_path_buf()]), None);
    }
}
