//! Platform-specific paths for configuration and sensor profiles.
//!
//! - **User config**: `~/.config/rbcal/` (Linux), `~/Library/Application Support/rbcal/` (macOS), `%APPDATA%\rbcal\` (Windows)
//! - **User sensor profiles**: `<user config>/sensors/`, one TOML file per profile
//!
//! # Example
//!
//! ```rust,no_run
//! use rbcal_config::paths;
//!
//! // Find a user profile by name
//! if let Some(path) = paths::find_sensor_profile("CMG-3T") {
//!     println!("Found profile at: {:?}", path);
//! }
//! ```

use crate::ConfigError;
use rbcal_core::SensorProfile;
use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "rbcal";

/// Subdirectory name for sensor profiles.
const SENSORS_SUBDIR: &str = "sensors";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific sensor profile directory.
pub fn user_sensors_dir() -> PathBuf {
    user_config_dir().join(SENSORS_SUBDIR)
}

/// Ensure the user sensor profile directory exists.
pub fn ensure_user_sensors_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_sensors_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Find a sensor profile file by name.
///
/// The name may be a path to an existing TOML file, or a profile name
/// looked up (with `.toml` appended) in [`user_sensors_dir`].
pub fn find_sensor_profile(name: &str) -> Option<PathBuf> {
    find_sensor_profile_in(name, &user_sensors_dir())
}

fn find_sensor_profile_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };
    let user_path = dir.join(filename);
    user_path.is_file().then_some(user_path)
}

/// Load a sensor profile from a TOML file.
pub fn load_sensor_profile(path: impl AsRef<Path>) -> Result<SensorProfile, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    Ok(toml::from_str(&content)?)
}

/// List all profile files in the user sensor directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_sensors() -> Vec<PathBuf> {
    list_profiles_in_dir(&user_sensors_dir())
}

fn list_profiles_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut profiles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    profiles.sort();
    profiles
}
