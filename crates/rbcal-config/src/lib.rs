//! Run configuration and sensor profiles for rbcal.
//!
//! # Features
//!
//! - **Run files**: [`RunConfig`] describes one calibration (station,
//!   sensor, nominal response, waveform directories, analysis settings)
//! - **Sensor profiles**: factory profiles plus user TOML profiles
//! - **Validation**: band, tolerance and profile checks before any file is read
//! - **Paths**: platform-specific user configuration directories
//!
//! # Example
//!
//! ```rust,no_run
//! use rbcal_config::{RunConfig, validate_run_config};
//!
//! let config = RunConfig::load("anmo/run.toml").unwrap();
//! validate_run_config(&config).unwrap();
//! let profile = config.sensor_profile().unwrap();
//! println!("{} with {} long-period poles", profile.name, profile.lf_map.poles.len());
//! ```

mod error;
mod run_config;

/// Platform-specific paths for configuration and sensor profiles.
pub mod paths;

/// Run configuration validation.
pub mod validation;

/// Factory sensor profiles bundled with the library.
pub mod factory_sensors;

pub use error::{ConfigError, FileOp};
pub use factory_sensors::{
    FACTORY_SENSOR_NAMES, factory_sensors, get_factory_sensor, is_factory_sensor,
};
pub use paths::{
    ensure_user_sensors_dir, find_sensor_profile, list_user_sensors, load_sensor_profile,
    user_config_dir, user_sensors_dir,
};
pub use run_config::{BandRun, RunConfig};
pub use validation::{ValidationError, ValidationResult, validate_run_config, validate_settings};
