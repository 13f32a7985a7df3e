//! Run configuration file format.

use crate::error::ConfigError;
use crate::factory_sensors::get_factory_sensor;
use crate::paths::{find_sensor_profile, load_sensor_profile};
use rbcal_core::{CalibrationSettings, SensorProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Waveforms and log of one excitation band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRun {
    /// Directory of mono WAV traces.
    pub waveforms: PathBuf,
    /// Calibration log with settling and trailer durations.
    pub log: PathBuf,
}

/// Everything needed to run one calibration analysis.
///
/// # TOML Format
///
/// ```toml
/// station = "ANMO"
/// network = "IU"
/// location = "00"
/// sensor = "STS-2.5"
/// nominal_response = "sts25.paz"
/// input_channel = "BC?"
/// output_dir = "report"
///
/// [low_frequency]
/// waveforms = "lf"
/// log = "lf/qcal.log"
///
/// [high_frequency]
/// waveforms = "hf"
/// log = "hf/qcal.log"
///
/// [settings]
/// amplitude_tolerance_pct = 3.0
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Station code.
    pub station: String,

    /// Network code.
    pub network: String,

    /// Location code.
    #[serde(default)]
    pub location: String,

    /// Channel prefix of the calibrated outputs (`BH` gives `BHZ`, `BHN`, `BHE`).
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// IMS instrument type; the sensor profile name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_type: Option<String>,

    /// Sensor profile name.
    pub sensor: String,

    /// Nominal response file (IDA PAZ).
    pub nominal_response: PathBuf,

    /// Channel pattern of the excitation trace.
    #[serde(default = "default_input_channel")]
    pub input_channel: String,

    /// Report output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Long-period run.
    pub low_frequency: BandRun,

    /// Short-period run.
    pub high_frequency: BandRun,

    /// Analysis settings.
    #[serde(default)]
    pub settings: CalibrationSettings,

    /// Sensor profiles defined in this file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<SensorProfile>,
}

fn default_channel_prefix() -> String {
    "BH".to_string()
}

fn default_input_channel() -> String {
    "BC?".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("report")
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl RunConfig {
    /// Load a run configuration, resolving relative paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse a run configuration from a TOML string. Paths are left as written.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        resolve(base, &mut self.nominal_response);
        resolve(base, &mut self.output_dir);
        for run in [&mut self.low_frequency, &mut self.high_frequency] {
            resolve(base, &mut run.waveforms);
            resolve(base, &mut run.log);
        }
    }

    /// Instrument type written into IMS messages.
    pub fn instrument_type(&self) -> &str {
        self.instrument_type.as_deref().unwrap_or(&self.sensor)
    }

    /// Resolve the sensor profile.
    ///
    /// Profiles defined in this file win over user profile files, which win
    /// over the factory profiles.
    pub fn sensor_profile(&self) -> Result<SensorProfile, ConfigError> {
        if let Ok(profile) = rbcal_core::find_profile(&self.sensors, &self.sensor) {
            return Ok(profile.clone());
        }
        if let Some(path) = find_sensor_profile(&self.sensor) {
            return load_sensor_profile(path);
        }
        get_factory_sensor(&self.sensor)
            .ok_or_else(|| ConfigError::UnknownSensor(self.sensor.clone()))
    }
}
