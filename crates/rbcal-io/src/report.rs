//! Report directory writer.

use crate::ims::{Station, calibrate_result_message, response_message};
use crate::paz_file::write_paz;
use crate::plot::{plot_amplitude, plot_phase};
use crate::Result;
use chrono::{DateTime, Utc};
use rbcal_analysis::{BandFit, CalibrationOutcome, Sensitivity};
use rbcal_core::{CalibrationSettings, Component, PoleZeroModel};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of everything [`write_report`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    /// Amplitude plot.
    pub amplitude_plot: PathBuf,
    /// Phase plot.
    pub phase_plot: PathBuf,
    /// IMS2.0 `CALIBRATE_RESULT` message.
    pub calibrate_result: PathBuf,
    /// IMS2.0 `RESPONSE` message.
    pub response: PathBuf,
    /// Fitted models, one per component.
    pub paz_files: Vec<PathBuf>,
    /// JSON summary.
    pub summary: PathBuf,
}

#[derive(Serialize)]
struct ComponentSummary<'a> {
    component: Component,
    in_spec: bool,
    max_amplitude_pct: f64,
    max_phase_deg: f64,
    sensitivity: Sensitivity,
    lf_fit: Option<&'a BandFit>,
    hf_fit: Option<&'a BandFit>,
    fitted: &'a PoleZeroModel,
}

#[derive(Serialize)]
struct Summary<'a> {
    network: &'a str,
    station: &'a str,
    location: &'a str,
    sensor: &'a str,
    start: Option<DateTime<Utc>>,
    in_spec: bool,
    settings: &'a CalibrationSettings,
    components: Vec<ComponentSummary<'a>>,
}

/// IMS message identifier: station code and start time.
fn message_id(station: &Station, start: DateTime<Utc>) -> String {
    format!("{}_{}", station.station, start.format("%Y%m%d%H%M%S"))
}

/// Write plots, IMS2.0 messages, fitted models and a JSON summary to `dir`.
///
/// The directory is created if needed; existing artifacts are overwritten.
/// Runs without a logged start time are stamped with the current time.
pub fn write_report<P: AsRef<Path>>(
    dir: P,
    outcome: &CalibrationOutcome,
    station: &Station,
) -> Result<ReportArtifacts> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let start = outcome.start.unwrap_or_else(Utc::now);
    let msg_id = message_id(station, start);

    let amplitude_plot = dir.join("amplitude.png");
    plot_amplitude(&amplitude_plot, outcome)?;
    let phase_plot = dir.join("phase.png");
    plot_phase(&phase_plot, outcome)?;

    let calibrate_result = dir.join("calibrate_result.msg");
    std::fs::write(
        &calibrate_result,
        calibrate_result_message(&msg_id, station, &outcome.components, start),
    )?;
    let response = dir.join("response.msg");
    std::fs::write(
        &response,
        response_message(&msg_id, station, &outcome.components, outcome.hf_sample_rate, start)?,
    )?;

    let mut paz_files = Vec::with_capacity(outcome.components.len());
    for result in &outcome.components {
        let path = dir.join(format!("{}.paz", result.component));
        write_paz(&path, &result.fitted)?;
        paz_files.push(path);
    }

    let summary = dir.join("summary.json");
    let content = Summary {
        network: &station.network,
        station: &station.station,
        location: &station.location,
        sensor: &outcome.sensor,
        start: outcome.start,
        in_spec: outcome.in_spec(),
        settings: &outcome.settings,
        components: outcome
            .components
            .iter()
            .map(|r| ComponentSummary {
                component: r.component,
                in_spec: r.in_spec,
                max_amplitude_pct: r.deviation.max_amplitude_pct,
                max_phase_deg: r.deviation.max_phase_deg,
                sensitivity: r.sensitivity,
                lf_fit: r.lf_fit.as_ref(),
                hf_fit: r.hf_fit.as_ref(),
                fitted: &r.fitted,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(BufWriter::new(File::create(&summary)?), &content)?;

    info!(dir = %dir.display(), in_spec = outcome.in_spec(), "report written");
    Ok(ReportArtifacts {
        amplitude_plot,
        phase_plot,
        calibrate_result,
        response,
        paz_files,
        summary,
    })
}
