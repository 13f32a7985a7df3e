//! Full calibration analysis from a run file.

use super::common::stage;
use clap::Args;
use rbcal_analysis::{Calibration, CalibrationOutcome};
use rbcal_config::{RunConfig, validate_run_config};
use rbcal_core::Band;
use rbcal_io::{Station, load_calibration_run, read_paz, write_report};
use std::path::PathBuf;

#[derive(Args)]
pub struct CalibrateArgs {
    /// Run configuration file (TOML)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Report directory (overrides `output_dir` in the run file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analyse the three components in parallel
    #[arg(long)]
    parallel: bool,
}

pub fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let mut config = RunConfig::load(&args.config)?;
    if args.parallel {
        config.settings.parallel = true;
    }
    validate_run_config(&config)?;
    let profile = config.sensor_profile()?;

    println!("Calibration");
    println!("===========");
    println!("  Station: {}.{}.{}", config.network, config.station, config.location);
    println!("  Sensor:  {}", profile.name);
    println!();

    let nominal = stage("Reading nominal response", || {
        Ok(read_paz(&config.nominal_response)?)
    })?;
    let lf = stage("Loading long-period run", || {
        let run = &config.low_frequency;
        Ok(load_calibration_run(&run.waveforms, &run.log, Band::Low, &config.input_channel)?)
    })?;
    let hf = stage("Loading short-period run", || {
        let run = &config.high_frequency;
        Ok(load_calibration_run(&run.waveforms, &run.log, Band::High, &config.input_channel)?)
    })?;

    let outcome = stage("Fitting responses", || {
        let calibration = Calibration::new(nominal, profile, config.settings.clone())?;
        Ok(calibration.run(lf, hf)?)
    })?;

    let station = Station {
        network: config.network.clone(),
        station: config.station.clone(),
        location: config.location.clone(),
        channel_prefix: config.channel_prefix.clone(),
        instrument_type: config.instrument_type().to_string(),
    };
    let out_dir = args.output.unwrap_or_else(|| config.output_dir.clone());
    let artifacts = stage("Writing report", || Ok(write_report(&out_dir, &outcome, &station)?))?;

    println!();
    print_table(&outcome);
    println!();
    println!("Report written to {}", out_dir.display());
    println!("  {}", artifacts.summary.display());
    Ok(())
}

fn print_table(outcome: &CalibrationOutcome) {
    let settings = &outcome.settings;
    println!(
        "{:<10} {:>9} {:>9} {:>14} {:>8} {:>8} {:>8}",
        "Component", "Amp %", "Phase", "nm/count", "LF eval", "HF eval", "In spec"
    );
    println!("{}", "-".repeat(72));
    for result in &outcome.components {
        let evals = |fit: Option<&rbcal_analysis::BandFit>| {
            fit.map_or_else(|| "-".to_string(), |f| f.outcome.evaluations.to_string())
        };
        println!(
            "{:<10} {:>9.3} {:>9.3} {:>14.6e} {:>8} {:>8} {:>8}",
            result.component.name(),
            result.deviation.max_amplitude_pct,
            result.deviation.max_phase_deg,
            result.sensitivity.nm_per_count,
            evals(result.lf_fit.as_ref()),
            evals(result.hf_fit.as_ref()),
            if result.in_spec { "yes" } else { "NO" },
        );
    }
    println!();
    println!(
        "Tolerance: {:.1}% amplitude, {:.1} deg phase up to {} Hz",
        settings.amplitude_tolerance_pct, settings.phase_tolerance_deg, settings.comparison_max_hz
    );
    println!(
        "Overall: {}",
        if outcome.in_spec() { "IN SPEC" } else { "OUT OF SPEC" }
    );
}
