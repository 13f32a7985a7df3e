//! Deviation of one response from another.

use super::common::sample_rows;
use clap::Args;
use rbcal_analysis::{compare_responses, comparison_axis};
use rbcal_io::read_paz;
use std::path::PathBuf;

#[derive(Args)]
pub struct CompareArgs {
    /// Response under test (e.g. a fitted model)
    #[arg(value_name = "FITTED")]
    fitted: PathBuf,

    /// Reference response (e.g. the nominal model)
    #[arg(value_name = "NOMINAL")]
    nominal: PathBuf,

    /// Frequency step of the comparison axis (Hz)
    #[arg(long, default_value = "0.01")]
    step: f64,

    /// Upper end of the comparison axis (Hz)
    #[arg(long, default_value = "18.0")]
    max: f64,

    /// Normalisation frequency (Hz)
    #[arg(long, default_value = "1.0")]
    norm: f64,

    /// Amplitude tolerance (percent)
    #[arg(long, default_value = "5.0")]
    amp_tol: f64,

    /// Phase tolerance (degrees)
    #[arg(long, default_value = "5.0")]
    phase_tol: f64,

    /// Number of rows to print
    #[arg(long, default_value = "20")]
    rows: usize,
}

pub fn run(args: CompareArgs) -> anyhow::Result<()> {
    let fitted = read_paz(&args.fitted)?;
    let nominal = read_paz(&args.nominal)?;
    let axis = comparison_axis(args.step, args.max)?;
    let deviation = compare_responses(&fitted, &nominal, &axis, args.norm);

    println!("Response Comparison");
    println!("===================");
    println!("  Fitted:  {}", args.fitted.display());
    println!("  Nominal: {}", args.nominal.display());
    println!();
    println!("{:>12} {:>10} {:>10}", "Freq (Hz)", "Amp %", "Phase");
    for i in sample_rows(deviation.frequencies.len(), args.rows) {
        println!(
            "{:>12.4} {:>10.4} {:>10.4}",
            deviation.frequencies[i], deviation.amplitude_pct[i], deviation.phase_deg[i]
        );
    }
    println!();
    println!("  Max amplitude deviation: {:.4}%", deviation.max_amplitude_pct);
    println!("  Max phase deviation:     {:.4} deg", deviation.max_phase_deg);
    println!(
        "  Result: {}",
        if deviation.within(args.amp_tol, args.phase_tol) {
            "IN SPEC"
        } else {
            "OUT OF SPEC"
        }
    );
    Ok(())
}
