//! Cross spectrum of two traces.

use super::common::sample_rows;
use clap::Args;
use rbcal_analysis::cross_spectrum;
use rbcal_io::read_trace;
use std::path::PathBuf;

#[derive(Args)]
pub struct CrossArgs {
    /// Reference trace (e.g. the excitation input)
    #[arg(value_name = "A")]
    a: PathBuf,

    /// Response trace (e.g. a sensor output)
    #[arg(value_name = "B")]
    b: PathBuf,

    /// Write the full spectrum as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of rows to print
    #[arg(long, default_value = "20")]
    rows: usize,
}

pub fn run(args: CrossArgs) -> anyhow::Result<()> {
    let (mut a, a_info) = read_trace(&args.a)?;
    let (mut b, b_info) = read_trace(&args.b)?;
    if a_info.sample_rate != b_info.sample_rate {
        anyhow::bail!(
            "Sample rate mismatch: {} vs {}",
            a_info.sample_rate,
            b_info.sample_rate
        );
    }
    let len = a.len().min(b.len());
    a.truncate(len);
    b.truncate(len);
    let sample_rate = f64::from(a_info.sample_rate);

    let spectrum = cross_spectrum(&a, &b, sample_rate)?;

    println!("Cross Spectrum");
    println!("==============");
    println!("  A: {}", args.a.display());
    println!("  B: {}", args.b.display());
    println!(
        "  {} samples at {} sps, {} bins of {:.6} Hz",
        len,
        a_info.sample_rate,
        spectrum.len(),
        spectrum.bin_width()
    );
    println!();
    println!("{:>12} {:>14} {:>10} {:>10}", "Freq (Hz)", "Gain", "Phase", "Coh²");
    for i in sample_rows(spectrum.len(), args.rows) {
        println!(
            "{:>12.6} {:>14.6e} {:>10.3} {:>10.6}",
            spectrum.frequencies[i],
            spectrum.gain[i],
            spectrum.phase[i],
            spectrum.coherence[i]
        );
    }

    if let Some(path) = args.output {
        std::fs::write(&path, serde_json::to_string_pretty(&spectrum)?)?;
        println!();
        println!("Spectrum written to {}", path.display());
    }
    Ok(())
}
