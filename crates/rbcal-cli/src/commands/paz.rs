//! Print a response file, optionally converted.

use clap::Args;
use rbcal_core::{Mode, Units};
use rbcal_io::{read_paz, write_paz};
use std::path::PathBuf;

#[derive(Args)]
pub struct PazArgs {
    /// Response file (IDA PAZ)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Target mode: acc, vel or disp
    #[arg(long)]
    mode: Option<String>,

    /// Target units: rad or hz
    #[arg(long)]
    units: Option<String>,

    /// Normalisation frequency (Hz)
    #[arg(long, default_value = "1.0")]
    norm: f64,

    /// Also write the converted model to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: PazArgs) -> anyhow::Result<()> {
    let model = read_paz(&args.file)?;
    let mode = match &args.mode {
        Some(name) => name.parse::<Mode>()?,
        None => model.mode(),
    };
    let units = match &args.units {
        Some(name) => name.parse::<Units>()?,
        None => model.units(),
    };
    let converted = model.converted(mode, units, args.norm)?;

    println!("{}", args.file.display());
    print!("{converted}");
    println!("  |H({} Hz)| = {:.6}", args.norm, converted.response(args.norm).norm());

    if let Some(path) = args.output {
        write_paz(&path, &converted)?;
        println!("Written to {}", path.display());
    }
    Ok(())
}
