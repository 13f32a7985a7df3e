//! rbcal CLI - random-binary seismometer calibration analysis.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rbcal")]
#[command(author, version, about = "Random-binary seismometer calibration", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full calibration analysis described by a run file
    Calibrate(commands::calibrate::CalibrateArgs),

    /// Multitaper cross spectrum of two traces
    Cross(commands::cross::CrossArgs),

    /// Amplitude/phase deviation of one response from another
    Compare(commands::compare::CompareArgs),

    /// Print a response file, optionally converted
    Paz(commands::paz::PazArgs),

    /// List factory and user sensor profiles
    Sensors(commands::sensors::SensorsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Cross(args) => commands::cross::run(args),
        Commands::Compare(args) => commands::compare::run(args),
        Commands::Paz(args) => commands::paz::run(args),
        Commands::Sensors(args) => commands::sensors::run(args),
    }
}
