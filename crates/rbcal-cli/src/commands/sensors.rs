//! Sensor profile listing.

use clap::Args;
use rbcal_config::{factory_sensors, list_user_sensors, load_sensor_profile};
use rbcal_core::{Geometry, SensorProfile, find_profile};

#[derive(Args)]
pub struct SensorsArgs {
    /// Print one profile in full (TOML)
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

/// Factory profiles followed by readable user profiles.
fn all_profiles() -> Vec<(SensorProfile, &'static str)> {
    let mut profiles: Vec<_> = factory_sensors().into_iter().map(|p| (p, "factory")).collect();
    for path in list_user_sensors() {
        match load_sensor_profile(&path) {
            Ok(profile) => profiles.push((profile, "user")),
            Err(e) => tracing::warn!(path = %path.display(), "skipping profile: {e}"),
        }
    }
    profiles
}

pub fn run(args: SensorsArgs) -> anyhow::Result<()> {
    let profiles = all_profiles();

    if let Some(name) = args.name {
        // User profiles shadow factory ones of the same name
        let candidates: Vec<SensorProfile> =
            profiles.into_iter().rev().map(|(p, _)| p).collect();
        let profile = find_profile(&candidates, &name)?;
        print!("{}", toml::to_string_pretty(profile)?);
        return Ok(());
    }

    println!("Sensor Profiles");
    println!("===============");
    println!();
    println!(
        "{:<14} {:<8} {:>9} {:<11} {:<12} {:<12}",
        "Name", "Source", "Gain", "Geometry", "LF poles", "HF poles"
    );
    println!("{}", "-".repeat(72));
    for (profile, source) in &profiles {
        let geometry = match profile.geometry {
            Geometry::Orthogonal => "orthogonal",
            Geometry::Triaxial { .. } => "triaxial",
        };
        println!(
            "{:<14} {:<8} {:>9.1} {:<11} {:<12} {:<12}",
            profile.name,
            source,
            profile.sensor_gain,
            geometry,
            format!("{:?}", profile.lf_map.poles),
            format!("{:?}", profile.hf_map.poles),
        );
        if let Some(description) = &profile.description {
            println!("    {description}");
        }
    }
    Ok(())
}
