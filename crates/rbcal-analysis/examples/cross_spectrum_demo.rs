//! Cross-spectrum demo: excite a broadband sensor with a random-binary
//! sequence and recover its transfer function.
//!
//! Run with: cargo run -p rbcal-analysis --example cross_spectrum_demo

use rbcal_analysis::signal::convolve_response;
use rbcal_analysis::{TransferFunction, cross_spectrum};
use rbcal_core::{Complex64, Mode, PoleZeroModel, Units};

fn main() -> rbcal_core::Result<()> {
    let sample_rate = 40.0;

    let mut sensor = PoleZeroModel::from_parts(
        Mode::Velocity,
        Units::Radians,
        vec![
            Complex64::new(-0.037, 0.037),
            Complex64::new(-0.037, -0.037),
            Complex64::new(-50.0, 50.0),
            Complex64::new(-50.0, -50.0),
        ],
        vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
    );
    sensor.normalize_at(1.0);
    println!("=== Sensor ===\n{sensor}");

    // --- Random-binary excitation ---
    let mut state = 0x0123_4567_89ab_cdefu64;
    let input: Vec<f64> = (0..16384)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            if state >> 63 == 0 { 1.0 } else { -1.0 }
        })
        .collect();

    // The calibration coil drives acceleration
    let acceleration = sensor.converted(Mode::Acceleration, Units::Radians, 1.0)?;
    let output = convolve_response(&input, &acceleration, sample_rate);

    let spectrum = cross_spectrum(&input, &output, sample_rate)?;
    println!(
        "{} bins of {:.6} Hz\n",
        spectrum.len(),
        spectrum.bin_width()
    );

    let measured = TransferFunction::from_cross(&spectrum)
        .band(0.1, 15.0)
        .normalized_at(1.0)?;
    let expected = acceleration.normalized_response(&measured.frequencies, 1.0);

    println!("{:>10} {:>12} {:>12} {:>10}", "Freq (Hz)", "Measured", "Expected", "Coh²");
    for freq in [0.2, 0.5, 1.0, 2.0, 5.0, 10.0] {
        let Some(i) = measured.frequencies.iter().position(|&f| f >= freq) else {
            continue;
        };
        let bin = spectrum.frequencies.iter().position(|&f| f >= freq).unwrap_or(0);
        println!(
            "{:>10.4} {:>12.6} {:>12.6} {:>10.6}",
            measured.frequencies[i],
            measured.values[i].norm(),
            expected[i].norm(),
            spectrum.coherence[bin]
        );
    }
    Ok(())
}
