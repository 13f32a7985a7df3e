//! Time-series preparation helpers.
//!
//! Statistics, tapering, edge trimming and FFT convolution with an analog
//! pole-zero response. Everything here works on plain `f64` slices.

use crate::fft::{Fft, bin_frequencies};
use rbcal_core::{Complex64, PoleZeroModel};
use std::f64::consts::PI;

/// Arithmetic mean (0 for an empty slice)
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance (divides by N)
pub fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let m = mean(samples);
    samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64
}

/// Subtract the mean in place
pub fn demean(samples: &mut [f64]) {
    let m = mean(samples);
    for x in samples.iter_mut() {
        *x -= m;
    }
}

/// Scale to zero mean and unit standard deviation in place
///
/// A constant series is only de-meaned.
pub fn standardize(samples: &mut [f64]) {
    demean(samples);
    let std = variance(samples).sqrt();
    if std > 0.0 && std.is_finite() {
        for x in samples.iter_mut() {
            *x /= std;
        }
    }
}

/// Tukey (tapered cosine) window with `fraction` of the length tapered at each end
pub fn tukey(len: usize, fraction: f64) -> Vec<f64> {
    let taper = (fraction.clamp(0.0, 0.5) * len as f64).floor() as usize;
    let mut window = vec![1.0; len];
    if taper == 0 {
        return window;
    }
    for i in 0..taper {
        let w = 0.5 * (1.0 - (PI * i as f64 / taper as f64).cos());
        window[i] = w;
        window[len - 1 - i] = w;
    }
    window
}

/// Multiply by a Tukey window in place
pub fn apply_taper(samples: &mut [f64], fraction: f64) {
    let window = tukey(samples.len(), fraction);
    for (x, w) in samples.iter_mut().zip(window) {
        *x *= w;
    }
}

/// Drop `count` samples from each end
///
/// Returns an empty vector when nothing would remain.
pub fn trim_edges(samples: &[f64], count: usize) -> Vec<f64> {
    if 2 * count >= samples.len() {
        return Vec::new();
    }
    samples[count..samples.len() - count].to_vec()
}

/// Filter a sampled signal through an analog pole-zero response
///
/// The signal is zero padded to at least twice its length, multiplied by
/// `H(f)` on the positive bins and `conj(H(|f|))` on the negative bins,
/// and transformed back. The output has the input's length.
pub fn convolve_response(samples: &[f64], model: &PoleZeroModel, sample_rate: f64) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let size = (2 * samples.len()).next_power_of_two();
    let fft = Fft::new(size);
    let mut spectrum = fft.forward_real(samples);
    for (bin, f) in spectrum.iter_mut().zip(bin_frequencies(size, sample_rate)) {
        let h = if f >= 0.0 {
            model.response(f)
        } else {
            model.response(-f).conj()
        };
        *bin *= if h.is_finite() { h } else { Complex64::new(0.0, 0.0) };
    }
    fft.inverse_complex(&mut spectrum);
    spectrum.iter().take(samples.len()).map(|c| c.re).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbcal_core::{Mode, Units};
    use std::f64::consts::TAU;

    #[test]
    fn test_statistics() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&x), 2.5);
        assert_eq!(variance(&x), 1.25);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_standardize() {
        let mut x: Vec<f64> = (0..100).map(|i| 3.0 * i as f64 + 7.0).collect();
        standardize(&mut x);
        assert!(mean(&x).abs() < 1e-12);
        assert!((variance(&x) - 1.0).abs() < 1e-12);

        let mut flat = vec![2.0; 5];
        standardize(&mut flat);
        assert_eq!(flat, vec![0.0; 5]);
    }

    #[test]
    fn test_tukey_shape() {
        let w = tukey(100, 0.1);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[99], 0.0);
        assert_eq!(w[10], 1.0);
        assert_eq!(w[50], 1.0);
        assert!(w[5] > 0.0 && w[5] < 1.0);
        assert_eq!(tukey(10, 0.0), vec![1.0; 10]);
    }

    #[test]
    fn test_trim_edges() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(trim_edges(&x, 1), vec![1.0, 2.0, 3.0]);
        assert!(trim_edges(&x, 3).is_empty());
    }

    #[test]
    fn test_convolve_unity_response() {
        let model = PoleZeroModel::new(Mode::Acceleration, Units::Radians);
        let x: Vec<f64> = (0..300).map(|i| (i as f64 * 0.37).sin()).collect();
        let y = convolve_response(&x, &model, 10.0);
        for (a, b) in x.iter().zip(&y) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_convolve_single_pole_gain() {
        // H(s) = 1/(s + 2π): half-power at 1 Hz
        let mut model = PoleZeroModel::new(Mode::Acceleration, Units::Radians);
        model.add_pole(Complex64::new(-TAU, 0.0));
        model.set_h0(TAU);
        let fs = 64.0;
        let n = 4096;
        let tone = |f: f64| -> Vec<f64> { (0..n).map(|i| (TAU * f * i as f64 / fs).sin()).collect() };

        let rms = |x: &[f64]| (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt();
        let low = convolve_response(&tone(0.0625), &model, fs);
        let high = convolve_response(&tone(8.0), &model, fs);
        let core = 512..n - 512;
        let ref_rms = rms(&tone(1.0)[core.clone()]);
        assert!((rms(&low[core.clone()]) / ref_rms - 1.0).abs() < 0.01);
        assert!((rms(&high[core]) / ref_rms - 1.0 / 65f64.sqrt()).abs() < 0.01);
    }
}
