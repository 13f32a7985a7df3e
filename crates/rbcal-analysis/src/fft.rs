//! FFT wrapper over rustfft in double precision

use rbcal_core::Complex64;
use rustfft::FftPlanner;
use std::sync::Arc;

/// FFT processor with cached forward and inverse plans
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f64>>,
    ifft: Arc<dyn rustfft::Fft<f64>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        Self { fft, ifft, size }
    }

    /// Forward transform of real input, zero padded (or truncated) to the FFT size
    ///
    /// Returns the full complex spectrum with the `e^{-iωt}` kernel.
    pub fn forward_real(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Perform inverse FFT on complex buffer (in-place, normalised by 1/N)
    pub fn inverse_complex(&self, buffer: &mut [Complex64]) {
        self.ifft.process(buffer);

        let scale = 1.0 / self.size as f64;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

/// Frequency of each bin of an `fft_size`-point transform, folded to ±fs/2
///
/// Bins above `fft_size / 2` map to negative frequencies.
pub fn bin_frequencies(fft_size: usize, sample_rate: f64) -> Vec<f64> {
    let df = sample_rate / fft_size as f64;
    (0..fft_size)
        .map(|k| {
            if k <= fft_size / 2 {
                k as f64 * df
            } else {
                -((fft_size - k) as f64) * df
            }
        })
        .collect()
}
