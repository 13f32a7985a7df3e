//! Fit a partial pole-zero model to a measured transfer function.
//!
//! The measured transfer function is the ratio between the sensor's true
//! response and the nominal response, restricted to one band and
//! normalised in magnitude at the band's reference frequency. The fitter
//! adjusts the real and imaginary parts of the partial model's poles and
//! zeros until
//!
//! ```text
//! T(f) = (H(f) / |H(f_norm)|) / reference(f)
//! ```
//!
//! matches the measurement, where `reference` is the nominal partial's
//! normalised response.

use crate::lsq::{Termination, TrustRegion};
use crate::transfer_fn::TransferFunction;
use rbcal_core::{Complex64, Error, FitOptions, PoleZeroModel, Result};
use serde::Serialize;
use tracing::debug;

/// What one flattened parameter stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// Real part of pole `i`.
    PoleRe(usize),
    /// Imaginary part of pole `i`.
    PoleIm(usize),
    /// Real part of zero `i`.
    ZeroRe(usize),
    /// Imaginary part of zero `i`.
    ZeroIm(usize),
}

/// Flatten poles then zeros into `(re, im)` pairs in index order.
pub fn flatten(model: &PoleZeroModel) -> Result<(Vec<f64>, Vec<ParamRole>)> {
    let poles = model.poles(None);
    let zeros = model.zeros(None, None)?;
    let mut values = Vec::with_capacity(2 * (poles.len() + zeros.len()));
    let mut roles = Vec::with_capacity(values.capacity());
    for (i, p) in poles.iter().enumerate() {
        values.extend([p.re, p.im]);
        roles.extend([ParamRole::PoleRe(i), ParamRole::PoleIm(i)]);
    }
    for (i, z) in zeros.iter().enumerate() {
        values.extend([z.re, z.im]);
        roles.extend([ParamRole::ZeroRe(i), ParamRole::ZeroIm(i)]);
    }
    Ok((values, roles))
}

/// Rebuild a model shaped like `template` from flattened values.
///
/// The result is normalised at `norm_freq`.
pub fn repack(
    template: &PoleZeroModel,
    values: &[f64],
    roles: &[ParamRole],
    norm_freq: f64,
) -> Result<PoleZeroModel> {
    if values.len() != roles.len() {
        return Err(Error::InvalidInput(format!(
            "{} values for {} parameter roles",
            values.len(),
            roles.len()
        )));
    }
    let mut poles = template.poles(None);
    let mut zeros = template.zeros(None, None)?;
    for (&value, role) in values.iter().zip(roles) {
        let slot = match *role {
            ParamRole::PoleRe(i) => poles.get_mut(i).map(|c| &mut c.re),
            ParamRole::PoleIm(i) => poles.get_mut(i).map(|c| &mut c.im),
            ParamRole::ZeroRe(i) => zeros.get_mut(i).map(|c| &mut c.re),
            ParamRole::ZeroIm(i) => zeros.get_mut(i).map(|c| &mut c.im),
        };
        let Some(slot) = slot else {
            return Err(Error::InvalidParameter(format!(
                "{role:?} out of range for the template model"
            )));
        };
        *slot = value;
    }
    let mut model = PoleZeroModel::from_parts(template.mode(), template.units(), poles, zeros);
    model.normalize_at(norm_freq);
    Ok(model)
}

/// Box `[x − f|x|, x + f|x|]` around every value.
pub fn bounds(values: &[f64], fraction: f64) -> (Vec<f64>, Vec<f64>) {
    values
        .iter()
        .map(|&x| {
            let half = fraction * x.abs();
            (x - half, x + half)
        })
        .unzip()
}

/// Fitted partial model and solver diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitOutcome {
    /// Fitted partial model, normalised at the band's reference frequency.
    pub model: PoleZeroModel,
    /// Final cost `½·Σr²`.
    pub cost: f64,
    /// Residual evaluations used.
    pub evaluations: usize,
    /// Why the solver stopped.
    pub termination: Termination,
}

/// Fits the perturbable poles and zeros of one band.
#[derive(Debug, Clone)]
pub struct ResponseFitter {
    options: FitOptions,
}

impl ResponseFitter {
    /// Fitter with the given solver options.
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    /// Residual of every bin for a trial model.
    ///
    /// One scalar per bin: `|T_trial(f) − target(f)|`.
    pub fn residuals(
        trial: &PoleZeroModel,
        target: &TransferFunction,
        reference: &[Complex64],
        norm_freq: f64,
    ) -> Vec<f64> {
        let trial_response = trial.normalized_response(&target.frequencies, norm_freq);
        trial_response
            .iter()
            .zip(reference)
            .zip(&target.values)
            .map(|((h, r), t)| (h / r - t).norm())
            .collect()
    }

    /// Fit `initial` so that its ratio to `reference` matches `target`.
    ///
    /// `reference` holds one value per bin of `target`. Bins whose measured
    /// value or reference is not finite (or whose reference is zero) carry
    /// no information and are left out of the fit. Non-finite residuals of
    /// a trial are replaced by a large penalty, so the solver backs away
    /// from them.
    pub fn fit(
        &self,
        initial: &PoleZeroModel,
        target: &TransferFunction,
        reference: &[Complex64],
        norm_freq: f64,
    ) -> Result<FitOutcome> {
        if target.is_empty() {
            return Err(Error::InsufficientData { needed: 1, got: 0 });
        }
        if reference.len() != target.len() {
            return Err(Error::InvalidInput(format!(
                "{} reference values for {} target bins",
                reference.len(),
                target.len()
            )));
        }
        let (target, reference) = usable_bins(target, reference)?;
        let (target, reference) = (&target, reference.as_slice());
        let (x0, roles) = flatten(initial)?;
        let (lower, upper) = bounds(&x0, self.options.bound_fraction);

        let residual = |values: &[f64]| -> Vec<f64> {
            match repack(initial, values, &roles, norm_freq) {
                Ok(trial) => Self::residuals(&trial, target, reference, norm_freq)
                    .into_iter()
                    .map(|r| if r.is_finite() { r } else { 1e6 })
                    .collect(),
                Err(_) => vec![1e6; target.len()],
            }
        };
        let solution = TrustRegion::new(&self.options).minimize(residual, &x0, &lower, &upper);
        let model = repack(initial, &solution.x, &roles, norm_freq)?;

        debug!(
            parameters = x0.len(),
            bins = target.len(),
            cost = solution.cost,
            evaluations = solution.evaluations,
            termination = %solution.termination,
            "response fit"
        );
        Ok(FitOutcome {
            model,
            cost: solution.cost,
            evaluations: solution.evaluations,
            termination: solution.termination,
        })
    }
}

/// Keep only the bins whose target and reference values can enter a residual.
fn usable_bins(
    target: &TransferFunction,
    reference: &[Complex64],
) -> Result<(TransferFunction, Vec<Complex64>)> {
    let mut frequencies = Vec::with_capacity(target.len());
    let mut values = Vec::with_capacity(target.len());
    let mut kept = Vec::with_capacity(target.len());
    for ((&f, &t), &r) in target.frequencies.iter().zip(&target.values).zip(reference) {
        if f.is_finite() && t.is_finite() && r.is_finite() && r.norm() > 0.0 {
            frequencies.push(f);
            values.push(t);
            kept.push(r);
        }
    }
    let dropped = target.len() - kept.len();
    if kept.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            got: 0,
        });
    }
    if dropped > 0 {
        debug!(dropped, kept = kept.len(), "skipping non-finite bins in response fit");
    }
    Ok((TransferFunction::new(frequencies, values)?, kept))
}
