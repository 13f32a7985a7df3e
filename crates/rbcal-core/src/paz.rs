//! Pole-zero (PAZ) analog response model.
//!
//! A [`PoleZeroModel`] describes a sensor response as
//!
//! ```text
//! H(s) = h0 · Π(s − zᵢ) / Π(s − pⱼ)
//! ```
//!
//! with `s = i·2πf` when the poles and zeros are stored in radians per second
//! and `s = i·f` when they are stored in hertz.
//!
//! # Modes
//!
//! The same sensor can be described relative to ground acceleration,
//! velocity or displacement. Moving from one domain to the next adds one
//! zero at the origin:
//!
//! | Mode | Zeros at origin (relative) |
//! |------|----------------------------|
//! | [`Mode::Acceleration`] | 0 |
//! | [`Mode::Velocity`] | 1 |
//! | [`Mode::Displacement`] | 2 |
//!
//! Mode shifts never touch the finite poles or the non-zero zeros.
//!
//! # Partial models
//!
//! Fitting works on a sub-model holding only the perturbable poles and zeros
//! (see [`PazIndexMap`]). [`PoleZeroModel::make_partial`] copies them out,
//! [`PoleZeroModel::merge_paz_partial`] writes fitted values back.
//!
//! ```rust
//! use rbcal_core::paz::{Mode, PazIndexMap, PoleZeroModel, Units};
//! use rbcal_core::Complex64;
//!
//! let mut model = PoleZeroModel::new(Mode::Velocity, Units::Radians);
//! model.add_zero(Complex64::new(0.0, 0.0));
//! model.add_zero(Complex64::new(0.0, 0.0));
//! model.add_pole(Complex64::new(-0.037, 0.037));
//! model.add_pole(Complex64::new(-0.037, -0.037));
//! model.normalize_at(1.0);
//!
//! let map = PazIndexMap::new(vec![0, 1], vec![]);
//! let partial = model.make_partial(&map, 0.05).unwrap();
//! assert_eq!(partial.num_poles(), 2);
//! assert!((partial.response(0.05).norm() - 1.0).abs() < 1e-12);
//! ```

use crate::error::{Error, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

const ORIGIN: Complex64 = Complex64::new(0.0, 0.0);

/// Ground-motion domain a response is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Output per unit ground acceleration.
    Acceleration,
    /// Output per unit ground velocity.
    Velocity,
    /// Output per unit ground displacement.
    Displacement,
}

impl Mode {
    /// Relative number of zeros at the origin for this domain.
    pub fn origin_zeros(self) -> usize {
        match self {
            Mode::Acceleration => 0,
            Mode::Velocity => 1,
            Mode::Displacement => 2,
        }
    }

    /// Long lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Acceleration => "acceleration",
            Mode::Velocity => "velocity",
            Mode::Displacement => "displacement",
        }
    }

    /// Short name used in response files (`acc`, `vel`, `disp`).
    pub fn short_name(self) -> &'static str {
        match self {
            Mode::Acceleration => "acc",
            Mode::Velocity => "vel",
            Mode::Displacement => "disp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acc" | "acceleration" => Ok(Mode::Acceleration),
            "vel" | "velocity" => Ok(Mode::Velocity),
            "disp" | "displacement" => Ok(Mode::Displacement),
            other => Err(Error::InvalidParameter(format!("unknown response mode '{other}'"))),
        }
    }
}

/// Frequency units of stored poles and zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Angular frequency (rad/s).
    #[serde(alias = "rad")]
    Radians,
    /// Frequency (Hz).
    #[serde(alias = "hz")]
    Hertz,
}

impl Units {
    /// Short name (`rad` or `hz`).
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Radians => "rad",
            Units::Hertz => "hz",
        }
    }

    /// Multiplier that takes a value stored in `self` units to `to` units.
    pub fn scale_to(self, to: Units) -> f64 {
        match (self, to) {
            (Units::Hertz, Units::Radians) => TAU,
            (Units::Radians, Units::Hertz) => 1.0 / TAU,
            _ => 1.0,
        }
    }

    /// Laplace variable `s` at frequency `freq_hz` for values stored in these units.
    pub fn laplace(self, freq_hz: f64) -> Complex64 {
        match self {
            Units::Radians => Complex64::new(0.0, TAU * freq_hz),
            Units::Hertz => Complex64::new(0.0, freq_hz),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rad" | "radians" => Ok(Units::Radians),
            "hz" | "hertz" => Ok(Units::Hertz),
            other => Err(Error::InvalidParameter(format!("unknown response units '{other}'"))),
        }
    }
}

/// Ordered pole and zero indices selecting a sub-model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PazIndexMap {
    /// Pole indices, in the order they appear in the partial model.
    #[serde(default)]
    pub poles: Vec<usize>,
    /// Zero indices, in the order they appear in the partial model.
    #[serde(default)]
    pub zeros: Vec<usize>,
}

impl PazIndexMap {
    /// Create a map from pole and zero index lists.
    pub fn new(poles: Vec<usize>, zeros: Vec<usize>) -> Self {
        Self { poles, zeros }
    }

    /// True when no pole or zero is selected.
    pub fn is_empty(&self) -> bool {
        self.poles.is_empty() && self.zeros.is_empty()
    }

    /// Check every index against a model's pole and zero counts.
    pub fn check(&self, model: &PoleZeroModel) -> Result<()> {
        if let Some(&bad) = self.poles.iter().find(|&&i| i >= model.num_poles()) {
            return Err(Error::InvalidParameter(format!(
                "pole index {bad} out of range (model has {} poles)",
                model.num_poles()
            )));
        }
        if let Some(&bad) = self.zeros.iter().find(|&&i| i >= model.num_zeros()) {
            return Err(Error::InvalidParameter(format!(
                "zero index {bad} out of range (model has {} zeros)",
                model.num_zeros()
            )));
        }
        Ok(())
    }
}

/// Analog pole-zero response with normalisation gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleZeroModel {
    mode: Mode,
    units: Units,
    poles: Vec<Complex64>,
    zeros: Vec<Complex64>,
    h0: f64,
}

impl PoleZeroModel {
    /// Create an empty model with unit gain.
    pub fn new(mode: Mode, units: Units) -> Self {
        Self::from_parts(mode, units, Vec::new(), Vec::new())
    }

    /// Create a model from pole and zero lists, with unit gain.
    pub fn from_parts(
        mode: Mode,
        units: Units,
        poles: Vec<Complex64>,
        zeros: Vec<Complex64>,
    ) -> Self {
        Self {
            mode,
            units,
            poles,
            zeros,
            h0: 1.0,
        }
    }

    /// Create a model from string mode/units, as found in response files.
    pub fn with_names(mode: &str, units: &str) -> Result<Self> {
        Ok(Self::new(mode.parse()?, units.parse()?))
    }

    /// Builder-style gain setter.
    pub fn with_h0(mut self, h0: f64) -> Self {
        self.h0 = h0;
        self
    }

    /// Response domain.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Units of the stored poles and zeros.
    pub fn units(&self) -> Units {
        self.units
    }

    /// Normalisation gain.
    pub fn h0(&self) -> f64 {
        self.h0
    }

    /// Set the normalisation gain.
    pub fn set_h0(&mut self, h0: f64) {
        self.h0 = h0;
    }

    /// Number of poles.
    pub fn num_poles(&self) -> usize {
        self.poles.len()
    }

    /// Number of zeros.
    pub fn num_zeros(&self) -> usize {
        self.zeros.len()
    }

    /// Append a pole.
    pub fn add_pole(&mut self, value: Complex64) {
        self.poles.push(value);
    }

    /// Append a zero.
    pub fn add_zero(&mut self, value: Complex64) {
        self.zeros.push(value);
    }

    /// Copy of the poles, optionally converted to other units.
    ///
    /// Unlike [`zeros`](Self::zeros) this takes no mode: a mode shift only
    /// adds or strips zeros at the origin, so the poles are the same in
    /// every mode.
    pub fn poles(&self, units: Option<Units>) -> Vec<Complex64> {
        let scale = self.units.scale_to(units.unwrap_or(self.units));
        self.poles.iter().map(|p| p * scale).collect()
    }

    /// Copy of the zeros, optionally shifted to another mode and units.
    pub fn zeros(&self, mode: Option<Mode>, units: Option<Units>) -> Result<Vec<Complex64>> {
        let mut zeros = self.shifted_zeros(mode.unwrap_or(self.mode))?;
        let scale = self.units.scale_to(units.unwrap_or(self.units));
        for z in &mut zeros {
            *z *= scale;
        }
        Ok(zeros)
    }

    fn shifted_zeros(&self, to: Mode) -> Result<Vec<Complex64>> {
        let have = self.mode.origin_zeros();
        let want = to.origin_zeros();
        let mut zeros = self.zeros.clone();
        match want.cmp(&have) {
            Ordering::Greater => {
                let extra = std::iter::repeat_n(ORIGIN, want - have);
                zeros.splice(0..0, extra);
            }
            Ordering::Less => {
                let needed = have - want;
                let available = zeros.iter().filter(|z| **z == ORIGIN).count();
                if available < needed {
                    return Err(Error::IncompatibleMode {
                        from: self.mode,
                        to,
                        needed,
                        available,
                    });
                }
                let mut remaining = needed;
                zeros.retain(|z| {
                    if remaining > 0 && *z == ORIGIN {
                        remaining -= 1;
                        false
                    } else {
                        true
                    }
                });
            }
            Ordering::Equal => {}
        }
        Ok(zeros)
    }

    /// Unscaled transfer ratio `Π(s − z) / Π(s − p)` at one frequency.
    fn ratio(&self, freq_hz: f64) -> Complex64 {
        let s = self.units.laplace(freq_hz);
        let num: Complex64 = self.zeros.iter().map(|z| s - z).product();
        let den: Complex64 = self.poles.iter().map(|p| s - p).product();
        num / den
    }

    /// Complex response at `freq_hz`, including `h0`.
    pub fn response(&self, freq_hz: f64) -> Complex64 {
        self.ratio(freq_hz) * self.h0
    }

    /// Complex response at every frequency.
    pub fn response_at(&self, freqs: &[f64]) -> Vec<Complex64> {
        freqs.iter().map(|&f| self.response(f)).collect()
    }

    /// Response divided by its magnitude at `norm_freq`.
    pub fn normalized_response(&self, freqs: &[f64], norm_freq: f64) -> Vec<Complex64> {
        let scale = 1.0 / self.ratio(norm_freq).norm();
        freqs.iter().map(|&f| self.ratio(f) * scale).collect()
    }

    /// Set `h0` so that |H(norm_freq)| = 1.
    pub fn normalize_at(&mut self, norm_freq: f64) {
        self.h0 = 1.0 / self.ratio(norm_freq).norm();
    }

    /// Independent copy in another mode and units, normalised at `norm_freq`.
    pub fn converted(&self, mode: Mode, units: Units, norm_freq: f64) -> Result<Self> {
        let mut model = Self::from_parts(
            mode,
            units,
            self.poles(Some(units)),
            self.zeros(Some(mode), Some(units))?,
        );
        model.normalize_at(norm_freq);
        Ok(model)
    }

    /// Sub-model of the selected poles and zeros, normalised at `norm_freq`.
    pub fn make_partial(&self, map: &PazIndexMap, norm_freq: f64) -> Result<Self> {
        map.check(self)?;
        let mut partial = Self::from_parts(
            self.mode,
            self.units,
            map.poles.iter().map(|&i| self.poles[i]).collect(),
            map.zeros.iter().map(|&i| self.zeros[i]).collect(),
        );
        partial.normalize_at(norm_freq);
        Ok(partial)
    }

    /// Write a partial model's values back at the mapped positions.
    ///
    /// `h0` of `self` is recomputed so that |H(norm_freq)| = 1. Positions not
    /// named by `map` keep their values.
    pub fn merge_paz_partial(
        &mut self,
        partial: &PoleZeroModel,
        map: &PazIndexMap,
        norm_freq: f64,
    ) -> Result<()> {
        map.check(self)?;
        if partial.num_poles() != map.poles.len() || partial.num_zeros() != map.zeros.len() {
            return Err(Error::InvalidParameter(format!(
                "partial model has {} poles / {} zeros but the map names {} / {}",
                partial.num_poles(),
                partial.num_zeros(),
                map.poles.len(),
                map.zeros.len()
            )));
        }
        let scale = partial.units.scale_to(self.units);
        for (&i, p) in map.poles.iter().zip(&partial.poles) {
            self.poles[i] = p * scale;
        }
        for (&i, z) in map.zeros.iter().zip(&partial.zeros) {
            self.zeros[i] = z * scale;
        }
        self.normalize_at(norm_freq);
        Ok(())
    }
}

impl fmt::Display for PoleZeroModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PAZ ({}, {}), h0 = {:.8e}",
            self.mode, self.units, self.h0
        )?;
        writeln!(f, "  {} zeros", self.zeros.len())?;
        for z in &self.zeros {
            writeln!(f, "    {:>16.8e} {:>16.8e}", z.re, z.im)?;
        }
        writeln!(f, "  {} poles", self.poles.len())?;
        for p in &self.poles {
            writeln!(f, "    {:>16.8e} {:>16.8e}", p.re, p.im)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    /// Broadband velocity sensor: 120 s corner plus a 50 Hz pair.
    fn broadband() -> PoleZeroModel {
        let mut model = PoleZeroModel::from_parts(
            Mode::Velocity,
            Units::Radians,
            vec![c(-0.037, 0.037), c(-0.037, -0.037), c(-222.0, 222.0), c(-222.0, -222.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0)],
        );
        model.normalize_at(1.0);
        model
    }

    #[test]
    fn mode_and_units_parse() {
        assert_eq!("VEL".parse::<Mode>().unwrap(), Mode::Velocity);
        assert_eq!("displacement".parse::<Mode>().unwrap(), Mode::Displacement);
        assert_eq!("hz".parse::<Units>().unwrap(), Units::Hertz);
        assert!(matches!("jerk".parse::<Mode>(), Err(Error::InvalidParameter(_))));
        assert!(matches!("rpm".parse::<Units>(), Err(Error::InvalidParameter(_))));
        assert!(PoleZeroModel::with_names("vel", "furlongs").is_err());
    }

    #[test]
    fn zeros_shift_to_displacement_prepends_origin() {
        let mut model = PoleZeroModel::new(Mode::Velocity, Units::Radians);
        model.add_zero(c(-5.0, 0.0));
        let zeros = model.zeros(Some(Mode::Displacement), None).unwrap();
        assert_eq!(zeros, vec![c(0.0, 0.0), c(-5.0, 0.0)]);
        // Source untouched
        assert_eq!(model.num_zeros(), 1);
    }

    #[test]
    fn zeros_shift_to_acceleration_strips_origin() {
        let model = broadband();
        let zeros = model.zeros(Some(Mode::Acceleration), None).unwrap();
        assert_eq!(zeros.len(), 1);
        assert_eq!(zeros[0], c(0.0, 0.0));
    }

    #[test]
    fn zeros_shift_fails_without_origin_zeros() {
        let mut model = PoleZeroModel::new(Mode::Displacement, Units::Radians);
        model.add_zero(c(0.0, 0.0));
        model.add_zero(c(-3.0, 1.0));
        let err = model.zeros(Some(Mode::Acceleration), None).unwrap_err();
        assert_eq!(
            err,
            Error::IncompatibleMode {
                from: Mode::Displacement,
                to: Mode::Acceleration,
                needed: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn mode_shift_keeps_finite_values() {
        let mut model = PoleZeroModel::new(Mode::Velocity, Units::Radians);
        model.add_zero(c(-1.0, 2.0));
        model.add_zero(c(0.0, 0.0));
        model.add_zero(c(-7.0, 0.0));
        let zeros = model.zeros(Some(Mode::Acceleration), None).unwrap();
        assert_eq!(zeros, vec![c(-1.0, 2.0), c(-7.0, 0.0)]);
    }

    #[test]
    fn mode_conversion_keeps_poles() {
        let vel = broadband();
        for mode in [Mode::Displacement, Mode::Acceleration] {
            let shifted = vel.converted(mode, Units::Radians, 1.0).unwrap();
            assert_eq!(shifted.poles(None), vel.poles(None), "{mode:?}");
        }
        let disp = vel.converted(Mode::Displacement, Units::Radians, 1.0).unwrap();
        assert_eq!(disp.num_zeros(), vel.num_zeros() + 1);
        assert_eq!(disp.num_poles(), vel.num_poles());
    }

    #[test]
    fn unit_conversion_scales_by_two_pi() {
        let model = broadband();
        let hz = model.poles(Some(Units::Hertz));
        assert!((hz[0].re - (-0.037 / TAU)).abs() < 1e-15);
        assert!((hz[2].im - 222.0 / TAU).abs() < 1e-12);
    }

    #[test]
    fn response_independent_of_units_after_normalisation() {
        let rad = broadband();
        let hz = rad.converted(Mode::Velocity, Units::Hertz, 1.0).unwrap();
        for f in [0.001, 0.01, 0.1, 1.0, 10.0, 30.0] {
            let a = rad.response(f);
            let b = hz.response(f);
            assert!((a - b).norm() < 1e-9 * a.norm().max(1.0), "{f}: {a} vs {b}");
        }
    }

    #[test]
    fn displacement_response_adds_two_pi_f() {
        let vel = broadband();
        let disp = vel.converted(Mode::Displacement, Units::Radians, 1.0).unwrap();
        let vel_norm = vel.normalized_response(&[2.0], 1.0)[0];
        let disp_norm = disp.normalized_response(&[2.0], 1.0)[0];
        // |H_disp(2)| / |H_disp(1)| = 2 · |H_vel(2)| / |H_vel(1)|
        assert!((disp_norm.norm() - 2.0 * vel_norm.norm()).abs() < 1e-9);
    }

    #[test]
    fn make_partial_is_normalised_and_independent() {
        let model = broadband();
        let map = PazIndexMap::new(vec![2, 3], vec![]);
        let mut partial = model.make_partial(&map, 1.0).unwrap();
        assert_eq!(partial.num_poles(), 2);
        assert_eq!(partial.num_zeros(), 0);
        assert!((partial.response(1.0).norm() - 1.0).abs() < 1e-12);

        partial.add_pole(c(-1.0, 0.0));
        assert_eq!(model.num_poles(), 4);
    }

    #[test]
    fn make_partial_rejects_bad_index() {
        let model = broadband();
        let map = PazIndexMap::new(vec![9], vec![]);
        assert!(matches!(model.make_partial(&map, 1.0), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn merge_writes_only_mapped_positions() {
        let mut model = broadband();
        let map = PazIndexMap::new(vec![1], vec![]);
        let mut partial = PoleZeroModel::new(Mode::Velocity, Units::Radians);
        partial.add_pole(c(-0.04, -0.04));
        model.merge_paz_partial(&partial, &map, 1.0).unwrap();

        let poles = model.poles(None);
        assert_eq!(poles[0], c(-0.037, 0.037));
        assert_eq!(poles[1], c(-0.04, -0.04));
        assert_eq!(poles[2], c(-222.0, 222.0));
        assert!((model.response(1.0).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn merge_converts_partial_units() {
        let mut model = broadband();
        let map = PazIndexMap::new(vec![0, 1], vec![]);
        let partial = model
            .make_partial(&map, 0.05)
            .unwrap()
            .converted(Mode::Velocity, Units::Hertz, 0.05)
            .unwrap();
        let before = model.clone();
        model.merge_paz_partial(&partial, &map, 1.0).unwrap();
        for (a, b) in model.poles(None).iter().zip(before.poles(None)) {
            assert!((a - b).norm() < 1e-15);
        }
    }

    #[test]
    fn merge_rejects_size_mismatch() {
        let mut model = broadband();
        let map = PazIndexMap::new(vec![0, 1], vec![]);
        let partial = PoleZeroModel::new(Mode::Velocity, Units::Radians);
        assert!(model.merge_paz_partial(&partial, &map, 1.0).is_err());
    }

    #[test]
    fn copy_is_deep() {
        let model = broadband();
        let mut copy = model.clone();
        copy.set_h0(42.0);
        copy.add_zero(c(1.0, 1.0));
        assert_ne!(model.h0(), 42.0);
        assert_eq!(model.num_zeros(), 2);
    }
}
