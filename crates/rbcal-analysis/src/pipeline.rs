//! The calibration pipeline: prepare, measure, fit, compare.
//!
//! A [`Calibration`] holds the nominal response, the sensor profile and the
//! analysis settings. [`Calibration::run`] takes the long-period and
//! short-period data sets and returns one [`ComponentFitResult`] per output
//! component.
//!
//! ## Stages
//!
//! 1. **Prepare** each data set: trim settling and trailer, fix polarity,
//!    rotate triaxial axes, filter the tapered excitation through the
//!    nominal acceleration response, cut the tapered edges and scale every
//!    series to zero mean and unit variance.
//! 2. **Measure** the transfer function from filtered excitation to each
//!    component. After filtering it is the ratio of the true response to
//!    the nominal one.
//! 3. **Fit** the profile's perturbable poles and zeros in each band and
//!    merge them into a copy of the nominal model.
//! 4. **Compare** fitted and nominal responses and compute the system
//!    sensitivity.
//!
//! Components are independent. With `settings.parallel` set they run on
//! scoped threads.

use crate::compare::{ResponseDeviation, compare_responses, comparison_axis};
use crate::cross::cross_spectrum;
use crate::fit::{FitOutcome, ResponseFitter};
use crate::signal;
use crate::transfer_fn::TransferFunction;
use chrono::{DateTime, Utc};
use rbcal_core::{
    Band, BandLimits, CalibrationDataSet, CalibrationSettings, Component, Error, Mode,
    PazIndexMap, PoleZeroModel, Result, SensorProfile, Units,
};
use serde::Serialize;
use tracing::{debug, info};

/// A data set after preparation, ready for spectral analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    /// Excitation band.
    pub band: Band,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Start of the retained window, when known.
    pub start: Option<DateTime<Utc>>,
    /// Excitation filtered through the nominal acceleration response.
    pub input: Vec<f64>,
    /// Outputs in `[north, east, vertical]` order.
    pub outputs: [Vec<f64>; 3],
}

impl PreparedSeries {
    /// Output series of one component.
    pub fn output(&self, component: Component) -> &[f64] {
        &self.outputs[component.index()]
    }

    /// Samples per series.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// True when no samples are held.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Fit diagnostics of one band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandFit {
    /// Which band.
    pub band: Band,
    /// Band limits used.
    pub limits: BandLimits,
    /// Frequency bins inside the band.
    pub bins: usize,
    /// Fitted partial model and solver diagnostics.
    pub outcome: FitOutcome,
}

/// System sensitivity at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sensitivity {
    /// Frequency (Hz).
    pub frequency_hz: f64,
    /// Digitizer counts per metre of ground displacement.
    pub counts_per_m: f64,
    /// Nanometres of ground displacement per count.
    pub nm_per_count: f64,
}

/// Everything computed for one output component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentFitResult {
    /// Output component.
    pub component: Component,
    /// Nominal model with the fitted partials merged in.
    pub fitted: PoleZeroModel,
    /// Long-period fit, absent when the profile perturbs nothing there.
    pub lf_fit: Option<BandFit>,
    /// Short-period fit, absent when the profile perturbs nothing there.
    pub hf_fit: Option<BandFit>,
    /// Fitted response relative to nominal.
    pub deviation: ResponseDeviation,
    /// System sensitivity.
    pub sensitivity: Sensitivity,
    /// Deviation within tolerance.
    pub in_spec: bool,
}

/// Result of a full calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationOutcome {
    /// Sensor profile name.
    pub sensor: String,
    /// Nominal response.
    pub nominal: PoleZeroModel,
    /// Settings the run used.
    pub settings: CalibrationSettings,
    /// Start of the analysed long-period window, or the short-period one.
    pub start: Option<DateTime<Utc>>,
    /// Long-period sampling rate (Hz).
    pub lf_sample_rate: f64,
    /// Short-period sampling rate (Hz).
    pub hf_sample_rate: f64,
    /// Per-component results in north, east, vertical order.
    pub components: Vec<ComponentFitResult>,
}

impl CalibrationOutcome {
    /// True when every component is in spec.
    pub fn in_spec(&self) -> bool {
        self.components.iter().all(|c| c.in_spec)
    }

    /// Result of one component.
    pub fn component(&self, component: Component) -> Option<&ComponentFitResult> {
        self.components.iter().find(|c| c.component == component)
    }
}

/// Calibration analysis of one sensor.
#[derive(Debug, Clone)]
pub struct Calibration {
    nominal: PoleZeroModel,
    acceleration: PoleZeroModel,
    profile: SensorProfile,
    settings: CalibrationSettings,
    fitter: ResponseFitter,
}

impl Calibration {
    /// Check the profile against the nominal model and set up the run.
    pub fn new(
        nominal: PoleZeroModel,
        profile: SensorProfile,
        settings: CalibrationSettings,
    ) -> Result<Self> {
        profile.check_against(&nominal)?;
        if !(0.0..0.5).contains(&settings.taper_fraction) {
            return Err(Error::InvalidParameter(format!(
                "taper fraction must lie in [0, 0.5), got {}",
                settings.taper_fraction
            )));
        }
        let acceleration = nominal.converted(Mode::Acceleration, nominal.units(), 1.0)?;
        Ok(Self {
            fitter: ResponseFitter::new(settings.fit),
            nominal,
            acceleration,
            profile,
            settings,
        })
    }

    /// Nominal response.
    pub fn nominal(&self) -> &PoleZeroModel {
        &self.nominal
    }

    /// Sensor profile.
    pub fn profile(&self) -> &SensorProfile {
        &self.profile
    }

    /// Analysis settings.
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    fn band_setup(&self, band: Band) -> (&PazIndexMap, &BandLimits) {
        match band {
            Band::Low => (&self.profile.lf_map, &self.settings.lf_band),
            Band::High => (&self.profile.hf_map, &self.settings.hf_band),
        }
    }

    /// Trim, orient, filter and standardise one data set.
    pub fn prepare(&self, mut data: CalibrationDataSet) -> Result<PreparedSeries> {
        data.trim()?;
        for &component in &self.profile.invert {
            data.invert_polarity(component);
        }
        data.apply_geometry(&self.profile.geometry)?;

        let fraction = self.settings.taper_fraction;
        let mut excitation = data.input;
        signal::demean(&mut excitation);
        signal::apply_taper(&mut excitation, fraction);
        let filtered = signal::convolve_response(&excitation, &self.acceleration, data.sample_rate);

        let cut = (fraction * filtered.len() as f64).floor() as usize;
        let mut input = signal::trim_edges(&filtered, cut);
        if input.len() < 4 {
            return Err(Error::InsufficientData {
                needed: 2 * cut + 4,
                got: filtered.len(),
            });
        }
        signal::standardize(&mut input);
        let outputs = data.outputs.map(|series| {
            let mut kept = signal::trim_edges(&series, cut);
            signal::standardize(&mut kept);
            kept
        });

        let start = data.start.map(|t| {
            t + chrono::Duration::milliseconds((cut as f64 / data.sample_rate * 1000.0).round() as i64)
        });
        debug!(band = %data.band, samples = input.len(), cut, "prepared data set");
        Ok(PreparedSeries {
            band: data.band,
            sample_rate: data.sample_rate,
            start,
            input,
            outputs,
        })
    }

    /// Measure and fit one band of one component.
    ///
    /// Returns `None` when the profile perturbs nothing in this band.
    pub fn fit_band(
        &self,
        prepared: &PreparedSeries,
        component: Component,
    ) -> Result<Option<BandFit>> {
        let (map, limits) = self.band_setup(prepared.band);
        if map.is_empty() {
            return Ok(None);
        }
        let spectrum = cross_spectrum(
            &prepared.input,
            prepared.output(component),
            prepared.sample_rate,
        )?;
        let measured = TransferFunction::from_cross(&spectrum)
            .select(limits)
            .normalized_at(limits.norm_hz)?;
        let partial = self.nominal.make_partial(map, limits.norm_hz)?;
        let reference = partial.normalized_response(&measured.frequencies, limits.norm_hz);
        let outcome = self
            .fitter
            .fit(&partial, &measured, &reference, limits.norm_hz)?;

        debug!(
            %component,
            band = %prepared.band,
            bins = measured.len(),
            cost = outcome.cost,
            "band fitted"
        );
        Ok(Some(BandFit {
            band: prepared.band,
            limits: *limits,
            bins: measured.len(),
            outcome,
        }))
    }

    /// Fit both bands of one component and compare against nominal.
    pub fn analyse_component(
        &self,
        lf: &PreparedSeries,
        hf: &PreparedSeries,
        component: Component,
    ) -> Result<ComponentFitResult> {
        let lf_fit = self.fit_band(lf, component)?;
        let hf_fit = self.fit_band(hf, component)?;

        let mut fitted = self.nominal.clone();
        for fit in lf_fit.iter().chain(hf_fit.iter()) {
            let (map, limits) = self.band_setup(fit.band);
            fitted.merge_paz_partial(&fit.outcome.model, map, limits.norm_hz)?;
        }

        let axis = comparison_axis(
            self.settings.comparison_step_hz,
            self.settings.comparison_max_hz,
        )?;
        let deviation =
            compare_responses(&fitted, &self.nominal, &axis, self.settings.sensitivity_hz);
        let sensitivity = self.sensitivity(&fitted)?;
        let in_spec = deviation.within(
            self.settings.amplitude_tolerance_pct,
            self.settings.phase_tolerance_deg,
        );

        info!(
            %component,
            max_amplitude_pct = deviation.max_amplitude_pct,
            max_phase_deg = deviation.max_phase_deg,
            in_spec,
            "component calibrated"
        );
        Ok(ComponentFitResult {
            component,
            fitted,
            lf_fit,
            hf_fit,
            deviation,
            sensitivity,
            in_spec,
        })
    }

    /// Counts per metre and nanometres per count of a fitted model.
    ///
    /// The model is normalised in velocity to 1 at the sensitivity
    /// frequency, so the displacement gain there is `2πf` times the sensor
    /// and digitizer gains.
    pub fn sensitivity(&self, fitted: &PoleZeroModel) -> Result<Sensitivity> {
        let freq = self.settings.sensitivity_hz;
        let velocity = fitted.converted(Mode::Velocity, Units::Radians, freq)?;
        let displacement = PoleZeroModel::from_parts(
            Mode::Displacement,
            Units::Radians,
            velocity.poles(None),
            velocity.zeros(Some(Mode::Displacement), None)?,
        )
        .with_h0(velocity.h0());
        let counts_per_m = self.profile.sensor_gain
            * self.settings.digitizer_gain
            * displacement.response(freq).norm();
        Ok(Sensitivity {
            frequency_hz: freq,
            counts_per_m,
            nm_per_count: 1e9 / counts_per_m,
        })
    }

    /// Run the whole pipeline on a long-period and a short-period data set.
    pub fn run(&self, lf: CalibrationDataSet, hf: CalibrationDataSet) -> Result<CalibrationOutcome> {
        if lf.band != Band::Low || hf.band != Band::High {
            return Err(Error::InvalidInput(format!(
                "expected long- then short-period data, got {} and {}",
                lf.band, hf.band
            )));
        }
        info!(sensor = %self.profile.name, "calibration started");
        let lf = self.prepare(lf)?;
        let hf = self.prepare(hf)?;

        let results: Vec<Result<ComponentFitResult>> = if self.settings.parallel {
            let (lf, hf) = (&lf, &hf);
            std::thread::scope(|scope| {
                let workers: Vec<_> = Component::ALL
                    .iter()
                    .map(|&component| scope.spawn(move || self.analyse_component(lf, hf, component)))
                    .collect();
                workers
                    .into_iter()
                    .map(|worker| {
                        worker.join().unwrap_or_else(|_| {
                            Err(Error::InvalidInput("component worker panicked".to_string()))
                        })
                    })
                    .collect()
            })
        } else {
            Component::ALL
                .iter()
                .map(|&component| self.analyse_component(&lf, &hf, component))
                .collect()
        };
        let components = results.into_iter().collect::<Result<Vec<_>>>()?;

        let outcome = CalibrationOutcome {
            sensor: self.profile.name.clone(),
            nominal: self.nominal.clone(),
            settings: self.settings.clone(),
            start: lf.start.or(hf.start),
            lf_sample_rate: lf.sample_rate,
            hf_sample_rate: hf.sample_rate,
            components,
        };
        info!(in_spec = outcome.in_spec(), "calibration finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbcal_core::{Complex64, Geometry};
    use std::f64::consts::TAU;

    fn nominal() -> PoleZeroModel {
        let mut model = PoleZeroModel::from_parts(
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
        model.normalize_at(1.0);
        model
    }

    fn profile() -> SensorProfile {
        SensorProfile {
            name: "test".to_string(),
            description: None,
            sensor_gain: 1500.0,
            geometry: Geometry::Orthogonal,
            invert: vec![Component::East],
            lf_map: PazIndexMap::new(vec![0, 1], vec![]),
            hf_map: PazIndexMap::new(vec![2, 3], vec![]),
        }
    }

    fn calibration() -> Calibration {
        Calibration::new(nominal(), profile(), CalibrationSettings::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_profile() {
        let mut bad = profile();
        bad.hf_map = PazIndexMap::new(vec![4], vec![]);
        assert!(matches!(
            Calibration::new(nominal(), bad, CalibrationSettings::default()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_bad_taper() {
        let settings = CalibrationSettings {
            taper_fraction: 0.5,
            ..CalibrationSettings::default()
        };
        assert!(Calibration::new(nominal(), profile(), settings).is_err());
    }

    #[test]
    fn test_sensitivity_at_one_hz() {
        let cal = calibration();
        let s = cal.sensitivity(cal.nominal()).unwrap();
        let expected = 1500.0 * 419_430.0 * TAU;
        assert!((s.counts_per_m / expected - 1.0).abs() < 1e-12);
        assert!((s.nm_per_count * s.counts_per_m - 1e9).abs() < 1e-3);
    }

    #[test]
    fn test_prepare_standardises_and_cuts() {
        let cal = calibration();
        let n = 1000;
        let input: Vec<f64> = (0..n).map(|i| if (i * 37 % 11) < 5 { 1.0 } else { -1.0 }).collect();
        let outputs = [
            (0..n).map(|i| (i as f64 * 0.1).sin() + 4.0).collect(),
            (0..n).map(|i| (i as f64 * 0.2).cos()).collect(),
            (0..n).map(|i| (i as f64 * 0.3).sin() * 10.0).collect(),
        ];
        let data = CalibrationDataSet::new(Band::High, 20.0, input, outputs)
            .unwrap()
            .with_trim(1.0, 0.5);
        let prepared = cal.prepare(data).unwrap();
        // 970 samples after trimming, 48 cut from each end
        assert_eq!(prepared.len(), 970 - 96);
        for series in std::iter::once(&prepared.input).chain(prepared.outputs.iter()) {
            assert!(signal::mean(series).abs() < 1e-9);
            assert!((signal::variance(series) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_band_mismatch_rejected() {
        let cal = calibration();
        let data = || {
            CalibrationDataSet::new(Band::High, 1.0, vec![0.0; 64], [vec![0.0; 64], vec![0.0; 64], vec![0.0; 64]])
                .unwrap()
        };
        assert!(matches!(cal.run(data(), data()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_band_skips_fit() {
        let mut p = profile();
        p.lf_map = PazIndexMap::default();
        let cal = Calibration::new(nominal(), p, CalibrationSettings::default()).unwrap();
        let prepared = PreparedSeries {
            band: Band::Low,
            sample_rate: 1.0,
            start: None,
            input: vec![0.0; 8],
            outputs: [vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]],
        };
        assert!(cal.fit_band(&prepared, Component::North).unwrap().is_none());
    }
}
