//! Sensor profiles: axis geometry, polarity and perturbable PAZ subsets.
//!
//! The perturbable pole/zero indices depend on the physical sensor, not on
//! the fitter, so they live here alongside the axis geometry.

use crate::component::Component;
use crate::paz::{PazIndexMap, PoleZeroModel};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{SQRT_2, FRAC_1_SQRT_2};

/// Axis geometry of a three-component sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// Recorded channels are already North/East/Vertical.
    Orthogonal,
    /// Recorded channels are the symmetric U/V/W axes.
    ///
    /// Rows of `matrix` give X (east), Y (north) and Z (vertical) as linear
    /// combinations of (U, V, W). U is recorded on the vertical slot, V on
    /// the north slot and W on the east slot.
    Triaxial {
        /// UVW → XYZ transform, row major.
        matrix: [[f64; 3]; 3],
    },
}

impl Geometry {
    /// Galperin transform of the Streckeisen STS-2 family.
    pub fn sts2() -> Self {
        let a = 1.0 / 6f64.sqrt();
        let b = 1.0 / 3f64.sqrt();
        Geometry::Triaxial {
            matrix: [
                [-2.0 * a, a, a],
                [0.0, FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
                [b, b, b],
            ],
        }
    }

    /// Galperin transform of the Nanometrics Trillium family.
    pub fn trillium() -> Self {
        let a = 1.0 / 6f64.sqrt();
        let b = SQRT_2 * a;
        Geometry::Triaxial {
            matrix: [
                [2.0 * a, -a, -a],
                [0.0, FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
                [b, b, b],
            ],
        }
    }

    /// Inverse of an orthonormal triaxial transform (XYZ → UVW).
    ///
    /// Applying the result to North/East/Vertical slots leaves U, V and W on
    /// the vertical, north and east slots, so `apply` reads and writes the
    /// reversed axis order. The matrix is the transpose with rows and
    /// columns reversed.
    pub fn inverse(&self) -> Self {
        match self {
            Geometry::Orthogonal => Geometry::Orthogonal,
            Geometry::Triaxial { matrix } => {
                let mut t = [[0.0; 3]; 3];
                for (r, row) in matrix.iter().enumerate() {
                    for (c, value) in row.iter().enumerate() {
                        t[2 - c][2 - r] = *value;
                    }
                }
                Geometry::Triaxial { matrix: t }
            }
        }
    }

    /// Transform recorded `[north, east, vertical]` slots in place.
    ///
    /// All three series must have the same length.
    pub fn apply(&self, outputs: &mut [Vec<f64>; 3]) -> Result<()> {
        let Geometry::Triaxial { matrix } = self else {
            return Ok(());
        };
        let len = outputs[0].len();
        if outputs.iter().any(|o| o.len() != len) {
            return Err(Error::InvalidInput(
                "triaxial transform needs equal-length channels".to_string(),
            ));
        }
        let (n, e, z) = (
            Component::North.index(),
            Component::East.index(),
            Component::Vertical.index(),
        );
        for i in 0..len {
            let uvw = [outputs[z][i], outputs[n][i], outputs[e][i]];
            let dot = |row: &[f64; 3]| row[0] * uvw[0] + row[1] * uvw[1] + row[2] * uvw[2];
            outputs[e][i] = dot(&matrix[0]);
            outputs[n][i] = dot(&matrix[1]);
            outputs[z][i] = dot(&matrix[2]);
        }
        Ok(())
    }
}

/// Everything the calibration pipeline needs to know about a sensor model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    /// Model name, matched case-insensitively.
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nominal generator constant in V·s/m.
    pub sensor_gain: f64,

    /// Axis geometry.
    #[serde(default = "default_geometry")]
    pub geometry: Geometry,

    /// Recorded slots whose polarity is inverted before the transform.
    #[serde(default)]
    pub invert: Vec<Component>,

    /// Poles/zeros adjusted against the long-period data set.
    pub lf_map: PazIndexMap,

    /// Poles/zeros adjusted against the short-period data set.
    pub hf_map: PazIndexMap,
}

fn default_geometry() -> Geometry {
    Geometry::Orthogonal
}

impl SensorProfile {
    /// Case-insensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Check both index maps against a nominal model.
    pub fn check_against(&self, nominal: &PoleZeroModel) -> Result<()> {
        if self.lf_map.is_empty() && self.hf_map.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "sensor profile '{}' has no perturbable poles or zeros",
                self.name
            )));
        }
        self.lf_map.check(nominal)?;
        self.hf_map.check(nominal)?;
        if !self.sensor_gain.is_finite() || self.sensor_gain <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sensor profile '{}' has non-positive gain {}",
                self.name, self.sensor_gain
            )));
        }
        Ok(())
    }
}

/// Find a profile by name.
pub fn find_profile<'a>(profiles: &'a [SensorProfile], name: &str) -> Result<&'a SensorProfile> {
    profiles
        .iter()
        .find(|p| p.matches(name))
        .ok_or_else(|| Error::UnsupportedSensor(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_orthonormal(geometry: &Geometry) -> bool {
        let Geometry::Triaxial { matrix } = geometry else {
            return true;
        };
        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = (0..3).map(|k| matrix[i][k] * matrix[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                if (dot - expected).abs() > 1e-12 {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn galperin_matrices_are_orthonormal() {
        assert!(is_orthonormal(&Geometry::sts2()));
        assert!(is_orthonormal(&Geometry::trillium()));
    }

    #[test]
    fn inverse_round_trip() {
        let geometry = Geometry::sts2();
        let original = [vec![1.0, -2.0], vec![0.5, 4.0], vec![3.0, 0.25]];
        let mut data = original.clone();
        geometry.inverse().apply(&mut data).unwrap();
        geometry.apply(&mut data).unwrap();
        for (a, b) in data.iter().flatten().zip(original.iter().flatten()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn equal_uvw_motion_is_vertical() {
        // Identical signals on U, V and W describe purely vertical motion.
        let mut data = [vec![1.0], vec![1.0], vec![1.0]];
        Geometry::sts2().apply(&mut data).unwrap();
        assert!(data[Component::North.index()][0].abs() < 1e-12);
        assert!(data[Component::East.index()][0].abs() < 1e-12);
        assert!((data[Component::Vertical.index()][0] - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_is_identity() {
        let mut data = [vec![1.0], vec![2.0], vec![3.0]];
        Geometry::Orthogonal.apply(&mut data).unwrap();
        assert_eq!(data, [vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn triaxial_rejects_ragged_channels() {
        let mut data = [vec![1.0], vec![2.0, 3.0], vec![3.0]];
        assert!(Geometry::trillium().apply(&mut data).is_err());
    }

    #[test]
    fn find_profile_is_case_insensitive() {
        let profiles = vec![SensorProfile {
            name: "STS-2.5".to_string(),
            description: None,
            sensor_gain: 1500.0,
            geometry: Geometry::sts2(),
            invert: vec![],
            lf_map: PazIndexMap::new(vec![0, 1], vec![]),
            hf_map: PazIndexMap::new(vec![2, 3], vec![]),
        }];
        assert!(find_profile(&profiles, "sts-2.5").is_ok());
        assert_eq!(
            find_profile(&profiles, "CMG-3T").unwrap_err(),
            Error::UnsupportedSensor("CMG-3T".to_string())
        );
    }
}
