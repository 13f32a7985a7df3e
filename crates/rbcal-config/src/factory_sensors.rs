//! Factory sensor profiles bundled with the library.
//!
//! Index maps assume nominal responses ordered long-period pair first,
//! then the short-period poles, as in the IDA response files for these
//! sensors.

use rbcal_core::{Component, Geometry, PazIndexMap, SensorProfile};

/// Names of the factory sensor profiles.
pub static FACTORY_SENSOR_NAMES: &[&str] = &["STS-2.5", "T-120", "STS-2", "orthogonal"];

fn profile(
    name: &str,
    description: &str,
    sensor_gain: f64,
    geometry: Geometry,
    invert: Vec<Component>,
    lf_poles: Vec<usize>,
    hf_poles: Vec<usize>,
) -> SensorProfile {
    SensorProfile {
        name: name.to_string(),
        description: Some(description.to_string()),
        sensor_gain,
        geometry,
        invert,
        lf_map: PazIndexMap::new(lf_poles, vec![]),
        hf_map: PazIndexMap::new(hf_poles, vec![]),
    }
}

/// Get all factory sensor profiles.
pub fn factory_sensors() -> Vec<SensorProfile> {
    vec![
        profile(
            "STS-2.5",
            "Streckeisen STS-2.5, calibrated in UVW mode",
            1500.0,
            Geometry::sts2(),
            vec![],
            vec![0, 1],
            vec![2, 3, 4],
        ),
        profile(
            "T-120",
            "Nanometrics Trillium 120, calibrated in UVW mode",
            1201.0,
            Geometry::trillium(),
            vec![Component::East],
            vec![0, 1],
            vec![2, 3],
        ),
        profile(
            "STS-2",
            "Streckeisen STS-2 (generation 3), calibrated in UVW mode",
            1500.0,
            Geometry::sts2(),
            vec![],
            vec![0, 1],
            vec![2, 3],
        ),
        profile(
            "orthogonal",
            "Generic broadband with north/east/vertical outputs",
            1500.0,
            Geometry::Orthogonal,
            vec![],
            vec![0, 1],
            vec![2, 3],
        ),
    ]
}

/// Get a factory sensor profile by name (case-insensitive).
pub fn get_factory_sensor(name: &str) -> Option<SensorProfile> {
    factory_sensors().into_iter().find(|p| p.matches(name))
}

/// Check if a name matches a factory sensor profile.
pub fn is_factory_sensor(name: &str) -> bool {
    FACTORY_SENSOR_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name.trim()))
}
