//! Tilt law of a horizontal single-axis tracker.
//!
//! The shadow projector only needs a function from sun and system geometry
//! to a surface tilt, so any `Fn(f64, f64, f64, f64, f64) -> f64` can stand
//! in for the tracker (handy to pin the tilt in tests).

/// Surface tilt (degrees) of a tracked panel for one sun position.
pub trait TiltModel: Sync {
    fn tilt(
        &self,
        sun_elevation: f64,
        sun_azimuth: f64,
        axis_azimuth: f64,
        max_tilt: f64,
        ground_cover_ratio: f64,
    ) -> f64;
}

impl<F> TiltModel for F
where
    F: Fn(f64, f64, f64, f64, f64) -> f64 + Sync,
{
    fn tilt(
        &self,
        sun_elevation: f64,
        sun_azimuth: f64,
        axis_azimuth: f64,
        max_tilt: f64,
        ground_cover_ratio: f64,
    ) -> f64 {
        self(
            sun_elevation,
            sun_azimuth,
            axis_azimuth,
            max_tilt,
            ground_cover_ratio,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleAxisTracker {
    /// de-rotate near sunrise and sunset so rows do not shade each other
    pub backtrack: bool,
}

impl SingleAxisTracker {
    pub const BACKTRACKING: SingleAxisTracker = SingleAxisTracker { backtrack: true };
    pub const TRUE_TRACKING: SingleAxisTracker = SingleAxisTracker { backtrack: false };

    /// Signed rotation (degrees) of the panel around a horizontal axis.
    ///
    /// Positive angles turn the panel towards `axis_azimuth + 90°`. Returns NaN when the sun is
    /// below the horizon.
    pub fn rotation(
        &self,
        sun_elevation: f64,
        sun_azimuth: f64,
        axis_azimuth: f64,
        max_tilt: f64,
        ground_cover_ratio: f64,
    ) -> f64 {
        if !(sun_elevation >= 0.) {
            return f64::NAN;
        }
        let elevation = sun_elevation.to_radians();
        let relative_azimuth = (sun_azimuth - axis_azimuth).to_radians();

        // sun vector projected on the plane normal to the axis
        let x = elevation.cos() * relative_azimuth.sin();
        let z = elevation.sin();
        let mut rotation = x.atan2(z).to_degrees();

        if self.backtrack && ground_cover_ratio > 0. && rotation != 0. {
            let overlap = rotation.to_radians().cos().abs() / ground_cover_ratio;
            if overlap < 1. {
                rotation -= rotation.signum() * overlap.acos().to_degrees();
            }
        }

        rotation.max(-max_tilt).min(max_tilt)
    }
}

impl Default for SingleAxisTracker {
    fn default() -> Self {
        Self::BACKTRACKING
    }
}

impl TiltModel for SingleAxisTracker {
    fn tilt(
        &self,
        sun_elevation: f64,
        sun_azimuth: f64,
        axis_azimuth: f64,
        max_tilt: f64,
        ground_cover_ratio: f64,
    ) -> f64 {
        self.rotation(
            sun_elevation,
            sun_azimuth,
            axis_azimuth,
            max_tilt,
            ground_cover_ratio,
        )
        .abs()
    }
}

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    use super::{SingleAxisTracker, TiltModel};

    #[pyfunction]
    #[pyo3(name = "tilt", signature = (sun_elevation, sun_azimuth, axis_azimuth, max_tilt, ground_cover_ratio, backtrack = true))]
    pub fn py_tilt(
        sun_elevation: f64,
        sun_azimuth: f64,
        axis_azimuth: f64,
        max_tilt: f64,
        ground_cover_ratio: f64,
        backtrack: bool,
    ) -> f64 {
        SingleAxisTracker { backtrack }.tilt(
            sun_elevation,
            sun_azimuth,
            axis_azimuth,
            max_tilt,
            ground_cover_ratio,
        )
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "tracking")?;
    m.add_function(wrap_pyfunction!(python::py_tilt, &m)?)?;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_is_flat_with_sun_at_zenith() {
        let tracker = SingleAxisTracker::default();
        assert!(tracker.tilt(90., 180., 180., 60., 0.4).abs() < 1e-9);
    }

    #[test]
    fn panel_follows_sun_across_the_axis() {
        let tracker = SingleAxisTracker::TRUE_TRACKING;
        // sun due east of a north-south axis, 45° high
        let rotation = tracker.rotation(45., 90., 180., 90., 0.4);
        assert!((rotation + 45.).abs() < 1e-9);
        let rotation = tracker.rotation(45., 270., 180., 90., 0.4);
        assert!((rotation - 45.).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_limited_by_max_tilt() {
        let tracker = SingleAxisTracker::TRUE_TRACKING;
        assert_eq!(tracker.tilt(5., 90., 180., 55., 0.4), 55.);
    }

    #[test]
    fn backtracking_flattens_panels_at_low_sun() {
        let tracking = SingleAxisTracker::TRUE_TRACKING;
        let backtracking = SingleAxisTracker::BACKTRACKING;
        let ideal = tracking.tilt(5., 90., 180., 90., 0.5);
        let backtracked = backtracking.tilt(5., 90., 180., 90., 0.5);
        assert!(backtracked < ideal);
        // with no rows to shade there is nothing to back off from
        assert_eq!(backtracking.tilt(5., 90., 180., 90., 0.), ideal);
    }

    #[test]
    fn night_has_no_rotation() {
        let tracker = SingleAxisTracker::default();
        assert!(tracker.rotation(-5., 90., 180., 60., 0.4).is_nan());
    }

    #[test]
    fn closures_are_tilt_models() {
        let fixed = |_: f64, _: f64, _: f64, _: f64, _: f64| 30.;
        assert_eq!(fixed.tilt(10., 90., 180., 60., 0.3), 30.);
    }
}
