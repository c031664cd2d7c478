//! Ground shadow cast by one tracked panel row within a pitch period.
//!
//! The ground between two tracking axes is sampled at a fixed resolution.
//! Each sunlit timestep projects the two panel edges onto the ground along
//! the sun ray and marks the samples between them as shaded. Profiles are
//! produced one timestep at a time into a reused buffer, so memory stays
//! bounded by a single row of ground samples.

mod irradiance;

use ndarray::{Array1, Zip};

use crate::model::{validate_pitch, Error, SystemGeometry};
use crate::tracking::TiltModel;

pub use irradiance::{effective_irradiance, ground_irradiance, GroundIrradiance};

pub const DEFAULT_GROUND_RESOLUTION: f64 = 0.1; // m

/// Upper bound on the number of ground samples in one pitch period.
pub const MAX_GROUND_SAMPLES: f64 = 1_000_000.;

/// Added to the sun elevation before taking its tangent.
const ELEVATION_EPSILON: f64 = 1e-6; // rad

/// Ground offsets `0, r, 2r, ...` strictly below the pitch.
#[derive(Debug, Clone)]
pub struct GroundGrid {
    pitch: f64,
    offsets: Array1<f64>,
}

/// Number of ground samples `0, r, 2r, ...` below `pitch`, checked before anything is
/// allocated.
pub fn ground_sample_count(pitch: f64, resolution: f64) -> Result<usize, Error> {
    let pitch = validate_pitch(pitch)?;
    if !(resolution.is_finite() && resolution > 0.) {
        return Err(Error::invalid(
            "ground_resolution",
            format!("must be a finite positive distance (got {resolution})"),
        ));
    }
    let count = (pitch / resolution).ceil();
    if count > MAX_GROUND_SAMPLES {
        return Err(Error::invalid(
            "ground_resolution",
            format!("pitch {pitch} m at {resolution} m exceeds {MAX_GROUND_SAMPLES} samples"),
        ));
    }
    Ok(count as usize)
}

impl GroundGrid {
    pub fn new(pitch: f64, resolution: f64) -> Result<Self, Error> {
        let capacity = ground_sample_count(pitch, resolution)?;
        let offsets: Vec<f64> = (0..=capacity)
            .map(|i| i as f64 * resolution)
            .take_while(|&x| x < pitch)
            .collect();
        Ok(GroundGrid {
            pitch,
            offsets: Array1::from_vec(offsets),
        })
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn offsets(&self) -> &Array1<f64> {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Shaded ground samples of a single timestep.
#[derive(Debug, Clone)]
pub struct ShadingProfile {
    shaded: Array1<bool>,
}

impl ShadingProfile {
    fn unshaded(n: usize) -> Self {
        ShadingProfile {
            shaded: Array1::from_elem(n, false),
        }
    }

    pub fn shaded(&self) -> &Array1<bool> {
        &self.shaded
    }

    pub fn shaded_count(&self) -> usize {
        self.shaded.iter().filter(|&&s| s).count()
    }

    pub fn shaded_fraction(&self) -> f64 {
        if self.shaded.is_empty() {
            0.
        } else {
            self.shaded_count() as f64 / self.shaded.len() as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.shaded.iter().any(|&s| s)
    }
}

/// Shadow of the panel on the ground, in pitch-period coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowInterval {
    pub start: f64,
    pub end: f64,
}

impl ShadowInterval {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.start && x <= self.end
    }
}

/// Projects the panel centred at `pitch / 2` onto the ground.
///
/// `tilt` is the panel surface tilt in degrees. The interval is not wrapped into `[0, pitch)`:
/// parts falling outside the period are lost. Returns `None` for a degenerate (zero-width)
/// shadow.
pub fn project_shadow(
    geometry: &SystemGeometry,
    pitch: f64,
    tilt: f64,
    sun_elevation: f64,
    sun_azimuth: f64,
) -> Option<ShadowInterval> {
    let tilt = tilt.to_radians();
    let pivot_x = pitch / 2.;
    let half_width = 0.5 * geometry.panel_width;

    let x1 = pivot_x - half_width * tilt.cos();
    let y1 = geometry.pivot_height + half_width * tilt.sin();
    let x2 = pivot_x + half_width * tilt.cos();
    let y2 = geometry.pivot_height - half_width * tilt.sin();

    let relative_azimuth = (sun_azimuth - (geometry.axis_azimuth - 180.)).to_radians();
    let projection =
        relative_azimuth.sin() / (sun_elevation.to_radians() + ELEVATION_EPSILON).tan();
    let shadow_x1 = x1 - y1 * projection;
    let shadow_x2 = x2 - y2 * projection;

    let start = shadow_x1.min(shadow_x2);
    let end = shadow_x1.max(shadow_x2);
    if end > start {
        Some(ShadowInterval { start, end })
    } else {
        None
    }
}

/// Streams shading profiles for one pitch, one timestep at a time.
pub struct ShadowProjector<'a> {
    geometry: &'a SystemGeometry,
    tilt_model: &'a dyn TiltModel,
    grid: GroundGrid,
    ground_cover_ratio: f64,
    profile: ShadingProfile,
}

impl<'a> ShadowProjector<'a> {
    pub fn new(
        geometry: &'a SystemGeometry,
        tilt_model: &'a dyn TiltModel,
        pitch: f64,
        resolution: f64,
    ) -> Result<Self, Error> {
        let grid = GroundGrid::new(pitch, resolution)?;
        let profile = ShadingProfile::unshaded(grid.len());
        Ok(ShadowProjector {
            geometry,
            tilt_model,
            ground_cover_ratio: geometry.ground_cover_ratio(grid.pitch()),
            grid,
            profile,
        })
    }

    pub fn grid(&self) -> &GroundGrid {
        &self.grid
    }

    /// Surface tilt the tracker takes for this sun position (0 at night).
    pub fn panel_tilt(&self, sun_elevation: f64, sun_azimuth: f64) -> f64 {
        let tilt = self.tilt_model.tilt(
            sun_elevation,
            sun_azimuth,
            self.geometry.axis_azimuth,
            self.geometry.max_tilt,
            self.ground_cover_ratio,
        );
        if tilt.is_finite() {
            tilt
        } else {
            0.
        }
    }

    /// Shading profile of one timestep. The returned profile is overwritten
    /// by the next call.
    pub fn project(&mut self, sun_elevation: f64, sun_azimuth: f64) -> &ShadingProfile {
        self.profile.shaded.fill(false);
        // night (and NaN elevations) cast no shadow
        if !(sun_elevation > 0.) {
            return &self.profile;
        }

        let tilt = self.panel_tilt(sun_elevation, sun_azimuth);
        if let Some(shadow) = project_shadow(
            self.geometry,
            self.grid.pitch(),
            tilt,
            sun_elevation,
            sun_azimuth,
        ) {
            Zip::from(&mut self.profile.shaded)
                .and(&self.grid.offsets)
                .for_each(|shaded, &x| *shaded = shadow.contains(x));
        }
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(_: f64, _: f64, _: f64, _: f64, _: f64) -> f64 {
        0.
    }

    fn geometry() -> SystemGeometry {
        SystemGeometry {
            panel_width: 2.,
            pivot_height: 3.,
            axis_azimuth: 180.,
            max_tilt: 60.,
            ..Default::default()
        }
    }

    #[test]
    fn grid_covers_one_period_without_its_end() {
        let grid = GroundGrid::new(5., 0.1).unwrap();
        assert_eq!(grid.len(), 50);
        assert!(grid.offsets()[49] < 5.);

        let grid = GroundGrid::new(4.5, 0.1).unwrap();
        assert!(grid.offsets().iter().all(|&x| x < 4.5));
        assert!(GroundGrid::new(0., 0.1).is_err());
        assert!(GroundGrid::new(4., 0.).is_err());
    }

    #[test]
    fn flat_panel_under_overhead_sun_shades_its_footprint() {
        let shadow = project_shadow(&geometry(), 6., 0., 90., 180.).unwrap();
        assert!((shadow.start - 2.).abs() < 1e-9);
        assert!((shadow.end - 4.).abs() < 1e-9);
    }

    #[test]
    fn sun_along_the_axis_casts_footprint_shadow() {
        // sun due south of a north-south axis: no sideways displacement
        let shadow = project_shadow(&geometry(), 6., 0., 30., 180.).unwrap();
        assert!((shadow.start - 2.).abs() < 1e-6);
        assert!((shadow.end - 4.).abs() < 1e-6);
    }

    #[test]
    fn projector_marks_footprint_samples() {
        let geometry = geometry();
        let mut projector = ShadowProjector::new(&geometry, &flat, 6., 0.1).unwrap();
        let profile = projector.project(90., 180.);
        // offsets 2.0 ..= 4.0 within float error of the grid
        let count = profile.shaded_count();
        assert!((20..=21).contains(&count), "got {count}");
        assert!((profile.shaded_fraction() - count as f64 / 60.).abs() < 1e-12);
    }

    #[test]
    fn night_casts_no_shadow() {
        let geometry = geometry();
        let mut projector = ShadowProjector::new(&geometry, &flat, 6., 0.1).unwrap();
        assert!(!projector.project(90., 180.).is_empty());
        assert!(projector.project(0., 180.).is_empty());
        assert!(projector.project(-20., 90.).is_empty());
        assert!(projector.project(f64::NAN, 90.).is_empty());
    }

    #[test]
    fn zero_width_panel_casts_no_shadow() {
        let geometry = SystemGeometry {
            panel_width: 0.,
            ..geometry()
        };
        assert!(project_shadow(&geometry, 5., 0., 40., 180.).is_none());
        let mut projector = ShadowProjector::new(&geometry, &flat, 5., 0.1).unwrap();
        assert!(projector.project(40., 180.).is_empty());
    }

    #[test]
    fn shadow_leaving_the_period_is_not_wrapped() {
        // low sun from the east throws the shadow well before the period
        let geometry = geometry();
        let shadow = project_shadow(&geometry, 6., 0., 10., 90.).unwrap();
        assert!(shadow.end < 0.);

        let mut projector = ShadowProjector::new(&geometry, &flat, 6., 0.1).unwrap();
        assert!(projector.project(10., 90.).is_empty());
    }

    #[test]
    fn tracker_nan_tilt_is_treated_as_flat() {
        let geometry = geometry();
        let broken = |_: f64, _: f64, _: f64, _: f64, _: f64| f64::NAN;
        let projector = ShadowProjector::new(&geometry, &broken, 6., 0.1).unwrap();
        assert_eq!(projector.panel_tilt(30., 90.), 0.);
    }

    #[test]
    fn oversampled_ground_is_rejected() {
        assert_eq!(ground_sample_count(5., 0.1).unwrap(), 50);
        assert_eq!(ground_sample_count(1_000_000., 1.).unwrap(), 1_000_000);
        for (pitch, resolution) in [(2.0e6, 0.1), (50., 1e-7), (1e300, 1e-300)] {
            let err = GroundGrid::new(pitch, resolution).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { .. }));
        }

        let geometry = geometry();
        assert!(ShadowProjector::new(&geometry, &flat, 50., 1e-7).is_err());
    }
}
