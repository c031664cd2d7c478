use chrono::{NaiveDateTime, TimeDelta};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::climate::AcquisitionError;
use crate::metrics::MetricsError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("pitch must be a finite positive distance (got {0})")]
    InvalidPitch(f64),
    #[error("pitch grid must contain at least one candidate")]
    EmptyPitchGrid,
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("climate record has no samples")]
    EmptyClimate,
    #[error("climate columns must have the same length (expected {0}, got {1} for {2})")]
    LengthMismatch(usize, usize, &'static str),
    #[error("climate record is not hourly contiguous at sample {0}")]
    NonContiguous(usize),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to decide what to show end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AcquisitionFailure,
    InvalidInput,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Acquisition(_) => ErrorKind::AcquisitionFailure,
            Error::InvalidPitch(_)
            | Error::EmptyPitchGrid
            | Error::InvalidParameter { .. }
            | Error::EmptyClimate
            | Error::LengthMismatch(..)
            | Error::NonContiguous(_) => ErrorKind::InvalidInput,
            Error::Metrics(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "python")]
impl From<Error> for pyo3::PyErr {
    fn from(err: Error) -> pyo3::PyErr {
        use pyo3::exceptions::{PyConnectionError, PyRuntimeError, PyValueError};
        match err.kind() {
            ErrorKind::InvalidInput => PyValueError::new_err(err.to_string()),
            ErrorKind::AcquisitionFailure => PyConnectionError::new_err(err.to_string()),
            ErrorKind::Internal => {
                log::error!("simulation failed: {err:?}");
                PyRuntimeError::new_err("internal simulation error")
            }
        }
    }
}

/// One hourly weather and sun-geometry observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    pub timestamp: NaiveDateTime,
    /// global horizontal irradiance (W/m²)
    pub ghi: f64,
    /// diffuse horizontal irradiance (W/m²)
    pub dhi: f64,
    /// direct normal irradiance (W/m²)
    pub dni: f64,
    /// air temperature (°C)
    pub temp_air: f64,
    /// wind speed (m/s)
    pub wind_speed: f64,
    /// relative humidity (%)
    pub relative_humidity: f64,
    /// sun elevation above the horizon (°)
    pub sun_elevation: f64,
    /// sun azimuth, clockwise from north (°)
    pub sun_azimuth: f64,
}

/// Column-oriented input used to build a [`ClimateRecord`] starting at a known hour.
#[derive(Debug, Clone, Default)]
pub struct ClimateColumns {
    pub ghi: Vec<f64>,
    pub dhi: Vec<f64>,
    pub dni: Vec<f64>,
    pub temp_air: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub relative_humidity: Vec<f64>,
    pub sun_elevation: Vec<f64>,
    pub sun_azimuth: Vec<f64>,
}

/// Hourly reference-year climate, validated to be non-empty and contiguous.
///
/// The record is read-only once built and shared by every pitch evaluation.
#[derive(Debug, Clone)]
pub struct ClimateRecord {
    timestamps: Vec<NaiveDateTime>,
    ghi: Array1<f64>,
    dhi: Array1<f64>,
    dni: Array1<f64>,
    temp_air: Array1<f64>,
    wind_speed: Array1<f64>,
    relative_humidity: Array1<f64>,
    sun_elevation: Array1<f64>,
    sun_azimuth: Array1<f64>,
}

impl ClimateRecord {
    pub fn new(start: NaiveDateTime, columns: ClimateColumns) -> Result<Self, Error> {
        let n = columns.ghi.len();
        if n == 0 {
            return Err(Error::EmptyClimate);
        }
        for (name, len) in [
            ("dhi", columns.dhi.len()),
            ("dni", columns.dni.len()),
            ("temp_air", columns.temp_air.len()),
            ("wind_speed", columns.wind_speed.len()),
            ("relative_humidity", columns.relative_humidity.len()),
            ("sun_elevation", columns.sun_elevation.len()),
            ("sun_azimuth", columns.sun_azimuth.len()),
        ] {
            if len != n {
                return Err(Error::LengthMismatch(n, len, name));
            }
        }

        let timestamps = (0..n)
            .map(|i| start + TimeDelta::hours(i as i64))
            .collect();

        Ok(ClimateRecord {
            timestamps,
            ghi: Array1::from_vec(columns.ghi),
            dhi: Array1::from_vec(columns.dhi),
            dni: Array1::from_vec(columns.dni),
            temp_air: Array1::from_vec(columns.temp_air),
            wind_speed: Array1::from_vec(columns.wind_speed),
            relative_humidity: Array1::from_vec(columns.relative_humidity),
            sun_elevation: Array1::from_vec(columns.sun_elevation),
            sun_azimuth: Array1::from_vec(columns.sun_azimuth),
        })
    }

    pub fn from_samples(samples: &[ClimateSample]) -> Result<Self, Error> {
        let first = samples.first().ok_or(Error::EmptyClimate)?;
        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp - pair[0].timestamp != TimeDelta::hours(1) {
                return Err(Error::NonContiguous(i + 1));
            }
        }

        let columns = ClimateColumns {
            ghi: column(samples, |s| s.ghi),
            dhi: column(samples, |s| s.dhi),
            dni: column(samples, |s| s.dni),
            temp_air: column(samples, |s| s.temp_air),
            wind_speed: column(samples, |s| s.wind_speed),
            relative_humidity: column(samples, |s| s.relative_humidity),
            sun_elevation: column(samples, |s| s.sun_elevation),
            sun_azimuth: column(samples, |s| s.sun_azimuth),
        };
        ClimateRecord::new(first.timestamp, columns)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn sample(&self, i: usize) -> ClimateSample {
        ClimateSample {
            timestamp: self.timestamps[i],
            ghi: self.ghi[i],
            dhi: self.dhi[i],
            dni: self.dni[i],
            temp_air: self.temp_air[i],
            wind_speed: self.wind_speed[i],
            relative_humidity: self.relative_humidity[i],
            sun_elevation: self.sun_elevation[i],
            sun_azimuth: self.sun_azimuth[i],
        }
    }

    // Convenience accessors
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn ghi(&self) -> ArrayView1<'_, f64> {
        self.ghi.view()
    }

    pub fn dhi(&self) -> ArrayView1<'_, f64> {
        self.dhi.view()
    }

    pub fn dni(&self) -> ArrayView1<'_, f64> {
        self.dni.view()
    }

    pub fn temp_air(&self) -> ArrayView1<'_, f64> {
        self.temp_air.view()
    }

    pub fn wind_speed(&self) -> ArrayView1<'_, f64> {
        self.wind_speed.view()
    }

    pub fn relative_humidity(&self) -> ArrayView1<'_, f64> {
        self.relative_humidity.view()
    }

    pub fn sun_elevation(&self) -> ArrayView1<'_, f64> {
        self.sun_elevation.view()
    }

    pub fn sun_azimuth(&self) -> ArrayView1<'_, f64> {
        self.sun_azimuth.view()
    }
}

/// Geometry of the tracked panel rows, fixed for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemGeometry {
    /// panel width across the tracking axis (m)
    pub panel_width: f64,
    /// height of the rotation axis above ground (m)
    pub pivot_height: f64,
    /// azimuth of the tracking axis (°, 180 = north-south axis)
    pub axis_azimuth: f64,
    /// rotation limit of the tracker (°)
    pub max_tilt: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// site altitude (m)
    pub altitude: f64,
}

impl Default for SystemGeometry {
    fn default() -> Self {
        Self {
            panel_width: 2.0,
            pivot_height: 3.0,
            axis_azimuth: 180.0,
            max_tilt: 60.0,
            latitude: 33.9,
            longitude: -5.55,
            altitude: 550.0,
        }
    }
}

impl SystemGeometry {
    pub fn ground_cover_ratio(&self, pitch: f64) -> f64 {
        self.panel_width / pitch
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_finite("panel_width", self.panel_width)?;
        check_finite("pivot_height", self.pivot_height)?;
        check_finite("axis_azimuth", self.axis_azimuth)?;
        check_finite("max_tilt", self.max_tilt)?;
        check_finite("altitude", self.altitude)?;
        if self.panel_width < 0. {
            return Err(Error::invalid("panel_width", "must not be negative"));
        }
        if self.pivot_height < 0. {
            return Err(Error::invalid("pivot_height", "must not be negative"));
        }
        if !(0.0..=90.0).contains(&self.max_tilt) {
            return Err(Error::invalid("max_tilt", "must lie in [0, 90]"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::invalid("latitude", "must lie in [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::invalid("longitude", "must lie in [-180, 180]"));
        }
        Ok(())
    }
}

/// Light and temperature tolerances of the crop grown under the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParameters {
    pub name: Option<String>,
    /// minimum acceptable daily light integral (mol/m²/day)
    pub dli_min: f64,
    /// maximum useful daily light integral (mol/m²/day)
    pub dli_max: f64,
    /// lower comfortable temperature (°C)
    pub temp_min: f64,
    /// upper comfortable temperature (°C)
    pub temp_max: f64,
}

impl Default for CropParameters {
    fn default() -> Self {
        Self {
            name: None,
            dli_min: 12.0,
            dli_max: 30.0,
            temp_min: 10.0,
            temp_max: 30.0,
        }
    }
}

impl CropParameters {
    pub fn validate(&self) -> Result<(), Error> {
        check_finite("dli_min", self.dli_min)?;
        check_finite("dli_max", self.dli_max)?;
        check_finite("temp_min", self.temp_min)?;
        check_finite("temp_max", self.temp_max)?;
        if self.dli_min < 0. || self.dli_min > self.dli_max {
            return Err(Error::invalid(
                "dli_min",
                format!(
                    "expected 0 <= dli_min <= dli_max (got {} and {})",
                    self.dli_min, self.dli_max
                ),
            ));
        }
        if self.temp_min > self.temp_max {
            return Err(Error::invalid(
                "temp_min",
                format!(
                    "expected temp_min <= temp_max (got {} and {})",
                    self.temp_min, self.temp_max
                ),
            ));
        }
        Ok(())
    }
}

pub fn validate_pitch(pitch: f64) -> Result<f64, Error> {
    if pitch.is_finite() && pitch > 0. {
        Ok(pitch)
    } else {
        Err(Error::InvalidPitch(pitch))
    }
}

fn column(samples: &[ClimateSample], field: impl Fn(&ClimateSample) -> f64) -> Vec<f64> {
    samples.iter().map(field).collect()
}

fn check_finite(name: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("must be finite (got {value})")))
    }
}

#[cfg(feature = "python")]
#[derive(pyo3::FromPyObject)]
#[pyo3(from_item_all)]
pub struct PyClimate<'py> {
    pub start: String,
    pub ghi: numpy::PyReadonlyArray1<'py, f64>,
    pub dhi: numpy::PyReadonlyArray1<'py, f64>,
    pub dni: numpy::PyReadonlyArray1<'py, f64>,
    pub temp_air: numpy::PyReadonlyArray1<'py, f64>,
    pub wind_speed: numpy::PyReadonlyArray1<'py, f64>,
    pub relative_humidity: numpy::PyReadonlyArray1<'py, f64>,
    pub sun_elevation: numpy::PyReadonlyArray1<'py, f64>,
    pub sun_azimuth: numpy::PyReadonlyArray1<'py, f64>,
}

#[cfg(feature = "python")]
impl PyClimate<'_> {
    pub fn into_record(self) -> Result<ClimateRecord, Error> {
        let start = self.start.parse::<NaiveDateTime>().map_err(|e| {
            Error::invalid("start", format!("{e} (got '{}')", self.start))
        })?;
        ClimateRecord::new(
            start,
            ClimateColumns {
                ghi: self.ghi.as_array().to_vec(),
                dhi: self.dhi.as_array().to_vec(),
                dni: self.dni.as_array().to_vec(),
                temp_air: self.temp_air.as_array().to_vec(),
                wind_speed: self.wind_speed.as_array().to_vec(),
                relative_humidity: self.relative_humidity.as_array().to_vec(),
                sun_elevation: self.sun_elevation.as_array().to_vec(),
                sun_azimuth: self.sun_azimuth.as_array().to_vec(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample(hour: i64) -> ClimateSample {
        ClimateSample {
            timestamp: start() + TimeDelta::hours(hour),
            ghi: 100.,
            dhi: 50.,
            dni: 60.,
            temp_air: 20.,
            wind_speed: 2.,
            relative_humidity: 50.,
            sun_elevation: 30.,
            sun_azimuth: 180.,
        }
    }

    #[test]
    fn record_rejects_gaps_between_samples() {
        let samples = vec![sample(0), sample(1), sample(3)];
        let err = ClimateRecord::from_samples(&samples).unwrap_err();
        assert!(matches!(err, Error::NonContiguous(2)));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn record_rejects_columns_of_different_length() {
        let columns = ClimateColumns {
            ghi: vec![0.; 3],
            dhi: vec![0.; 3],
            dni: vec![0.; 3],
            temp_air: vec![0.; 2],
            wind_speed: vec![0.; 3],
            relative_humidity: vec![0.; 3],
            sun_elevation: vec![0.; 3],
            sun_azimuth: vec![0.; 3],
        };
        let err = ClimateRecord::new(start(), columns).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch(3, 2, "temp_air")));
    }

    #[test]
    fn record_keeps_samples_in_order() {
        let samples: Vec<_> = (0..5).map(sample).collect();
        let record = ClimateRecord::from_samples(&samples).unwrap();
        assert_eq!(record.len(), 5);
        assert_eq!(record.sample(4), samples[4]);
        assert!(ClimateRecord::from_samples(&[]).is_err());
    }

    #[test]
    fn pitch_must_be_positive() {
        assert!(validate_pitch(4.0).is_ok());
        assert!(matches!(validate_pitch(0.0), Err(Error::InvalidPitch(_))));
        assert!(validate_pitch(-1.0).is_err());
        assert!(validate_pitch(f64::NAN).is_err());
    }

    #[test]
    fn ground_cover_ratio_is_width_over_pitch() {
        let geometry = SystemGeometry::default();
        assert_eq!(geometry.ground_cover_ratio(geometry.panel_width), 1.0);
        assert!(geometry.ground_cover_ratio(1e12) < 1e-11);
    }

    #[test]
    fn crop_parameters_reject_inverted_ranges() {
        let crop = CropParameters {
            dli_min: 20.,
            dli_max: 10.,
            ..Default::default()
        };
        assert!(crop.validate().is_err());
        assert!(CropParameters::default().validate().is_ok());
    }
}
