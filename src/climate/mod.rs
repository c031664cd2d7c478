mod daily;
mod tmy;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::model::ClimateRecord;

pub use daily::{aggregate_daily, DailyClimateSummary, WATT_HOURS_TO_MJ};
pub use tmy::{read_climate_csv, CsvClimateSource};

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("climate provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("climate provider unreachable: {0}")]
    Unreachable(String),
    #[error("malformed climate data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Anything able to produce an hourly reference year for a location.
pub trait ClimateSource {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Result<ClimateRecord, AcquisitionError>;
}

/// Runs `source.fetch` on a worker thread and gives up after `timeout`.
///
/// A provider that hangs is abandoned, not cancelled: its thread keeps running until the
/// provider returns and its result is dropped.
pub fn fetch_with_timeout<S>(
    source: Arc<S>,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    timeout: Duration,
) -> Result<ClimateRecord, AcquisitionError>
where
    S: ClimateSource + Send + Sync + ?Sized + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("climate-fetch".to_string())
        .spawn(move || {
            // receiver is gone once the caller timed out
            let _ = sender.send(source.fetch(latitude, longitude, altitude));
        })?;

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!(
                "climate fetch for ({latitude}, {longitude}) timed out after {timeout:?}"
            );
            Err(AcquisitionError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(AcquisitionError::Unreachable(
            "climate provider stopped without returning data".to_string(),
        )),
    }
}

#[cfg(feature = "python")]
mod python {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use numpy::ToPyArray;
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    use super::{fetch_with_timeout, CsvClimateSource};
    use crate::model::Error;

    #[pyfunction]
    #[pyo3(name = "load_csv", signature = (path, latitude, longitude, altitude, timeout_secs = 30.0))]
    pub fn py_load_csv<'py>(
        py: Python<'py>,
        path: PathBuf,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        timeout_secs: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|e| Error::invalid("timeout_secs", e.to_string()))?;
        let source = Arc::new(CsvClimateSource::new(path));
        let record = py
            .detach(|| fetch_with_timeout(source, latitude, longitude, altitude, timeout))
            .map_err(Error::from)?;

        let dict = PyDict::new(py);
        dict.set_item("start", record.timestamps()[0].to_string())?;
        dict.set_item("ghi", record.ghi().to_pyarray(py))?;
        dict.set_item("dhi", record.dhi().to_pyarray(py))?;
        dict.set_item("dni", record.dni().to_pyarray(py))?;
        dict.set_item("temp_air", record.temp_air().to_pyarray(py))?;
        dict.set_item("wind_speed", record.wind_speed().to_pyarray(py))?;
        dict.set_item(
            "relative_humidity",
            record.relative_humidity().to_pyarray(py),
        )?;
        dict.set_item("sun_elevation", record.sun_elevation().to_pyarray(py))?;
        dict.set_item("sun_azimuth", record.sun_azimuth().to_pyarray(py))?;
        Ok(dict)
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "climate")?;
    m.add_function(wrap_pyfunction!(python::py_load_csv, &m)?)?;
    Ok(m)
}
