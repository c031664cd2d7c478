use chrono::Datelike;

use super::{extraterrestrial_radiation, latent_heat, EvapotranspirationModel};
use crate::climate::DailyClimateSummary;

const WATER_DENSITY: f64 = 1000.; // kg/m^3

/// Temperature-only formula; it ignores solar energy, so it yields the same value for the open
/// field and under the array.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oudin;

pub fn oudin(temperature: f64, day_of_year: u32, latitude: f64) -> f64 {
    let re = extraterrestrial_radiation(latitude, day_of_year);
    (re / (latent_heat(temperature) * WATER_DENSITY) * (temperature + 5.) / 100. * 1000.)
        .max(0.)
}

impl EvapotranspirationModel for Oudin {
    fn reference_et(
        &self,
        day: &DailyClimateSummary,
        _solar_energy: f64,
        latitude: f64,
        _altitude: f64,
    ) -> f64 {
        oudin(day.tmean, day.date.ordinal(), latitude)
    }
}

#[cfg(feature = "python")]
mod python {
    use numpy::{PyArray1, PyReadonlyArray1};
    use pyo3::prelude::*;

    use crate::model::Error;

    #[pyfunction]
    #[pyo3(name = "simulate")]
    pub fn py_simulate<'py>(
        py: Python<'py>,
        temperature: PyReadonlyArray1<'py, f64>,
        day_of_year: PyReadonlyArray1<'py, f64>,
        latitude: f64,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let temp = temperature.as_array();
        let doy = day_of_year.as_array();
        if temp.len() != doy.len() {
            let err = Error::LengthMismatch(temp.len(), doy.len(), "day_of_year");
            return Err(err.into());
        }

        let pet: Vec<f64> = temp
            .iter()
            .zip(doy.iter())
            .map(|(&t, &d)| super::oudin(t, d as u32, latitude))
            .collect();
        Ok(PyArray1::from_vec(py, pet))
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "oudin")?;
    m.add_function(wrap_pyfunction!(python::py_simulate, &m)?)?;
    Ok(m)
}
