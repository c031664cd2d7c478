use chrono::Datelike;

use super::{extraterrestrial_radiation, latent_heat, EvapotranspirationModel};
use crate::climate::DailyClimateSummary;

const STEFAN_BOLTZMANN: f64 = 4.903e-9; // MJ K^-4 m^-2 day^-1
const SPECIFIC_HEAT_AIR: f64 = 1.013e-3; // MJ kg^-1 °C^-1
const MOLECULAR_WEIGHT_RATIO: f64 = 0.622;

/// Daily FAO-56 Penman-Monteith reference evapotranspiration (grass).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenmanMonteith {
    pub albedo: f64,
    /// numerator constant of the aerodynamic term
    pub cn: f64,
    /// denominator constant of the aerodynamic term
    pub cd: f64,
}

impl PenmanMonteith {
    pub const FAO56: PenmanMonteith = PenmanMonteith {
        albedo: 0.23,
        cn: 900.,
        cd: 0.34,
    };
}

impl Default for PenmanMonteith {
    fn default() -> Self {
        Self::FAO56
    }
}

/// Atmospheric pressure (kPa) at `altitude` (m).
pub fn atmospheric_pressure(altitude: f64) -> f64 {
    101.3 * ((293. - 0.0065 * altitude) / 293.).powf(5.26)
}

/// Saturation vapour pressure (kPa) at `temperature` (°C).
pub fn saturation_vapour_pressure(temperature: f64) -> f64 {
    0.6108 * (17.27 * temperature / (temperature + 237.3)).exp()
}

impl EvapotranspirationModel for PenmanMonteith {
    fn reference_et(
        &self,
        day: &DailyClimateSummary,
        solar_energy: f64,
        latitude: f64,
        altitude: f64,
    ) -> f64 {
        let lambda = latent_heat(day.tmean);
        let pressure = atmospheric_pressure(altitude);
        let gamma = SPECIFIC_HEAT_AIR * pressure / (MOLECULAR_WEIGHT_RATIO * lambda);
        let delta = 4098. * saturation_vapour_pressure(day.tmean) / (day.tmean + 237.3).powi(2);

        let es = (saturation_vapour_pressure(day.tmax) + saturation_vapour_pressure(day.tmin)) / 2.;
        let ea = day.rh.clamp(0., 100.) / 100. * es;

        let ra = extraterrestrial_radiation(latitude, day.date.ordinal());
        let rso = (0.75 + 2e-5 * altitude) * ra;
        // relative shortwave radiation is kept in the range FAO-56 allows
        let relative_radiation = if rso > 0. {
            (solar_energy / rso).clamp(0.3, 1.)
        } else {
            0.3
        };

        let rns = (1. - self.albedo) * solar_energy;
        let rnl = STEFAN_BOLTZMANN
            * ((day.tmax + 273.16).powi(4) + (day.tmin + 273.16).powi(4))
            / 2.
            * (0.34 - 0.14 * ea.sqrt())
            * (1.35 * relative_radiation - 0.35);
        let rn = rns - rnl;

        let numerator = delta * rn / lambda
            + gamma * self.cn / (day.tmean + 273.) * day.wind * (es - ea);
        let denominator = delta + gamma * (1. + self.cd * day.wind);
        (numerator / denominator).max(0.)
    }
}

#[cfg(feature = "python")]
mod python {
    use chrono::NaiveDate;
    use pyo3::prelude::*;

    use super::{EvapotranspirationModel, PenmanMonteith};
    use crate::climate::DailyClimateSummary;
    use crate::model::Error;

    #[allow(clippy::too_many_arguments)]
    #[pyfunction]
    #[pyo3(name = "reference_et")]
    pub fn py_reference_et(
        date: &str,
        tmin: f64,
        tmax: f64,
        tmean: f64,
        wind: f64,
        rh: f64,
        solar_energy: f64,
        latitude: f64,
        altitude: f64,
    ) -> PyResult<f64> {
        let date = date
            .parse::<NaiveDate>()
            .map_err(|e| Error::invalid("date", e.to_string()))?;
        let day = DailyClimateSummary {
            date,
            tmin,
            tmax,
            tmean,
            wind,
            rh,
            sol_rad_open: solar_energy,
            sol_rad_agri: solar_energy,
        };
        Ok(PenmanMonteith::FAO56.reference_et(&day, solar_energy, latitude, altitude))
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "penman_monteith")?;
    m.add_function(wrap_pyfunction!(python::py_reference_et, &m)?)?;
    Ok(m)
}
