pub mod oudin;
pub mod penman_monteith;

use std::f64::consts::PI;

use crate::climate::DailyClimateSummary;

pub use oudin::Oudin;
pub use penman_monteith::PenmanMonteith;

/// solar constant (MJ m^-2 min^-1)
const SOLAR_CONSTANT: f64 = 0.082;

/// Reference evapotranspiration (mm/day) of one day.
///
/// `solar_energy` is passed apart from `day` so the same weather can be evaluated with open-field
/// and under-array radiation.
pub trait EvapotranspirationModel: Sync {
    fn reference_et(
        &self,
        day: &DailyClimateSummary,
        solar_energy: f64,
        latitude: f64,
        altitude: f64,
    ) -> f64;
}

impl<F> EvapotranspirationModel for F
where
    F: Fn(&DailyClimateSummary, f64, f64, f64) -> f64 + Sync,
{
    fn reference_et(
        &self,
        day: &DailyClimateSummary,
        solar_energy: f64,
        latitude: f64,
        altitude: f64,
    ) -> f64 {
        self(day, solar_energy, latitude, altitude)
    }
}

/// Extraterrestrial radiation (MJ m^-2 day^-1) at `latitude` (degrees).
pub fn extraterrestrial_radiation(latitude: f64, day_of_year: u32) -> f64 {
    let lat_rad = PI * latitude / 180.;
    let doy = day_of_year as f64;
    let ds = 0.409 * (2. * PI / 365. * doy - 1.39).sin(); // solar declination (rad)
    let dr = 1. + 0.033 * (doy * 2. * PI / 365.).cos(); // inverse relative distance Earth-Sun
    let omega = (-lat_rad.tan() * ds.tan()).clamp(-1., 1.).acos(); // sunset hour angle (rad)
    24. * 60. / PI
        * SOLAR_CONSTANT
        * dr
        * (omega * lat_rad.sin() * ds.sin() + lat_rad.cos() * ds.cos() * omega.sin())
}

/// Latent heat of vaporization (MJ/kg).
pub fn latent_heat(temperature: f64) -> f64 {
    2.501 - 0.002361 * temperature
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use crate::utils::register_submodule;
    use pyo3::prelude::*;

    let m = PyModule::new(py, "pet")?;
    register_submodule(py, &m, &oudin::make_module(py)?, "agrivolt_rs.pet")?;
    register_submodule(
        py,
        &m,
        &penman_monteith::make_module(py)?,
        "agrivolt_rs.pet",
    )?;
    Ok(m)
}
