//! Full shading, water and crop pipeline for one pitch.

use ndarray::Array1;
use serde::Serialize;

use crate::charts::{build_charts, ChartData, ChartInputs};
use crate::climate::{aggregate_daily, DailyClimateSummary};
use crate::metrics::{
    assess_crop, calculate_crop_metrics, calculate_water_savings, CropAssessment, SummerCalendar,
    WaterSavings,
};
use crate::model::{validate_pitch, ClimateRecord, CropParameters, Error, SystemGeometry};
use crate::pet::{EvapotranspirationModel, PenmanMonteith};
use crate::shading::{ground_irradiance, GroundIrradiance, DEFAULT_GROUND_RESOLUTION};
use crate::tracking::{SingleAxisTracker, TiltModel};

/// Everything a pitch evaluation reads. Shared, never mutated, by every
/// candidate of an optimization.
#[derive(Clone, Copy)]
pub struct SimulationInput<'a> {
    pub climate: &'a ClimateRecord,
    pub system: &'a SystemGeometry,
    pub crop: &'a CropParameters,
    /// spacing of the ground samples (m)
    pub ground_resolution: f64,
    pub tilt_model: &'a dyn TiltModel,
    pub et_model: &'a dyn EvapotranspirationModel,
    /// solstice and summer months of the crop metrics
    pub summer: SummerCalendar,
}

impl<'a> SimulationInput<'a> {
    /// Backtracking single-axis tracker, FAO-56 Penman-Monteith and a June summer.
    pub fn new(
        climate: &'a ClimateRecord,
        system: &'a SystemGeometry,
        crop: &'a CropParameters,
    ) -> Self {
        SimulationInput {
            climate,
            system,
            crop,
            ground_resolution: DEFAULT_GROUND_RESOLUTION,
            tilt_model: &SingleAxisTracker::BACKTRACKING,
            et_model: &PenmanMonteith::FAO56,
            summer: SummerCalendar::default(),
        }
    }

    pub fn with_ground_resolution(self, ground_resolution: f64) -> Self {
        SimulationInput {
            ground_resolution,
            ..self
        }
    }

    pub fn with_tilt_model(self, tilt_model: &'a dyn TiltModel) -> Self {
        SimulationInput { tilt_model, ..self }
    }

    pub fn with_et_model(self, et_model: &'a dyn EvapotranspirationModel) -> Self {
        SimulationInput { et_model, ..self }
    }

    pub fn with_summer_calendar(self, summer: SummerCalendar) -> Self {
        SimulationInput { summer, ..self }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.climate.is_empty() {
            return Err(Error::EmptyClimate);
        }
        self.system.validate()?;
        self.crop.validate()?;
        if !(self.ground_resolution.is_finite() && self.ground_resolution > 0.) {
            return Err(Error::invalid(
                "ground_resolution",
                format!(
                    "must be a finite positive distance (got {})",
                    self.ground_resolution
                ),
            ));
        }
        Ok(())
    }
}

/// Daily evapotranspiration of both scenarios for one pitch.
#[derive(Debug, Clone)]
pub struct WaterBalance {
    pub days: Vec<DailyClimateSummary>,
    pub et_open: Array1<f64>,
    pub et_agri: Array1<f64>,
    pub savings: WaterSavings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub pitch: f64,
    pub ground_cover_ratio: f64,
    /// relative reduction of annual evapotranspiration (%)
    pub water_savings: f64,
    pub et_open: f64,
    pub et_agri: f64,
    pub dli_open: f64,
    pub dli_agri: f64,
    pub peak_temp_open: f64,
    pub peak_temp_agri: f64,
    pub mean_daytime_shading: f64,
    pub assessment: CropAssessment,
}

pub fn evaluate_water_balance(
    input: &SimulationInput,
    ground: &GroundIrradiance,
) -> Result<WaterBalance, Error> {
    let days = aggregate_daily(input.climate, ground.agrivoltaic.view())?;
    let (latitude, altitude) = (input.system.latitude, input.system.altitude);

    let et_open = Array1::from_iter(days.iter().map(|day| {
        input
            .et_model
            .reference_et(day, day.sol_rad_open, latitude, altitude)
    }));
    let et_agri = Array1::from_iter(days.iter().map(|day| {
        input
            .et_model
            .reference_et(day, day.sol_rad_agri, latitude, altitude)
    }));
    let savings = calculate_water_savings(et_open.view(), et_agri.view())?;

    Ok(WaterBalance {
        days,
        et_open,
        et_agri,
        savings,
    })
}

/// Water savings (%) of one pitch, without crop metrics or chart series.
pub fn water_savings_for_pitch(input: &SimulationInput, pitch: f64) -> Result<f64, Error> {
    let pitch = validate_pitch(pitch)?;
    let ground = ground_irradiance(
        input.climate,
        input.system,
        input.tilt_model,
        pitch,
        input.ground_resolution,
    )?;
    let balance = evaluate_water_balance(input, &ground)?;
    log::debug!(
        "pitch {pitch} m: {:.3} % water savings",
        balance.savings.percent
    );
    Ok(balance.savings.percent)
}

pub fn run_single_pitch(
    input: &SimulationInput,
    pitch: f64,
) -> Result<(SimulationResult, ChartData), Error> {
    let pitch = validate_pitch(pitch)?;
    input.validate()?;
    log::info!(
        "simulating pitch {pitch} m over {} hourly samples",
        input.climate.len()
    );

    let ground = ground_irradiance(
        input.climate,
        input.system,
        input.tilt_model,
        pitch,
        input.ground_resolution,
    )?;
    let balance = evaluate_water_balance(input, &ground)?;
    let crop = calculate_crop_metrics(
        input.climate,
        ground.agrivoltaic.view(),
        input.system.latitude,
        input.summer,
    )?;

    let result = SimulationResult {
        pitch,
        ground_cover_ratio: input.system.ground_cover_ratio(pitch),
        water_savings: balance.savings.percent,
        et_open: balance.savings.et_open,
        et_agri: balance.savings.et_agri,
        dli_open: crop.dli_open,
        dli_agri: crop.dli_agri,
        peak_temp_open: crop.peak_temp_open,
        peak_temp_agri: crop.peak_temp_agri,
        mean_daytime_shading: ground.mean_daytime_shading(input.climate),
        assessment: assess_crop(input.crop, &crop),
    };
    let charts = build_charts(&ChartInputs {
        record: input.climate,
        ground_irradiance: ground.agrivoltaic.view(),
        days: &balance.days,
        et_open: balance.et_open.view(),
        et_agri: balance.et_agri.view(),
        pitch,
        latitude: input.system.latitude,
        summer: input.summer,
    });

    log::info!(
        "pitch {pitch} m: {:.2} % water savings, DLI {:.1} -> {:.1} mol/m²/day",
        result.water_savings,
        result.dli_open,
        result.dli_agri
    );
    Ok((result, charts))
}

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    use crate::config::SimulationConfig;
    use crate::model::{Error, PyClimate};
    use crate::utils::to_json;

    /// Returns the result and the chart series as JSON strings.
    #[pyfunction]
    #[pyo3(name = "run_single_pitch", signature = (climate, pitch, config = None))]
    pub fn py_run_single_pitch<'py>(
        py: Python<'py>,
        climate: PyClimate<'py>,
        pitch: f64,
        config: Option<String>,
    ) -> PyResult<(String, String)> {
        let config = match config {
            Some(json) => SimulationConfig::from_json_str(&json)?,
            None => SimulationConfig::default(),
        };
        let record = climate.into_record()?;

        let output: Result<(String, String), Error> = py.detach(|| {
            let input = config.simulation_input(&record);
            let (result, charts) = super::run_single_pitch(&input, pitch)?;
            Ok((to_json(&result)?, to_json(&charts)?))
        });
        Ok(output?)
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "simulation")?;
    m.add_function(wrap_pyfunction!(python::py_run_single_pitch, &m)?)?;
    Ok(m)
}
