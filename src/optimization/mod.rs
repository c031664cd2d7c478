mod grid_search;
mod utils;

pub use grid_search::{
    evaluate_grid, run_optimization, select_optimum, OptimizationResult, PitchEvaluation,
};
pub use utils::{PitchGrid, PitchRange};

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    use crate::config::SimulationConfig;
    use crate::model::{Error, PyClimate};
    use crate::utils::to_json;

    /// Returns the grid search, the result at the optimal pitch and the chart series as JSON
    /// strings.
    #[pyfunction]
    #[pyo3(name = "run_optimization", signature = (climate, config = None))]
    pub fn py_run_optimization<'py>(
        py: Python<'py>,
        climate: PyClimate<'py>,
        config: Option<String>,
    ) -> PyResult<(String, String, String)> {
        let config = match config {
            Some(json) => SimulationConfig::from_json_str(&json)?,
            None => SimulationConfig::default(),
        };
        let grid = config.pitch_grid.to_grid()?;
        let record = climate.into_record()?;

        let output: Result<(String, String, String), Error> = py.detach(|| {
            let input = config.simulation_input(&record);
            let (optimization, result, charts) = super::run_optimization(&input, &grid)?;
            Ok((to_json(&optimization)?, to_json(&result)?, to_json(&charts)?))
        });
        Ok(output?)
    }
}

#[cfg(feature = "python")]
pub fn make_module(py: pyo3::Python<'_>) -> pyo3::PyResult<pyo3::Bound<'_, pyo3::types::PyModule>> {
    use pyo3::prelude::*;

    let m = PyModule::new(py, "optimization")?;
    m.add_function(wrap_pyfunction!(python::py_run_optimization, &m)?)?;
    Ok(m)
}
