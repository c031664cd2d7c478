pub mod charts;
pub mod climate;
pub mod config;
pub mod metrics;
pub mod model;
pub mod optimization;
pub mod pet;
pub mod shading;
pub mod simulation;
pub mod tracking;
mod utils;

pub use config::SimulationConfig;
pub use metrics::SummerCalendar;
pub use model::{ClimateRecord, ClimateSample, CropParameters, Error, ErrorKind, SystemGeometry};
pub use optimization::{run_optimization, OptimizationResult, PitchGrid};
pub use simulation::{run_single_pitch, SimulationInput, SimulationResult};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn agrivolt_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use utils::register_submodule;

    let py = m.py();

    register_submodule(py, m, &climate::make_module(py)?, "agrivolt_rs")?;
    register_submodule(py, m, &tracking::make_module(py)?, "agrivolt_rs")?;
    register_submodule(py, m, &pet::make_module(py)?, "agrivolt_rs")?;
    register_submodule(py, m, &simulation::make_module(py)?, "agrivolt_rs")?;
    register_submodule(py, m, &optimization::make_module(py)?, "agrivolt_rs")?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
