use rayon::prelude::*;
use serde::Serialize;

use crate::charts::{ChartData, OptimizationChart, Series};
use crate::model::Error;
use crate::optimization::utils::PitchGrid;
use crate::simulation::{
    run_single_pitch, water_savings_for_pitch, SimulationInput, SimulationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchEvaluation {
    pub pitch: f64,
    pub water_savings_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// one entry per candidate, in grid order
    pub candidates: Vec<PitchEvaluation>,
    pub optimal_pitch: f64,
    pub max_savings: f64,
}

/// Water savings of every candidate. Candidates are independent and run in parallel; the output
/// keeps the grid order.
pub fn evaluate_grid(
    input: &SimulationInput,
    grid: &PitchGrid,
) -> Result<Vec<PitchEvaluation>, Error> {
    grid.values()
        .par_iter()
        .map(|&pitch| {
            water_savings_for_pitch(input, pitch).map(|savings| PitchEvaluation {
                pitch,
                water_savings_percent: savings,
            })
        })
        .collect()
}

/// First candidate with the largest savings. NaN savings never win.
pub fn select_optimum(candidates: &[PitchEvaluation]) -> Option<PitchEvaluation> {
    candidates
        .iter()
        .filter(|c| !c.water_savings_percent.is_nan())
        .fold(None, |best: Option<PitchEvaluation>, &c| match best {
            Some(b) if c.water_savings_percent <= b.water_savings_percent => best,
            _ => Some(c),
        })
}

/// Searches the grid with the cheap water-only path, then runs the full pipeline once at the
/// winning pitch.
pub fn run_optimization(
    input: &SimulationInput,
    grid: &PitchGrid,
) -> Result<(OptimizationResult, SimulationResult, ChartData), Error> {
    if grid.is_empty() {
        return Err(Error::EmptyPitchGrid);
    }
    input.validate()?;
    log::info!(
        "optimizing pitch over {} candidates ({} to {} m)",
        grid.len(),
        grid.values()[0],
        grid.values()[grid.len() - 1]
    );

    let candidates = evaluate_grid(input, grid)?;
    let best = select_optimum(&candidates).ok_or_else(|| {
        log::error!("no finite water savings in grid {:?}", grid.values());
        Error::Internal(format!(
            "no finite water savings among {} candidates",
            candidates.len()
        ))
    })?;
    log::info!(
        "optimal pitch {} m with {:.2} % water savings",
        best.pitch,
        best.water_savings_percent
    );

    let (result, mut charts) = run_single_pitch(input, best.pitch)?;
    charts.optimization = Some(OptimizationChart {
        labels: candidates.iter().map(|c| c.pitch).collect(),
        datasets: vec![Series {
            label: "Simulated Savings".to_string(),
            data: candidates.iter().map(|c| c.water_savings_percent).collect(),
        }],
        optimal_pitch: best.pitch,
        max_savings: best.water_savings_percent,
    });

    Ok((
        OptimizationResult {
            candidates,
            optimal_pitch: best.pitch,
            max_savings: best.water_savings_percent,
        },
        result,
        charts,
    ))
}
