//! Series prepared for the front-end charts of one simulated pitch.

use chrono::{Datelike, NaiveDate};
use ndarray::ArrayView1;
use serde::Serialize;

use crate::climate::DailyClimateSummary;
use crate::metrics::{SummerCalendar, AGRIVOLTAIC_COOLING};
use crate::model::{ClimateRecord, Error};
use crate::utils::to_json;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub data: Vec<f64>,
}

impl Series {
    fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Series {
            label: label.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub datasets: Vec<Series>,
}

/// Savings over the pitch grid, with the selected optimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationChart {
    pub labels: Vec<f64>,
    pub datasets: Vec<Series>,
    pub optimal_pitch: f64,
    pub max_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub irradiance: Chart,
    pub monthly_water: Chart,
    pub cumulative_water: Chart,
    pub peak_temp: Chart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationChart>,
}

impl ChartData {
    pub fn to_json(&self) -> Result<String, Error> {
        to_json(self)
    }
}

/// Inputs of [`build_charts`], all coming from one full pipeline run.
pub struct ChartInputs<'a> {
    pub record: &'a ClimateRecord,
    pub ground_irradiance: ArrayView1<'a, f64>,
    pub days: &'a [DailyClimateSummary],
    pub et_open: ArrayView1<'a, f64>,
    pub et_agri: ArrayView1<'a, f64>,
    pub pitch: f64,
    pub latitude: f64,
    pub summer: SummerCalendar,
}

pub fn build_charts(inputs: &ChartInputs) -> ChartData {
    ChartData {
        irradiance: solstice_irradiance(inputs),
        monthly_water: monthly_water(inputs),
        cumulative_water: cumulative_water(inputs),
        peak_temp: hottest_day(inputs.record),
        optimization: None,
    }
}

fn solstice_irradiance(inputs: &ChartInputs) -> Chart {
    let timestamps = inputs.record.timestamps();
    let solstice = inputs.summer.solstice(timestamps[0].year(), inputs.latitude);
    let hours: Vec<usize> = (0..timestamps.len())
        .filter(|&t| Some(timestamps[t].date()) == solstice)
        .collect();

    let ghi = inputs.record.ghi();
    Chart {
        title: None,
        labels: hours
            .iter()
            .map(|&t| timestamps[t].format("%H:%M").to_string())
            .collect(),
        datasets: vec![
            Series::new("Open Field GHI", hours.iter().map(|&t| ghi[t]).collect()),
            Series::new(
                format!("Agrivoltaic GHI (Pitch = {}m)", inputs.pitch),
                hours.iter().map(|&t| inputs.ground_irradiance[t]).collect(),
            ),
        ],
    }
}

fn daily_savings(inputs: &ChartInputs) -> Vec<(NaiveDate, f64)> {
    inputs
        .days
        .iter()
        .zip(inputs.et_open.iter().zip(inputs.et_agri.iter()))
        .map(|(day, (open, agri))| (day.date, open - agri))
        .collect()
}

fn monthly_water(inputs: &ChartInputs) -> Chart {
    let mut labels: Vec<String> = vec![];
    let mut data: Vec<f64> = vec![];
    let mut current: Option<(i32, u32)> = None;
    for (date, saved) in daily_savings(inputs) {
        let month = (date.year(), date.month());
        if current != Some(month) {
            current = Some(month);
            labels.push(date.format("%b").to_string());
            data.push(0.);
        }
        if let Some(total) = data.last_mut() {
            *total += saved;
        }
    }

    Chart {
        title: None,
        labels,
        datasets: vec![Series::new("Water Saved (mm)", data)],
    }
}

fn cumulative_water(inputs: &ChartInputs) -> Chart {
    let (labels, data): (Vec<String>, Vec<f64>) = daily_savings(inputs)
        .into_iter()
        .scan(0., |total, (date, saved)| {
            *total += saved;
            Some((date.format("%Y-%m-%d").to_string(), *total))
        })
        .unzip();

    Chart {
        title: None,
        labels,
        datasets: vec![Series::new("Total Water Saved (mm)", data)],
    }
}

/// Hourly temperatures of the day holding the first annual maximum.
fn hottest_day(record: &ClimateRecord) -> Chart {
    let temp_air = record.temp_air();
    let timestamps = record.timestamps();
    let hottest = temp_air
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (t, &temp)| match best {
            _ if temp.is_nan() => best,
            Some((_, max)) if temp <= max => best,
            _ => Some((t, temp)),
        })
        .map_or(timestamps[0].date(), |(t, _)| timestamps[t].date());

    let hours: Vec<usize> = (0..timestamps.len())
        .filter(|&t| timestamps[t].date() == hottest)
        .collect();
    let open: Vec<f64> = hours.iter().map(|&t| temp_air[t]).collect();
    let agri = open.iter().map(|t| t - AGRIVOLTAIC_COOLING).collect();

    Chart {
        title: Some(format!(
            "Temperature Profile on Hottest Day ({})",
            hottest.format("%B %d")
        )),
        labels: hours
            .iter()
            .map(|&t| timestamps[t].format("%H:%M").to_string())
            .collect(),
        datasets: vec![
            Series::new("Open Field Temperature", open),
            Series::new("Agrivoltaic Temperature", agri),
        ],
    }
}
