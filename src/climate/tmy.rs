use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{AcquisitionError, ClimateSource};
use crate::model::{ClimateRecord, ClimateSample};

/// Hourly typical-meteorological-year file already resolved for one site.
#[derive(Debug, Clone)]
pub struct CsvClimateSource {
    path: PathBuf,
}

impl CsvClimateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvClimateSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClimateSource for CsvClimateSource {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        _altitude: f64,
    ) -> Result<ClimateRecord, AcquisitionError> {
        log::info!(
            "loading climate for ({latitude}, {longitude}) from {}",
            self.path.display()
        );
        let file = std::fs::File::open(&self.path)?;
        read_climate_csv(file)
    }
}

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: NaiveDateTime,
    #[serde(deserialize_with = "csv::invalid_option")]
    ghi: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    dhi: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    dni: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    temp_air: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    wind_speed: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    relative_humidity: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    sun_elevation: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    sun_azimuth: Option<f64>,
}

/// Parses an hourly climate CSV with a header row.
///
/// Missing or unparsable cells are forward-filled then back-filled within their column; a column
/// with no value at all is rejected.
pub fn read_climate_csv<R: Read>(reader: R) -> Result<ClimateRecord, AcquisitionError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let rows = reader.deserialize::<Row>().collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(AcquisitionError::Malformed("climate file has no data rows".to_string()));
    }

    let ghi = fill_gaps(rows.iter().map(|r| r.ghi), "ghi")?;
    let dhi = fill_gaps(rows.iter().map(|r| r.dhi), "dhi")?;
    let dni = fill_gaps(rows.iter().map(|r| r.dni), "dni")?;
    let temp_air = fill_gaps(rows.iter().map(|r| r.temp_air), "temp_air")?;
    let wind_speed = fill_gaps(rows.iter().map(|r| r.wind_speed), "wind_speed")?;
    let relative_humidity = fill_gaps(
        rows.iter().map(|r| r.relative_humidity),
        "relative_humidity",
    )?;
    let sun_elevation = fill_gaps(rows.iter().map(|r| r.sun_elevation), "sun_elevation")?;
    let sun_azimuth = fill_gaps(rows.iter().map(|r| r.sun_azimuth), "sun_azimuth")?;

    let samples: Vec<ClimateSample> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| ClimateSample {
            timestamp: row.timestamp,
            ghi: ghi[i],
            dhi: dhi[i],
            dni: dni[i],
            temp_air: temp_air[i],
            wind_speed: wind_speed[i],
            relative_humidity: relative_humidity[i],
            sun_elevation: sun_elevation[i],
            sun_azimuth: sun_azimuth[i],
        })
        .collect();

    ClimateRecord::from_samples(&samples)
        .map_err(|e| AcquisitionError::Malformed(e.to_string()))
}

fn fill_gaps(
    values: impl Iterator<Item = Option<f64>>,
    column: &'static str,
) -> Result<Vec<f64>, AcquisitionError> {
    let values: Vec<Option<f64>> = values.map(|v| v.filter(|x| x.is_finite())).collect();
    let first = values.iter().flatten().next().copied().ok_or_else(|| {
        AcquisitionError::Malformed(format!("column '{column}' has no values"))
    })?;

    let n_missing = values.iter().filter(|v| v.is_none()).count();
    if n_missing > 0 {
        log::warn!("filled {n_missing} missing values in column '{column}'");
    }

    // leading gaps take the first known value, later gaps the previous one
    let mut last = first;
    Ok(values
        .into_iter()
        .map(|v| {
            if let Some(x) = v {
                last = x;
            }
            last
        })
        .collect())
}
