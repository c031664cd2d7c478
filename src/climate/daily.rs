use chrono::NaiveDate;
use ndarray::{s, ArrayView1};
use serde::Serialize;

use crate::model::{ClimateRecord, Error};

/// Converts one hour at 1 W/m² into MJ/m².
pub const WATT_HOURS_TO_MJ: f64 = 3600. / 1_000_000.;

/// Weather of one calendar day, with the solar energy reaching the open field and the ground
/// under the array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyClimateSummary {
    pub date: NaiveDate,
    pub tmin: f64,
    pub tmax: f64,
    pub tmean: f64,
    /// mean wind speed (m/s)
    pub wind: f64,
    /// mean relative humidity (%)
    pub rh: f64,
    /// open-field solar energy (MJ/m²/day)
    pub sol_rad_open: f64,
    /// under-array solar energy (MJ/m²/day)
    pub sol_rad_agri: f64,
}

/// Resamples the hourly record into calendar days.
///
/// `ground_irradiance` is the effective irradiance under the array, one
/// value per hourly sample.
pub fn aggregate_daily(
    record: &ClimateRecord,
    ground_irradiance: ArrayView1<f64>,
) -> Result<Vec<DailyClimateSummary>, Error> {
    if ground_irradiance.len() != record.len() {
        return Err(Error::LengthMismatch(
            record.len(),
            ground_irradiance.len(),
            "ground_irradiance",
        ));
    }

    let timestamps = record.timestamps();
    let mut days = vec![];
    let mut begin = 0;
    while begin < timestamps.len() {
        let date = timestamps[begin].date();
        let end = timestamps[begin..]
            .iter()
            .position(|t| t.date() != date)
            .map_or(timestamps.len(), |offset| begin + offset);

        let temp = record.temp_air().slice_move(s![begin..end]);
        days.push(DailyClimateSummary {
            date,
            tmin: temp.fold(f64::INFINITY, |acc, &x| acc.min(x)),
            tmax: temp.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x)),
            tmean: temp.mean().unwrap_or(f64::NAN),
            wind: record
                .wind_speed()
                .slice_move(s![begin..end])
                .mean()
                .unwrap_or(f64::NAN),
            rh: record
                .relative_humidity()
                .slice_move(s![begin..end])
                .mean()
                .unwrap_or(f64::NAN),
            sol_rad_open: record.ghi().slice_move(s![begin..end]).sum() * WATT_HOURS_TO_MJ,
            sol_rad_agri: ground_irradiance.slice(s![begin..end]).sum() * WATT_HOURS_TO_MJ,
        });
        begin = end;
    }

    Ok(days)
}
