use chrono::{Datelike, NaiveDate};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ClimateRecord, CropParameters};

/// PPFD (µmol m^-2 s^-1) = PPFD_OFFSET + PPFD_SLOPE * GHI (W m^-2)
pub const PPFD_OFFSET: f64 = -46.65;
pub const PPFD_SLOPE: f64 = 1.792;
/// Fixed air temperature drop under the array (°C).
pub const AGRIVOLTAIC_COOLING: f64 = 1.2;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("open-field and agrivoltaic series must have the same length (got {0} and {1})")]
    LengthMismatch(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterSavings {
    /// annual reference evapotranspiration, open field (mm)
    pub et_open: f64,
    /// annual reference evapotranspiration under the array (mm)
    pub et_agri: f64,
    pub percent: f64,
}

/// Relative reduction of evapotranspiration, 0 when the open field has none.
pub fn savings_percent(et_open: f64, et_agri: f64) -> f64 {
    if et_open > 0. {
        (et_open - et_agri) / et_open * 100.
    } else {
        0.
    }
}

pub fn calculate_water_savings(
    et_open: ArrayView1<f64>,
    et_agri: ArrayView1<f64>,
) -> Result<WaterSavings, MetricsError> {
    check_lengths(et_open, et_agri)?;
    let (et_open, et_agri) = (et_open.sum(), et_agri.sum());
    Ok(WaterSavings {
        et_open,
        et_agri,
        percent: savings_percent(et_open, et_agri),
    })
}

pub fn ppfd(ghi: f64) -> f64 {
    (PPFD_OFFSET + PPFD_SLOPE * ghi.max(0.)).max(0.)
}

/// Daily light integral (mol m^-2 day^-1) from hourly irradiance.
pub fn daily_light_integral(hourly_ghi: impl IntoIterator<Item = f64>) -> f64 {
    hourly_ghi.into_iter().map(|g| ppfd(g) * 3600.).sum::<f64>() / 1_000_000.
}

/// Which dates stand for summer in the crop metrics and charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummerCalendar {
    /// 21 June and June to August at every site.
    #[default]
    June,
    /// 21 December and December to February south of the equator, `June` elsewhere.
    Hemispheric,
}

impl SummerCalendar {
    fn is_southern(self, latitude: f64) -> bool {
        self == SummerCalendar::Hemispheric && latitude < 0.
    }

    pub fn solstice(self, year: i32, latitude: f64) -> Option<NaiveDate> {
        let month = if self.is_southern(latitude) { 12 } else { 6 };
        NaiveDate::from_ymd_opt(year, month, 21)
    }

    pub fn is_summer_month(self, month: u32, latitude: f64) -> bool {
        if self.is_southern(latitude) {
            matches!(month, 12 | 1 | 2)
        } else {
            matches!(month, 6..=8)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropMetrics {
    pub dli_open: f64,
    pub dli_agri: f64,
    /// NaN when the record holds no summer hour
    pub peak_temp_open: f64,
    pub peak_temp_agri: f64,
}

pub fn calculate_crop_metrics(
    record: &ClimateRecord,
    ground_irradiance: ArrayView1<f64>,
    latitude: f64,
    summer: SummerCalendar,
) -> Result<CropMetrics, MetricsError> {
    check_lengths(record.ghi(), ground_irradiance)?;
    let timestamps = record.timestamps();
    let solstice = summer.solstice(timestamps[0].year(), latitude);
    let on_solstice: Vec<usize> = (0..record.len())
        .filter(|&t| Some(timestamps[t].date()) == solstice)
        .collect();

    let ghi = record.ghi();
    let dli_open = daily_light_integral(on_solstice.iter().map(|&t| ghi[t]));
    let dli_agri = daily_light_integral(on_solstice.iter().map(|&t| ground_irradiance[t]));

    let peak_temp_open = timestamps
        .iter()
        .zip(record.temp_air())
        .filter(|(ts, _)| summer.is_summer_month(ts.month(), latitude))
        .map(|(_, &temp)| temp)
        .fold(f64::NAN, f64::max);

    Ok(CropMetrics {
        dli_open,
        dli_agri,
        peak_temp_open,
        peak_temp_agri: peak_temp_open - AGRIVOLTAIC_COOLING,
    })
}

/// How the simulated conditions compare with the crop's tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropAssessment {
    pub dli_within_range: bool,
    pub dli_reduction_percent: f64,
    pub heat_stress_open: bool,
    pub heat_stress_agri: bool,
}

pub fn assess_crop(crop: &CropParameters, metrics: &CropMetrics) -> CropAssessment {
    CropAssessment {
        dli_within_range: (crop.dli_min..=crop.dli_max).contains(&metrics.dli_agri),
        dli_reduction_percent: savings_percent(metrics.dli_open, metrics.dli_agri),
        heat_stress_open: metrics.peak_temp_open > crop.temp_max,
        heat_stress_agri: metrics.peak_temp_agri > crop.temp_max,
    }
}

fn check_lengths(open: ArrayView1<f64>, agri: ArrayView1<f64>) -> Result<(), MetricsError> {
    if open.len() != agri.len() {
        Err(MetricsError::LengthMismatch(open.len(), agri.len()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClimateColumns;
    use ndarray::{array, Array1};

    #[test]
    fn savings_are_relative_to_open_field() {
        let open = array![2., 3., 5.];
        let agri = array![1., 2., 4.];
        let savings = calculate_water_savings(open.view(), agri.view()).unwrap();
        assert_eq!(savings.et_open, 10.);
        assert_eq!(savings.et_agri, 7.);
        assert!((savings.percent - 30.).abs() < 1e-12);
    }

    #[test]
    fn savings_are_zero_without_open_field_evapotranspiration() {
        let zeros = Array1::zeros(365);
        let savings = calculate_water_savings(zeros.view(), zeros.view()).unwrap();
        assert_eq!(savings.percent, 0.);
        assert_eq!(savings_percent(0., 5.), 0.);
    }

    #[test]
    fn savings_never_exceed_one_hundred_percent() {
        assert_eq!(savings_percent(4., 0.), 100.);
        assert!(savings_percent(4., 6.) < 0.);
    }

    #[test]
    fn savings_reject_mismatched_series() {
        let open = array![1., 2.];
        let agri = array![1.];
        assert!(calculate_water_savings(open.view(), agri.view()).is_err());
    }

    #[test]
    fn ppfd_is_clipped_at_zero() {
        assert_eq!(ppfd(-100.), 0.);
        assert_eq!(ppfd(10.), 0.);
        assert!((ppfd(1000.) - 1745.35).abs() < 1e-9);
    }

    #[test]
    fn dli_integrates_hourly_ppfd() {
        // one hour at 1000 W/m²: 1745.35 µmol/m²/s for 3600 s
        let dli = daily_light_integral([0., 1000., 0.]);
        assert!((dli - 6.28326).abs() < 1e-9);
    }

    #[test]
    fn june_calendar_ignores_hemisphere() {
        let june_21 = NaiveDate::from_ymd_opt(2022, 6, 21);
        assert_eq!(SummerCalendar::default(), SummerCalendar::June);
        assert_eq!(SummerCalendar::June.solstice(2022, 45.), june_21);
        assert_eq!(SummerCalendar::June.solstice(2022, -33.), june_21);
        assert!(SummerCalendar::June.is_summer_month(7, -10.));
        assert!(!SummerCalendar::June.is_summer_month(1, -10.));
    }

    #[test]
    fn hemispheric_calendar_flips_south_of_equator() {
        let summer = SummerCalendar::Hemispheric;
        let june_21 = NaiveDate::from_ymd_opt(2022, 6, 21);
        let december_21 = NaiveDate::from_ymd_opt(2022, 12, 21);
        assert_eq!(summer.solstice(2022, 45.), june_21);
        assert_eq!(summer.solstice(2022, -33.), december_21);
        assert!(summer.is_summer_month(7, 10.));
        assert!(!summer.is_summer_month(7, -10.));
        assert!(summer.is_summer_month(1, -10.));
    }

    fn june_days() -> ClimateRecord {
        let start = NaiveDate::from_ymd_opt(2022, 6, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let n = 72;
        let ghi: Vec<f64> = (0..n)
            .map(|h| if (10..14).contains(&(h % 24)) { 800. } else { 0. })
            .collect();
        let columns = ClimateColumns {
            dhi: vec![100.; n],
            dni: vec![0.; n],
            temp_air: (0..n).map(|h| 20. + (h % 24) as f64 / 2.).collect(),
            wind_speed: vec![2.; n],
            relative_humidity: vec![50.; n],
            sun_elevation: vec![45.; n],
            sun_azimuth: vec![180.; n],
            ghi,
        };
        ClimateRecord::new(start, columns).unwrap()
    }

    #[test]
    fn crop_metrics_use_solstice_and_summer_peak() {
        let record = june_days();
        let ground = record.ghi().mapv(|g| g / 2.);
        let metrics = calculate_crop_metrics(&record, ground.view(), 34., SummerCalendar::June)
            .unwrap();

        let expected_open = daily_light_integral([800.; 4]);
        assert!((metrics.dli_open - expected_open).abs() < 1e-9);
        assert!(metrics.dli_agri < metrics.dli_open);
        assert!(metrics.dli_agri >= 0.);
        assert_eq!(metrics.peak_temp_open, 31.5);
        assert!((metrics.peak_temp_agri - 30.3).abs() < 1e-9);
    }

    #[test]
    fn southern_site_uses_june_by_default() {
        let record = june_days();
        let summer = SummerCalendar::June;
        let north = calculate_crop_metrics(&record, record.ghi(), 34., summer).unwrap();
        let south = calculate_crop_metrics(&record, record.ghi(), -34., summer).unwrap();
        assert_eq!(north, south);
        assert_eq!(south.peak_temp_open, 31.5);
    }

    #[test]
    fn hemispheric_peak_is_nan_without_southern_summer() {
        let record = june_days();
        let summer = SummerCalendar::Hemispheric;
        let metrics = calculate_crop_metrics(&record, record.ghi(), -34., summer).unwrap();
        assert!(metrics.peak_temp_open.is_nan());
        assert_eq!(metrics.dli_open, 0.);
    }

    #[test]
    fn assessment_flags_heat_and_light() {
        let crop = CropParameters {
            dli_min: 10.,
            dli_max: 20.,
            temp_max: 31.,
            ..Default::default()
        };
        let metrics = CropMetrics {
            dli_open: 30.,
            dli_agri: 15.,
            peak_temp_open: 31.5,
            peak_temp_agri: 30.3,
        };
        let assessment = assess_crop(&crop, &metrics);
        assert!(assessment.dli_within_range);
        assert!(assessment.heat_stress_open);
        assert!(!assessment.heat_stress_agri);
        assert!((assessment.dli_reduction_percent - 50.).abs() < 1e-12);
    }
}
