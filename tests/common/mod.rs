#![allow(dead_code)]

use std::f64::consts::PI;

use agrivolt_rs::model::ClimateColumns;
use agrivolt_rs::ClimateRecord;
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $tol,
            "assert_approx failed: left={}, right={}, diff={}, tol={}",
            l,
            r,
            (l - r).abs(),
            $tol
        );
    };
}

pub const HOURS_PER_YEAR: usize = 8760;

/// Sun elevation and azimuth (degrees) from a simple declination and hour-angle model.
pub fn sun_position(latitude: f64, day_of_year: usize, hour: f64) -> (f64, f64) {
    let lat = latitude.to_radians();
    let declination = (23.45 * PI / 180.) * (2. * PI * (284. + day_of_year as f64) / 365.).sin();
    let hour_angle = (15. * (hour - 12.)).to_radians();

    let sin_elevation =
        lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
    let elevation = sin_elevation.clamp(-1., 1.).asin();
    let cos_azimuth =
        (declination.sin() - elevation.sin() * lat.sin()) / (elevation.cos() * lat.cos());
    let mut azimuth = cos_azimuth.clamp(-1., 1.).acos().to_degrees();
    if hour_angle > 0. {
        azimuth = 360. - azimuth;
    }
    (elevation.to_degrees(), azimuth)
}

/// One non-leap year of hourly weather with a plausible sun path and seeded random cloudiness.
pub fn synthetic_year(latitude: f64, seed: u64) -> ClimateRecord {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut columns = ClimateColumns::default();
    let season = if latitude >= 0. { 1. } else { -1. };

    for h in 0..HOURS_PER_YEAR {
        let day_of_year = h / 24 + 1;
        let hour = (h % 24) as f64;
        let (elevation, azimuth) = sun_position(latitude, day_of_year, hour);

        let clearness: f64 = rng.random_range(0.4..0.85);
        let ghi = 1100. * elevation.to_radians().sin().max(0.) * clearness;
        let diffuse_share: f64 = rng.random_range(0.1..0.5);
        let dhi = ghi * diffuse_share;
        let dni = if elevation > 0. {
            (ghi - dhi) / elevation.to_radians().sin()
        } else {
            0.
        };
        let annual = -season * (2. * PI * (day_of_year as f64 - 15.) / 365.).cos();
        let daily = (2. * PI * (hour - 9.) / 24.).sin();

        columns.ghi.push(ghi);
        columns.dhi.push(dhi);
        columns.dni.push(dni);
        let noise: f64 = rng.random_range(-1.5..1.5);
        columns.temp_air.push(18. + 9. * annual + 6. * daily + noise);
        columns.wind_speed.push(rng.random_range(0.5..4.));
        columns.relative_humidity.push(rng.random_range(30.0..80.0));
        columns.sun_elevation.push(elevation);
        columns.sun_azimuth.push(azimuth);
    }

    let start = NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    ClimateRecord::new(start, columns).unwrap()
}

/// Constant weather on one summer day, sun path included.
pub fn single_day(
    latitude: f64,
    ghi: impl Fn(f64) -> f64,
    dhi: impl Fn(f64) -> f64,
) -> ClimateRecord {
    let mut columns = ClimateColumns::default();
    for h in 0..24 {
        let hour = h as f64;
        let (elevation, azimuth) = sun_position(latitude, 172, hour);
        let sun_up = if elevation > 0. { 1. } else { 0. };
        columns.ghi.push(ghi(hour) * sun_up);
        columns.dhi.push(dhi(hour) * sun_up);
        columns.dni.push(0.);
        columns.temp_air.push(20. + hour / 2.);
        columns.wind_speed.push(2.);
        columns.relative_humidity.push(50.);
        columns.sun_elevation.push(elevation);
        columns.sun_azimuth.push(azimuth);
    }
    let start = NaiveDate::from_ymd_opt(2022, 6, 21)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    ClimateRecord::new(start, columns).unwrap()
}
