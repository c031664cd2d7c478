//! Run configuration, read from JSON.
//!
//! Every field has a default, so `{}` is a valid configuration describing
//! the reference site with the default crop and pitch grid:
//!
//! ```json
//! {
//!   "system": { "panel_width": 2.0, "pivot_height": 3.0, "latitude": 33.9 },
//!   "crop": { "name": "lettuce", "dli_min": 12.0, "dli_max": 17.0 },
//!   "pitch_grid": { "start": 4.0, "stop": 10.0, "step": 0.5 },
//!   "ground_resolution": 0.1,
//!   "summer_calendar": "june",
//!   "fetch_timeout_secs": 30.0
//! }
//! ```
//!
//! `summer_calendar` is `"june"` (21 June and June to August everywhere) or `"hemispheric"`
//! (21 December and December to February for southern sites).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::climate::{fetch_with_timeout, ClimateSource};
use crate::metrics::SummerCalendar;
use crate::model::{ClimateRecord, CropParameters, Error, SystemGeometry};
use crate::optimization::PitchRange;
use crate::shading::{ground_sample_count, DEFAULT_GROUND_RESOLUTION};
use crate::simulation::SimulationInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub system: SystemGeometry,
    pub crop: CropParameters,
    pub pitch_grid: PitchRange,
    /// spacing of the ground samples (m)
    pub ground_resolution: f64,
    pub summer_calendar: SummerCalendar,
    /// bound on the climate provider call (s)
    pub fetch_timeout_secs: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            system: SystemGeometry::default(),
            crop: CropParameters::default(),
            pitch_grid: PitchRange::default(),
            ground_resolution: DEFAULT_GROUND_RESOLUTION,
            summer_calendar: SummerCalendar::default(),
            fetch_timeout_secs: 30.,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|e| Error::invalid("configuration", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::invalid(
                "configuration",
                format!("cannot open {}: {e}", path.display()),
            )
        })?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::invalid("configuration", format!("{}: {e}", path.display())))?;
        config.validate()?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.system.validate()?;
        self.crop.validate()?;
        let grid = self.pitch_grid.to_grid()?;
        for &pitch in grid.values() {
            ground_sample_count(pitch, self.ground_resolution)?;
        }
        self.fetch_timeout()?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Result<Duration, Error> {
        Duration::try_from_secs_f64(self.fetch_timeout_secs).map_err(|e| {
            Error::invalid(
                "fetch_timeout_secs",
                format!("{e} (got {})", self.fetch_timeout_secs),
            )
        })
    }

    /// Fetches the reference year at the configured site, bounded by the
    /// configured timeout.
    pub fn fetch_climate<S>(&self, source: Arc<S>) -> Result<ClimateRecord, Error>
    where
        S: ClimateSource + Send + Sync + ?Sized + 'static,
    {
        let timeout = self.fetch_timeout()?;
        let record = fetch_with_timeout(
            source,
            self.system.latitude,
            self.system.longitude,
            self.system.altitude,
            timeout,
        )?;
        Ok(record)
    }

    /// Pipeline input with the default tracker and evapotranspiration model.
    pub fn simulation_input<'a>(&'a self, climate: &'a ClimateRecord) -> SimulationInput<'a> {
        SimulationInput::new(climate, &self.system, &self.crop)
            .with_ground_resolution(self.ground_resolution)
            .with_summer_calendar(self.summer_calendar)
    }
}
