use serde::{Deserialize, Serialize};

use crate::model::{validate_pitch, Error};

/// Upper bound on the number of candidates a range may expand to.
const MAX_CANDIDATES: f64 = 10_000.;

/// Ordered candidate pitches, non-empty and all strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchGrid {
    values: Vec<f64>,
}

impl PitchGrid {
    pub fn new(values: Vec<f64>) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::EmptyPitchGrid);
        }
        for &pitch in &values {
            validate_pitch(pitch)?;
        }
        Ok(PitchGrid { values })
    }

    /// `start, start + step, ...` up to and including `stop`.
    pub fn range(start: f64, stop: f64, step: f64) -> Result<Self, Error> {
        if !(step.is_finite() && step > 0.) {
            return Err(Error::invalid(
                "pitch step",
                format!("must be a finite positive distance (got {step})"),
            ));
        }
        if !(start.is_finite() && stop.is_finite()) {
            return Err(Error::invalid(
                "pitch range",
                format!("bounds must be finite (got {start} and {stop})"),
            ));
        }
        // tolerance keeps `stop` when the division rounds just below it
        let last = ((stop - start) / step + 1e-9).floor();
        if last < 0. {
            return Err(Error::EmptyPitchGrid);
        }
        if last >= MAX_CANDIDATES {
            return Err(Error::invalid(
                "pitch range",
                format!("expands to more than {MAX_CANDIDATES} candidates"),
            ));
        }
        Self::new(
            (0..=last as usize)
                .map(|i| start + i as f64 * step)
                .collect(),
        )
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 4.0 to 10.0 m by 0.5 m.
impl Default for PitchGrid {
    fn default() -> Self {
        PitchGrid {
            values: (0..13).map(|i| 4. + 0.5 * i as f64).collect(),
        }
    }
}

/// Serialized form of a pitch range in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for PitchRange {
    fn default() -> Self {
        PitchRange {
            start: 4.0,
            stop: 10.0,
            step: 0.5,
        }
    }
}

impl PitchRange {
    pub fn to_grid(&self) -> Result<PitchGrid, Error> {
        PitchGrid::range(self.start, self.stop, self.step)
    }
}
