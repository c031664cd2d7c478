use ndarray::Array1;

use super::{ShadingProfile, ShadowProjector};
use crate::model::{ClimateRecord, Error, SystemGeometry};
use crate::tracking::TiltModel;

/// Hourly irradiance reaching the ground under the array.
#[derive(Debug, Clone)]
pub struct GroundIrradiance {
    /// mean irradiance over the pitch period (W/m²)
    pub agrivoltaic: Array1<f64>,
    /// share of ground samples in the panel shadow
    pub shaded_fraction: Array1<f64>,
}

impl GroundIrradiance {
    /// Mean shaded fraction over the timesteps with the sun up.
    pub fn mean_daytime_shading(&self, record: &ClimateRecord) -> f64 {
        let (sum, count) = self
            .shaded_fraction
            .iter()
            .zip(record.sun_elevation())
            .filter(|(_, elevation)| **elevation > 0.)
            .fold((0., 0usize), |(sum, count), (&f, _)| (sum + f, count + 1));
        if count == 0 {
            0.
        } else {
            sum / count as f64
        }
    }
}

/// Diffuse light reaches every ground sample; the direct part is lost on shaded samples. The
/// result is averaged over the period.
///
/// Written as `ghi - direct * fraction` so an unshaded period gives back `ghi` exactly.
pub fn effective_irradiance(ghi: f64, dhi: f64, profile: &ShadingProfile) -> f64 {
    ghi - (ghi - dhi) * profile.shaded_fraction()
}

pub fn ground_irradiance(
    record: &ClimateRecord,
    geometry: &SystemGeometry,
    tilt_model: &dyn TiltModel,
    pitch: f64,
    resolution: f64,
) -> Result<GroundIrradiance, Error> {
    let mut projector = ShadowProjector::new(geometry, tilt_model, pitch, resolution)?;

    let n = record.len();
    let mut agrivoltaic = Array1::zeros(n);
    let mut shaded_fraction = Array1::zeros(n);
    let (ghi, dhi) = (record.ghi(), record.dhi());
    let (elevation, azimuth) = (record.sun_elevation(), record.sun_azimuth());

    for t in 0..n {
        let profile = projector.project(elevation[t], azimuth[t]);
        agrivoltaic[t] = effective_irradiance(ghi[t], dhi[t], profile);
        shaded_fraction[t] = profile.shaded_fraction();
    }

    Ok(GroundIrradiance {
        agrivoltaic,
        shaded_fraction,
    })
}
