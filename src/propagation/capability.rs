use super::time::JulianInstant;
use crate::constants::MINUTES_PER_DAY;
use crate::elements::{checksum, LINE_LENGTH};
use nalgebra as na;

pub const CODE_OK: i32 = 0;
pub const CODE_INVALID_ELEMENTS: i32 = 1;
pub const CODE_INITIALISATION_FAILED: i32 = 2;
pub const CODE_PROPAGATION_FAILED: i32 = 6;

/// Result of one call into a propagation capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityOutput {
    pub code: i32,
    /// Earth-centred inertial position [km]
    pub position_km: na::Vector3<f64>,
    /// Earth-centred inertial velocity [km/s], not used by screening
    pub velocity_km_s: na::Vector3<f64>,
}

impl CapabilityOutput {
    pub fn ok(position_km: na::Vector3<f64>, velocity_km_s: na::Vector3<f64>) -> Self {
        Self {
            code: CODE_OK,
            position_km,
            velocity_km_s,
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            code,
            position_km: na::Vector3::zeros(),
            velocity_km_s: na::Vector3::zeros(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// A trusted orbit propagator: two-line pair plus instant in, state vector out.
///
/// Implementations hold no per-call mutable state, so one instance can be
/// shared across worker threads.
pub trait PropagationCapability: Send + Sync {
    fn propagate(&self, line1: &str, line2: &str, instant: JulianInstant) -> CapabilityOutput;
}

impl<T: PropagationCapability + ?Sized> PropagationCapability for Box<T> {
    fn propagate(&self, line1: &str, line2: &str, instant: JulianInstant) -> CapabilityOutput {
        (**self).propagate(line1, line2, instant)
    }
}

/// Replaces column 69 with the computed checksum.
///
/// The decoder tolerates checksum mismatches; this keeps stricter parsers
/// from rejecting a record the decoder already accepted.
pub(crate) fn restamp_checksum(line: &str) -> String {
    let line = line.trim_end();
    match line.get(..LINE_LENGTH - 1) {
        Some(body) if line.len() == LINE_LENGTH => format!("{}{}", body, checksum(body)),
        _ => line.to_string(),
    }
}

/// SGP4/SDP4 via the `sgp4` crate. Positions are in the TEME frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Capability;

impl PropagationCapability for Sgp4Capability {
    fn propagate(&self, line1: &str, line2: &str, instant: JulianInstant) -> CapabilityOutput {
        let line1 = restamp_checksum(line1);
        let line2 = restamp_checksum(line2);

        let elements = match sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes()) {
            Ok(elements) => elements,
            Err(e) => {
                log::debug!("sgp4 rejected elements: {}", e);
                return CapabilityOutput::failed(CODE_INVALID_ELEMENTS);
            }
        };
        let constants = match sgp4::Constants::from_elements(&elements) {
            Ok(constants) => constants,
            Err(e) => {
                log::debug!("sgp4 initialisation failed: {}", e);
                return CapabilityOutput::failed(CODE_INITIALISATION_FAILED);
            }
        };

        let epoch_utc = elements.datetime.and_utc();
        let epoch_unix =
            epoch_utc.timestamp() as f64 + f64::from(epoch_utc.timestamp_subsec_nanos()) * 1e-9;
        let epoch = JulianInstant::from_unix_seconds(epoch_unix);
        let minutes = instant.days_since(&epoch) * MINUTES_PER_DAY;

        match constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
            Ok(prediction) => CapabilityOutput::ok(
                na::Vector3::from(prediction.position),
                na::Vector3::from(prediction.velocity),
            ),
            Err(e) => {
                log::debug!("sgp4 propagation failed at t+{:.3} min: {}", minutes, e);
                CapabilityOutput::failed(CODE_PROPAGATION_FAILED)
            }
        }
    }
}
