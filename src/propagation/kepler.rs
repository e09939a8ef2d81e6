use super::capability::{CapabilityOutput, PropagationCapability, CODE_INVALID_ELEMENTS};
use super::time::JulianInstant;
use crate::constants::SECONDS_PER_DAY;
use crate::elements::decode;
use crate::physics::orbital::OrbitalMechanics;
use nalgebra as na;

/// Unperturbed two-body propagation of the mean elements.
///
/// Ignores drag and J2, so it drifts from SGP4 by kilometres per orbit; meant
/// for quick what-if screening and reproducible tests.
#[derive(Debug, Clone, Copy)]
pub struct KeplerCapability {
    pub tolerance: f64,
    pub max_iterations: i32,
}

impl Default for KeplerCapability {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 50,
        }
    }
}

impl PropagationCapability for KeplerCapability {
    fn propagate(&self, line1: &str, line2: &str, instant: JulianInstant) -> CapabilityOutput {
        let set = match decode(line1, line2) {
            Ok(set) => set,
            Err(e) => {
                log::debug!("two-body propagation rejected elements: {}", e);
                return CapabilityOutput::failed(CODE_INVALID_ELEMENTS);
            }
        };

        let epoch = JulianInstant::from_epoch(set.epoch());
        let dt = instant.days_since(&epoch) * SECONDS_PER_DAY;

        let a = set.semi_major_axis_km();
        let e = set.eccentricity;
        let mean_anomaly = set.mean_anomaly_deg.to_radians() + OrbitalMechanics::mean_motion(a) * dt;
        let eccentric_anomaly = OrbitalMechanics::mean_to_eccentric_anomaly(
            mean_anomaly,
            e,
            self.tolerance,
            self.max_iterations,
        );
        let true_anomaly = OrbitalMechanics::eccentric_to_true_anomaly(eccentric_anomaly, e);

        let elements = na::Vector6::new(
            a,
            e,
            set.inclination_deg.to_radians(),
            set.raan_deg.to_radians(),
            set.arg_perigee_deg.to_radians(),
            true_anomaly,
        );
        let (position, velocity) = OrbitalMechanics::keplerian_to_cartesian(&elements);
        CapabilityOutput::ok(position, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ISS_1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    #[test]
    fn returns_to_start_after_one_period() {
        let set = decode(ISS_1, ISS_2).unwrap();
        let start = JulianInstant::from_epoch(set.epoch());
        let later = JulianInstant::from_epoch(
            set.epoch() + hifitime::Duration::from_seconds(set.period_seconds()),
        );

        let capability = KeplerCapability::default();
        let first = capability.propagate(ISS_1, ISS_2, start);
        let second = capability.propagate(ISS_1, ISS_2, later);
        assert!(first.is_ok() && second.is_ok());
        assert_abs_diff_eq!(first.position_km, second.position_km, epsilon = 1e-1);
    }

    #[test]
    fn agrees_with_sgp4_near_epoch() {
        let set = decode(ISS_1, ISS_2).unwrap();
        let instant = JulianInstant::from_epoch(set.epoch());
        let kepler = KeplerCapability::default().propagate(ISS_1, ISS_2, instant);
        let sgp4 = super::super::capability::Sgp4Capability.propagate(ISS_1, ISS_2, instant);
        assert!((kepler.position_km - sgp4.position_km).magnitude() < 50.0);
    }
}
