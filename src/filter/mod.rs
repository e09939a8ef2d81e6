//! Orbital-similarity prefilter.
//!
//! Narrows a catalog to the objects worth propagating against a target. The
//! windows are applied one after another, each on the survivors of the
//! previous one. This trades recall for throughput: an object outside the
//! windows is never propagated, so a crossing orbit with very different
//! apsides or plane will not be screened. It is a prefilter, not a
//! substitute for conjunction geometry.

use crate::constants::{
    DEFAULT_ALTITUDE_TOLERANCE_KM, DEFAULT_INCLINATION_TOLERANCE_DEG, DEFAULT_RAAN_TOLERANCE_DEG,
};
use crate::elements::OrbitalElementSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTolerances {
    pub apoapsis_km: f64,
    pub periapsis_km: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    /// Chain the RAAN window after the inclination window
    pub apply_raan: bool,
}

impl Default for FilterTolerances {
    fn default() -> Self {
        Self {
            apoapsis_km: DEFAULT_ALTITUDE_TOLERANCE_KM,
            periapsis_km: DEFAULT_ALTITUDE_TOLERANCE_KM,
            inclination_deg: DEFAULT_INCLINATION_TOLERANCE_DEG,
            raan_deg: DEFAULT_RAAN_TOLERANCE_DEG,
            apply_raan: false,
        }
    }
}

/// Absolute difference between two angles in degrees, on the circle.
fn angular_separation_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

pub fn filter_by_altitude<'a>(
    candidates: &[&'a OrbitalElementSet],
    target: &OrbitalElementSet,
    tolerances: &FilterTolerances,
) -> Vec<&'a OrbitalElementSet> {
    candidates
        .iter()
        .copied()
        .filter(|c| {
            (c.apoapsis_km - target.apoapsis_km).abs() <= tolerances.apoapsis_km
                && (c.periapsis_km - target.periapsis_km).abs() <= tolerances.periapsis_km
        })
        .collect()
}

pub fn filter_by_inclination<'a>(
    candidates: &[&'a OrbitalElementSet],
    target: &OrbitalElementSet,
    tolerances: &FilterTolerances,
) -> Vec<&'a OrbitalElementSet> {
    candidates
        .iter()
        .copied()
        .filter(|c| (c.inclination_deg - target.inclination_deg).abs() <= tolerances.inclination_deg)
        .collect()
}

pub fn filter_by_raan<'a>(
    candidates: &[&'a OrbitalElementSet],
    target: &OrbitalElementSet,
    tolerances: &FilterTolerances,
) -> Vec<&'a OrbitalElementSet> {
    candidates
        .iter()
        .copied()
        .filter(|c| angular_separation_deg(c.raan_deg, target.raan_deg) <= tolerances.raan_deg)
        .collect()
}

/// Returns the catalog objects orbitally similar to `target`, never including the target itself.
pub fn filter_candidates<'a>(
    catalog: impl IntoIterator<Item = &'a OrbitalElementSet>,
    target: &OrbitalElementSet,
    tolerances: &FilterTolerances,
) -> Vec<&'a OrbitalElementSet> {
    let others: Vec<&OrbitalElementSet> = catalog
        .into_iter()
        .filter(|c| c.catalog_id != target.catalog_id)
        .collect();

    let by_altitude = filter_by_altitude(&others, target, tolerances);
    let mut candidates = filter_by_inclination(&by_altitude, target, tolerances);
    if tolerances.apply_raan {
        candidates = filter_by_raan(&candidates, target, tolerances);
    }

    log::debug!(
        "target {}: {} of {} objects pass altitude, {} remain as candidates",
        target.catalog_id,
        by_altitude.len(),
        others.len(),
        candidates.len()
    );
    candidates
}
