use super::capability::PropagationCapability;
use super::time::{JulianInstant, TimeWindow};
use crate::elements::OrbitalElementSet;
use crate::errors::PropagationError;
use nalgebra as na;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    pub offset_seconds: f64,
    pub position_km: na::Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkippedSample {
    pub step_index: usize,
    pub offset_seconds: f64,
    pub code: i32,
}

/// Time-ordered positions of one object over a screening window.
///
/// Shorter than the window's step count when steps were skipped; every
/// gap is listed in `skipped`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSeries {
    pub object_id: String,
    pub samples: Vec<PositionSample>,
    pub skipped: Vec<SkippedSample>,
}

impl PositionSeries {
    pub fn empty(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            samples: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn requested_steps(&self) -> usize {
        self.samples.len() + self.skipped.len()
    }

    /// `Unavailable` when the object produced no sample at all.
    pub fn check_available(&self) -> Result<(), PropagationError> {
        if self.is_empty() {
            Err(PropagationError::Unavailable {
                object_id: self.object_id.clone(),
                steps: self.requested_steps(),
            })
        } else {
            Ok(())
        }
    }
}

/// Samples one object at every step of `window`. Failed steps are skipped, never fatal.
pub fn propagate_series<C: PropagationCapability + ?Sized>(
    capability: &C,
    elements: &OrbitalElementSet,
    window: &TimeWindow,
) -> PositionSeries {
    let mut series = PositionSeries::empty(elements.catalog_id.clone());

    for (step_index, offset_seconds) in window.offsets().enumerate() {
        let instant = JulianInstant::from_epoch(window.instant_at(offset_seconds));
        let output = capability.propagate(&elements.line1, &elements.line2, instant);

        if output.is_ok() {
            series.samples.push(PositionSample {
                offset_seconds,
                position_km: output.position_km,
            });
        } else {
            let skip = PropagationError::Sample {
                object_id: elements.catalog_id.clone(),
                step_index,
                offset_seconds,
                code: output.code,
            };
            log::warn!("{}, skipping sample", skip);
            series.skipped.push(SkippedSample {
                step_index,
                offset_seconds,
                code: output.code,
            });
        }
    }

    if series.is_empty() {
        log::warn!(
            "object {}: no usable sample in {} steps",
            series.object_id,
            series.requested_steps()
        );
    }
    series
}

/// Propagates independent objects on `pool`. Output order follows `objects`.
pub fn propagate_all<C: PropagationCapability + ?Sized>(
    capability: &C,
    objects: &[&OrbitalElementSet],
    window: &TimeWindow,
    pool: &rayon::ThreadPool,
) -> Vec<PositionSeries> {
    pool.install(|| {
        objects
            .par_iter()
            .map(|elements| propagate_series(capability, elements, window))
            .collect()
    })
}
