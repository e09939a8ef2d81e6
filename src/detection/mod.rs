//! Pairwise proximity detection between a target series and candidate series.

use crate::constants::DEFAULT_ALIGNMENT_EPSILON_SECONDS;
use crate::propagation::{PositionSample, PositionSeries};
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How samples of two series are paired up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Alignment {
    /// Pair samples whose offsets agree within `epsilon_seconds`.
    Timestamp { epsilon_seconds: f64 },
    /// Pair the i-th sample with the i-th sample, stopping at the shorter
    /// series. Only correct when neither series skipped a step.
    Index,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Timestamp {
            epsilon_seconds: DEFAULT_ALIGNMENT_EPSILON_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConjunctionEvent {
    pub time_offset_seconds: f64,
    pub target_id: String,
    pub other_id: String,
    pub target_position_km: na::Vector3<f64>,
    pub other_position_km: na::Vector3<f64>,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub events: Vec<ConjunctionEvent>,
    /// Objects whose samples could not all be paired with the target's
    pub misaligned: Vec<String>,
}

/// Pairs samples of `target` and `other`. The flag is false when some
/// sample on either side was left without a partner.
pub fn pair_samples<'a>(
    target: &'a [PositionSample],
    other: &'a [PositionSample],
    alignment: Alignment,
) -> (Vec<(&'a PositionSample, &'a PositionSample)>, bool) {
    match alignment {
        Alignment::Index => {
            let pairs = target.iter().zip(other.iter()).collect();
            (pairs, target.len() == other.len())
        }
        Alignment::Timestamp { epsilon_seconds } => {
            let mut pairs = Vec::with_capacity(target.len().min(other.len()));
            let (mut i, mut j) = (0, 0);
            while i < target.len() && j < other.len() {
                let (t, o) = (&target[i], &other[j]);
                if (t.offset_seconds - o.offset_seconds).abs() <= epsilon_seconds {
                    pairs.push((t, o));
                    i += 1;
                    j += 1;
                } else if t.offset_seconds < o.offset_seconds {
                    i += 1;
                } else {
                    j += 1;
                }
            }
            let complete = pairs.len() == target.len() && pairs.len() == other.len();
            (pairs, complete)
        }
    }
}

/// Records an event for every paired sample closer than `threshold_km`.
///
/// No clustering: a pass that stays inside the threshold for several steps
/// yields one event per step. See [`closest_approaches`].
pub fn detect(
    target: &PositionSeries,
    others: &BTreeMap<String, PositionSeries>,
    threshold_km: f64,
    alignment: Alignment,
) -> Detection {
    let mut detection = Detection::default();

    for (other_id, other) in others {
        if *other_id == target.object_id || other.is_empty() {
            continue;
        }

        let (pairs, complete) = pair_samples(&target.samples, &other.samples, alignment);
        if !complete {
            log::warn!(
                "object {}: {} of {}/{} samples paired with target {}",
                other_id,
                pairs.len(),
                other.len(),
                target.len(),
                target.object_id
            );
            detection.misaligned.push(other_id.clone());
        }

        for (t, o) in pairs {
            let distance_km = (t.position_km - o.position_km).norm();
            if distance_km <= threshold_km {
                detection.events.push(ConjunctionEvent {
                    time_offset_seconds: t.offset_seconds,
                    target_id: target.object_id.clone(),
                    other_id: other_id.clone(),
                    target_position_km: t.position_km,
                    other_position_km: o.position_km,
                    distance_km,
                });
            }
        }
    }

    detection
}

/// The single closest event per other object, ordered by distance.
pub fn closest_approaches(events: &[ConjunctionEvent]) -> Vec<ConjunctionEvent> {
    let mut best: BTreeMap<&str, &ConjunctionEvent> = BTreeMap::new();
    for event in events {
        best.entry(event.other_id.as_str())
            .and_modify(|current| {
                if event.distance_km < current.distance_km {
                    *current = event;
                }
            })
            .or_insert(event);
    }

    let mut closest: Vec<ConjunctionEvent> = best.into_values().cloned().collect();
    closest.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    closest
}
