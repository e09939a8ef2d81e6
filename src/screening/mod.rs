//! End-to-end screening of one target against a catalog.
//!
//! A run filters the catalog down to orbitally similar candidates,
//! propagates the target and every candidate over the same window, and
//! compares the series pairwise. Candidates that cannot be propagated are
//! reported and left out of detection; only an unusable target or an empty
//! catalog fails the run.

use crate::config::ScreeningConfig;
use crate::detection::{self, ConjunctionEvent};
use crate::elements::{decode_catalog, OrbitalElementSet, RawTle};
use crate::errors::{ConfigError, ElementError, PropagationError, ScreeningError};
use crate::filter::{filter_candidates, FilterTolerances};
use crate::propagation::{propagate_all, PositionSeries, PropagationCapability, TimeWindow};
use crate::sink::ResultSink;
use hifitime::Epoch;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningRequest {
    pub target_id: String,
    pub window: TimeWindow,
    pub tolerances: FilterTolerances,
    pub threshold_km: f64,
}

impl ScreeningRequest {
    pub fn new(
        target_id: impl Into<String>,
        window: TimeWindow,
        tolerances: FilterTolerances,
        threshold_km: f64,
    ) -> Result<Self, ConfigError> {
        if !(threshold_km.is_finite() && threshold_km > 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "threshold_km must be positive, got {}",
                threshold_km
            )));
        }
        Ok(Self {
            target_id: target_id.into(),
            window,
            tolerances,
            threshold_km,
        })
    }

    /// Request starting at `start`, everything else taken from `config`.
    pub fn from_config(
        target_id: impl Into<String>,
        start: Epoch,
        config: &ScreeningConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(target_id, config.window(start)?, config.filter, config.threshold_km)
    }
}

#[derive(Debug, Clone)]
pub struct ScreeningReport {
    pub target_id: String,
    pub window: TimeWindow,
    /// Element sets the run started from, target included
    pub catalog_size: usize,
    pub candidate_ids: Vec<String>,
    pub target_series: PositionSeries,
    /// Candidate series keyed by catalog id; unavailable candidates carry an empty series
    pub series: BTreeMap<String, PositionSeries>,
    pub unavailable: Vec<PropagationError>,
    /// Raw records that never decoded; only filled by [`Screener::run_raw`]
    pub rejected: Vec<(RawTle, ElementError)>,
    pub misaligned: Vec<String>,
    /// Ordered by distance, then offset, then other id
    pub events: Vec<ConjunctionEvent>,
}

impl ScreeningReport {
    pub fn start(&self) -> Epoch {
        self.window.start
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn closest_approaches(&self) -> Vec<ConjunctionEvent> {
        detection::closest_approaches(&self.events)
    }
}

/// One element set per catalog id, the one with the latest epoch.
///
/// Order of first appearance is kept. On equal epochs the earlier set wins.
pub fn latest_per_object(catalog: &[OrbitalElementSet]) -> Vec<&OrbitalElementSet> {
    let mut kept: Vec<&OrbitalElementSet> = Vec::with_capacity(catalog.len());
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for set in catalog {
        match slots.get(set.catalog_id.as_str()) {
            Some(&slot) => {
                let current = kept[slot];
                let newer = (set.epoch_year, set.epoch_day) > (current.epoch_year, current.epoch_day);
                let (stale, fresh) = if newer { (current, set) } else { (set, current) };
                log::warn!(
                    "object {}: duplicate element set, epoch {}/{:.8} dropped for {}/{:.8}",
                    set.catalog_id,
                    stale.epoch_year,
                    stale.epoch_day,
                    fresh.epoch_year,
                    fresh.epoch_day
                );
                kept[slot] = fresh;
            }
            None => {
                slots.insert(set.catalog_id.as_str(), kept.len());
                kept.push(set);
            }
        }
    }
    kept
}

fn rank_events(a: &ConjunctionEvent, b: &ConjunctionEvent) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.time_offset_seconds.total_cmp(&b.time_offset_seconds))
        .then_with(|| a.other_id.cmp(&b.other_id))
}

pub struct Screener<C: PropagationCapability> {
    capability: C,
    config: ScreeningConfig,
    sink: Option<Box<dyn ResultSink>>,
}

impl<C: PropagationCapability> Screener<C> {
    pub fn new(capability: C, config: ScreeningConfig) -> Self {
        Self {
            capability,
            config,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    pub fn run(
        &self,
        request: &ScreeningRequest,
        catalog: &[OrbitalElementSet],
    ) -> Result<ScreeningReport, ScreeningError> {
        self.screen(request, catalog, Vec::new())
    }

    fn screen(
        &self,
        request: &ScreeningRequest,
        catalog: &[OrbitalElementSet],
        rejected: Vec<(RawTle, ElementError)>,
    ) -> Result<ScreeningReport, ScreeningError> {
        let latest = latest_per_object(catalog);

        // Nothing but the target (or nothing at all) leaves nobody to screen against
        if latest.iter().all(|set| set.catalog_id == request.target_id) {
            return Err(ScreeningError::EmptyCatalog);
        }

        let target = latest
            .iter()
            .copied()
            .find(|set| set.catalog_id == request.target_id)
            .ok_or_else(|| ScreeningError::TargetNotFound(request.target_id.clone()))?;

        let candidates = filter_candidates(latest.iter().copied(), target, &request.tolerances);
        log::info!(
            "target {}: {} candidates out of {} catalog objects, {} steps of {}s",
            target.catalog_id,
            candidates.len(),
            catalog.len(),
            request.window.step_count(),
            request.window.step_seconds
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()?;

        let mut objects = Vec::with_capacity(candidates.len() + 1);
        objects.push(target);
        objects.extend(candidates.iter().copied());

        let mut propagated = propagate_all(&self.capability, &objects, &request.window, &pool).into_iter();
        let target_series = propagated
            .next()
            .unwrap_or_else(|| PositionSeries::empty(target.catalog_id.clone()));
        target_series
            .check_available()
            .map_err(ScreeningError::TargetUnavailable)?;

        let mut unavailable = Vec::new();
        let mut series = BTreeMap::new();
        for candidate in propagated {
            if let Err(e) = candidate.check_available() {
                log::warn!("{}, excluded from detection", e);
                unavailable.push(e);
            }
            series.insert(candidate.object_id.clone(), candidate);
        }

        let detected = detection::detect(
            &target_series,
            &series,
            request.threshold_km,
            self.config.alignment,
        );
        let mut events = detected.events;
        events.sort_by(rank_events);

        let report = ScreeningReport {
            target_id: target.catalog_id.clone(),
            window: request.window,
            catalog_size: catalog.len(),
            candidate_ids: candidates.iter().map(|c| c.catalog_id.clone()).collect(),
            target_series,
            series,
            unavailable,
            rejected,
            misaligned: detected.misaligned,
            events,
        };

        log::info!(
            "target {}: {} events within {} km, {} candidates unavailable",
            report.target_id,
            report.event_count(),
            request.threshold_km,
            report.unavailable.len()
        );

        if self.config.persist_results {
            match &self.sink {
                Some(sink) => sink.persist(&report)?,
                None => log::warn!("persist_results is set but no result sink is attached"),
            }
        }

        Ok(report)
    }

    /// Decodes `raws` first. Records that fail to decode are left out of the
    /// run and listed in [`ScreeningReport::rejected`], unless the target
    /// itself is among them.
    pub fn run_raw(
        &self,
        request: &ScreeningRequest,
        raws: &[RawTle],
    ) -> Result<ScreeningReport, ScreeningError> {
        let decoded = decode_catalog(raws);

        let target_decoded = decoded
            .elements
            .iter()
            .any(|set| set.catalog_id == request.target_id);
        if !target_decoded {
            let target_rejection = decoded
                .rejected
                .iter()
                .find(|(raw, _)| raw.line1.get(2..7).map(str::trim) == Some(request.target_id.as_str()));
            if let Some((_, e)) = target_rejection {
                return Err(ScreeningError::Element(e.clone()));
            }
        }

        self.screen(request, &decoded.elements, decoded.rejected)
    }
}
