//! Where screening results go once a run is over.
//!
//! [`CsvSink`] keeps two tables: a snapshot replaced on every run and a
//! history that only grows. [`write_series_json`] exports the propagated
//! tracks for a renderer.

use crate::detection::ConjunctionEvent;
use crate::errors::SinkError;
use crate::propagation::PositionSeries;
use crate::screening::ScreeningReport;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use hifitime::{Duration, Epoch};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const EVENT_COLUMNS: [&str; 8] = [
    "run_timestamp",
    "target_id",
    "other_id",
    "time_offset_seconds",
    "event_utc",
    "distance_km",
    "target_position_km",
    "other_position_km",
];

/// One conjunction event flattened into a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub run_timestamp: String,
    pub target_id: String,
    pub other_id: String,
    pub time_offset_seconds: f64,
    pub event_utc: String,
    pub distance_km: f64,
    /// `[x, y, z]` as a JSON array
    pub target_position_km: String,
    pub other_position_km: String,
}

impl EventRecord {
    pub fn from_event(
        event: &ConjunctionEvent,
        start: Epoch,
        run_timestamp: &DateTime<Utc>,
    ) -> Result<Self, SinkError> {
        let at = start + Duration::from_seconds(event.time_offset_seconds);
        Ok(Self {
            run_timestamp: run_timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            target_id: event.target_id.clone(),
            other_id: event.other_id.clone(),
            time_offset_seconds: event.time_offset_seconds,
            event_utc: at.to_string(),
            distance_km: event.distance_km,
            target_position_km: serde_json::to_string(event.target_position_km.as_slice())?,
            other_position_km: serde_json::to_string(event.other_position_km.as_slice())?,
        })
    }
}

/// Rows for every event of `report`, in report order.
pub fn event_records(
    report: &ScreeningReport,
    run_timestamp: &DateTime<Utc>,
) -> Result<Vec<EventRecord>, SinkError> {
    report
        .events
        .iter()
        .map(|event| EventRecord::from_event(event, report.start(), run_timestamp))
        .collect()
}

pub trait ResultSink {
    fn persist(&self, report: &ScreeningReport) -> Result<(), SinkError>;
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    pub snapshot_path: PathBuf,
    pub history_path: PathBuf,
}

fn ensure_parent(path: &Path) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_records<W: Write>(
    writer: W,
    records: &[EventRecord],
    with_header: bool,
) -> Result<(), SinkError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    if with_header {
        writer.write_record(EVENT_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

impl CsvSink {
    pub fn new(snapshot_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn write_snapshot(&self, records: &[EventRecord]) -> Result<(), SinkError> {
        ensure_parent(&self.snapshot_path)?;
        write_records(File::create(&self.snapshot_path)?, records, true)
    }

    pub fn append_history(&self, records: &[EventRecord]) -> Result<(), SinkError> {
        ensure_parent(&self.history_path)?;
        let fresh = fs::metadata(&self.history_path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)?;
        write_records(file, records, fresh)
    }
}

impl ResultSink for CsvSink {
    fn persist(&self, report: &ScreeningReport) -> Result<(), SinkError> {
        let records = event_records(report, &Utc::now())?;
        self.write_snapshot(&records)?;
        self.append_history(&records)?;
        log::info!(
            "persisted {} events to {:?} and {:?}",
            records.len(),
            self.snapshot_path,
            self.history_path
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedPosition {
    pub utc: String,
    pub offset_seconds: f64,
    pub position_km: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTrack {
    pub object_id: String,
    pub is_target: bool,
    pub samples: Vec<TimedPosition>,
}

/// Time-tagged tracks of the target and all candidates of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDocument {
    pub target_id: String,
    pub start_utc: String,
    pub step_seconds: f64,
    pub tracks: Vec<ObjectTrack>,
}

impl SeriesDocument {
    pub fn from_report(report: &ScreeningReport) -> Self {
        let start = report.start();
        let track = |series: &PositionSeries, is_target: bool| ObjectTrack {
            object_id: series.object_id.clone(),
            is_target,
            samples: series
                .samples
                .iter()
                .map(|s| TimedPosition {
                    utc: (start + Duration::from_seconds(s.offset_seconds)).to_string(),
                    offset_seconds: s.offset_seconds,
                    position_km: [s.position_km.x, s.position_km.y, s.position_km.z],
                })
                .collect(),
        };

        let mut tracks = vec![track(&report.target_series, true)];
        tracks.extend(report.series.values().map(|series| track(series, false)));

        Self {
            target_id: report.target_id.clone(),
            start_utc: start.to_string(),
            step_seconds: report.window.step_seconds,
            tracks,
        }
    }
}

pub fn write_series_json<P: AsRef<Path>>(path: P, report: &ScreeningReport) -> Result<(), SinkError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &SeriesDocument::from_report(report))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{PositionSample, TimeWindow};
    use chrono::TimeZone;
    use nalgebra as na;
    use std::collections::BTreeMap;

    fn sample(offset: f64, x: f64) -> PositionSample {
        PositionSample {
            offset_seconds: offset,
            position_km: na::Vector3::new(x, 0.0, 0.0),
        }
    }

    fn report() -> ScreeningReport {
        let start = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let target_series = PositionSeries {
            object_id: "10000".to_string(),
            samples: vec![sample(0.0, 7000.0), sample(60.0, 7001.0)],
            skipped: Vec::new(),
        };
        let other = PositionSeries {
            object_id: "20000".to_string(),
            samples: vec![sample(0.0, 7003.0), sample(60.0, 7001.5)],
            skipped: Vec::new(),
        };
        let events = vec![ConjunctionEvent {
            time_offset_seconds: 60.0,
            target_id: "10000".to_string(),
            other_id: "20000".to_string(),
            target_position_km: na::Vector3::new(7001.0, 0.0, 0.0),
            other_position_km: na::Vector3::new(7001.5, 0.0, 0.0),
            distance_km: 0.5,
        }];

        ScreeningReport {
            target_id: "10000".to_string(),
            window: TimeWindow::new(start, 60.0, 60.0).unwrap(),
            catalog_size: 2,
            candidate_ids: vec!["20000".to_string()],
            target_series,
            series: BTreeMap::from([("20000".to_string(), other)]),
            unavailable: Vec::new(),
            rejected: Vec::new(),
            misaligned: Vec::new(),
            events,
        }
    }

    #[test]
    fn record_carries_utc_and_vectors() {
        let run = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = event_records(&report(), &run).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.run_timestamp, "2024-03-01T12:00:00Z");
        assert!(record.event_utc.starts_with("2024-03-01T00:01:00"));
        assert_eq!(record.distance_km, 0.5);
        let other: Vec<f64> = serde_json::from_str(&record.other_position_km).unwrap();
        assert_eq!(other, vec![7001.5, 0.0, 0.0]);
    }

    #[test]
    fn snapshot_replaced_history_appended() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(
            dir.path().join("out/current.csv"),
            dir.path().join("out/history.csv"),
        );
        let report = report();

        sink.persist(&report).unwrap();
        sink.persist(&report).unwrap();

        let mut snapshot = csv::Reader::from_path(&sink.snapshot_path).unwrap();
        let rows: Vec<EventRecord> = snapshot.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].other_id, "20000");

        let mut history = csv::Reader::from_path(&sink.history_path).unwrap();
        assert_eq!(history.headers().unwrap(), EVENT_COLUMNS.as_slice());
        assert_eq!(history.deserialize::<EventRecord>().count(), 2);
    }

    #[test]
    fn empty_run_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("current.csv"), dir.path().join("history.csv"));
        let mut empty = report();
        empty.events.clear();
        sink.persist(&empty).unwrap();

        let content = fs::read_to_string(&sink.snapshot_path).unwrap();
        assert_eq!(content.trim(), EVENT_COLUMNS.join(","));
    }

    #[test]
    fn series_document_lists_target_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        write_series_json(&path, &report()).unwrap();

        let document: SeriesDocument =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document.target_id, "10000");
        assert_eq!(document.step_seconds, 60.0);
        assert_eq!(document.tracks.len(), 2);
        assert!(document.tracks[0].is_target);
        assert_eq!(document.tracks[1].object_id, "20000");
        assert_eq!(document.tracks[1].samples[1].position_km, [7001.5, 0.0, 0.0]);
    }
}
