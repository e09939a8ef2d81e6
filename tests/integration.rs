use hifitime::Epoch;
use orbscreen::config::{OutputSettings, ScreeningConfig};
use orbscreen::constants::{MU_EARTH, SECONDS_PER_DAY, WGS84_A};
use orbscreen::elements::{decode, encode, parse_catalog_text, OrbitalElementSet, RawTle};
use orbscreen::errors::{PropagationError, ScreeningError};
use orbscreen::filter::{filter_candidates, FilterTolerances};
use orbscreen::propagation::{
    CapabilityOutput, JulianInstant, KeplerCapability, PropagationCapability, Sgp4Capability,
    TimeWindow, CODE_PROPAGATION_FAILED,
};
use orbscreen::screening::{ScreeningRequest, Screener};
use orbscreen::sink::{CsvSink, EventRecord};
use std::f64::consts::PI;

const ISS_1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
const ISS_2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

/// Two-line text for a drag-free orbit with the given apsis altitudes.
fn synthetic(
    id: &str,
    apoapsis_km: f64,
    periapsis_km: f64,
    inclination_deg: f64,
    mean_anomaly_deg: f64,
) -> (String, String) {
    let mut set = decode(ISS_1, ISS_2).unwrap();
    let a = WGS84_A + (apoapsis_km + periapsis_km) / 2.0;
    let rad_per_s = (MU_EARTH / a.powi(3)).sqrt();

    set.catalog_id = id.to_string();
    set.first_derivative_mean_motion = 0.0;
    set.second_derivative_mean_motion = 0.0;
    set.bstar_drag = 0.0;
    set.inclination_deg = inclination_deg;
    set.eccentricity = (apoapsis_km - periapsis_km) / (2.0 * a);
    set.mean_anomaly_deg = mean_anomaly_deg;
    set.mean_motion_rev_per_day = rad_per_s * SECONDS_PER_DAY / (2.0 * PI);
    encode(&set)
}

fn element_set(id: &str, apo: f64, peri: f64, inc: f64, ma: f64) -> OrbitalElementSet {
    let (line1, line2) = synthetic(id, apo, peri, inc, ma);
    decode(&line1, &line2).unwrap()
}

fn scenario() -> Vec<OrbitalElementSet> {
    vec![
        element_set("00001", 420.0, 410.0, 51.6, 0.0),
        element_set("00002", 425.0, 408.0, 51.9, 10.0),
        element_set("00003", 420.0, 410.0, 98.0, 0.0),
    ]
}

fn request(catalog: &[OrbitalElementSet], hours: f64, threshold_km: f64) -> ScreeningRequest {
    let window = TimeWindow::new(catalog[0].epoch(), hours * 3600.0, 60.0).unwrap();
    ScreeningRequest::new("00001", window, FilterTolerances::default(), threshold_km).unwrap()
}

#[test]
fn synthetic_elements_keep_their_apsides() {
    let set = element_set("00001", 420.0, 410.0, 51.6, 0.0);
    assert!((set.apoapsis_km - 420.0).abs() < 0.5);
    assert!((set.periapsis_km - 410.0).abs() < 0.5);
    assert!(set.checksum_valid());
}

#[test]
fn filter_keeps_only_coplanar_neighbour() {
    let catalog = scenario();
    let candidates = filter_candidates(&catalog, &catalog[0], &FilterTolerances::default());
    let ids: Vec<&str> = candidates.iter().map(|c| c.catalog_id.as_str()).collect();
    assert_eq!(ids, vec!["00002"]);
}

#[test]
fn sgp4_screening_finds_neighbour() {
    let catalog = scenario();
    let report = Screener::new(Sgp4Capability, ScreeningConfig::default())
        .run(&request(&catalog, 2.0, 5000.0), &catalog)
        .unwrap();

    assert_eq!(report.candidate_ids, vec!["00002".to_string()]);
    assert_eq!(report.target_series.len(), 121);
    assert!(report.event_count() >= 1);
    assert!(report.unavailable.is_empty());
    assert!(report.events.iter().all(|e| e.other_id == "00002"));
    assert!(report.events.iter().all(|e| e.distance_km <= 5000.0));
    assert!(report
        .events
        .windows(2)
        .all(|pair| pair[0].distance_km <= pair[1].distance_km));
}

#[test]
fn co_orbital_twin_is_reported_at_every_step() {
    let catalog = vec![
        element_set("00001", 420.0, 410.0, 51.6, 0.0),
        element_set("00004", 420.0, 410.0, 51.6, 0.0),
    ];
    let report = Screener::new(KeplerCapability::default(), ScreeningConfig::default())
        .run(&request(&catalog, 0.5, 1.0), &catalog)
        .unwrap();
    assert_eq!(report.event_count(), 31);
    assert!(report.events.iter().all(|e| e.distance_km < 1e-6));
}

/// SGP4 for every object except those listed.
struct FailingFor(Vec<&'static str>);

impl PropagationCapability for FailingFor {
    fn propagate(&self, line1: &str, line2: &str, instant: JulianInstant) -> CapabilityOutput {
        if self.0.iter().any(|id| line1.get(2..7) == Some(*id)) {
            return CapabilityOutput::failed(CODE_PROPAGATION_FAILED);
        }
        Sgp4Capability.propagate(line1, line2, instant)
    }
}

#[test]
fn failed_candidate_is_reported_not_fatal() {
    let catalog = vec![
        element_set("00001", 420.0, 410.0, 51.6, 0.0),
        element_set("00002", 425.0, 408.0, 51.9, 10.0),
        element_set("00005", 415.0, 412.0, 51.5, 20.0),
    ];
    let report = Screener::new(FailingFor(vec!["00002"]), ScreeningConfig::default())
        .run(&request(&catalog, 1.0, 5000.0), &catalog)
        .unwrap();

    assert_eq!(report.candidate_ids.len(), 2);
    assert!(matches!(
        report.unavailable.as_slice(),
        [PropagationError::Unavailable { object_id, steps: 61 }] if object_id == "00002"
    ));
    assert!(report.series["00002"].is_empty());
    assert!(report.event_count() >= 1);
    assert!(report.events.iter().all(|e| e.other_id == "00005"));
}

#[test]
fn failed_target_aborts_run() {
    let catalog = scenario();
    let result = Screener::new(FailingFor(vec!["00001"]), ScreeningConfig::default())
        .run(&request(&catalog, 1.0, 5000.0), &catalog);
    assert!(matches!(result, Err(ScreeningError::TargetUnavailable(_))));
}

#[test]
fn empty_catalog_aborts_run() {
    let catalog = scenario();
    let request = request(&catalog, 1.0, 10.0);
    let result = Screener::new(Sgp4Capability, ScreeningConfig::default()).run_raw(&request, &[]);
    assert!(matches!(result, Err(ScreeningError::EmptyCatalog)));
}

#[test]
fn catalog_text_to_persisted_events() {
    let (t1, t2) = synthetic("00001", 420.0, 410.0, 51.6, 0.0);
    let (c1, c2) = synthetic("00002", 425.0, 408.0, 51.9, 10.0);
    let text = format!("TARGET\n{}\n{}\nNEIGHBOUR\n{}\n{}\nBROKEN\n1 00009\n", t1, t2, c1, c2);
    let raws: Vec<RawTle> = parse_catalog_text(&text);
    assert_eq!(raws.len(), 2);
    assert_eq!(raws[1].name.as_deref(), Some("NEIGHBOUR"));

    let dir = tempfile::tempdir().unwrap();
    let config = ScreeningConfig {
        persist_results: true,
        output: OutputSettings {
            snapshot_csv: dir.path().join("current.csv"),
            history_csv: dir.path().join("history.csv"),
        },
        ..ScreeningConfig::default()
    };
    let sink = CsvSink::new(
        config.output.snapshot_csv.clone(),
        config.output.history_csv.clone(),
    );

    let start = decode(&t1, &t2).unwrap().epoch();
    let request = ScreeningRequest::from_config(
        "00001",
        start,
        &ScreeningConfig {
            duration_seconds: 1800.0,
            threshold_km: 5000.0,
            ..config.clone()
        },
    )
    .unwrap();
    let report = Screener::new(Sgp4Capability, config)
        .with_sink(sink.clone())
        .run_raw(&request, &raws)
        .unwrap();
    assert!(report.event_count() >= 1);

    let mut reader = csv::Reader::from_path(&sink.snapshot_path).unwrap();
    let rows: Vec<EventRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), report.event_count());
    assert!(rows.iter().all(|r| r.target_id == "00001" && r.other_id == "00002"));
    assert!(sink.history_path.exists());
}

#[test]
fn window_start_is_independent_of_element_epoch() {
    // A week after epoch the neighbour is still screenable
    let catalog = scenario();
    let start = catalog[0].epoch() + hifitime::Duration::from_days(7.0);
    let window = TimeWindow::new(start, 600.0, 60.0).unwrap();
    let request =
        ScreeningRequest::new("00001", window, FilterTolerances::default(), 5000.0).unwrap();
    let report = Screener::new(Sgp4Capability, ScreeningConfig::default())
        .run(&request, &catalog)
        .unwrap();
    assert_eq!(report.target_series.len(), 11);
    assert!(report.start() > Epoch::from_gregorian_utc_at_midnight(2008, 9, 1));
}
