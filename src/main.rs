use chrono::Utc;
use clap::{Parser, ValueEnum};
use csv::Writer;
use hifitime::Epoch;
use orbscreen::config::ScreeningConfig;
use orbscreen::elements::parse_catalog_text;
use orbscreen::propagation::{KeplerCapability, PropagationCapability, Sgp4Capability};
use orbscreen::screening::{ScreeningReport, ScreeningRequest, Screener};
use orbscreen::sink::{event_records, write_series_json, CsvSink};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Propagator {
    /// SGP4/SDP4 (TEME positions)
    Sgp4,
    /// Unperturbed two-body
    Kepler,
}

/// Screen a target against a TLE catalog for close approaches.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog file with two- or three-line element records
    catalog: PathBuf,

    /// Catalog id of the target object
    #[arg(short, long)]
    target: String,

    /// Window start, e.g. "2024-03-01T00:00:00 UTC" (default: now)
    #[arg(long)]
    start: Option<String>,

    /// Window length in hours
    #[arg(long)]
    hours: Option<f64>,

    /// Sampling step in seconds
    #[arg(long)]
    step: Option<f64>,

    /// Conjunction distance threshold in km
    #[arg(long)]
    threshold: Option<f64>,

    /// Propagation worker threads (0 = one per core)
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long, value_enum, default_value_t = Propagator::Sgp4)]
    propagator: Propagator,

    /// Configuration file (default: the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write this run's events to a CSV file
    #[arg(long)]
    events_csv: Option<PathBuf>,

    /// Write the propagated tracks to a JSON file
    #[arg(long)]
    series_json: Option<PathBuf>,

    /// Persist events to the configured snapshot and history tables
    #[arg(long)]
    persist: bool,
}

fn load_config(cli: &Cli) -> Result<ScreeningConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => ScreeningConfig::from_file(path)?,
        None => ScreeningConfig::load_default()?,
    };

    if let Some(hours) = cli.hours {
        config.duration_seconds = hours * 3600.0;
    }
    if let Some(step) = cli.step {
        config.step_seconds = step;
    }
    if let Some(threshold) = cli.threshold {
        config.threshold_km = threshold;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    config.persist_results |= cli.persist;

    config.validate()?;
    Ok(config)
}

fn window_start(start: Option<&str>) -> Result<Epoch, Box<dyn Error>> {
    match start {
        Some(text) => Epoch::from_gregorian_str(text)
            .map_err(|e| format!("cannot read start time {:?}: {}", text, e).into()),
        None => Ok(Epoch::from_unix_seconds(
            Utc::now().timestamp_millis() as f64 / 1000.0,
        )),
    }
}

fn write_events_csv(path: &Path, report: &ScreeningReport) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = Writer::from_path(path)?;
    for record in event_records(report, &Utc::now())? {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let start = window_start(cli.start.as_deref())?;
    let request = ScreeningRequest::from_config(cli.target.clone(), start, &config)?;

    let text = fs::read_to_string(&cli.catalog)?;
    let raws = parse_catalog_text(&text);
    log::info!("read {} records from {:?}", raws.len(), cli.catalog);

    let capability: Box<dyn PropagationCapability> = match cli.propagator {
        Propagator::Sgp4 => Box::new(Sgp4Capability),
        Propagator::Kepler => Box::new(KeplerCapability::default()),
    };
    let sink = CsvSink::new(
        config.output.snapshot_csv.clone(),
        config.output.history_csv.clone(),
    );
    let report = Screener::new(capability, config)
        .with_sink(sink)
        .run_raw(&request, &raws)?;

    if let Some(path) = &cli.events_csv {
        write_events_csv(path, &report)?;
        log::info!("events written to {:?}", path);
    }
    if let Some(path) = &cli.series_json {
        write_series_json(path, &report)?;
        log::info!("tracks written to {:?}", path);
    }

    println!(
        "Target {}: {} candidates, {} events within {} km",
        report.target_id,
        report.candidate_ids.len(),
        report.event_count(),
        request.threshold_km
    );
    for event in report.closest_approaches() {
        println!(
            "  {:>7}  closest {:10.3} km at t+{:.0}s",
            event.other_id, event.distance_km, event.time_offset_seconds
        );
    }
    for missing in &report.unavailable {
        println!("  unavailable: {}", missing);
    }
    for (raw, error) in &report.rejected {
        let label = raw
            .name
            .clone()
            .unwrap_or_else(|| raw.line1.get(2..7).unwrap_or("?????").trim().to_string());
        println!("  rejected: {}: {}", label, error);
    }

    Ok(())
}
