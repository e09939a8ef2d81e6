use std::{io, path::PathBuf};
use thiserror::Error;

/// Raised when two-line text cannot be turned into a usable element set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("catalog id on line {line} is not ASCII")]
    NotAscii { line: u8 },
    #[error("catalog id is missing")]
    MissingCatalogId,
    #[error("catalog id {0:?} is not numeric")]
    NonNumericCatalogId(String),
    #[error("object {catalog_id}: {field} = {value} is outside the plausible range")]
    OutOfRange {
        catalog_id: String,
        field: &'static str,
        value: f64,
    },
}

/// Propagation failures. `Sample` is recovered locally by skipping the step;
/// `Unavailable` means an object produced no usable sample at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("object {object_id}: step {step_index} (t+{offset_seconds}s) failed with code {code}")]
    Sample {
        object_id: String,
        step_index: usize,
        offset_seconds: f64,
        code: i32,
    },
    #[error("object {object_id}: no usable sample in {steps} steps")]
    Unavailable { object_id: String, steps: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid time window: {0}")]
    InvalidWindow(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("catalog is empty, nothing to screen")]
    EmptyCatalog,
    #[error("target {0} is not in the catalog")]
    TargetNotFound(String),
    #[error("target could not be propagated: {0}")]
    TargetUnavailable(PropagationError),
    #[error("malformed element set: {0}")]
    Element(#[from] ElementError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("result sink failed: {0}")]
    Sink(#[from] SinkError),
}
