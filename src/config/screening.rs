use crate::constants::{DEFAULT_DURATION_SECONDS, DEFAULT_STEP_SECONDS, DEFAULT_THRESHOLD_KM};
use crate::detection::Alignment;
use crate::errors::ConfigError;
use crate::filter::FilterTolerances;
use crate::propagation::TimeWindow;
use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "orbscreen";
const CONFIG_FILE: &str = "screening.toml";

/// Run parameters for a screening pass.
///
/// Every field has a default, so a TOML file only needs to name what it
/// overrides:
///
/// ```toml
/// threshold_km = 5.0
/// workers = 4
///
/// [filter]
/// inclination_deg = 3.0
/// apply_raan = true
///
/// [alignment]
/// mode = "index"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub step_seconds: f64,
    pub duration_seconds: f64,
    pub threshold_km: f64,
    pub filter: FilterTolerances,
    pub alignment: Alignment,
    /// Propagation worker threads; 0 lets rayon pick one per core
    pub workers: usize,
    /// Hand each report to the attached result sink
    pub persist_results: bool,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Replaced on every persisted run
    pub snapshot_csv: PathBuf,
    /// Appended on every persisted run
    pub history_csv: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            snapshot_csv: PathBuf::from("output/conjunctions_current.csv"),
            history_csv: PathBuf::from("output/conjunctions_history.csv"),
        }
    }
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_STEP_SECONDS,
            duration_seconds: DEFAULT_DURATION_SECONDS,
            threshold_km: DEFAULT_THRESHOLD_KM,
            filter: FilterTolerances::default(),
            alignment: Alignment::default(),
            workers: 0,
            persist_results: false,
            output: OutputSettings::default(),
        }
    }
}

impl ScreeningConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScreeningConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `<config dir>/orbscreen/screening.toml`, e.g. `~/.config/orbscreen/screening.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads the file at [`Self::default_path`] if there is one, defaults otherwise.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("loading screening configuration from {:?}", path);
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold_km.is_finite() && self.threshold_km > 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "threshold_km must be positive, got {}",
                self.threshold_km
            )));
        }

        let tolerances = [
            ("filter.apoapsis_km", self.filter.apoapsis_km),
            ("filter.periapsis_km", self.filter.periapsis_km),
            ("filter.inclination_deg", self.filter.inclination_deg),
            ("filter.raan_deg", self.filter.raan_deg),
        ];
        for (name, value) in tolerances {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if let Alignment::Timestamp { epsilon_seconds } = self.alignment {
            if !(epsilon_seconds.is_finite() && epsilon_seconds >= 0.0) {
                return Err(ConfigError::InvalidParameter(format!(
                    "alignment epsilon must be non-negative, got {}",
                    epsilon_seconds
                )));
            }
        }

        // Step and duration are checked by the window itself
        self.window(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
            .map(|_| ())
    }

    pub fn window(&self, start: Epoch) -> Result<TimeWindow, ConfigError> {
        TimeWindow::new(start, self.duration_seconds, self.step_seconds)
    }
}
