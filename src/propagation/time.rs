use crate::constants::{SECONDS_PER_DAY, UNIX_EPOCH_JD};
use crate::errors::ConfigError;
use hifitime::{Duration, Epoch};

/// An instant split into Julian day at the preceding midnight (`x.5`) and
/// the fraction of day since then. Keeping the two parts apart preserves
/// sub-millisecond resolution that a single f64 Julian date would lose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianInstant {
    pub day: f64,
    pub fraction: f64,
}

impl JulianInstant {
    pub fn from_unix_seconds(unix_seconds: f64) -> Self {
        let days = unix_seconds / SECONDS_PER_DAY;
        let whole = days.floor();
        Self {
            day: whole + UNIX_EPOCH_JD,
            fraction: days - whole,
        }
    }

    pub fn from_epoch(epoch: Epoch) -> Self {
        Self::from_unix_seconds(epoch.to_unix_seconds())
    }

    pub fn to_epoch(&self) -> Epoch {
        Epoch::from_unix_seconds(((self.day - UNIX_EPOCH_JD) + self.fraction) * SECONDS_PER_DAY)
    }

    pub fn julian_date(&self) -> f64 {
        self.day + self.fraction
    }

    /// Days elapsed from `other` to `self`.
    pub fn days_since(&self, other: &JulianInstant) -> f64 {
        (self.day - other.day) + (self.fraction - other.fraction)
    }
}

/// Upper bound on samples per object in one window
pub const MAX_WINDOW_STEPS: u32 = u32::MAX;

/// Screening window: `[start, start + duration]` sampled every `step_seconds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Epoch,
    pub duration_seconds: f64,
    pub step_seconds: f64,
}

impl TimeWindow {
    pub fn new(start: Epoch, duration_seconds: f64, step_seconds: f64) -> Result<Self, ConfigError> {
        if !(step_seconds.is_finite() && step_seconds > 0.0) {
            return Err(ConfigError::InvalidWindow(format!(
                "step must be positive, got {}",
                step_seconds
            )));
        }
        if !(duration_seconds.is_finite() && duration_seconds >= 0.0) {
            return Err(ConfigError::InvalidWindow(format!(
                "duration must be non-negative, got {}",
                duration_seconds
            )));
        }
        let intervals = Self::intervals(duration_seconds, step_seconds);
        if intervals >= f64::from(MAX_WINDOW_STEPS) {
            return Err(ConfigError::InvalidWindow(format!(
                "{}s at {}s steps exceeds {} samples",
                duration_seconds, step_seconds, MAX_WINDOW_STEPS
            )));
        }
        Ok(Self {
            start,
            duration_seconds,
            step_seconds,
        })
    }

    fn intervals(duration_seconds: f64, step_seconds: f64) -> f64 {
        (duration_seconds / step_seconds + 1e-9).floor()
    }

    pub fn step_count(&self) -> usize {
        (Self::intervals(self.duration_seconds, self.step_seconds) as usize).saturating_add(1)
    }

    /// Offsets from `start`, from 0 up to and including the duration.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.step_count()).map(move |i| i as f64 * self.step_seconds)
    }

    pub fn instant_at(&self, offset_seconds: f64) -> Epoch {
        self.start + Duration::from_seconds(offset_seconds)
    }
}
