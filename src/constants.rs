pub const MU_EARTH: f64 = 398_600.4418; // Earth's gravitational parameter (km³/s²)
pub const WGS84_A: f64 = 6378.137; // Equatorial radius [km]

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5; // Julian date of 1970-01-01T00:00:00 UTC

// Two-digit year pivots of the two-line element format
pub const LAUNCH_YEAR_PIVOT: i32 = 57;
pub const EPOCH_YEAR_PIVOT: i32 = 50;

// Screening defaults
pub const DEFAULT_ALTITUDE_TOLERANCE_KM: f64 = 100.0;
pub const DEFAULT_INCLINATION_TOLERANCE_DEG: f64 = 2.0;
pub const DEFAULT_RAAN_TOLERANCE_DEG: f64 = 15.0;
pub const DEFAULT_THRESHOLD_KM: f64 = 10.0;
pub const DEFAULT_STEP_SECONDS: f64 = 60.0;
pub const DEFAULT_DURATION_SECONDS: f64 = 10.0 * 3600.0; // 10 hour look-ahead
pub const DEFAULT_ALIGNMENT_EPSILON_SECONDS: f64 = 1e-3;

// Math
pub const PI: f64 = std::f64::consts::PI;
