//! Fixed-column decoding of two-line element sets.
//!
//! Fields are cut out of each line by column offset. The catalog id is the
//! only field whose absence aborts decoding; every other numeric field falls
//! back to zero and is listed in [`OrbitalElementSet::fallbacks`] so callers
//! can tell a substituted zero from a real one. A non-ASCII character takes
//! one column and makes only the field it sits in unreadable.

use crate::constants::{EPOCH_YEAR_PIVOT, LAUNCH_YEAR_PIVOT, SECONDS_PER_DAY};
use crate::errors::ElementError;
use crate::physics::orbital::OrbitalMechanics;
use hifitime::{Duration, Epoch};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

pub const LINE_LENGTH: usize = 69;

// Line 1 columns (0-based, end exclusive)
const L1_CATALOG_ID: Range<usize> = 2..7;
const L1_CLASSIFICATION: Range<usize> = 7..8;
const L1_LAUNCH_YEAR: Range<usize> = 9..11;
const L1_LAUNCH_NUMBER: Range<usize> = 11..14;
const L1_LAUNCH_PIECE: Range<usize> = 14..17;
const L1_EPOCH_YEAR: Range<usize> = 18..20;
const L1_EPOCH_DAY: Range<usize> = 20..32;
const L1_MEAN_MOTION_DOT: Range<usize> = 33..43;
const L1_MEAN_MOTION_DDOT: Range<usize> = 44..52;
const L1_BSTAR: Range<usize> = 53..61;
const L1_EPHEMERIS_TYPE: Range<usize> = 62..63;
const L1_ELEMENT_SET: Range<usize> = 64..68;
const CHECKSUM: Range<usize> = 68..69;

// Line 2 columns
const L2_CATALOG_ID: Range<usize> = 2..7;
const L2_INCLINATION: Range<usize> = 8..16;
const L2_RAAN: Range<usize> = 17..25;
const L2_ECCENTRICITY: Range<usize> = 26..33;
const L2_ARG_PERIGEE: Range<usize> = 34..42;
const L2_MEAN_ANOMALY: Range<usize> = 43..51;
const L2_MEAN_MOTION: Range<usize> = 52..63;
const L2_REVOLUTION: Range<usize> = 63..68;

/// Fields that can fall back to a default value during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TleField {
    Classification,
    LaunchYear,
    LaunchNumber,
    EpochYear,
    EpochDay,
    FirstDerivativeMeanMotion,
    SecondDerivativeMeanMotion,
    BstarDrag,
    ElementSetNumber,
    Inclination,
    Raan,
    Eccentricity,
    ArgPerigee,
    MeanAnomaly,
    MeanMotion,
    RevolutionNumber,
    Checksum1,
    Checksum2,
}

impl fmt::Display for TleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One decoded two-line element record with its derived geometry.
#[derive(Debug, Clone, Serialize)]
pub struct OrbitalElementSet {
    pub catalog_id: String,
    pub classification: char,
    pub launch_year: i32,
    pub launch_number: u32,
    pub launch_piece: String,
    pub epoch_year: i32,
    pub epoch_day: f64,
    pub first_derivative_mean_motion: f64,
    pub second_derivative_mean_motion: f64,
    pub bstar_drag: f64,
    pub ephemeris_type: char,
    pub element_set_number: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub mean_motion_rev_per_day: f64,
    pub revolution_number: u32,
    /// Checksums as embedded in column 69 of each line
    pub checksums: [u8; 2],

    pub apoapsis_km: f64,
    pub periapsis_km: f64,

    pub line1: String,
    pub line2: String,
    pub fallbacks: Vec<TleField>,
}

impl OrbitalElementSet {
    pub fn is_fallback(&self, field: TleField) -> bool {
        self.fallbacks.contains(&field)
    }

    pub fn computed_checksums(&self) -> [u8; 2] {
        [checksum(&self.line1), checksum(&self.line2)]
    }

    /// True when both embedded checksums match the line contents.
    pub fn checksum_valid(&self) -> bool {
        !self.is_fallback(TleField::Checksum1)
            && !self.is_fallback(TleField::Checksum2)
            && self.computed_checksums() == self.checksums
    }

    pub fn semi_major_axis_km(&self) -> f64 {
        OrbitalMechanics::semi_major_axis_from_mean_motion(self.mean_motion_rev_per_day)
    }

    pub fn period_seconds(&self) -> f64 {
        SECONDS_PER_DAY / self.mean_motion_rev_per_day
    }

    /// Reference epoch of the element set (UTC).
    pub fn epoch(&self) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(self.epoch_year, 1, 1)
            + Duration::from_days(self.epoch_day - 1.0)
    }
}

/// Mod-10 checksum over the first 68 columns: digits count their value, `-` counts one.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

pub fn expand_launch_year(two_digit: i32) -> i32 {
    if two_digit >= LAUNCH_YEAR_PIVOT {
        1900 + two_digit
    } else {
        2000 + two_digit
    }
}

pub fn expand_epoch_year(two_digit: i32) -> i32 {
    if two_digit < EPOCH_YEAR_PIVOT {
        2000 + two_digit
    } else {
        1900 + two_digit
    }
}

/// Decodes the packed "implied decimal point" notation used by the drag terms.
///
/// `" 12345-3"` is `0.12345e-3`, `"-11606-4"` is `-0.11606e-4`.
pub fn decode_implied_decimal(field: &str) -> Option<f64> {
    let field = field.trim();
    if !field.is_ascii() || field.len() < 3 {
        return None;
    }

    let (sign, body) = match field.as_bytes()[0] {
        b'-' => (-1.0, &field[1..]),
        b'+' => (1.0, &field[1..]),
        _ => (1.0, field),
    };
    if body.len() < 3 {
        return None;
    }

    let (mantissa, exponent) = body.split_at(body.len() - 2);
    if !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exponent: i32 = exponent.parse().ok()?;
    let mantissa: f64 = format!("0.{}", mantissa).parse().ok()?;

    Some(sign * mantissa * 10f64.powi(exponent))
}

/// Stands in for a non-ASCII character. Never valid inside a field.
const UNREADABLE: char = '\u{1a}';

/// Maps every non-ASCII character to one [`UNREADABLE`] column.
fn ascii_columns(line: &str) -> Cow<'_, str> {
    if line.is_ascii() {
        return Cow::Borrowed(line);
    }
    Cow::Owned(
        line.chars()
            .map(|c| if c.is_ascii() { c } else { UNREADABLE })
            .collect(),
    )
}

/// Column slice that tolerates short lines.
fn column<'a>(line: &'a str, range: Range<usize>) -> &'a str {
    line.get(range).unwrap_or("")
}

/// Collects substituted fields while a record is decoded.
struct FieldReader<'a> {
    catalog_id: &'a str,
    fallbacks: Vec<TleField>,
}

impl<'a> FieldReader<'a> {
    fn fallback<T>(&mut self, field: TleField, raw: &str, default: T) -> T {
        log::warn!(
            "object {}: field {} ({:?}) unreadable, using fallback",
            self.catalog_id,
            field,
            raw
        );
        self.fallbacks.push(field);
        default
    }

    fn float(&mut self, field: TleField, raw: &str) -> f64 {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => self.fallback(field, raw, 0.0),
        }
    }

    fn implied(&mut self, field: TleField, raw: &str) -> f64 {
        match decode_implied_decimal(raw) {
            Some(value) => value,
            None => self.fallback(field, raw, 0.0),
        }
    }

    fn leading_decimal(&mut self, field: TleField, raw: &str) -> f64 {
        let digits = raw.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return self.fallback(field, raw, 0.0);
        }
        match format!("0.{}", digits).parse::<f64>() {
            Ok(value) => value,
            Err(_) => self.fallback(field, raw, 0.0),
        }
    }

    fn unsigned(&mut self, field: TleField, raw: &str) -> u32 {
        match raw.trim().parse::<u32>() {
            Ok(value) => value,
            Err(_) => self.fallback(field, raw, 0),
        }
    }

    fn digit(&mut self, field: TleField, raw: &str) -> u8 {
        match raw.bytes().next() {
            Some(b @ b'0'..=b'9') => b - b'0',
            _ => self.fallback(field, raw, 0),
        }
    }

    fn character(&mut self, field: TleField, raw: &str, default: char) -> char {
        match raw.chars().next() {
            Some(c) if c.is_ascii_graphic() => c,
            _ => self.fallback(field, raw, default),
        }
    }
}

fn reject(catalog_id: &str, field: &'static str, value: f64) -> ElementError {
    ElementError::OutOfRange {
        catalog_id: catalog_id.to_string(),
        field,
        value,
    }
}

/// Decodes a two-line element pair.
pub fn decode(line1: &str, line2: &str) -> Result<OrbitalElementSet, ElementError> {
    let line1 = ascii_columns(line1.trim_end());
    let line2 = ascii_columns(line2.trim_end());
    let (line1, line2) = (line1.as_ref(), line2.as_ref());
    if column(line1, L1_CATALOG_ID).contains(UNREADABLE) {
        return Err(ElementError::NotAscii { line: 1 });
    }
    if column(line2, L2_CATALOG_ID).contains(UNREADABLE) {
        return Err(ElementError::NotAscii { line: 2 });
    }

    let catalog_id = column(line1, L1_CATALOG_ID).trim();
    if catalog_id.is_empty() {
        return Err(ElementError::MissingCatalogId);
    }
    if !catalog_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ElementError::NonNumericCatalogId(catalog_id.to_string()));
    }

    let second_id = column(line2, L2_CATALOG_ID).trim();
    if second_id != catalog_id {
        log::warn!(
            "object {}: line 2 carries catalog id {:?}",
            catalog_id,
            second_id
        );
    }
    if line1.len() != LINE_LENGTH || line2.len() != LINE_LENGTH {
        log::warn!(
            "object {}: line lengths {}/{} differ from {}",
            catalog_id,
            line1.len(),
            line2.len(),
            LINE_LENGTH
        );
    }

    let mut reader = FieldReader {
        catalog_id,
        fallbacks: Vec::new(),
    };

    let classification = reader.character(
        TleField::Classification,
        column(line1, L1_CLASSIFICATION),
        'U',
    );

    let launch_year = match column(line1, L1_LAUNCH_YEAR).trim().parse::<i32>() {
        Ok(yy) => expand_launch_year(yy),
        Err(_) => reader.fallback(TleField::LaunchYear, column(line1, L1_LAUNCH_YEAR), 0),
    };
    let launch_number = reader.unsigned(TleField::LaunchNumber, column(line1, L1_LAUNCH_NUMBER));
    let launch_piece = column(line1, L1_LAUNCH_PIECE)
        .trim()
        .replace(UNREADABLE, "");

    let epoch_year = match column(line1, L1_EPOCH_YEAR).trim().parse::<i32>() {
        Ok(yy) => expand_epoch_year(yy),
        Err(_) => reader.fallback(TleField::EpochYear, column(line1, L1_EPOCH_YEAR), 0),
    };
    let epoch_day = reader.float(TleField::EpochDay, column(line1, L1_EPOCH_DAY));
    let first_derivative_mean_motion = reader.float(
        TleField::FirstDerivativeMeanMotion,
        column(line1, L1_MEAN_MOTION_DOT),
    );
    let second_derivative_mean_motion = reader.implied(
        TleField::SecondDerivativeMeanMotion,
        column(line1, L1_MEAN_MOTION_DDOT),
    );
    let bstar_drag = reader.implied(TleField::BstarDrag, column(line1, L1_BSTAR));
    let ephemeris_type = column(line1, L1_EPHEMERIS_TYPE)
        .chars()
        .next()
        .filter(|c| c.is_ascii_graphic())
        .unwrap_or('0');
    let element_set_number =
        reader.unsigned(TleField::ElementSetNumber, column(line1, L1_ELEMENT_SET));
    let checksum1 = reader.digit(TleField::Checksum1, column(line1, CHECKSUM));

    let inclination_deg = reader.float(TleField::Inclination, column(line2, L2_INCLINATION));
    let raan_deg = reader.float(TleField::Raan, column(line2, L2_RAAN));
    let eccentricity =
        reader.leading_decimal(TleField::Eccentricity, column(line2, L2_ECCENTRICITY));
    let arg_perigee_deg = reader.float(TleField::ArgPerigee, column(line2, L2_ARG_PERIGEE));
    let mean_anomaly_deg = reader.float(TleField::MeanAnomaly, column(line2, L2_MEAN_ANOMALY));
    let mean_motion_rev_per_day =
        reader.float(TleField::MeanMotion, column(line2, L2_MEAN_MOTION));
    let revolution_number =
        reader.unsigned(TleField::RevolutionNumber, column(line2, L2_REVOLUTION));
    let checksum2 = reader.digit(TleField::Checksum2, column(line2, CHECKSUM));

    if !(0.0..1.0).contains(&eccentricity) {
        return Err(reject(catalog_id, "eccentricity", eccentricity));
    }
    if mean_motion_rev_per_day <= 0.0 {
        return Err(reject(catalog_id, "mean_motion", mean_motion_rev_per_day));
    }
    if !(0.0..=180.0).contains(&inclination_deg) {
        return Err(reject(catalog_id, "inclination", inclination_deg));
    }

    let a = OrbitalMechanics::semi_major_axis_from_mean_motion(mean_motion_rev_per_day);
    let (apoapsis_km, periapsis_km) = OrbitalMechanics::apsis_altitudes(a, eccentricity);
    if periapsis_km < 0.0 {
        return Err(reject(catalog_id, "periapsis_km", periapsis_km));
    }

    let set = OrbitalElementSet {
        catalog_id: catalog_id.to_string(),
        classification,
        launch_year,
        launch_number,
        launch_piece,
        epoch_year,
        epoch_day,
        first_derivative_mean_motion,
        second_derivative_mean_motion,
        bstar_drag,
        ephemeris_type,
        element_set_number,
        inclination_deg,
        raan_deg,
        eccentricity,
        arg_perigee_deg,
        mean_anomaly_deg,
        mean_motion_rev_per_day,
        revolution_number,
        checksums: [checksum1, checksum2],
        apoapsis_km,
        periapsis_km,
        line1: line1.to_string(),
        line2: line2.to_string(),
        fallbacks: reader.fallbacks,
    };

    if !set.checksum_valid() {
        log::warn!(
            "object {}: checksum mismatch, embedded {:?} computed {:?}",
            set.catalog_id,
            set.checksums,
            set.computed_checksums()
        );
    }

    Ok(set)
}
