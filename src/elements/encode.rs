//! Renders an element set back into standard two-line text.

use super::tle::{checksum, OrbitalElementSet};

/// `" .00016717"` / `"-.00002182"`: sign column, no leading zero, 8 decimals.
fn encode_mean_motion_dot(value: f64) -> String {
    let sign = if value < 0.0 { '-' } else { ' ' };
    let digits = format!("{:.8}", value.abs());
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    format!("{}{:>9}", sign, digits)
}

/// The exponent occupies a single column.
const MAX_IMPLIED_EXPONENT: i32 = 9;

/// Packs a value into implied-decimal notation: sign, five mantissa digits, signed exponent.
///
/// Always eight columns. Magnitudes below `1e-10` are written as zero; magnitudes
/// of `1e9` and above saturate at `99999+9` with a warning.
pub fn encode_implied_decimal(value: f64) -> String {
    let sign = if value < 0.0 { '-' } else { ' ' };
    let magnitude = value.abs();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return format!("{}00000-0", sign);
    }

    let mut exponent = magnitude.log10().floor() as i32 + 1;
    let mut mantissa = (magnitude / 10f64.powi(exponent) * 1e5).round() as u64;
    if mantissa >= 100_000 {
        exponent += 1;
        mantissa /= 10;
    }

    if exponent < -MAX_IMPLIED_EXPONENT {
        return format!("{}00000-0", sign);
    }
    if exponent > MAX_IMPLIED_EXPONENT {
        log::warn!("{} does not fit an implied-decimal field, saturating", value);
        return format!("{}99999+9", sign);
    }

    let exponent_sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{:05}{}{}", sign, mantissa, exponent_sign, exponent.abs())
}

fn with_checksum(body: String) -> String {
    let digit = checksum(&body);
    format!("{}{}", body, digit)
}

/// Re-renders both lines at standard precision with freshly computed checksums.
pub fn encode(set: &OrbitalElementSet) -> (String, String) {
    let line1 = format!(
        "1 {:0>5}{} {:02}{:03}{:<3} {:02}{:012.8} {} {} {} {} {:>4}",
        set.catalog_id,
        set.classification,
        set.launch_year.rem_euclid(100),
        set.launch_number,
        set.launch_piece,
        set.epoch_year.rem_euclid(100),
        set.epoch_day,
        encode_mean_motion_dot(set.first_derivative_mean_motion),
        encode_implied_decimal(set.second_derivative_mean_motion),
        encode_implied_decimal(set.bstar_drag),
        set.ephemeris_type,
        set.element_set_number % 10_000,
    );

    let eccentricity = (set.eccentricity * 1e7).round() as u32;
    let line2 = format!(
        "2 {:0>5} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:>5}",
        set.catalog_id,
        set.inclination_deg,
        set.raan_deg,
        eccentricity,
        set.arg_perigee_deg,
        set.mean_anomaly_deg,
        set.mean_motion_rev_per_day,
        set.revolution_number % 100_000,
    );

    (with_checksum(line1), with_checksum(line2))
}
