//! Combination of independent diagnostic coverages.
//!
//! Independent methods miss a dangerous failure only if all of them miss it,
//! so the aggregate is `1 - Π(1 - cᵢ/100)`, expressed as a percentage and
//! rounded half-up to two decimals. The same primitive serves the
//! whole-profile figure and per-fault figures.

use crate::config::CoverageSettings;
use crate::error::{EngineError, EngineResult};
use crate::model::Level;

/// Decimal places of every reported coverage percentage.
pub const COVERAGE_SCALE: u32 = 2;

/// Reject a coverage value outside [0, 100].
///
/// Out-of-range values are reported, never clamped.
pub fn check_coverage(value: f64) -> EngineResult<f64> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::CoverageOutOfRange { value })
    }
}

/// Aggregate coverage of independent methods, rounded to two decimals.
///
/// An empty input yields `0.0`; any input of exactly `100` yields `100.0`.
pub fn aggregate_coverage(coverages: &[f64]) -> EngineResult<f64> {
    aggregate_coverage_with(coverages, COVERAGE_SCALE)
}

/// [`aggregate_coverage`] with an explicit number of decimal places.
pub fn aggregate_coverage_with(coverages: &[f64], places: u32) -> EngineResult<f64> {
    let mut sorted = Vec::with_capacity(coverages.len());
    for &value in coverages {
        sorted.push(check_coverage(value)?);
    }

    if sorted.is_empty() {
        return Ok(0.0);
    }
    if sorted.iter().any(|&c| c == 100.0) {
        return Ok(100.0);
    }

    // Multiplying in a fixed order makes the result independent of input order.
    sorted.sort_by(f64::total_cmp);
    let miss = sorted
        .iter()
        .fold(1.0_f64, |product, &c| product * (1.0 - c / 100.0));

    Ok(round_half_up((1.0 - miss) * 100.0, places))
}

/// Round `value` to `places` decimals, half away from zero.
///
/// Rounds the shortest decimal representation of `value` rather than its
/// binary expansion, so `2.675` becomes `2.68` instead of `2.67`.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    if !value.is_finite() || value == 0.0 || value.abs() >= 1e15 {
        return value;
    }

    let mut buffer = ryu::Buffer::new();
    let repr = buffer.format_finite(value.abs());

    let (mantissa, exponent) = match repr.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (repr, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .collect();
    let mut point = int_part.len() as i32 + exponent;
    if point < 0 {
        let pad = (-point) as usize;
        digits.splice(0..0, std::iter::repeat(0).take(pad));
        point = 0;
    }

    let keep = (point + places as i32) as usize;
    if digits.len() <= keep {
        return value;
    }

    let mut kept = digits[..keep]
        .iter()
        .fold(0_u128, |acc, &d| acc * 10 + u128::from(d));
    if digits[keep] >= 5 {
        kept += 1;
    }

    let rounded = kept as f64 / 10_f64.powi(places as i32);
    if value.is_sign_negative() {
        -rounded
    } else {
        rounded
    }
}

/// Coverage level implied by a percentage under the configured bands.
pub fn level_for_percent(percent: f64, bands: &CoverageSettings) -> Level {
    if percent >= bands.high_min {
        Level::High
    } else if percent >= bands.medium_min {
        Level::Medium
    } else {
        Level::Low
    }
}

/// Whether a declared coverage level matches the band its percentage falls in.
pub fn is_level_consistent(percent: f64, level: Level, bands: &CoverageSettings) -> bool {
    level_for_percent(percent, bands) == level
}
