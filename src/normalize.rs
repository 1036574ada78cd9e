//! Type and format normalizers: raw entry text in, typed value or failure out.
//!
//! These are the leaf functions of the validation pipeline. Each one is pure
//! and independent of column rules; the row validator decides which of them
//! applies to a field.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::rule::NumericFormat;
use crate::value::{CellValue, narrow_to_i64};

/// Date formats attempted in order. `01/02/2024` resolves as day/month/year
/// because `%d/%m/%Y` precedes `%m/%d/%Y`; list order, not locale, is the
/// documented tiebreak.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const DATETIME_FALLBACK_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty date value"));
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    // ISO-8601 fallback: accept a full timestamp and keep the date part.
    for fmt in DATETIME_FALLBACK_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.date());
        }
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.date_naive());
    }
    Err(anyhow!("Failed to parse '{trimmed}' as date"))
}

/// True iff the value parses as a floating-point number once whitespace and
/// thousands separators are stripped. Empty input is not numeric.
pub fn is_numeric(value: &str) -> bool {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return false;
    }
    cleaned.parse::<f64>().is_ok()
}

/// Parses a numeric entry into a typed cell value.
///
/// Decimal columns round to 2 fractional digits. Integer (or unspecified)
/// columns narrow to `i64` when the parsed float has no fractional part
/// and round-trips through `i64` without loss; magnitudes beyond the `i64`
/// range stay floats instead of saturating.
pub fn normalize_number(value: &str, format: Option<NumericFormat>) -> Result<CellValue> {
    let cleaned = value.trim().replace(',', "");
    let parsed: f64 = cleaned
        .parse()
        .map_err(|_| anyhow!("Failed to parse '{}' as number", value.trim()))?;
    let normalized = match format {
        Some(NumericFormat::Decimal) => {
            let rounded = (parsed * 100.0).round() / 100.0;
            CellValue::Float(rounded)
        }
        Some(NumericFormat::Integer) | None => match narrow_to_i64(parsed) {
            Some(whole) => CellValue::Integer(whole),
            None => CellValue::Float(parsed),
        },
    };
    Ok(normalized)
}

/// Collapses internal whitespace runs to single spaces and trims the ends.
/// An empty result is `None`.
pub fn normalize_text(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(value: &str) -> bool {
    let re = EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));
    re.is_match(value.trim())
}
