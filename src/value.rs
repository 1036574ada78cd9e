use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A typed cell value ready to be written into the tabular store.
///
/// A normalized row is a `Vec<Option<CellValue>>`; `None` marks an empty
/// optional field and is written back as a blank cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => match narrow_to_i64(*f) {
                Some(whole) => whole.to_string(),
                None => f.to_string(),
            },
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// `Some` when the float is a whole number exactly representable as `i64`.
/// The cast saturates out of range, so the narrowed value is accepted only
/// when it round-trips back to the original float.
pub(crate) fn narrow_to_i64(value: f64) -> Option<i64> {
    if value.fract() != 0.0 {
        return None;
    }
    let narrowed = value as i64;
    if narrowed as f64 == value { Some(narrowed) } else { None }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Projects a normalized row onto the display strings held by the UI mirror.
pub fn display_row(values: &[Option<CellValue>]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.as_ref().map(CellValue::as_display).unwrap_or_default())
        .collect()
}
