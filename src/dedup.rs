//! Duplicate detection: on-demand column scans plus the edit-session
//! snapshot that lets an unchanged value pass its own duplicate check.

use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::store::TabularStore;

/// Canonical form used for duplicate comparison: trimmed and lowercased.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Scans one column of the store into a case-insensitive set of existing
/// values. Rebuilt on every field validation; the store is fully in memory,
/// so there is no cache to invalidate.
pub fn existing_values(store: &dyn TabularStore, position: usize) -> Result<HashSet<String>> {
    let values = store
        .column_values(position)
        .with_context(|| format!("Scanning column {position} for duplicates"))?;
    Ok(values
        .iter()
        .map(|value| normalize_key(value))
        .filter(|value| !value.is_empty())
        .collect())
}

/// Snapshot of the row being edited, recorded when edit mode starts.
///
/// The column scan cannot tell which row contributed a value, so the
/// snapshot of the row's own original values is what keeps an unchanged
/// field from colliding with itself. Other rows holding the same value
/// still count as duplicates only when they appear in the scan alongside
/// the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    store_row_index: usize,
    original: Vec<Option<String>>,
}

impl EditSession {
    /// Captures the normalized original values of the row at
    /// `store_row_index` (1-based among data rows).
    pub fn capture(store: &dyn TabularStore, store_row_index: usize) -> Result<Self> {
        let rows = store.data_rows()?;
        let row = rows
            .get(store_row_index.checked_sub(1).unwrap_or(usize::MAX))
            .with_context(|| format!("No stored row at index {store_row_index}"))?;
        let original = row
            .iter()
            .map(|cell| {
                let key = normalize_key(cell);
                if key.is_empty() { None } else { Some(key) }
            })
            .collect();
        Ok(EditSession { store_row_index, original })
    }

    pub fn store_row_index(&self) -> usize {
        self.store_row_index
    }

    pub(crate) fn shift_down(&mut self) {
        self.store_row_index -= 1;
    }

    /// True when `candidate` (already normalized) is this row's own original
    /// value for the column at `position`.
    pub fn is_original_value(&self, position: usize, candidate: &str) -> bool {
        position
            .checked_sub(1)
            .and_then(|idx| self.original.get(idx))
            .and_then(Option::as_deref)
            .is_some_and(|original| original == candidate)
    }
}

/// Duplicate check for one field: true when the candidate matches an
/// existing value in the column and is not the active edit session's own
/// original value.
pub fn is_duplicate(
    store: &dyn TabularStore,
    position: usize,
    candidate: &str,
    session: Option<&EditSession>,
) -> Result<bool> {
    let key = normalize_key(candidate);
    if key.is_empty() {
        return Ok(false);
    }
    if session.is_some_and(|s| s.is_original_value(position, &key)) {
        return Ok(false);
    }
    Ok(existing_values(store, position)?.contains(&key))
}
