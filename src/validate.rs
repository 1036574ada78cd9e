//! Row validation: applies required/duplicate/type checks column by column
//! and produces a structured report plus presentation hints.
//!
//! Validation failures are values inside [`RowReport`], never `Err`; the
//! `Result` returns here only carry store read failures from the duplicate
//! scan.

use std::fmt;

use anyhow::Result;

use crate::{
    dedup::{self, EditSession},
    normalize,
    rule::{DuplicatePolicy, RuleSet, ValueType},
    store::TabularStore,
    value::CellValue,
};

/// Presentation hint for one field, kept apart from the domain result so a
/// UI can color entries without the validator knowing about widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Valid,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// 1-based column position.
    pub position: usize,
    pub column: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

/// Outcome of validating one raw row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    /// True iff no strict errors were recorded. Warnings never clear this.
    pub ok: bool,
    pub errors: Vec<FieldIssue>,
    pub warnings: Vec<FieldIssue>,
    pub normalized: Vec<Option<CellValue>>,
    /// `(position, hint)` pairs, one per field, in column order.
    pub feedback: Vec<(usize, Feedback)>,
}

impl RowReport {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(FieldIssue::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(FieldIssue::to_string).collect()
    }
}

/// Validates a raw row against the rule set, consulting the store for
/// duplicate checks and the edit session for self-exclusion.
///
/// Per field: required check, then optional-empty short-circuit, then
/// duplicate policy, then type validation. A strict duplicate stops the
/// field before type validation; a warn duplicate records a warning and
/// continues.
pub fn validate_row(
    raw: &[String],
    rules: &RuleSet,
    store: &dyn TabularStore,
    session: Option<&EditSession>,
) -> Result<RowReport> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut normalized = Vec::with_capacity(rules.len());
    let mut feedback = Vec::with_capacity(rules.len());

    for entry in &rules.columns {
        let position = entry.column.position;
        let name = &entry.column.name;
        let rule = &entry.rule;
        let stripped = raw
            .get(position - 1)
            .map(|value| value.trim())
            .unwrap_or_default();

        let issue = |message: &str| FieldIssue {
            position,
            column: name.clone(),
            message: message.to_string(),
        };

        if stripped.is_empty() {
            normalized.push(None);
            if rule.required {
                errors.push(issue("Required"));
                feedback.push((position, Feedback::Error));
            } else {
                feedback.push((position, Feedback::Valid));
            }
            continue;
        }

        let mut field_hint = Feedback::Valid;
        if matches!(rule.duplicate_policy, DuplicatePolicy::Warn | DuplicatePolicy::Strict)
            && dedup::is_duplicate(store, position, stripped, session)?
        {
            match rule.duplicate_policy {
                DuplicatePolicy::Strict => {
                    errors.push(issue("Duplicate value found"));
                    feedback.push((position, Feedback::Error));
                    // Strict duplicate short-circuits; no type validation.
                    normalized.push(Some(CellValue::Text(stripped.to_string())));
                    continue;
                }
                DuplicatePolicy::Warn => {
                    warnings.push(issue("Possible duplicate"));
                    field_hint = Feedback::Warning;
                }
                DuplicatePolicy::None => unreachable!(),
            }
        }

        let outcome: std::result::Result<Option<CellValue>, String> = match rule.value_type {
            ValueType::Text => Ok(normalize::normalize_text(stripped).map(CellValue::Text)),
            ValueType::Numeric => {
                if normalize::is_numeric(stripped) {
                    normalize::normalize_number(stripped, rule.numeric_format)
                        .map(Some)
                        .map_err(|err| err.to_string())
                } else {
                    Err("Invalid numeric value".to_string())
                }
            }
            ValueType::Date => normalize::parse_date(stripped)
                .map(|date| Some(CellValue::Date(date)))
                .map_err(|_| "Invalid date (try YYYY-MM-DD)".to_string()),
            ValueType::Email => {
                if normalize::is_valid_email(stripped) {
                    Ok(Some(CellValue::Text(stripped.to_string())))
                } else {
                    Err("Invalid email format".to_string())
                }
            }
        };

        match outcome {
            Ok(value) => {
                normalized.push(value);
                feedback.push((position, field_hint));
            }
            Err(message) => {
                errors.push(issue(&message));
                normalized.push(Some(CellValue::Text(stripped.to_string())));
                feedback.push((position, Feedback::Error));
            }
        }
    }

    Ok(RowReport {
        ok: errors.is_empty(),
        errors,
        warnings,
        normalized,
        feedback,
    })
}
