//! Column validation rules: the per-column policy model, the header-keyword
//! inference engine, and YAML persistence for rule sets.
//!
//! Inference runs as an ordered list of named steps over the lowercased
//! header so the precedence between overlapping signals (a header like
//! `Zip Code` trips both a numeric keyword and the identifier rule) is fixed
//! and testable, not an accident of nested conditionals.

use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Numeric,
    Date,
    Email,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueType::Text => "Text",
            ValueType::Numeric => "Numeric",
            ValueType::Date => "Date",
            ValueType::Email => "Email",
        };
        write!(f, "{label}")
    }
}

impl FromStr for ValueType {
    type Err = anyhow::Error;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(ValueType::Text),
            "numeric" | "number" => Ok(ValueType::Numeric),
            "date" => Ok(ValueType::Date),
            "email" => Ok(ValueType::Email),
            other => Err(anyhow!("Unknown value type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NumericFormat {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    None,
    Warn,
    Strict,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DuplicatePolicy::None => "none",
            DuplicatePolicy::Warn => "warn",
            DuplicatePolicy::Strict => "strict",
        };
        write!(f, "{label}")
    }
}

/// One field of the loaded sheet. `position` is the 1-based index into the
/// row tuple and stays stable for the lifetime of the loaded sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub position: usize,
}

/// The validation policy for one column.
///
/// `numeric_format` is `Some` iff `value_type` is `Numeric`; use
/// [`ValidationRule::set_value_type`] to keep the pair consistent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationRule {
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_format: Option<NumericFormat>,
    pub required: bool,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ValidationRule {
    fn default() -> Self {
        ValidationRule {
            value_type: ValueType::Text,
            numeric_format: None,
            required: true,
            duplicate_policy: DuplicatePolicy::None,
        }
    }
}

impl ValidationRule {
    pub fn set_value_type(&mut self, value_type: ValueType, format: Option<NumericFormat>) {
        self.value_type = value_type;
        self.numeric_format = match value_type {
            ValueType::Numeric => format.or(Some(NumericFormat::Integer)),
            _ => None,
        };
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(
            self.numeric_format.is_some() == (self.value_type == ValueType::Numeric),
            "numeric_format must be set exactly for Numeric columns"
        );
        Ok(())
    }

    pub fn describe(&self) -> String {
        let type_label = match (self.value_type, self.numeric_format) {
            (ValueType::Numeric, Some(NumericFormat::Decimal)) => "Numeric(decimal)".to_string(),
            (ValueType::Numeric, _) => "Numeric(integer)".to_string(),
            (other, _) => other.to_string(),
        };
        format!(
            "{type_label}, {}, duplicates={}",
            if self.required { "required" } else { "optional" },
            self.duplicate_policy
        )
    }
}

const DECIMAL_KEYWORDS: &[&str] = &["amount", "price", "rate", "total", "cost", "balance", "value"];
const INTEGER_KEYWORDS: &[&str] = &["qty", "quantity", "number", "count", "age"];
const OPTIONAL_TEXT_KEYWORDS: &[&str] = &["description", "notes"];
const IDENTIFIER_KEYWORDS: &[&str] = &["id", "code"];

struct InferenceStep {
    name: &'static str,
    apply: fn(&str, &mut ValidationRule),
}

fn contains_any(header: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| header.contains(keyword))
}

fn step_value_type(header: &str, rule: &mut ValidationRule) {
    if contains_any(header, DECIMAL_KEYWORDS) {
        rule.set_value_type(ValueType::Numeric, Some(NumericFormat::Decimal));
    } else if contains_any(header, INTEGER_KEYWORDS) {
        rule.set_value_type(ValueType::Numeric, Some(NumericFormat::Integer));
    } else if header.contains("date") {
        rule.set_value_type(ValueType::Date, None);
    } else if header.contains("email") {
        rule.set_value_type(ValueType::Email, None);
    }
}

fn step_optional_marker(header: &str, rule: &mut ValidationRule) {
    if header.contains("optional") {
        rule.required = false;
    }
}

fn step_free_text_optional(header: &str, rule: &mut ValidationRule) {
    if rule.value_type == ValueType::Text && contains_any(header, OPTIONAL_TEXT_KEYWORDS) {
        rule.required = false;
    }
}

fn step_identifier(header: &str, rule: &mut ValidationRule) {
    if contains_any(header, IDENTIFIER_KEYWORDS) {
        rule.duplicate_policy = DuplicatePolicy::Strict;
        // Identifiers are usually system- or user-generated, not mandatory
        // at entry time.
        rule.required = false;
    }
}

fn step_explicit_markers(header: &str, rule: &mut ValidationRule) {
    if header.contains("(unique)") || header.contains("[strict]") {
        rule.duplicate_policy = DuplicatePolicy::Strict;
    } else if header.contains("(duplicate-warn)") || header.contains("[warn]") {
        rule.duplicate_policy = DuplicatePolicy::Warn;
    }
}

/// Inference pipeline, evaluated in order; later steps override earlier ones.
const INFERENCE_STEPS: &[InferenceStep] = &[
    InferenceStep { name: "value-type-keywords", apply: step_value_type },
    InferenceStep { name: "optional-marker", apply: step_optional_marker },
    InferenceStep { name: "free-text-optional", apply: step_free_text_optional },
    InferenceStep { name: "identifier", apply: step_identifier },
    InferenceStep { name: "explicit-markers", apply: step_explicit_markers },
];

/// Derives the validation rule for a column from its header text.
/// Pure and deterministic; matching is case-insensitive.
pub fn infer_rule(header: &str) -> ValidationRule {
    let lowered = header.to_lowercase();
    let mut rule = ValidationRule::default();
    for step in INFERENCE_STEPS {
        (step.apply)(&lowered, &mut rule);
        log::trace!("inference step '{}' on '{}': {:?}", step.name, header, rule);
    }
    rule
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRule {
    #[serde(flatten)]
    pub column: Column,
    #[serde(flatten)]
    pub rule: ValidationRule,
}

/// The full per-sheet rule set: one rule per column, in column order.
///
/// Rules are inferred once at load time and only change through explicit
/// override ([`RuleSet::set_required`] / [`RuleSet::set_duplicate_policy`])
/// or by editing a saved YAML rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub columns: Vec<ColumnRule>,
}

impl RuleSet {
    pub fn infer(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnRule {
                column: Column { name: name.clone(), position: idx + 1 },
                rule: infer_rule(name),
            })
            .collect();
        RuleSet { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn rule_at(&self, position: usize) -> Option<&ColumnRule> {
        self.columns.get(position.checked_sub(1)?)
    }

    fn rule_at_mut(&mut self, position: usize) -> Result<&mut ColumnRule> {
        let len = self.len();
        position
            .checked_sub(1)
            .and_then(|idx| self.columns.get_mut(idx))
            .ok_or_else(|| anyhow!("Column position {position} out of range (1..={len})"))
    }

    /// Replaces the inferred `required` flag; never recomputed afterwards.
    pub fn set_required(&mut self, position: usize, required: bool) -> Result<()> {
        self.rule_at_mut(position)?.rule.required = required;
        Ok(())
    }

    /// Replaces the inferred duplicate policy; never recomputed afterwards.
    pub fn set_duplicate_policy(&mut self, position: usize, policy: DuplicatePolicy) -> Result<()> {
        self.rule_at_mut(position)?.rule.duplicate_policy = policy;
        Ok(())
    }

    /// Checks a rules file against the headers of a freshly loaded sheet.
    pub fn ensure_matches(&self, headers: &[String]) -> Result<()> {
        ensure!(
            headers.len() == self.len(),
            "Rule set covers {} column(s) but sheet contains {}",
            self.len(),
            headers.len()
        );
        for (idx, entry) in self.columns.iter().enumerate() {
            let name = headers.get(idx).map(String::as_str).unwrap_or_default();
            ensure!(
                entry.column.name == name,
                "Column mismatch at position {}: rules expect '{}' but sheet has '{}'",
                idx + 1,
                entry.column.name,
                name
            );
        }
        Ok(())
    }

    /// Checks every per-column invariant plus the positional one: column
    /// positions must be exactly 1..=len in order, since the validator
    /// indexes the raw row with them. A hand-edited rules file is the usual
    /// way to break this.
    pub fn ensure_valid(&self) -> Result<()> {
        for (idx, entry) in self.columns.iter().enumerate() {
            ensure!(
                entry.column.position == idx + 1,
                "Column '{}' has position {} but occupies slot {}; positions must run 1..={}",
                entry.column.name,
                entry.column.position,
                idx + 1,
                self.len()
            );
            entry
                .rule
                .ensure_valid()
                .with_context(|| format!("Column '{}'", entry.column.name))?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.ensure_valid()?;
        let file =
            File::create(path).with_context(|| format!("Creating rules file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing rules YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening rules file {path:?}"))?;
        let reader = BufReader::new(file);
        let rules: RuleSet = serde_yaml::from_reader(reader).context("Parsing rules YAML")?;
        rules.ensure_valid()?;
        Ok(rules)
    }
}
