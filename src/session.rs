//! The row mutation engine: a workbench over one loaded sheet that owns the
//! tabular store, the per-column rules, the display mirror, and the
//! Add/Edit state machine.
//!
//! The mode is data-driven: the workbench is in Edit exactly while an
//! [`EditSession`] is held, and falls back to Add when the session ends
//! (update applied, edit cancelled, or the edited row deleted).

use anyhow::{Context, Result, ensure};
use log::{debug, info};

use crate::{
    dedup::EditSession,
    rule::RuleSet,
    store::TabularStore,
    validate::{self, RowReport},
    value::display_row,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Edit,
}

/// One entry of the UI mirror: the display-string projection of a stored
/// row plus the store index it corresponds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRow {
    pub store_row_index: usize,
    pub display: Vec<String>,
}

/// Outcome of a warning-gated add/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Applied,
    /// The row carried duplicate warnings and the caller declined the
    /// confirmation; nothing was written and the dirty flag is untouched.
    Declined,
}

pub struct Workbench<S: TabularStore> {
    store: S,
    rules: RuleSet,
    mirror: Vec<MirrorRow>,
    session: Option<EditSession>,
    dirty: bool,
}

impl<S: TabularStore> Workbench<S> {
    /// Opens a sheet, inferring rules from its headers.
    pub fn open(store: S) -> Result<Self> {
        let headers = store.load_headers()?;
        let rules = RuleSet::infer(&headers);
        Self::with_rules(store, rules)
    }

    /// Opens a sheet with an explicit rule set (for example one loaded from
    /// a rules file carrying user overrides).
    pub fn with_rules(store: S, rules: RuleSet) -> Result<Self> {
        let headers = store.load_headers()?;
        rules.ensure_matches(&headers)?;
        rules.ensure_valid()?;
        let mirror = store
            .data_rows()?
            .into_iter()
            .enumerate()
            .map(|(idx, display)| MirrorRow { store_row_index: idx + 1, display })
            .collect();
        Ok(Workbench {
            store,
            rules,
            mirror,
            session: None,
            dirty: false,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    pub fn mirror(&self) -> &[MirrorRow] {
        &self.mirror
    }

    pub fn mode(&self) -> Mode {
        if self.session.is_some() { Mode::Edit } else { Mode::Add }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Validates a candidate row in the current mode.
    pub fn validate(&self, raw: &[String]) -> Result<RowReport> {
        validate::validate_row(raw, &self.rules, &self.store, self.session.as_ref())
    }

    /// Enters Edit mode on the given stored row and returns its current
    /// display values for the entry form.
    pub fn begin_edit(&mut self, store_row_index: usize) -> Result<Vec<String>> {
        let session = EditSession::capture(&self.store, store_row_index)?;
        let display = self
            .mirror
            .iter()
            .find(|row| row.store_row_index == store_row_index)
            .map(|row| row.display.clone())
            .with_context(|| format!("No mirror entry for row {store_row_index}"))?;
        debug!("Editing row {store_row_index}");
        self.session = Some(session);
        Ok(display)
    }

    pub fn cancel_edit(&mut self) {
        if self.session.take().is_some() {
            debug!("Edit cancelled, back to add mode");
        }
    }

    /// Appends a validated row. `confirm_duplicates` answers the modal
    /// duplicate-warning prompt; `false` (the fail-safe default) declines.
    pub fn add_row(&mut self, report: &RowReport, confirm_duplicates: bool) -> Result<RowOutcome> {
        ensure!(report.ok, "Cannot add a row with strict validation errors");
        if !report.warnings.is_empty() && !confirm_duplicates {
            info!("Add declined: {} duplicate warning(s)", report.warnings.len());
            return Ok(RowOutcome::Declined);
        }
        self.store.append_row(&report.normalized)?;
        self.mirror.push(MirrorRow {
            store_row_index: self.mirror.len() + 1,
            display: display_row(&report.normalized),
        });
        self.dirty = true;
        info!("Appended row {}", self.mirror.len());
        Ok(RowOutcome::Applied)
    }

    /// Overwrites the row under edit with a validated row and ends the edit
    /// session. Requires an active session.
    pub fn update_row(
        &mut self,
        report: &RowReport,
        confirm_duplicates: bool,
    ) -> Result<RowOutcome> {
        ensure!(report.ok, "Cannot update a row with strict validation errors");
        let index = self
            .session
            .as_ref()
            .context("No active edit session")?
            .store_row_index();
        if !report.warnings.is_empty() && !confirm_duplicates {
            info!("Update declined: {} duplicate warning(s)", report.warnings.len());
            return Ok(RowOutcome::Declined);
        }
        self.store.update_row(index, &report.normalized)?;
        if let Some(entry) = self
            .mirror
            .iter_mut()
            .find(|row| row.store_row_index == index)
        {
            entry.display = display_row(&report.normalized);
        }
        self.session = None;
        self.dirty = true;
        info!("Updated row {index}");
        Ok(RowOutcome::Applied)
    }

    /// Deletes a stored row; later rows shift down by one. Deleting the row
    /// under edit cancels the session.
    pub fn delete_row(&mut self, store_row_index: usize) -> Result<()> {
        self.store.delete_row(store_row_index)?;
        self.mirror
            .retain(|row| row.store_row_index != store_row_index);
        for row in &mut self.mirror {
            if row.store_row_index > store_row_index {
                row.store_row_index -= 1;
            }
        }
        match self.session.as_mut() {
            Some(session) if session.store_row_index() == store_row_index => {
                self.session = None;
                debug!("Deleted the row under edit, back to add mode");
            }
            Some(session) if session.store_row_index() > store_row_index => {
                session.shift_down();
            }
            _ => {}
        }
        self.dirty = true;
        info!("Deleted row {store_row_index}");
        Ok(())
    }

    /// Flushes the store. On failure the in-memory state (and the dirty
    /// flag) is kept so the caller can retry without losing edits.
    pub fn save(&mut self) -> Result<()> {
        self.store.persist()?;
        self.dirty = false;
        Ok(())
    }
}
