//! One request/response cycle against the register.
//!
//! A [`Session`] ties a store, the validation rules and the persisted view
//! state together. Each CLI invocation opens one, performs a single
//! operation, and saves the view state back.

use std::io::Read;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::departure::{Departure, TransportKind};
use crate::error::{Error, Result};
use crate::export::{self, ExportContext, ExportFormat};
use crate::storage::{open_store, DepartureStore};
use crate::validate::{validate, DepartureForm, ValidationRules};
use crate::view::{derive_view, local_now, DayStep, ViewState};

/// Fields given on the command line for an edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPatch {
    /// New service date.
    pub service_date: Option<String>,
    /// New unit number.
    pub unit_number: Option<String>,
    /// New gate.
    pub gate: Option<String>,
    /// New departure time.
    pub departure_time: Option<String>,
    /// New transport kind.
    pub transport: Option<String>,
    /// New destination; an empty string clears it.
    pub destination: Option<String>,
    /// New comment; an empty string clears it.
    pub comment: Option<String>,
}

impl FormPatch {
    /// Overlay the given fields on `form`.
    pub fn apply(self, form: &mut DepartureForm) {
        let overlay = |slot: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *slot = value;
            }
        };
        overlay(&mut form.service_date, self.service_date);
        overlay(&mut form.unit_number, self.unit_number);
        overlay(&mut form.gate, self.gate);
        overlay(&mut form.departure_time, self.departure_time);
        overlay(&mut form.transport, self.transport);
        overlay(&mut form.destination, self.destination);
        overlay(&mut form.comment, self.comment);
    }

    /// Whether no field was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record is marked and waits for confirmation.
    Pending(Departure),
    /// The record was removed.
    Deleted(i64),
    /// There was nothing left to remove.
    AlreadyGone(i64),
}

/// Counts of one day's departures per transport kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    /// The day counted.
    pub day: NaiveDate,
    /// One entry per transport kind, in [`TransportKind::ALL`] order.
    pub counts: Vec<(TransportKind, usize)>,
}

impl DaySummary {
    /// Departures of all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Outcome of loading a flat file into the active store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows stored.
    pub inserted: usize,
    /// Rows skipped because the triple was already taken.
    pub duplicates: usize,
    /// Rows skipped because they failed validation.
    pub invalid: usize,
}

/// The store, rules, and view state for one invocation.
#[derive(Debug)]
pub struct Session {
    store: Box<dyn DepartureStore>,
    rules: ValidationRules,
    state: ViewState,
    state_path: Option<PathBuf>,
    now: NaiveDateTime,
}

impl Session {
    /// Open the configured store and load the saved view state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the state file
    /// cannot be read.
    pub fn open(config: &Config) -> Result<Self> {
        let store = open_store(config)?;
        let state_path = config.view_state_path();
        let state = ViewState::load(&state_path, config.initial_view_state())?;
        debug!("Loaded view state from {}", state_path.display());

        let mut session = Self::new(store, config.validation_rules(), state);
        session.state_path = Some(state_path);
        Ok(session)
    }

    /// A session over an existing store whose view state is not persisted.
    #[must_use]
    pub fn new(store: Box<dyn DepartureStore>, rules: ValidationRules, state: ViewState) -> Self {
        Self {
            store,
            rules,
            state,
            state_path: None,
            now: local_now(),
        }
    }

    /// Pin the wall clock used for "today" and the upcoming sort.
    #[must_use]
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &dyn DepartureStore {
        self.store.as_ref()
    }

    /// The current view state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Mutable access to the view state.
    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    /// The wall clock of this session.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// The day being viewed.
    #[must_use]
    pub fn selected_day(&self) -> NaiveDate {
        self.state.selected_day(self.now.date())
    }

    /// Move the selected day.
    pub fn navigate(&mut self, step: DayStep) {
        self.state.navigate(step, self.now.date());
        debug!("Selected day is now {}", self.selected_day());
    }

    /// Validate a form and store it.
    ///
    /// An empty service date files the departure under the selected day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::Duplicate`] when the
    /// submission is rejected, or a storage error.
    pub fn register(&self, mut form: DepartureForm) -> Result<Departure> {
        if form.service_date.trim().is_empty() {
            form.service_date = self.selected_day().to_string();
        }
        let draft = validate(&form, &self.rules).inspect_err(|errors| {
            warn!("Rejected departure: {}", errors);
        })?;
        self.store.insert(&draft)
    }

    /// Change a stored departure.
    ///
    /// The form starts from the stored record, so fields not in `patch` keep
    /// their values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or the same errors as
    /// [`Session::register`].
    pub fn edit(&self, id: i64, patch: FormPatch) -> Result<Departure> {
        let stored = self.get(id)?;
        let mut form = DepartureForm::from_departure(&stored);
        patch.apply(&mut form);
        let draft = validate(&form, &self.rules).inspect_err(|errors| {
            warn!("Rejected edit of departure {}: {}", id, errors);
        })?;
        if draft == stored.to_draft() {
            debug!("Edit of departure {} changes nothing", id);
            return Ok(stored);
        }
        self.store.update(id, &draft)
    }

    /// A stored departure, or [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a storage error.
    pub fn get(&self, id: i64) -> Result<Departure> {
        self.store.get(id)?.ok_or(Error::NotFound(id))
    }

    /// Delete departure `id`, or mark it for confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when marking an unknown id, or a storage
    /// error.
    pub fn delete(&mut self, id: i64, confirmed: bool) -> Result<DeleteOutcome> {
        if !confirmed {
            let stored = self.get(id)?;
            self.state.pending_delete = Some(id);
            info!("Departure {} awaits delete confirmation", id);
            return Ok(DeleteOutcome::Pending(stored));
        }

        if self.state.pending_delete == Some(id) {
            self.state.pending_delete = None;
        }
        if self.store.delete(id)? {
            Ok(DeleteOutcome::Deleted(id))
        } else {
            Ok(DeleteOutcome::AlreadyGone(id))
        }
    }

    /// Carry out the pending delete, if there is one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn confirm(&mut self) -> Result<Option<DeleteOutcome>> {
        match self.state.pending_delete {
            Some(id) => self.delete(id, true).map(Some),
            None => Ok(None),
        }
    }

    /// Drop the pending delete, returning the id that was pending.
    pub fn cancel(&mut self) -> Option<i64> {
        let cancelled = self.state.pending_delete.take();
        if let Some(id) = cancelled {
            info!("Cancelled pending delete of departure {}", id);
        }
        cancelled
    }

    /// The visible list for the selected day under the saved view state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the day cannot be read.
    pub fn view(&self) -> Result<Vec<Departure>> {
        self.view_with(&self.state, None)
    }

    /// The visible list under `state`, for `day` or the selected day.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the day cannot be read.
    pub fn view_with(&self, state: &ViewState, day: Option<NaiveDate>) -> Result<Vec<Departure>> {
        let day = day.unwrap_or_else(|| state.selected_day(self.now.date()));
        let records = self.store.list_by_day(day)?;
        Ok(derive_view(records, state, self.now))
    }

    /// Counts per transport kind for `day`, or the selected day.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the counts cannot be read.
    pub fn summary(&self, day: Option<NaiveDate>) -> Result<DaySummary> {
        let day = day.unwrap_or_else(|| self.selected_day());
        let counts = TransportKind::ALL
            .iter()
            .map(|&kind| Ok((kind, self.store.count_by_day_and_kind(day, kind)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(DaySummary { day, counts })
    }

    /// Service dates that have departures, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the dates cannot be read.
    pub fn days(&self) -> Result<Vec<NaiveDate>> {
        self.store.days()
    }

    /// Load a flat file into the store.
    ///
    /// Every row goes through the same validation as a typed form. Rows that
    /// cannot be read or fail validation count as invalid, rows that collide
    /// with a stored departure count as duplicates, and the rest is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the header or the underlying reader fails, or a
    /// row cannot be stored for a reason other than a collision.
    pub fn import(&self, reader: impl Read) -> Result<ImportReport> {
        let rows = export::csv::parse_rows(reader, self.selected_day())?;
        let mut report = ImportReport::default();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(Error::Csv(e)) if e.is_io_error() => return Err(Error::Csv(e)),
                Err(e) => {
                    warn!("Skipping unreadable imported row: {}", e);
                    report.invalid += 1;
                    continue;
                }
            };
            let draft = match validate(&DepartureForm::from_departure(&row), &self.rules) {
                Ok(draft) => draft,
                Err(errors) => {
                    warn!("Skipping imported unit {}: {}", row.unit_number, errors);
                    report.invalid += 1;
                    continue;
                }
            };
            match self.store.insert(&draft) {
                Ok(_) => report.inserted += 1,
                Err(e) if e.is_duplicate() => {
                    debug!("Skipping duplicate imported unit {}", draft.unit_number);
                    report.duplicates += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Imported {} departures ({} duplicates, {} invalid)",
            report.inserted, report.duplicates, report.invalid
        );
        Ok(report)
    }

    /// Render the visible list for `day`, or the selected day.
    ///
    /// # Errors
    ///
    /// Returns an error if the day cannot be read or the format cannot be
    /// rendered.
    pub fn export(&self, format: ExportFormat, day: Option<NaiveDate>) -> Result<Vec<u8>> {
        let day = day.unwrap_or_else(|| self.selected_day());
        let records = self.view_with(&self.state, Some(day))?;
        let context = ExportContext {
            day,
            locale: self.state.locale,
        };
        export::render(format, &records, &context)
    }

    /// Write the view state back to disk, if this session has a state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save_state(&self) -> Result<()> {
        match &self.state_path {
            Some(path) => self.state.save(path),
            None => Ok(()),
        }
    }
}
