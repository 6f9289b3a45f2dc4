//! Per-user view state and view derivation.
//!
//! The view state is everything the operator has chosen about how the list
//! looks: which day, language, theme, filters, sort order, and which record
//! is waiting for delete confirmation. It is stored as JSON between
//! invocations, and the visible list is always recomputed from
//! (stored records) × (view state).

use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::departure::{Departure, TransportKind};
use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::schedule::{sort_departures, SortMode};

/// Colour scheme for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Dark text on a light background.
    #[default]
    Light,
    /// Light text on a dark background.
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Day navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStep {
    /// Back to today.
    Today,
    /// One day earlier.
    Previous,
    /// One day later.
    Next,
    /// A specific day.
    On(NaiveDate),
}

/// Operator choices carried between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// Selected service date; `None` follows today.
    pub day: Option<NaiveDate>,
    /// Display language.
    pub locale: Locale,
    /// Colour scheme.
    pub theme: Theme,
    /// Only show this transport kind.
    pub transport_filter: Option<TransportKind>,
    /// Only show this destination.
    pub destination_filter: Option<String>,
    /// List ordering.
    pub sort: SortMode,
    /// Record awaiting delete confirmation.
    pub pending_delete: Option<i64>,
}

impl ViewState {
    /// A fresh state with the configured locale and theme.
    #[must_use]
    pub fn with_defaults(locale: Locale, theme: Theme) -> Self {
        Self {
            locale,
            theme,
            ..Self::default()
        }
    }

    /// Load the state from `path`, or start from `fallback` if there is none.
    ///
    /// A corrupt state file is logged and replaced by `fallback` rather than
    /// blocking the operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path, fallback: Self) -> Result<Self> {
        if !path.exists() {
            return Ok(fallback);
        }
        let raw = std::fs::read_to_string(path)?;
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!("Ignoring unreadable view state at {}: {}", path.display(), e);
                Ok(fallback)
            }
        }
    }

    /// Persist the state to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved view state to {}", path.display());
        Ok(())
    }

    /// The service date being viewed.
    #[must_use]
    pub fn selected_day(&self, today: NaiveDate) -> NaiveDate {
        self.day.unwrap_or(today)
    }

    /// Move the selected day.
    ///
    /// Landing on today clears the selection so the view keeps following
    /// the calendar on later days.
    pub fn navigate(&mut self, step: DayStep, today: NaiveDate) {
        let current = self.selected_day(today);
        let target = match step {
            DayStep::Today => today,
            DayStep::Previous => current.pred_opt().unwrap_or(current),
            DayStep::Next => current.succ_opt().unwrap_or(current),
            DayStep::On(day) => day,
        };
        self.day = (target != today).then_some(target);
    }

    /// Drop both filters.
    pub fn clear_filters(&mut self) {
        self.transport_filter = None;
        self.destination_filter = None;
    }

    /// Check whether a record passes the active filters.
    #[must_use]
    pub fn matches(&self, departure: &Departure) -> bool {
        self.transport_filter
            .is_none_or(|kind| departure.transport == kind)
            && self
                .destination_filter
                .as_deref()
                .is_none_or(|dest| departure.destination_key().eq_ignore_ascii_case(dest))
    }
}

/// Derive the visible list from a day's records and the view state.
#[must_use]
pub fn derive_view(
    records: Vec<Departure>,
    state: &ViewState,
    now: NaiveDateTime,
) -> Vec<Departure> {
    let mut visible: Vec<Departure> = records.into_iter().filter(|d| state.matches(d)).collect();
    sort_departures(&mut visible, state.sort, now);
    visible
}

/// The current local wall-clock time.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
