//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::departure::TransportKind;
use crate::export::ExportFormat;
use crate::i18n::Locale;
use crate::schedule::SortMode;
use crate::session::FormPatch;
use crate::validate::DepartureForm;
use crate::view::{DayStep, Theme};

/// Register a new departure.
///
/// Values are checked by the same validator as edits, so they are taken as
/// typed and any problems are reported together.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Unit number
    #[arg(short, long)]
    pub unit: String,

    /// Gate
    #[arg(short, long)]
    pub gate: String,

    /// Departure time (HH:MM, H:MM, HHMM)
    #[arg(short, long)]
    pub time: String,

    /// Transport kind (train/tog, car/bil)
    #[arg(short, long)]
    pub kind: String,

    /// Destination from the configured list
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Free-text comment
    #[arg(long)]
    pub comment: Option<String>,

    /// Service date (defaults to the selected day)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

impl AddCommand {
    /// The raw form for the validator.
    #[must_use]
    pub fn into_form(self) -> DepartureForm {
        DepartureForm {
            service_date: self.date.unwrap_or_default(),
            unit_number: self.unit,
            gate: self.gate,
            departure_time: self.time,
            transport: self.kind,
            destination: self.destination.unwrap_or_default(),
            comment: self.comment.unwrap_or_default(),
        }
    }
}

/// List arguments. Filters given here apply to this listing only.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Day to list instead of the selected day
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Only this transport kind
    #[arg(short, long, value_enum)]
    pub kind: Option<TransportKindArg>,

    /// Only this destination
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Ordering
    #[arg(short, long, value_enum)]
    pub sort: Option<SortModeArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Change fields of a stored departure.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Departure id
    pub id: i64,

    /// New unit number
    #[arg(short, long)]
    pub unit: Option<String>,

    /// New gate
    #[arg(short, long)]
    pub gate: Option<String>,

    /// New departure time
    #[arg(short, long)]
    pub time: Option<String>,

    /// New transport kind
    #[arg(short, long)]
    pub kind: Option<String>,

    /// New destination (empty string clears it)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// New comment (empty string clears it)
    #[arg(long)]
    pub comment: Option<String>,

    /// New service date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

impl EditCommand {
    /// Split into the id and the fields to overlay.
    #[must_use]
    pub fn into_patch(self) -> (i64, FormPatch) {
        (
            self.id,
            FormPatch {
                service_date: self.date,
                unit_number: self.unit,
                gate: self.gate,
                departure_time: self.time,
                transport: self.kind,
                destination: self.destination,
                comment: self.comment,
            },
        )
    }
}

/// Delete arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Departure id
    pub id: i64,

    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Export arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Document format
    #[arg(value_enum)]
    pub format: ExportFormatArg,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Day to export instead of the selected day
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

/// Filter arguments. The filter is saved and applies to later listings.
#[derive(Debug, Args)]
pub struct FilterCommand {
    /// Only this transport kind
    #[arg(short, long, value_enum)]
    pub kind: Option<TransportKindArg>,

    /// Only this destination
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Remove both filters
    #[arg(long, conflicts_with_all = ["kind", "destination"])]
    pub clear: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Parse `today`, `prev`, `next`, or a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns a message when the value is none of those.
pub fn parse_day_step(value: &str) -> Result<DayStep, String> {
    match value.trim().to_lowercase().as_str() {
        "today" | "idag" => Ok(DayStep::Today),
        "prev" | "previous" | "forrige" => Ok(DayStep::Previous),
        "next" | "neste" => Ok(DayStep::Next),
        other => other
            .parse::<NaiveDate>()
            .map(DayStep::On)
            .map_err(|_| format!("expected today, prev, next or YYYY-MM-DD, got '{value}'")),
    }
}

/// Transport kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKindArg {
    /// Train
    #[value(alias = "tog")]
    Train,
    /// Car
    #[value(alias = "bil")]
    Car,
}

impl From<TransportKindArg> for TransportKind {
    fn from(arg: TransportKindArg) -> Self {
        match arg {
            TransportKindArg::Train => Self::Train,
            TransportKindArg::Car => Self::Car,
        }
    }
}

/// Sort mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortModeArg {
    /// Next departure first
    Upcoming,
    /// Clock order
    Time,
    /// Unit number
    Unit,
    /// Destination, then time
    Destination,
}

impl From<SortModeArg> for SortMode {
    fn from(arg: SortModeArg) -> Self {
        match arg {
            SortModeArg::Upcoming => Self::Upcoming,
            SortModeArg::Time => Self::Time,
            SortModeArg::Unit => Self::Unit,
            SortModeArg::Destination => Self::Destination,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// Comma-separated values
    Csv,
    /// Excel workbook
    Xlsx,
    /// PDF document
    Pdf,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Xlsx => Self::Xlsx,
            ExportFormatArg::Pdf => Self::Pdf,
        }
    }
}

/// Language argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocaleArg {
    /// English
    En,
    /// Norwegian Bokmål
    #[value(alias = "no")]
    Nb,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => Self::En,
            LocaleArg::Nb => Self::Nb,
        }
    }
}

/// Theme argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    /// Light terminal background
    Light,
    /// Dark terminal background
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_step() {
        assert_eq!(parse_day_step("today"), Ok(DayStep::Today));
        assert_eq!(parse_day_step("Prev"), Ok(DayStep::Previous));
        assert_eq!(parse_day_step("neste"), Ok(DayStep::Next));
        assert_eq!(
            parse_day_step("2024-05-01"),
            Ok(DayStep::On(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
        assert!(parse_day_step("tomorrow").is_err());
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(TransportKind::from(TransportKindArg::Car), TransportKind::Car);
        assert_eq!(SortMode::from(SortModeArg::Destination), SortMode::Destination);
        assert_eq!(ExportFormat::from(ExportFormatArg::Pdf), ExportFormat::Pdf);
        assert_eq!(Locale::from(LocaleArg::Nb), Locale::Nb);
        assert_eq!(Theme::from(ThemeArg::Dark), Theme::Dark);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_add_into_form() {
        let cmd = AddCommand {
            unit: "AB12".to_string(),
            gate: "3".to_string(),
            time: "0805".to_string(),
            kind: "tog".to_string(),
            destination: None,
            comment: Some("late".to_string()),
            date: None,
        };
        let form = cmd.into_form();
        assert_eq!(form.unit_number, "AB12");
        assert_eq!(form.departure_time, "0805");
        assert!(form.service_date.is_empty());
        assert!(form.destination.is_empty());
        assert_eq!(form.comment, "late");
    }

    #[test]
    fn test_edit_into_patch() {
        let cmd = EditCommand {
            id: 4,
            unit: None,
            gate: Some("7".to_string()),
            time: None,
            kind: None,
            destination: Some(String::new()),
            comment: None,
            date: None,
        };
        let (id, patch) = cmd.into_patch();
        assert_eq!(id, 4);
        assert_eq!(patch.gate.as_deref(), Some("7"));
        assert_eq!(patch.destination.as_deref(), Some(""));
        assert!(patch.unit_number.is_none());
    }
}
