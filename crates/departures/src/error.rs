//! Error types for departures.
//!
//! This module defines all error types used throughout the departures crate.
//! User errors (validation, duplicates, unknown ids) are kept apart from
//! storage and configuration faults so the CLI can report them differently.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::validate::ValidationErrors;

/// The main error type for departures operations.
#[derive(Error, Debug)]
pub enum Error {
    // === User Errors ===
    /// The submitted form did not pass validation.
    #[error("invalid departure: {0}")]
    Validation(ValidationErrors),

    /// Another departure already uses this (unit, time, destination) triple on the same day.
    #[error(
        "duplicate departure on {service_date}: unit {unit_number} at {} to '{destination}'",
        .departure_time.format("%H:%M")
    )]
    Duplicate {
        /// Service date of the collision.
        service_date: NaiveDate,
        /// Unit number of the collision.
        unit_number: String,
        /// Departure time of the collision.
        departure_time: NaiveTime,
        /// Destination of the collision (empty when none).
        destination: String,
    },

    /// No departure exists with the given identifier.
    #[error("departure {0} not found")]
    NotFound(i64),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading or writing delimited text failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row in a flat file could not be turned into a departure.
    #[error("invalid record on line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number in the file.
        line: u64,
        /// What was wrong with the row.
        message: String,
    },

    /// The advisory lock on the flat file could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Path of the lock file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Export Errors ===
    /// The requested export format was compiled out.
    #[error("{format} export is not available in this build")]
    ExportUnavailable {
        /// Name of the disabled format.
        format: &'static str,
    },

    /// A renderer failed to produce output.
    #[error("export failed: {0}")]
    Export(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for departures operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(err.to_string())
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new export error.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Check if this error is a uniqueness violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error was caused by operator input rather than a fault.
    ///
    /// User errors are reported as warnings and leave the store untouched.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Duplicate { .. } | Self::NotFound(_)
        )
    }
}
