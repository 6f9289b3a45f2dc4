//! Fixed user-facing texts in English and Norwegian Bokmål.

use serde::{Deserialize, Serialize};

use crate::departure::TransportKind;
use crate::validate::{Field, ValidationIssue};

/// Display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Norwegian Bokmål.
    Nb,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "nb" | "no" | "norsk" => Ok(Self::Nb),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// A translatable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    /// Page title.
    Title,
    /// Column: identifier.
    Id,
    /// Column: service date.
    Date,
    /// Column: unit number.
    Unit,
    /// Column: gate.
    Gate,
    /// Column: departure time.
    Time,
    /// Column: transport kind.
    Transport,
    /// Column: destination.
    Destination,
    /// Column: comment.
    Comment,
    /// Column: created-at.
    CreatedAt,
    /// A departure was stored.
    Registered,
    /// A departure was changed.
    Updated,
    /// A departure was removed.
    Deleted,
    /// The list is empty.
    NoDepartures,
    /// Uniqueness violation.
    DuplicateWarning,
    /// The form was rejected.
    FixFields,
    /// Unknown id.
    NotFound,
    /// Delete requires confirmation.
    ConfirmDelete,
    /// Nothing is waiting for confirmation.
    NothingPending,
    /// Pending delete dropped.
    Cancelled,
    /// Import: rows skipped as duplicates.
    DuplicatesSkipped,
    /// Import: rows skipped as invalid.
    InvalidSkipped,
    /// Storage failed.
    StorageFailure,
}

impl Text {
    /// The text in the given locale.
    #[must_use]
    pub fn get(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en(),
            Locale::Nb => self.nb(),
        }
    }

    fn en(self) -> &'static str {
        match self {
            Self::Title => "Departure register",
            Self::Id => "ID",
            Self::Date => "Date",
            Self::Unit => "Unit number",
            Self::Gate => "Gate",
            Self::Time => "Departure time",
            Self::Transport => "Transport type",
            Self::Destination => "Destination",
            Self::Comment => "Comment",
            Self::CreatedAt => "Created at",
            Self::Registered => "Departure registered",
            Self::Updated => "Departure updated",
            Self::Deleted => "Departure deleted",
            Self::NoDepartures => "No departures registered yet.",
            Self::DuplicateWarning => {
                "A departure with this unit, time and destination already exists for this day"
            }
            Self::FixFields => "Please correct the following",
            Self::NotFound => "No departure with that ID",
            Self::ConfirmDelete => "Run again with --yes (or `confirm`) to delete departure",
            Self::NothingPending => "Nothing is waiting for confirmation",
            Self::Cancelled => "Pending delete cancelled",
            Self::DuplicatesSkipped => "duplicates skipped",
            Self::InvalidSkipped => "invalid rows skipped",
            Self::StorageFailure => "Could not save changes",
        }
    }

    fn nb(self) -> &'static str {
        match self {
            Self::Title => "Destinasjonsregistrering",
            Self::Id => "ID",
            Self::Date => "Dato",
            Self::Unit => "Enhetnummer",
            Self::Gate => "Luke",
            Self::Time => "Avgangstid",
            Self::Transport => "Transporttype",
            Self::Destination => "Destinasjon",
            Self::Comment => "Kommentar",
            Self::CreatedAt => "Opprettet",
            Self::Registered => "Avgang registrert",
            Self::Updated => "Avgang oppdatert",
            Self::Deleted => "Avgang slettet",
            Self::NoDepartures => "Ingen avganger registrert ennå.",
            Self::DuplicateWarning => {
                "En avgang med denne enheten, tiden og destinasjonen finnes allerede denne dagen"
            }
            Self::FixFields => "Vennligst rett følgende",
            Self::NotFound => "Ingen avgang med denne ID-en",
            Self::ConfirmDelete => "Kjør igjen med --yes (eller `confirm`) for å slette avgang",
            Self::NothingPending => "Ingenting venter på bekreftelse",
            Self::Cancelled => "Sletting avbrutt",
            Self::DuplicatesSkipped => "duplikater hoppet over",
            Self::InvalidSkipped => "ugyldige rader hoppet over",
            Self::StorageFailure => "Kunne ikke lagre endringene",
        }
    }
}

/// Localized name of a transport kind.
#[must_use]
pub fn transport_label(kind: TransportKind, locale: Locale) -> &'static str {
    match (kind, locale) {
        (TransportKind::Train, Locale::En) => "Train",
        (TransportKind::Car, Locale::En) => "Car",
        (TransportKind::Train, Locale::Nb) => "Tog",
        (TransportKind::Car, Locale::Nb) => "Bil",
    }
}

/// Localized description of one validation issue.
#[must_use]
pub fn issue_message(issue: &ValidationIssue, locale: Locale) -> String {
    match locale {
        Locale::En => issue.to_string(),
        Locale::Nb => match issue {
            ValidationIssue::Missing(field) => {
                format!("{} må fylles ut", field_label(*field, locale))
            }
            ValidationIssue::GateNotNumeric(gate) => format!("Luke må være et tall: '{gate}'"),
            ValidationIssue::GateTooLarge(gate) => format!("Lukenummeret er for stort: '{gate}'"),
            ValidationIssue::InvalidTime(time) => format!("Ugyldig tid: '{time}'"),
            ValidationIssue::UnknownTransport(kind) => format!("Ukjent transporttype: '{kind}'"),
            ValidationIssue::UnknownDestination(dest) => format!("Ukjent destinasjon: '{dest}'"),
        },
    }
}

fn field_label(field: Field, locale: Locale) -> &'static str {
    let text = match field {
        Field::ServiceDate => Text::Date,
        Field::UnitNumber => Text::Unit,
        Field::Gate => Text::Gate,
        Field::DepartureTime => Text::Time,
        Field::Transport => Text::Transport,
        Field::Destination => Text::Destination,
    };
    text.get(locale)
}
