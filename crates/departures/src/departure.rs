//! Core departure types.
//!
//! This module defines the departure record, the closed set of transport
//! kinds, and the canonical `HH:MM` time format shared by storage and export.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical time format for departure times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Canonical date format for service dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts `H:MM`, `HH:MM`, `HH:MM:SS` and `HHMM`.
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{1,2}):(\d{2})(?::\d{2})?|(\d{2})(\d{2}))$")
        .expect("valid time pattern")
});

/// How a unit leaves the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportKind {
    /// Rail departure.
    Train,
    /// Road departure.
    Car,
}

impl TransportKind {
    /// All transport kinds, in display order.
    pub const ALL: [TransportKind; 2] = [Self::Train, Self::Car];

    /// Canonical English name, as stored.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Car => "Car",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    /// Parses the English names and the legacy Norwegian `Tog`/`Bil`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" | "tog" => Ok(Self::Train),
            "car" | "bil" => Ok(Self::Car),
            other => Err(format!("unknown transport kind: {other}")),
        }
    }
}

/// A validated departure that has not been stored yet.
///
/// Produced by [`crate::validate::validate`]; every field is already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureDraft {
    /// Day the departure is filed under.
    pub service_date: NaiveDate,
    /// Vehicle or unit identifier.
    pub unit_number: String,
    /// Station gate label.
    pub gate: String,
    /// Scheduled departure time, minute precision.
    pub departure_time: NaiveTime,
    /// Transport kind.
    pub transport: TransportKind,
    /// Destination from the configured list, if any.
    pub destination: Option<String>,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl DepartureDraft {
    /// Destination as it takes part in the uniqueness key.
    #[must_use]
    pub fn destination_key(&self) -> &str {
        self.destination.as_deref().unwrap_or("")
    }
}

/// A stored departure record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Identifier assigned by the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Day the departure is filed under.
    pub service_date: NaiveDate,
    /// Vehicle or unit identifier.
    pub unit_number: String,
    /// Station gate label.
    pub gate: String,
    /// Scheduled departure time.
    #[serde(with = "hhmm")]
    pub departure_time: NaiveTime,
    /// Transport kind.
    pub transport: TransportKind,
    /// Destination, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Free-text comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the record was first registered.
    pub created_at: DateTime<Utc>,
}

impl Departure {
    /// Build a stored record from a draft.
    #[must_use]
    pub fn from_draft(id: i64, draft: DepartureDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            service_date: draft.service_date,
            unit_number: draft.unit_number,
            gate: draft.gate,
            departure_time: draft.departure_time,
            transport: draft.transport,
            destination: draft.destination,
            comment: draft.comment,
            created_at,
        }
    }

    /// The editable fields of this record.
    #[must_use]
    pub fn to_draft(&self) -> DepartureDraft {
        DepartureDraft {
            service_date: self.service_date,
            unit_number: self.unit_number.clone(),
            gate: self.gate.clone(),
            departure_time: self.departure_time,
            transport: self.transport,
            destination: self.destination.clone(),
            comment: self.comment.clone(),
        }
    }

    /// Destination as it takes part in the uniqueness key.
    #[must_use]
    pub fn destination_key(&self) -> &str {
        self.destination.as_deref().unwrap_or("")
    }

    /// Departure time as `HH:MM`.
    #[must_use]
    pub fn time_label(&self) -> String {
        format_time(self.departure_time)
    }
}

/// Parse a clock time into minute precision.
///
/// Returns `None` for anything that is not a valid 24-hour time.
#[must_use]
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let caps = TIME_PATTERN.captures(input.trim())?;
    let (hour, minute) = match (caps.get(1), caps.get(2)) {
        (Some(h), Some(m)) => (h.as_str(), m.as_str()),
        _ => (caps.get(3)?.as_str(), caps.get(4)?.as_str()),
    };
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Format a time as zero-padded `HH:MM`.
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter storing times as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DepartureDraft {
        DepartureDraft {
            service_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            unit_number: "AB12".to_string(),
            gate: "3".to_string(),
            departure_time: NaiveTime::from_hms_opt(8, 5, 0).unwrap(),
            transport: TransportKind::Train,
            destination: Some("Molde".to_string()),
            comment: None,
        }
    }

    #[test]
    fn test_parse_time_variants() {
        let expected = NaiveTime::from_hms_opt(8, 5, 0);
        assert_eq!(parse_time("08:05"), expected);
        assert_eq!(parse_time("8:05"), expected);
        assert_eq!(parse_time("08:05:59"), expected);
        assert_eq!(parse_time("0805"), expected);
        assert_eq!(parse_time(" 08:05 "), expected);
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("").is_none());
        assert!(parse_time("24:00").is_none());
        assert!(parse_time("12:60").is_none());
        assert!(parse_time("noon").is_none());
        assert!(parse_time("8:5").is_none());
    }

    #[test]
    fn test_format_time_zero_padded() {
        let time = NaiveTime::from_hms_opt(7, 3, 0).unwrap();
        assert_eq!(format_time(time), "07:03");
    }

    #[test]
    fn test_transport_kind_parse() {
        assert_eq!("Train".parse::<TransportKind>(), Ok(TransportKind::Train));
        assert_eq!("car".parse::<TransportKind>(), Ok(TransportKind::Car));
        assert_eq!("Tog".parse::<TransportKind>(), Ok(TransportKind::Train));
        assert_eq!("BIL".parse::<TransportKind>(), Ok(TransportKind::Car));
        assert!("boat".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_transport_kind_display() {
        assert_eq!(TransportKind::Train.to_string(), "Train");
        assert_eq!(TransportKind::Car.to_string(), "Car");
    }

    #[test]
    fn test_draft_round_trip() {
        let created = Utc::now();
        let departure = Departure::from_draft(5, draft(), created);
        assert_eq!(departure.id, Some(5));
        assert_eq!(departure.created_at, created);
        assert_eq!(departure.to_draft(), draft());
        assert_eq!(departure.time_label(), "08:05");
    }

    #[test]
    fn test_destination_key_empty() {
        let mut d = draft();
        d.destination = None;
        assert_eq!(d.destination_key(), "");
    }

    #[test]
    fn test_departure_json_uses_hhmm() {
        let departure = Departure::from_draft(1, draft(), Utc::now());
        let json = serde_json::to_string(&departure).unwrap();
        assert!(json.contains(r#""departure_time":"08:05""#));
        let back: Departure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, departure);
    }
}
