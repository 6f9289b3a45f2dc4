//! Ordering of departures within a day.
//!
//! The default ordering is "upcoming first": on today's list, departures
//! whose time has already passed roll over to tomorrow and sink to the end.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::departure::{parse_time, Departure};

/// How the departure list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Next departure first; passed departures today roll to the end.
    #[default]
    Upcoming,
    /// Plain clock order.
    Time,
    /// By unit number.
    Unit,
    /// By destination, then time.
    Destination,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Time => write!(f, "time"),
            Self::Unit => write!(f, "unit"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// Compute the comparable instant for a departure time on `reference_day`.
///
/// When `reference_day` is today and the instant is already behind `now`,
/// it is moved forward one day. Unparseable times map to
/// [`NaiveDateTime::MAX`] so they sort last.
#[must_use]
pub fn sort_key(time: &str, reference_day: NaiveDate, now: NaiveDateTime) -> NaiveDateTime {
    let Some(time) = parse_time(time) else {
        return NaiveDateTime::MAX;
    };
    let instant = reference_day.and_time(time);
    if reference_day == now.date() && instant < now {
        instant + Duration::days(1)
    } else {
        instant
    }
}

/// Order `departures` in place according to `mode`.
///
/// Ties are broken by id so the order is stable across invocations.
pub fn sort_departures(departures: &mut [Departure], mode: SortMode, now: NaiveDateTime) {
    departures.sort_by(|a, b| compare(a, b, mode, now).then_with(|| a.id.cmp(&b.id)));
}

fn compare(a: &Departure, b: &Departure, mode: SortMode, now: NaiveDateTime) -> Ordering {
    match mode {
        SortMode::Upcoming => {
            let key_a = sort_key(&a.time_label(), a.service_date, now);
            let key_b = sort_key(&b.time_label(), b.service_date, now);
            key_a.cmp(&key_b)
        }
        SortMode::Time => a.departure_time.cmp(&b.departure_time),
        SortMode::Unit => a
            .unit_number
            .to_lowercase()
            .cmp(&b.unit_number.to_lowercase()),
        SortMode::Destination => a
            .destination_key()
            .cmp(b.destination_key())
            .then_with(|| a.departure_time.cmp(&b.departure_time)),
    }
}
