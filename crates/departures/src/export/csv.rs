//! Delimited-text format.
//!
//! The same layout is used for export, import, and the flat-file backend.
//! Older files with Norwegian headers and without identifier or service
//! date columns are still readable.

use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::departure::{format_time, parse_time, Departure, TransportKind, DATE_FORMAT};
use crate::error::{Error, Result};

/// Canonical column headers, in order.
pub const HEADERS: [&str; 9] = [
    "Identifier",
    "Service Date",
    "Unit Number",
    "Gate",
    "Departure Time",
    "Transport Type",
    "Destination",
    "Comment",
    "Created At",
];

/// One row as it appears in the file.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Identifier", alias = "ID", default)]
    id: Option<i64>,
    #[serde(rename = "Service Date", alias = "Dato", default)]
    service_date: Option<String>,
    #[serde(rename = "Unit Number", alias = "Enhetnummer")]
    unit_number: String,
    #[serde(rename = "Gate", alias = "Luke")]
    gate: String,
    #[serde(rename = "Departure Time", alias = "Avgangstid")]
    departure_time: String,
    #[serde(rename = "Transport Type", alias = "Transporttype")]
    transport: String,
    #[serde(rename = "Destination", alias = "Destinasjon", default)]
    destination: Option<String>,
    #[serde(rename = "Comment", alias = "Kommentar", default)]
    comment: Option<String>,
    #[serde(rename = "Created At", alias = "Opprettet", default)]
    created_at: Option<String>,
}

impl From<&Departure> for CsvRow {
    fn from(d: &Departure) -> Self {
        Self {
            id: d.id,
            service_date: Some(d.service_date.format(DATE_FORMAT).to_string()),
            unit_number: d.unit_number.clone(),
            gate: d.gate.clone(),
            departure_time: format_time(d.departure_time),
            transport: d.transport.to_string(),
            destination: d.destination.clone(),
            comment: d.comment.clone(),
            created_at: Some(d.created_at.to_rfc3339()),
        }
    }
}

/// Render departures as CSV bytes with the canonical header.
///
/// The header is written even when there are no records.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render(departures: &[Departure]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for departure in departures {
        writer.serialize(CsvRow::from(departure))?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Read departures from CSV.
///
/// Rows without an identifier get the next free id. Rows without a service
/// date are filed under the date of their creation timestamp, or
/// `fallback_day` when that is missing too.
///
/// # Errors
///
/// Returns an error if the input is not valid CSV or a row has an unreadable
/// time or transport kind.
pub fn parse<R: Read>(reader: R, fallback_day: NaiveDate) -> Result<Vec<Departure>> {
    let mut departures = parse_rows(reader, fallback_day)?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let mut next_id = departures.iter().filter_map(|d| d.id).max().unwrap_or(0);
    for departure in departures.iter_mut().filter(|d| d.id.is_none()) {
        next_id += 1;
        departure.id = Some(next_id);
    }

    debug!("Parsed {} departure rows", departures.len());
    Ok(departures)
}

/// Read CSV row by row, keeping one result per data row.
///
/// Unlike [`parse`], a bad row does not stop the read; its error is returned
/// in its place. Identifiers are not filled in.
///
/// # Errors
///
/// Returns an error if the header line cannot be read.
pub fn parse_rows<R: Read>(
    reader: R,
    fallback_day: NaiveDate,
) -> Result<Vec<Result<Departure>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Fields)
        .from_reader(reader);
    csv_reader.headers()?;

    let rows = csv_reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(index, row)| {
            // Line 1 is the header.
            let line = index as u64 + 2;
            row_to_departure(row?, line, fallback_day)
        })
        .collect();
    Ok(rows)
}

fn row_to_departure(row: CsvRow, line: u64, fallback_day: NaiveDate) -> Result<Departure> {
    let invalid = |message: String| Error::InvalidRecord { line, message };

    let created_at = row
        .created_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let service_date = match row.service_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| invalid(format!("invalid service date '{raw}'")))?,
        None => created_at.map_or(fallback_day, |dt| dt.date_naive()),
    };

    let departure_time = parse_time(&row.departure_time)
        .ok_or_else(|| invalid(format!("invalid time '{}'", row.departure_time)))?;
    let transport = row
        .transport
        .parse::<TransportKind>()
        .map_err(invalid)?;

    Ok(Departure {
        id: row.id,
        service_date,
        unit_number: row.unit_number,
        gate: row.gate,
        departure_time,
        transport,
        destination: row.destination.filter(|d| !d.is_empty()),
        comment: row.comment.filter(|c| !c.is_empty()),
        created_at: created_at.unwrap_or_else(Utc::now),
    })
}
