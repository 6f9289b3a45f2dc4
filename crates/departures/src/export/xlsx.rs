//! Excel workbook export.

use rust_xlsxwriter::{Format, Workbook};

use super::csv::HEADERS;
use crate::departure::{Departure, DATE_FORMAT};
use crate::error::{Error, Result};

/// Name of the only worksheet.
pub const SHEET_NAME: &str = "Departures";

/// Column widths in characters, matching [`HEADERS`].
const COLUMN_WIDTHS: [f64; 9] = [10.0, 12.0, 14.0, 6.0, 14.0, 14.0, 16.0, 30.0, 26.0];

/// Render departures as a single-sheet workbook with a bold header row.
///
/// # Errors
///
/// Returns an error if the workbook cannot be assembled.
pub fn render(departures: &[Departure]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_freeze_panes(1, 0)?;

    for (col, (title, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = column(col)?;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, width)?;
    }

    for (index, departure) in departures.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| Error::export("too many rows for XLSX"))?;
        for (col, value) in cells(departure).iter().enumerate() {
            sheet.write_string(row, column(col)?, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| Error::export("too many columns for XLSX"))
}

fn cells(d: &Departure) -> [String; 9] {
    [
        d.id.map(|id| id.to_string()).unwrap_or_default(),
        d.service_date.format(DATE_FORMAT).to_string(),
        d.unit_number.clone(),
        d.gate.clone(),
        d.time_label(),
        d.transport.to_string(),
        d.destination.clone().unwrap_or_default(),
        d.comment.clone().unwrap_or_default(),
        d.created_at.to_rfc3339(),
    ]
}
