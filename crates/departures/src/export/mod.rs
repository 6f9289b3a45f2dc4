//! Export renderers.
//!
//! Every renderer is a pure function from the visible list to bytes. The
//! XLSX and PDF renderers sit behind the `xlsx` and `pdf` cargo features;
//! with a feature compiled out that format reports
//! [`Error::ExportUnavailable`] while the others keep working.
//!
//! [`Error::ExportUnavailable`]: crate::error::Error::ExportUnavailable

pub mod csv;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "xlsx")]
pub mod xlsx;

use chrono::NaiveDate;
use tracing::debug;

use crate::departure::Departure;
use crate::error::Result;
use crate::i18n::Locale;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbook.
    Xlsx,
    /// Printable PDF.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    /// Whether this build can render the format.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Csv => true,
            Self::Xlsx => cfg!(feature = "xlsx"),
            Self::Pdf => cfg!(feature = "pdf"),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Csv => "CSV",
            Self::Xlsx => "XLSX",
            Self::Pdf => "PDF",
        })
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// What the document is about, for titles and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportContext {
    /// The service date being exported.
    pub day: NaiveDate,
    /// Language for headings in the PDF.
    pub locale: Locale,
}

/// Suggested file name for an export of `day`.
#[must_use]
pub fn default_file_name(format: ExportFormat, day: NaiveDate) -> String {
    format!("departures-{day}.{}", format.extension())
}

/// Render `departures` in the requested format.
///
/// # Errors
///
/// Returns [`Error::ExportUnavailable`](crate::error::Error::ExportUnavailable)
/// when the format was compiled out, or an error from the renderer.
#[cfg_attr(not(all(feature = "xlsx", feature = "pdf")), allow(unused_variables))]
pub fn render(
    format: ExportFormat,
    departures: &[Departure],
    context: &ExportContext,
) -> Result<Vec<u8>> {
    debug!("Rendering {} departures as {}", departures.len(), format);
    match format {
        ExportFormat::Csv => csv::render(departures),
        #[cfg(feature = "xlsx")]
        ExportFormat::Xlsx => xlsx::render(departures),
        #[cfg(not(feature = "xlsx"))]
        ExportFormat::Xlsx => Err(crate::error::Error::ExportUnavailable { format: "XLSX" }),
        #[cfg(feature = "pdf")]
        ExportFormat::Pdf => pdf::render(departures, context),
        #[cfg(not(feature = "pdf"))]
        ExportFormat::Pdf => Err(crate::error::Error::ExportUnavailable { format: "PDF" }),
    }
}
