//! Printable PDF export.
//!
//! A plain monospaced listing on A4: a title with the service date, a header
//! line, and one line per departure. Overlong lines are cut with `...` and
//! the listing continues on a new page when the current one is full.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use super::ExportContext;
use crate::departure::Departure;
use crate::error::Result;
use crate::i18n::{transport_label, Locale, Text};

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.0;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 842.0;
/// Margin on every side.
pub const MARGIN: f32 = 40.0;
/// Font size in points.
pub const FONT_SIZE: f32 = 10.0;
/// Distance between baselines.
pub const LINE_HEIGHT: f32 = 14.0;

/// Lines that fit between the top and bottom margins.
pub const LINES_PER_PAGE: usize = 54;
/// Characters that fit between the left and right margins.
pub const MAX_CHARS: usize = 85;

const FONT_NAME: Name<'static> = Name(b"F1");

/// (width, label) per column; the comment takes what is left.
const COLUMNS: [(usize, Text); 6] = [
    (5, Text::Id),
    (11, Text::Time),
    (12, Text::Unit),
    (6, Text::Gate),
    (15, Text::Transport),
    (14, Text::Destination),
];

/// Render departures as an A4 PDF document.
///
/// # Errors
///
/// Currently infallible; the signature matches the other renderers.
pub fn render(departures: &[Departure], context: &ExportContext) -> Result<Vec<u8>> {
    let lines = listing(departures, context);
    let pages = paginate(&lines, LINES_PER_PAGE);

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let page_ids: Vec<Ref> = (0..pages.len()).map(|i| page_ref(i, 0)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(i32::try_from(pages.len()).unwrap_or(i32::MAX));
    pdf.type1_font(font_id)
        .base_font(Name(b"Courier"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (index, page_lines) in pages.iter().enumerate() {
        let page_id = page_ref(index, 0);
        let content_id = page_ref(index, 1);

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources().fonts().pair(FONT_NAME, font_id);
        page.finish();

        pdf.stream(content_id, &page_content(page_lines));
    }

    Ok(pdf.finish())
}

/// Pages and their content streams take two ids each after the fixed three.
fn page_ref(index: usize, offset: i32) -> Ref {
    let base = i32::try_from(index).unwrap_or(i32::MAX / 2 - 4);
    Ref::new(4 + base * 2 + offset)
}

fn page_content(lines: &[String]) -> Vec<u8> {
    let mut content = Content::new();
    let mut y = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    for line in lines {
        if !line.is_empty() {
            content.begin_text();
            content.set_font(FONT_NAME, FONT_SIZE);
            content.next_line(MARGIN, y);
            content.show(Str(&win_ansi(line)));
            content.end_text();
        }
        y -= LINE_HEIGHT;
    }
    content.finish()
}

/// All lines of the document, before pagination.
fn listing(departures: &[Departure], context: &ExportContext) -> Vec<String> {
    let locale = context.locale;
    let mut lines = vec![
        truncate(
            &format!(
                "{} - {}: {}",
                Text::Title.get(locale),
                Text::Date.get(locale),
                context.day
            ),
            MAX_CHARS,
        ),
        String::new(),
    ];

    let labels: Vec<&str> = COLUMNS.iter().map(|(_, text)| text.get(locale)).collect();
    lines.push(format_line(&labels, Text::Comment.get(locale)));
    lines.push("-".repeat(MAX_CHARS));

    if departures.is_empty() {
        lines.push(Text::NoDepartures.get(locale).to_string());
    }
    lines.extend(departures.iter().map(|d| record_line(d, locale)));
    lines
}

fn record_line(d: &Departure, locale: Locale) -> String {
    let id = d.id.map(|id| id.to_string()).unwrap_or_default();
    let time = d.time_label();
    let cells = [
        id.as_str(),
        time.as_str(),
        d.unit_number.as_str(),
        d.gate.as_str(),
        transport_label(d.transport, locale),
        d.destination_key(),
    ];
    format_line(&cells, d.comment.as_deref().unwrap_or(""))
}

/// Lay out one line in fixed-width columns, cut to the printable width.
#[must_use]
pub fn format_line(cells: &[&str], rest: &str) -> String {
    let mut line = String::new();
    for (&(width, _), cell) in COLUMNS.iter().zip(cells) {
        let cell = truncate(cell, width - 1);
        line.push_str(&format!("{cell:<width$}"));
    }
    line.push_str(rest);
    truncate(line.trim_end(), MAX_CHARS)
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

/// Split lines into pages of `per_page`. There is always at least one page.
#[must_use]
pub fn paginate(lines: &[String], per_page: usize) -> Vec<Vec<String>> {
    if lines.is_empty() || per_page == 0 {
        return vec![Vec::new()];
    }
    lines.chunks(per_page).map(<[String]>::to_vec).collect()
}

/// Encode for the built-in WinAnsi font encoding.
///
/// Latin-1 maps straight through; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::{parse_time, DepartureDraft, TransportKind};
    use chrono::{NaiveDate, Utc};

    fn context(locale: Locale) -> ExportContext {
        ExportContext {
            day: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            locale,
        }
    }

    fn departure(id: i64, unit: &str) -> Departure {
        Departure::from_draft(
            id,
            DepartureDraft {
                service_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                unit_number: unit.to_string(),
                gate: "3".to_string(),
                departure_time: parse_time("08:05").unwrap(),
                transport: TransportKind::Train,
                destination: Some("Molde".to_string()),
                comment: Some("x".repeat(200)),
            },
            Utc::now(),
        )
    }

    /// Courier glyphs are 600/1000 em wide.
    const CHAR_WIDTH: f32 = FONT_SIZE * 0.6;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_single_page_document() {
        let bytes = render(&[departure(1, "AB12")], &context(Locale::En)).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(&bytes, b"/MediaBox"), 1);
        assert!(count(&bytes, b"AB12") >= 1);
        assert!(count(&bytes, b"Courier") >= 1);
    }

    #[test]
    fn test_empty_listing_still_renders() {
        let bytes = render(&[], &context(Locale::En)).unwrap();
        assert_eq!(count(&bytes, b"/MediaBox"), 1);
        assert!(count(&bytes, b"No departures") >= 1);
    }

    #[test]
    fn test_long_listing_paginates() {
        let records: Vec<Departure> = (1..=120).map(|i| departure(i, &format!("U{i}"))).collect();
        let lines = listing(&records, &context(Locale::En));
        let expected_pages = lines.len().div_ceil(LINES_PER_PAGE);
        assert!(expected_pages > 1);

        let bytes = render(&records, &context(Locale::En)).unwrap();
        assert_eq!(count(&bytes, b"/MediaBox"), expected_pages);
    }

    #[test]
    fn test_lines_fit_printable_width() {
        let line = record_line(&departure(1, "AB12"), Locale::En);
        assert_eq!(line.chars().count(), MAX_CHARS);
        assert!(line.ends_with("..."));
        assert!(MARGIN + CHAR_WIDTH * MAX_CHARS as f32 <= PAGE_WIDTH - MARGIN);
        assert!(MARGIN + LINE_HEIGHT * LINES_PER_PAGE as f32 <= PAGE_HEIGHT - MARGIN);
    }

    #[test]
    fn test_localized_headings() {
        let lines = listing(&[departure(1, "AB12")], &context(Locale::Nb));
        assert!(lines[0].starts_with("Destinasjonsregistrering"));
        assert!(lines[2].contains("Enhetnummer"));
        assert!(lines[4].contains("Tog"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much too long", 8), "much ...");
        assert_eq!(truncate("abcdef", 2), "ab");
        assert_eq!(truncate("Ålesund-Ørsta", 8), "Ålesu...");
    }

    #[test]
    fn test_paginate() {
        let lines: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let pages = paginate(&lines, 3);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2], vec!["6".to_string()]);
        assert_eq!(paginate(&[], 3).len(), 1);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Ålesund"), b"\xC5lesund".to_vec());
        assert_eq!(win_ansi("a→b"), b"a?b".to_vec());
    }
}
