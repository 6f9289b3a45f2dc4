//! Terminal rendering for `depreg`.

use colored::{ColoredString, Colorize};
use tabled::builder::Builder;
use tabled::settings::{Alignment, Style};

use crate::departure::Departure;
use crate::i18n::{transport_label, Locale, Text};
use crate::session::DaySummary;
use crate::view::Theme;

/// Title line for a day's listing.
#[must_use]
pub fn heading(text: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Light => text.bold().blue(),
        Theme::Dark => text.bold().cyan(),
    }
}

/// A localized table of departures.
#[must_use]
pub fn departure_table(departures: &[Departure], locale: Locale, theme: Theme) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        [
            Text::Id,
            Text::Time,
            Text::Unit,
            Text::Gate,
            Text::Transport,
            Text::Destination,
            Text::Comment,
        ]
        .map(|t| header_cell(t.get(locale), theme)),
    );
    for d in departures {
        builder.push_record([
            d.id.map(|id| id.to_string()).unwrap_or_default(),
            d.time_label(),
            d.unit_number.clone(),
            d.gate.clone(),
            transport_label(d.transport, locale).to_string(),
            d.destination.clone().unwrap_or_default(),
            d.comment.clone().unwrap_or_default(),
        ]);
    }
    finish(builder, theme)
}

/// Field/value table for one departure.
#[must_use]
pub fn detail_table(d: &Departure, locale: Locale, theme: Theme) -> String {
    let rows = [
        (Text::Id, d.id.map(|id| id.to_string()).unwrap_or_default()),
        (Text::Date, d.service_date.to_string()),
        (Text::Unit, d.unit_number.clone()),
        (Text::Gate, d.gate.clone()),
        (Text::Time, d.time_label()),
        (
            Text::Transport,
            transport_label(d.transport, locale).to_string(),
        ),
        (Text::Destination, d.destination.clone().unwrap_or_default()),
        (Text::Comment, d.comment.clone().unwrap_or_default()),
        (
            Text::CreatedAt,
            d.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ];

    let mut builder = Builder::default();
    for (label, value) in rows {
        builder.push_record([header_cell(label.get(locale), theme), value]);
    }
    finish(builder, theme)
}

/// Counts per transport kind with a total row.
#[must_use]
pub fn summary_table(summary: &DaySummary, locale: Locale, theme: Theme) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        header_cell(Text::Transport.get(locale), theme),
        header_cell("#", theme),
    ]);
    for (kind, count) in &summary.counts {
        builder.push_record([transport_label(*kind, locale).to_string(), count.to_string()]);
    }
    builder.push_record([String::new(), summary.total().to_string()]);
    finish(builder, theme)
}

/// A confirmation line.
#[must_use]
pub fn success(message: &str) -> ColoredString {
    message.green()
}

/// A line for rejected input.
#[must_use]
pub fn warning(message: &str) -> ColoredString {
    message.yellow()
}

/// A line for failures.
#[must_use]
pub fn failure(message: &str) -> ColoredString {
    message.red().bold()
}

fn header_cell(text: &str, theme: Theme) -> String {
    heading(text, theme).to_string()
}

fn finish(builder: Builder, theme: Theme) -> String {
    let mut table = builder.build();
    match theme {
        Theme::Light => table.with(Style::modern()),
        Theme::Dark => table.with(Style::rounded()),
    };
    table.with(Alignment::left());
    table.to_string()
}
