//! Command-line interface for departures.
//!
//! This module provides the CLI structure for the `depreg` binary and the
//! terminal rendering of its results.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_day_step, AddCommand, ConfigCommand, DeleteCommand, EditCommand, ExportCommand,
    ExportFormatArg, FilterCommand, ListCommand, LocaleArg, OutputFormat, SortModeArg, ThemeArg,
    TransportKindArg,
};

use crate::view::DayStep;

/// depreg - Register departures by day
///
/// Records unit, gate, time, transport kind and destination for each
/// departure, keeps one list per service date, and exports the list as CSV,
/// XLSX or PDF.
#[derive(Debug, Parser)]
#[command(name = "depreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a departure
    Add(AddCommand),

    /// List departures for the selected day
    #[command(alias = "ls")]
    List(ListCommand),

    /// Show one departure
    Show {
        /// Departure id
        id: i64,
    },

    /// Change a departure
    Edit(EditCommand),

    /// Delete a departure (asks for confirmation unless --yes)
    #[command(alias = "rm")]
    Delete(DeleteCommand),

    /// Carry out the pending delete
    Confirm,

    /// Drop the pending delete
    Cancel,

    /// Export the current view
    Export(ExportCommand),

    /// Load departures from a CSV file
    Import {
        /// File to read (legacy Norwegian headers accepted)
        file: PathBuf,
    },

    /// Count departures per transport kind
    Summary {
        /// Day to count instead of the selected day
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<chrono::NaiveDate>,
    },

    /// Select the day to work on: today, prev, next, or YYYY-MM-DD
    Day {
        /// Where to go
        #[arg(value_parser = parse_day_step, default_value = "today")]
        step: DayStep,
    },

    /// Switch language
    Lang {
        /// Language
        #[arg(value_enum)]
        locale: LocaleArg,
    },

    /// Switch colour theme
    Theme {
        /// Theme
        #[arg(value_enum)]
        theme: ThemeArg,
    },

    /// Set or clear the saved list filter
    Filter(FilterCommand),

    /// Set the saved list ordering
    Sort {
        /// Ordering
        #[arg(value_enum)]
        mode: SortModeArg,
    },

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "depreg");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["depreg", "-q", "list"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["depreg", "list"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["depreg", "-v", "list"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["depreg", "-vv", "list"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["depreg", "-c", "/custom/config.toml", "list"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "depreg", "add", "--unit", "AB12", "--gate", "3", "--time", "08:05", "--kind", "Train",
            "--destination", "Molde",
        ]);
        match cli.command {
            Command::Add(add) => {
                assert_eq!(add.unit, "AB12");
                assert_eq!(add.destination.as_deref(), Some("Molde"));
                assert!(add.date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_requires_fields() {
        assert!(Cli::try_parse_from(["depreg", "add", "--unit", "AB12"]).is_err());
    }

    #[test]
    fn test_parse_list_overrides() {
        let cli = parse(&["depreg", "list", "--kind", "bil", "--sort", "time", "-f", "json"]);
        match cli.command {
            Command::List(list) => {
                assert_eq!(list.kind, Some(TransportKindArg::Car));
                assert_eq!(list.sort, Some(SortModeArg::Time));
                assert_eq!(list.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_delete_yes() {
        let cli = parse(&["depreg", "delete", "7", "--yes"]);
        assert!(matches!(
            cli.command,
            Command::Delete(DeleteCommand { id: 7, yes: true })
        ));
    }

    #[test]
    fn test_parse_export() {
        let cli = parse(&["depreg", "export", "pdf", "-o", "out.pdf", "--date", "2024-05-01"]);
        match cli.command {
            Command::Export(export) => {
                assert_eq!(export.format, ExportFormatArg::Pdf);
                assert_eq!(export.output, Some(PathBuf::from("out.pdf")));
                assert!(export.date.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_day() {
        assert!(matches!(
            parse(&["depreg", "day", "prev"]).command,
            Command::Day {
                step: DayStep::Previous
            }
        ));
        assert!(matches!(
            parse(&["depreg", "day"]).command,
            Command::Day {
                step: DayStep::Today
            }
        ));
        assert!(Cli::try_parse_from(["depreg", "day", "someday"]).is_err());
    }

    #[test]
    fn test_parse_filter_clear_conflicts() {
        assert!(Cli::try_parse_from(["depreg", "filter", "--clear", "--kind", "train"]).is_err());
        assert!(Cli::try_parse_from(["depreg", "filter", "--clear"]).is_ok());
    }

    #[test]
    fn test_parse_lang_and_theme() {
        assert!(matches!(
            parse(&["depreg", "lang", "nb"]).command,
            Command::Lang {
                locale: LocaleArg::Nb
            }
        ));
        assert!(matches!(
            parse(&["depreg", "theme", "dark"]).command,
            Command::Theme {
                theme: ThemeArg::Dark
            }
        ));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["depreg", "config", "validate", "--file", "x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
