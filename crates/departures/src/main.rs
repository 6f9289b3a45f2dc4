//! `depreg` - CLI for the departure register
//!
//! Each invocation opens the configured store, performs one command, saves
//! the view state, and exits. Rejected input exits with status 2, storage
//! and configuration failures with status 1.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use departures::cli::output::{
    departure_table, detail_table, failure, heading, success, summary_table, warning,
};
use departures::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, ExportCommand, FilterCommand, ListCommand,
    OutputFormat,
};
use departures::export::{default_file_name, ExportFormat};
use departures::i18n::{issue_message, Locale, Text};
use departures::session::DeleteOutcome;
use departures::{init_logging, Config, Error, Result, Session};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let mut locale = Locale::default();
    match run(cli, &mut locale) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, locale),
    }
}

fn run(cli: Cli, locale: &mut Locale) -> Result<()> {
    let Cli {
        config: config_path,
        command,
        ..
    } = cli;

    match command {
        Command::Config(cmd) => handle_config(config_path, cmd),
        command => {
            let config = Config::load_from(config_path)?;
            let mut session = Session::open(&config)?;
            *locale = session.state().locale;
            dispatch(&mut session, command, locale)?;
            session.save_state()
        }
    }
}

fn dispatch(session: &mut Session, command: Command, locale: &mut Locale) -> Result<()> {
    match command {
        Command::Add(cmd) => {
            let stored = session.register(cmd.into_form())?;
            print_stored(Text::Registered, &stored, *locale);
        }
        Command::List(cmd) => handle_list(session, cmd)?,
        Command::Show { id } => {
            let departure = session.get(id)?;
            println!(
                "{}",
                detail_table(&departure, *locale, session.state().theme)
            );
        }
        Command::Edit(cmd) => {
            let (id, patch) = cmd.into_patch();
            let updated = session.edit(id, patch)?;
            print_stored(Text::Updated, &updated, *locale);
        }
        Command::Delete(DeleteCommand { id, yes }) => {
            let outcome = session.delete(id, yes)?;
            print_delete(&outcome, *locale);
        }
        Command::Confirm => match session.confirm()? {
            Some(outcome) => print_delete(&outcome, *locale),
            None => println!("{}", warning(Text::NothingPending.get(*locale))),
        },
        Command::Cancel => match session.cancel() {
            Some(id) => println!("{} ({id})", success(Text::Cancelled.get(*locale))),
            None => println!("{}", warning(Text::NothingPending.get(*locale))),
        },
        Command::Export(cmd) => handle_export(session, cmd)?,
        Command::Import { file } => {
            let report = session.import(File::open(&file)?)?;
            println!(
                "{}",
                success(&format!(
                    "{}: {} {}, {} {}, {} {}",
                    file.display(),
                    Text::Registered.get(*locale),
                    report.inserted,
                    Text::DuplicatesSkipped.get(*locale),
                    report.duplicates,
                    Text::InvalidSkipped.get(*locale),
                    report.invalid
                ))
            );
        }
        Command::Summary { date } => {
            let summary = session.summary(date)?;
            let theme = session.state().theme;
            println!(
                "{}",
                heading(&format!("{}: {}", Text::Date.get(*locale), summary.day), theme)
            );
            println!("{}", summary_table(&summary, *locale, theme));
        }
        Command::Day { step } => {
            session.navigate(step);
            handle_day(session, *locale)?;
        }
        Command::Lang { locale: choice } => {
            session.state_mut().locale = choice.into();
            *locale = session.state().locale;
            println!("{}", success(Text::Title.get(*locale)));
        }
        Command::Theme { theme } => {
            session.state_mut().theme = theme.into();
            println!(
                "{}",
                heading(Text::Title.get(*locale), session.state().theme)
            );
        }
        Command::Filter(cmd) => handle_filter(session, cmd, *locale),
        Command::Sort { mode } => {
            session.state_mut().sort = mode.into();
            println!("{}", success(&session.state().sort.to_string()));
        }
        // Handled before a session is opened.
        Command::Config(_) => {}
    }
    Ok(())
}

fn handle_list(session: &Session, cmd: ListCommand) -> Result<()> {
    let mut state = session.state().clone();
    if let Some(kind) = cmd.kind {
        state.transport_filter = Some(kind.into());
    }
    if let Some(destination) = cmd.destination {
        state.destination_filter = Some(destination);
    }
    if let Some(sort) = cmd.sort {
        state.sort = sort.into();
    }

    let day = cmd
        .date
        .unwrap_or_else(|| state.selected_day(session.now().date()));
    let departures = session.view_with(&state, Some(day))?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&departures)?),
        OutputFormat::Table => {
            let locale = state.locale;
            println!(
                "{}",
                heading(
                    &format!("{} - {}", Text::Title.get(locale), day),
                    state.theme
                )
            );
            if departures.is_empty() {
                println!("{}", Text::NoDepartures.get(locale));
            } else {
                println!("{}", departure_table(&departures, locale, state.theme));
            }
            if let Some(id) = state.pending_delete {
                println!("{} {id}", warning(Text::ConfirmDelete.get(locale)));
            }
        }
    }
    Ok(())
}

fn handle_export(session: &Session, cmd: ExportCommand) -> Result<()> {
    let format = ExportFormat::from(cmd.format);
    let bytes = session.export(format, cmd.date)?;

    match cmd.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(default_file_name(
                    format,
                    cmd.date.unwrap_or_else(|| session.selected_day()),
                ))
            } else {
                path
            };
            std::fs::write(&path, &bytes)?;
            println!("{}", success(&format!("{format}: {}", path.display())));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn handle_day(session: &Session, locale: Locale) -> Result<()> {
    let day = session.selected_day();
    let summary = session.summary(Some(day))?;
    println!(
        "{} ({})",
        heading(
            &format!("{}: {}", Text::Date.get(locale), day),
            session.state().theme
        ),
        summary.total()
    );

    let days: Vec<String> = session
        .days()?
        .into_iter()
        .take(7)
        .map(|d| d.to_string())
        .collect();
    if !days.is_empty() {
        println!("  {}", days.join("  "));
    }
    Ok(())
}

fn handle_filter(session: &mut Session, cmd: FilterCommand, locale: Locale) {
    let state = session.state_mut();
    if cmd.clear {
        state.clear_filters();
    }
    if let Some(kind) = cmd.kind {
        state.transport_filter = Some(kind.into());
    }
    if let Some(destination) = cmd.destination {
        state.destination_filter = Some(destination).filter(|d| !d.trim().is_empty());
    }

    let kind = state
        .transport_filter
        .map_or("*", |k| departures::i18n::transport_label(k, locale));
    let destination = state.destination_filter.as_deref().unwrap_or("*");
    println!(
        "{}",
        success(&format!(
            "{}: {kind}, {}: {destination}",
            Text::Transport.get(locale),
            Text::Destination.get(locale)
        ))
    );
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {:?}", config.storage.backend);
                println!("  Database path:      {}", config.database_path().display());
                println!("  Flat file path:     {}", config.flat_file_path().display());
                println!("  Flat file locking:  {}", config.flat_file.lock);
                println!();
                println!("[Validation]");
                println!("  Numeric gate:       {}", config.validation.numeric_gate);
                println!(
                    "  Require destination: {}",
                    config.validation.require_destination
                );
                println!(
                    "  Destinations:       {}",
                    config.validation.destinations.join(", ")
                );
                println!();
                println!("[View]");
                println!("  State path:         {}", config.view_state_path().display());
                println!("  Default locale:     {:?}", config.view.default_locale);
                println!("  Default theme:      {:?}", config.view.default_theme);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("{}", success("Configuration is valid."));
        }
    }
    Ok(())
}

fn print_stored(text: Text, departure: &departures::Departure, locale: Locale) {
    println!(
        "{}",
        success(&format!(
            "{} (ID {}): {} {} {}",
            text.get(locale),
            departure.id.unwrap_or_default(),
            departure.unit_number,
            departure.time_label(),
            departure.destination_key()
        ))
    );
}

fn print_delete(outcome: &DeleteOutcome, locale: Locale) {
    match outcome {
        DeleteOutcome::Pending(d) => println!(
            "{} {} ({} {})",
            warning(Text::ConfirmDelete.get(locale)),
            d.id.unwrap_or_default(),
            d.unit_number,
            d.time_label()
        ),
        DeleteOutcome::Deleted(id) => {
            println!("{} ({id})", success(Text::Deleted.get(locale)));
        }
        DeleteOutcome::AlreadyGone(id) => {
            println!("{} ({id})", warning(Text::NotFound.get(locale)));
        }
    }
}

fn report(err: &Error, locale: Locale) -> ExitCode {
    match err {
        Error::Validation(errors) => {
            eprintln!("{}", warning(Text::FixFields.get(locale)));
            for issue in errors.issues() {
                eprintln!("  - {}", issue_message(issue, locale));
            }
        }
        Error::Duplicate {
            unit_number,
            departure_time,
            destination,
            ..
        } => eprintln!(
            "{} ({unit_number} {} {destination})",
            warning(Text::DuplicateWarning.get(locale)),
            departure_time.format("%H:%M")
        ),
        Error::NotFound(id) => eprintln!("{} ({id})", warning(Text::NotFound.get(locale))),
        Error::ConfigLoad(_)
        | Error::ConfigValidation { .. }
        | Error::ExportUnavailable { .. } => {
            eprintln!("{}", failure(&err.to_string()));
        }
        _ => eprintln!("{}: {err}", failure(Text::StorageFailure.get(locale))),
    }

    if err.is_user_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
