//! `departures` - a day-scoped register of transport departures
//!
//! This library provides the record model, validation, ordering, storage
//! backends, and export renderers behind the `depreg` command-line tool.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod departure;
pub mod error;
pub mod export;
pub mod i18n;
pub mod logging;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod validate;
pub mod view;

pub use config::Config;
pub use departure::{Departure, DepartureDraft, TransportKind};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use session::Session;
pub use storage::{DepartureStore, FlatFileStore, SqliteStore};
