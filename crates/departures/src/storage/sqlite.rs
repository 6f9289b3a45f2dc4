//! `SQLite` backend.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::{Type, Value, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{duplicate_error, ensure_parent_dir, migrations, DepartureStore};
use crate::departure::{
    format_time, Departure, DepartureDraft, TransportKind, DATE_FORMAT, TIME_FORMAT,
};
use crate::error::{Error, Result};
use crate::validate::is_numeric_gate;

const SELECT_COLUMNS: &str = r"
    SELECT id, service_date, unit_number, gate, departure_time, transport_type,
           destination, comment, created_at
    FROM departures
";

/// Departure store backed by an embedded `SQLite` database.
///
/// The duplicate-triple invariant is a `UNIQUE` constraint in the schema;
/// constraint violations surface as [`Error::Duplicate`].
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets other sessions keep reading while one writes.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Map a unique-constraint failure to a duplicate error for `draft`.
    fn map_constraint(err: rusqlite::Error, draft: &DepartureDraft) -> Error {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                debug!("Unique constraint rejected unit {}", draft.unit_number);
                duplicate_error(draft)
            }
            _ => Error::DatabaseQuery(err),
        }
    }

    /// Convert a database row to a Departure.
    fn row_to_departure(row: &rusqlite::Row) -> rusqlite::Result<Departure> {
        let id: i64 = row.get(0)?;
        let service_date: String = row.get(1)?;
        let unit_number: String = row.get(2)?;
        let gate = match row.get_ref(3)? {
            ValueRef::Integer(n) => n.to_string(),
            ValueRef::Real(n) => n.to_string(),
            ValueRef::Text(text) | ValueRef::Blob(text) => {
                String::from_utf8_lossy(text).into_owned()
            }
            other @ ValueRef::Null => {
                return Err(rusqlite::Error::InvalidColumnType(
                    3,
                    "gate".to_string(),
                    other.data_type(),
                ))
            }
        };
        let departure_time: String = row.get(4)?;
        let transport_type: String = row.get(5)?;
        let destination: String = row.get(6)?;
        let comment: Option<String> = row.get(7)?;
        let created_at: String = row.get(8)?;

        let service_date = NaiveDate::parse_from_str(&service_date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let departure_time = NaiveTime::parse_from_str(&departure_time, TIME_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        let transport = transport_type.parse::<TransportKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        Ok(Departure {
            id: Some(id),
            service_date,
            unit_number,
            gate,
            departure_time,
            transport,
            destination: Some(destination).filter(|d| !d.is_empty()),
            comment,
            created_at,
        })
    }
}

/// Canonical numeric gates go in as integers. Anything else is stored as a
/// blob, which the column's numeric affinity leaves untouched, so texts like
/// `3.5` or `1e3` read back exactly as typed.
fn gate_value(gate: &str) -> Value {
    match gate.parse::<i64>() {
        Ok(n) if is_numeric_gate(gate) && n.to_string() == gate => Value::Integer(n),
        _ => Value::Blob(gate.as_bytes().to_vec()),
    }
}

fn usize_from(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

impl DepartureStore for SqliteStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_by_day(&self, day: NaiveDate) -> Result<Vec<Departure>> {
        let sql = format!("{SELECT_COLUMNS} WHERE service_date = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let departures = stmt
            .query_map([day.format(DATE_FORMAT).to_string()], Self::row_to_departure)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(departures)
    }

    fn get(&self, id: i64) -> Result<Option<Departure>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let result = self
            .conn
            .query_row(&sql, [id], Self::row_to_departure)
            .optional()?;
        Ok(result)
    }

    fn insert(&self, draft: &DepartureDraft) -> Result<Departure> {
        let created_at = Utc::now();
        self.conn
            .execute(
                r"
                INSERT INTO departures (service_date, unit_number, gate, departure_time,
                                        transport_type, destination, comment, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
                params![
                    draft.service_date.format(DATE_FORMAT).to_string(),
                    draft.unit_number,
                    gate_value(&draft.gate),
                    format_time(draft.departure_time),
                    draft.transport.as_str(),
                    draft.destination_key(),
                    draft.comment,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::map_constraint(e, draft))?;

        let id = self.conn.last_insert_rowid();
        info!("Registered departure {} ({})", id, draft.unit_number);
        Ok(Departure::from_draft(id, draft.clone(), created_at))
    }

    fn update(&self, id: i64, draft: &DepartureDraft) -> Result<Departure> {
        let affected = self
            .conn
            .execute(
                r"
                UPDATE departures
                SET service_date = ?1, unit_number = ?2, gate = ?3, departure_time = ?4,
                    transport_type = ?5, destination = ?6, comment = ?7
                WHERE id = ?8
                ",
                params![
                    draft.service_date.format(DATE_FORMAT).to_string(),
                    draft.unit_number,
                    gate_value(&draft.gate),
                    format_time(draft.departure_time),
                    draft.transport.as_str(),
                    draft.destination_key(),
                    draft.comment,
                    id,
                ],
            )
            .map_err(|e| Self::map_constraint(e, draft))?;

        if affected == 0 {
            return Err(Error::NotFound(id));
        }
        info!("Updated departure {}", id);
        self.get(id)?.ok_or(Error::NotFound(id))
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM departures WHERE id = ?1", [id])?;
        if affected > 0 {
            info!("Deleted departure {}", id);
        } else {
            debug!("Delete of departure {} matched nothing", id);
        }
        Ok(affected > 0)
    }

    fn count_by_day_and_kind(&self, day: NaiveDate, kind: TransportKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM departures WHERE service_date = ?1 AND transport_type = ?2",
            params![day.format(DATE_FORMAT).to_string(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize_from(count))
    }

    fn days(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT service_date FROM departures ORDER BY service_date DESC")?;
        let days = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT).ok())
            .collect();
        Ok(days)
    }
}
