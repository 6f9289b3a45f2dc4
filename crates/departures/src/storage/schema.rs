//! `SQLite` schema definitions for departures.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the departures table.
///
/// The `UNIQUE` constraint carries the duplicate-triple invariant, so the
/// database rejects a second departure with the same unit, time and
/// destination on one service date. An empty destination is stored as `''`
/// rather than `NULL` so it takes part in the constraint. Gates that are not
/// plain integers are written as blobs so the column affinity cannot
/// reinterpret them.
pub const CREATE_DEPARTURES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS departures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    service_date TEXT NOT NULL,
    unit_number TEXT NOT NULL,
    gate INTEGER NOT NULL,
    departure_time TEXT NOT NULL,
    transport_type TEXT NOT NULL,
    destination TEXT NOT NULL DEFAULT '',
    comment TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (service_date, unit_number, departure_time, destination)
)
";

/// SQL statement to create an index on `service_date` for day-scoped queries.
pub const CREATE_SERVICE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_departures_service_date ON departures(service_date)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DEPARTURES_TABLE,
    CREATE_SERVICE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_departures_table_columns() {
        assert!(CREATE_DEPARTURES_TABLE.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_DEPARTURES_TABLE.contains("service_date TEXT NOT NULL"));
        assert!(CREATE_DEPARTURES_TABLE.contains("gate INTEGER NOT NULL"));
        assert!(CREATE_DEPARTURES_TABLE.contains("transport_type TEXT NOT NULL"));
        assert!(CREATE_DEPARTURES_TABLE.contains("created_at TEXT NOT NULL"));
    }

    #[test]
    fn test_departures_table_unique_triple() {
        assert!(CREATE_DEPARTURES_TABLE
            .contains("UNIQUE (service_date, unit_number, departure_time, destination)"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
