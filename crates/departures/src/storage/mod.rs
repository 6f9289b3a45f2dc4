//! Storage layer for departures.
//!
//! Two interchangeable backends implement [`DepartureStore`]: an embedded
//! `SQLite` database ([`SqliteStore`]) and a delimited text file guarded by an
//! advisory lock ([`FlatFileStore`]). Both enforce the duplicate-triple
//! invariant and report collisions as [`Error::Duplicate`].
//!
//! [`Error::Duplicate`]: crate::error::Error::Duplicate

pub mod flat_file;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{Backend, Config};
use crate::departure::{Departure, DepartureDraft, TransportKind};
use crate::error::{Error, Result};

pub use flat_file::FlatFileStore;
pub use sqlite::SqliteStore;

/// Persistence contract shared by all backends.
pub trait DepartureStore: std::fmt::Debug {
    /// Location of the backing file, or `:memory:`.
    fn path(&self) -> &Path;

    /// All departures filed under `day`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn list_by_day(&self, day: NaiveDate) -> Result<Vec<Departure>>;

    /// A single departure by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, id: i64) -> Result<Option<Departure>>;

    /// Store a new departure and return it with its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] on a colliding triple, or a storage error.
    fn insert(&self, draft: &DepartureDraft) -> Result<Departure>;

    /// Replace the editable fields of departure `id`. `created_at` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, [`Error::Duplicate`]
    /// when the new fields collide with another departure, or a storage error.
    fn update(&self, id: i64, draft: &DepartureDraft) -> Result<Departure>;

    /// Remove departure `id`. Returns `false` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn delete(&self, id: i64) -> Result<bool>;

    /// Number of departures of `kind` on `day`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn count_by_day_and_kind(&self, day: NaiveDate, kind: TransportKind) -> Result<usize>;

    /// Service dates that have at least one departure, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn days(&self) -> Result<Vec<NaiveDate>>;
}

/// Open the backend selected in the configuration.
///
/// # Errors
///
/// Returns an error if the backing file cannot be opened or created.
pub fn open_store(config: &Config) -> Result<Box<dyn DepartureStore>> {
    match config.storage.backend {
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(config.database_path())?)),
        Backend::FlatFile => Ok(Box::new(FlatFileStore::open(
            config.flat_file_path(),
            config.flat_file.lock,
        )?)),
    }
}

/// Create the parent directory of `path` if it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating directory {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Build the duplicate error for a draft.
pub(crate) fn duplicate_error(draft: &DepartureDraft) -> Error {
    Error::Duplicate {
        service_date: draft.service_date,
        unit_number: draft.unit_number.clone(),
        departure_time: draft.departure_time,
        destination: draft.destination_key().to_string(),
    }
}

/// Behaviour every backend must share, run against each implementation.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::departure::parse_time;

    pub fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    pub fn draft(unit: &str, time: &str, destination: Option<&str>) -> DepartureDraft {
        DepartureDraft {
            service_date: day(),
            unit_number: unit.to_string(),
            gate: "3".to_string(),
            departure_time: parse_time(time).unwrap(),
            transport: TransportKind::Train,
            destination: destination.map(str::to_string),
            comment: None,
        }
    }

    pub fn insert_grows_day_by_one(store: &dyn DepartureStore) {
        let before = store.list_by_day(day()).unwrap().len();
        let stored = store.insert(&draft("AB12", "08:05", Some("Molde"))).unwrap();
        assert!(stored.id.is_some());
        assert_eq!(store.list_by_day(day()).unwrap().len(), before + 1);
    }

    pub fn duplicate_rejected_per_day(store: &dyn DepartureStore) {
        let first = draft("AB12", "08:05", Some("Molde"));
        store.insert(&first).unwrap();
        let before = store.list_by_day(day()).unwrap();

        let err = store.insert(&first).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.list_by_day(day()).unwrap(), before);

        let mut next_day = first;
        next_day.service_date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(store.insert(&next_day).is_ok());
    }

    pub fn empty_destination_is_part_of_key(store: &dyn DepartureStore) {
        store.insert(&draft("C1", "09:00", None)).unwrap();
        assert!(store
            .insert(&draft("C1", "09:00", None))
            .unwrap_err()
            .is_duplicate());
        assert!(store.insert(&draft("C1", "09:00", Some("Oslo"))).is_ok());
    }

    pub fn get_round_trips(store: &dyn DepartureStore) {
        let mut d = draft("ZX9", "23:59", Some("Ålesund"));
        d.comment = Some("Sjåfør: Ødegård".to_string());
        let stored = store.insert(&d).unwrap();
        let loaded = store.get(stored.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.to_draft(), d);
        assert!(store.get(99_999).unwrap().is_none());
    }

    pub fn update_changes_fields_keeps_created_at(store: &dyn DepartureStore) {
        let stored = store.insert(&draft("AB12", "08:05", Some("Molde"))).unwrap();
        let id = stored.id.unwrap();

        let mut changed = stored.to_draft();
        changed.gate = "7".to_string();
        changed.transport = TransportKind::Car;
        let updated = store.update(id, &changed).unwrap();

        assert_eq!(updated.gate, "7");
        assert_eq!(updated.transport, TransportKind::Car);
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(store.get(id).unwrap().unwrap(), updated);
    }

    pub fn noop_update_is_identity(store: &dyn DepartureStore) {
        let stored = store.insert(&draft("AB12", "08:05", Some("Molde"))).unwrap();
        let id = stored.id.unwrap();
        let updated = store.update(id, &stored.to_draft()).unwrap();
        assert_eq!(updated, stored);
        assert_eq!(store.get(id).unwrap().unwrap(), stored);
    }

    pub fn update_collision_rejected(store: &dyn DepartureStore) {
        store.insert(&draft("A", "08:00", Some("Molde"))).unwrap();
        let other = store.insert(&draft("B", "08:00", Some("Molde"))).unwrap();

        let mut clash = other.to_draft();
        clash.unit_number = "A".to_string();
        let err = store.update(other.id.unwrap(), &clash).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.get(other.id.unwrap()).unwrap().unwrap(), other);
    }

    pub fn update_unknown_id(store: &dyn DepartureStore) {
        let err = store.update(4242, &draft("A", "08:00", None)).unwrap_err();
        assert!(matches!(err, Error::NotFound(4242)));
    }

    pub fn delete_then_redelete(store: &dyn DepartureStore) {
        let stored = store.insert(&draft("AB12", "08:05", Some("Molde"))).unwrap();
        let id = stored.id.unwrap();

        assert!(store.delete(id).unwrap());
        assert!(store
            .list_by_day(day())
            .unwrap()
            .iter()
            .all(|d| d.id != Some(id)));
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }

    pub fn count_by_day_and_kind(store: &dyn DepartureStore) {
        store.insert(&draft("A", "08:00", None)).unwrap();
        store.insert(&draft("B", "09:00", None)).unwrap();
        let mut car = draft("C", "10:00", None);
        car.transport = TransportKind::Car;
        store.insert(&car).unwrap();
        let mut other_day = draft("D", "10:00", None);
        other_day.service_date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        store.insert(&other_day).unwrap();

        assert_eq!(
            store
                .count_by_day_and_kind(day(), TransportKind::Train)
                .unwrap(),
            2
        );
        assert_eq!(
            store.count_by_day_and_kind(day(), TransportKind::Car).unwrap(),
            1
        );
        assert_eq!(
            store.days().unwrap(),
            vec![NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), day()]
        );
    }

    pub fn list_is_day_scoped(store: &dyn DepartureStore) {
        store.insert(&draft("A", "08:00", None)).unwrap();
        let mut tomorrow = draft("B", "08:00", None);
        tomorrow.service_date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        store.insert(&tomorrow).unwrap();

        let today = store.list_by_day(day()).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].unit_number, "A");
    }

    pub fn deleted_id_never_reused(store: &dyn DepartureStore) {
        let first = store.insert(&draft("A", "08:00", None)).unwrap();
        let second = store.insert(&draft("B", "09:00", None)).unwrap();
        let freed = second.id.unwrap();
        assert!(store.delete(freed).unwrap());

        let third = store.insert(&draft("C", "10:00", None)).unwrap();
        assert_ne!(third.id, Some(freed));
        assert!(third.id > Some(freed));

        // A stale delete of the freed id must not hit the new record.
        assert!(!store.delete(freed).unwrap());
        let units: Vec<String> = store
            .list_by_day(day())
            .unwrap()
            .into_iter()
            .map(|d| d.unit_number)
            .collect();
        assert_eq!(units, vec!["A", "C"]);
        assert!(store.get(first.id.unwrap()).unwrap().is_some());
    }

    pub fn run_all(make: impl Fn() -> Box<dyn DepartureStore>) {
        let checks: [fn(&dyn DepartureStore); 12] = [
            insert_grows_day_by_one,
            duplicate_rejected_per_day,
            empty_destination_is_part_of_key,
            get_round_trips,
            update_changes_fields_keeps_created_at,
            noop_update_is_identity,
            update_collision_rejected,
            update_unknown_id,
            delete_then_redelete,
            count_by_day_and_kind,
            list_is_day_scoped,
            deleted_id_never_reused,
        ];
        for check in checks {
            let store = make();
            check(store.as_ref());
        }
    }
}
