//! Flat-file backend.
//!
//! The whole table lives in one CSV file. Every mutation reads the file,
//! changes the records in memory, and writes a new file that replaces the old
//! one by rename. With locking enabled, an exclusive advisory lock on a
//! sidecar `.lock` file is held for the whole cycle so two writers cannot
//! interleave.
//!
//! The highest id ever issued is kept in a second sidecar, `<file>.seq`, so
//! an id freed by a delete is never handed out again.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::{duplicate_error, ensure_parent_dir, DepartureStore};
use crate::departure::{Departure, DepartureDraft, TransportKind};
use crate::error::{Error, Result};
use crate::export::csv;
use crate::validate::find_duplicate;

/// Departure store backed by a single CSV file.
#[derive(Debug)]
pub struct FlatFileStore {
    /// Path to the data file.
    path: PathBuf,
    /// Path to the sidecar lock file.
    lock_path: PathBuf,
    /// Path to the sidecar holding the highest id issued.
    seq_path: PathBuf,
    /// Whether to take the advisory lock.
    lock: bool,
}

/// Held while the lock is taken; dropping the file releases it.
struct LockGuard {
    _file: Option<File>,
}

impl FlatFileStore {
    /// Open a flat file store, creating parent directories as needed.
    ///
    /// The data file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>, lock: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;

        let sidecar = |suffix: &str| {
            let mut name = path.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        let lock_path = sidecar(".lock");
        let seq_path = sidecar(".seq");

        info!(
            "Using flat file {} (locking {})",
            path.display(),
            if lock { "on" } else { "off" }
        );
        Ok(Self {
            path,
            lock_path,
            seq_path,
            lock,
        })
    }

    fn acquire(&self, exclusive: bool) -> Result<LockGuard> {
        if !self.lock {
            return Ok(LockGuard { _file: None });
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|source| Error::Lock {
                path: self.lock_path.clone(),
                source,
            })?;
        let locked = if exclusive {
            file.lock()
        } else {
            file.lock_shared()
        };
        locked.map_err(|source| Error::Lock {
            path: self.lock_path.clone(),
            source,
        })?;
        debug!(
            "Took {} lock on {}",
            if exclusive { "exclusive" } else { "shared" },
            self.lock_path.display()
        );
        Ok(LockGuard { _file: Some(file) })
    }

    fn read_all(&self) -> Result<Vec<Departure>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        csv::parse(file, Local::now().date_naive())
    }

    /// Highest id ever issued, or 0 for a store that never recorded one.
    fn read_high_water(&self) -> Result<i64> {
        if !self.seq_path.exists() {
            return Ok(0);
        }
        let raw = std::fs::read_to_string(&self.seq_path)?;
        raw.trim().parse().map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid id counter in {}", self.seq_path.display()),
            ))
        })
    }

    /// Replace `target` with `bytes` through a temp file in the same directory.
    fn replace(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(target).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn write_all(&self, departures: &[Departure], high_water: i64) -> Result<()> {
        // Counter first: a crash between the two writes only skips ids.
        self.replace(&self.seq_path, high_water.to_string().as_bytes())?;
        self.replace(&self.path, &csv::render(departures)?)?;
        debug!(
            "Wrote {} departures to {}",
            departures.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Run a read-modify-write cycle under the exclusive lock.
    ///
    /// `change` gets the records and the highest id issued so far, and
    /// returns `None` when it left everything as it was.
    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Departure>, &mut i64) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let _guard = self.acquire(true)?;
        let mut departures = self.read_all()?;
        let mut high_water = self.read_high_water()?.max(max_id(&departures));
        let result = change(&mut departures, &mut high_water)?;
        if result.is_some() {
            self.write_all(&departures, high_water.max(max_id(&departures)))?;
        }
        Ok(result)
    }

    fn read<T>(&self, view: impl FnOnce(Vec<Departure>) -> T) -> Result<T> {
        let _guard = self.acquire(false)?;
        Ok(view(self.read_all()?))
    }
}

fn max_id(departures: &[Departure]) -> i64 {
    departures.iter().filter_map(|d| d.id).max().unwrap_or(0)
}

impl DepartureStore for FlatFileStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_by_day(&self, day: NaiveDate) -> Result<Vec<Departure>> {
        self.read(|all| {
            all.into_iter()
                .filter(|d| d.service_date == day)
                .collect()
        })
    }

    fn get(&self, id: i64) -> Result<Option<Departure>> {
        self.read(|all| all.into_iter().find(|d| d.id == Some(id)))
    }

    fn insert(&self, draft: &DepartureDraft) -> Result<Departure> {
        let stored = self
            .modify(|all, high_water| {
                if find_duplicate(draft, all, None).is_some() {
                    warn!("Rejected duplicate departure for unit {}", draft.unit_number);
                    return Err(duplicate_error(draft));
                }
                *high_water += 1;
                let departure = Departure::from_draft(*high_water, draft.clone(), Utc::now());
                all.push(departure.clone());
                Ok(Some(departure))
            })?
            .ok_or_else(|| Error::internal("insert produced no record"))?;
        info!(
            "Registered departure {:?} ({})",
            stored.id, stored.unit_number
        );
        Ok(stored)
    }

    fn update(&self, id: i64, draft: &DepartureDraft) -> Result<Departure> {
        let updated = self
            .modify(|all, _| {
                let index = all
                    .iter()
                    .position(|d| d.id == Some(id))
                    .ok_or(Error::NotFound(id))?;
                if find_duplicate(draft, all, Some(id)).is_some() {
                    return Err(duplicate_error(draft));
                }
                let departure = Departure::from_draft(id, draft.clone(), all[index].created_at);
                all[index] = departure.clone();
                Ok(Some(departure))
            })?
            .ok_or(Error::NotFound(id))?;
        info!("Updated departure {}", id);
        Ok(updated)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.modify(|all, _| {
            let before = all.len();
            all.retain(|d| d.id != Some(id));
            Ok((all.len() < before).then_some(()))
        })?;
        if removed.is_some() {
            info!("Deleted departure {}", id);
        } else {
            debug!("Delete of departure {} matched nothing", id);
        }
        Ok(removed.is_some())
    }

    fn count_by_day_and_kind(&self, day: NaiveDate, kind: TransportKind) -> Result<usize> {
        self.read(|all| {
            all.iter()
                .filter(|d| d.service_date == day && d.transport == kind)
                .count()
        })
    }

    fn days(&self) -> Result<Vec<NaiveDate>> {
        self.read(|all| {
            let mut days: Vec<NaiveDate> = all.iter().map(|d| d.service_date).collect();
            days.sort_unstable_by(|a, b| b.cmp(a));
            days.dedup();
            days
        })
    }
}
