//! Entry Store
//!
//! CRUD on a single table directory. Every write replaces the whole entry
//! file; fields are never patched in place.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::codec::EntryFormat;
use crate::config::Config;
use crate::error::{FlatDbError, Result};
use crate::schema::Schema;
use crate::Entry;

use super::allocator;
use super::lock::{TableGuard, TableLock};

/// Write behaviour of an `EntryStore`
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// On-disk entry encoding
    pub format: EntryFormat,
    /// Temp file + rename instead of overwriting in place
    pub atomic_writes: bool,
    /// `post` fails with `DuplicateId` instead of overwriting
    pub exclusive_create: bool,
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            format: config.format,
            atomic_writes: config.atomic_writes,
            exclusive_create: config.exclusive_create,
        }
    }
}

/// Raw (untransformed) entry storage for one table
///
/// ## Concurrency:
/// - `get` never locks
/// - `post`/`patch`/`delete` hold the table lock for their read-then-write
/// - with `NoLock`, two writers on the same table race: both may allocate
///   the same id, and a patch may lose against a concurrent delete (reported
///   as `EntryNotFound` at the write step)
#[derive(Debug)]
pub struct EntryStore {
    /// Table name, for errors and logs
    table: String,
    /// Directory holding the entry files
    dir: PathBuf,
    schema: Schema,
    options: StoreOptions,
    lock: Arc<dyn TableLock>,
}

impl EntryStore {
    /// Open the store for a table directory, creating the directory if needed
    pub fn open(
        table: impl Into<String>,
        dir: &Path,
        schema: Schema,
        options: StoreOptions,
        lock: Arc<dyn TableLock>,
    ) -> Result<Self> {
        fs::create_dir_all(dir)?;

        Ok(Self {
            table: table.into(),
            dir: dir.to_path_buf(),
            schema,
            options,
            lock,
        })
    }

    /// Acquire the table lock
    pub fn lock(&self) -> Result<TableGuard<'_>> {
        self.lock.acquire()
    }

    /// Next unused id (see `allocator::next_id` for the race)
    pub fn next_id(&self) -> Result<u64> {
        allocator::next_id(&self.dir)
    }

    /// All stored ids, in directory listing order
    pub fn all_ids(&self) -> Result<Vec<u64>> {
        allocator::all_ids(&self.dir)
    }

    /// Read and decode an entry; `None` if there is no file for the id
    pub fn get(&self, id: u64) -> Result<Option<Entry>> {
        let bytes = match fs::read(self.entry_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        self.options
            .format
            .decode(&self.schema, &bytes)
            .map(Some)
            .map_err(|e| self.with_location(id, e))
    }

    /// Store a new entry under the next free id and return the id
    pub fn post(&self, entry: &Entry) -> Result<u64> {
        self.post_with(entry.clone(), |_| Ok(())).map(|(id, ())| id)
    }

    /// Shallow-merge `partial` over the stored entry and rewrite it.
    /// Returns the merged entry.
    pub fn patch(&self, id: u64, partial: &Entry) -> Result<Entry> {
        self.patch_with(id, partial, Ok)
    }

    /// Remove an entry and return what it held
    pub fn delete(&self, id: u64) -> Result<Entry> {
        self.delete_with(id, Ok)
    }

    /// `post` that hands the validated entry to `check` before anything
    /// touches the disk. An error from `check` leaves the table unchanged.
    pub fn post_with<R>(
        &self,
        entry: Entry,
        check: impl FnOnce(Entry) -> Result<R>,
    ) -> Result<(u64, R)> {
        let _guard = self.lock()?;
        self.post_with_unlocked(entry, check)
    }

    /// `patch` that hands the merged entry to `check` before the file is
    /// rewritten. An error from `check` leaves the stored entry as it was.
    pub fn patch_with<R>(
        &self,
        id: u64,
        partial: &Entry,
        check: impl FnOnce(Entry) -> Result<R>,
    ) -> Result<R> {
        let _guard = self.lock()?;
        self.patch_with_unlocked(id, partial, check)
    }

    /// `delete` that hands the stored entry to `check` before the file is
    /// removed. An error from `check` keeps the entry.
    pub fn delete_with<R>(&self, id: u64, check: impl FnOnce(Entry) -> Result<R>) -> Result<R> {
        let _guard = self.lock()?;
        self.delete_with_unlocked(id, check)
    }

    // =========================================================================
    // Lock-free internals (caller holds the table lock)
    // =========================================================================

    pub(crate) fn post_with_unlocked<R>(
        &self,
        entry: Entry,
        check: impl FnOnce(Entry) -> Result<R>,
    ) -> Result<(u64, R)> {
        // Encode first: a rejected entry must not leave a file behind
        let bytes = self.options.format.encode(&self.schema, &entry)?;
        let out = check(entry)?;

        let id = self.next_id()?;
        self.write_new(id, &bytes)?;

        debug!(table = %self.table, id, "posted entry");
        Ok((id, out))
    }

    pub(crate) fn patch_with_unlocked<R>(
        &self,
        id: u64,
        partial: &Entry,
        check: impl FnOnce(Entry) -> Result<R>,
    ) -> Result<R> {
        let mut entry = self.get(id)?.ok_or_else(|| self.not_found(id))?;

        for (field, value) in partial {
            entry.insert(field.clone(), value.clone());
        }

        let bytes = self.options.format.encode(&self.schema, &entry)?;
        let out = check(entry)?;
        self.write_existing(id, &bytes)?;

        debug!(table = %self.table, id, fields = partial.len(), "patched entry");
        Ok(out)
    }

    pub(crate) fn delete_with_unlocked<R>(
        &self,
        id: u64,
        check: impl FnOnce(Entry) -> Result<R>,
    ) -> Result<R> {
        let entry = self.get(id)?.ok_or_else(|| self.not_found(id))?;
        let out = check(entry)?;

        match fs::remove_file(self.entry_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.not_found(id)),
            Err(e) => return Err(e.into()),
        }

        debug!(table = %self.table, id, "deleted entry");
        Ok(out)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Table name
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Table directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Path of the file backing an id
    pub fn entry_path(&self, id: u64) -> PathBuf {
        self.dir.join(id.to_string())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write the file for a freshly allocated id
    fn write_new(&self, id: u64, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(id);

        if !self.options.exclusive_create {
            return self.write_replace(id, &path, bytes);
        }

        if self.options.atomic_writes {
            // hard_link fails if the target exists, which makes the publish
            // step create-if-absent
            let tmp = self.write_temp(id, bytes)?;
            let linked = fs::hard_link(&tmp, &path);
            if let Err(e) = fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), error = %e, "failed to remove temp file");
            }
            return match linked {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(FlatDbError::DuplicateId(id)),
                Err(e) => Err(e.into()),
            };
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FlatDbError::DuplicateId(id));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes)?;
        Ok(())
    }

    /// Rewrite the file of an entry that was just read
    fn write_existing(&self, id: u64, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(id);

        // No create flag: an entry deleted since the read surfaces here
        let mut file = match OpenOptions::new()
            .write(true)
            .truncate(!self.options.atomic_writes)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.not_found(id)),
            Err(e) => return Err(e.into()),
        };

        if self.options.atomic_writes {
            drop(file);
            return self.write_replace(id, &path, bytes);
        }

        file.write_all(bytes)?;
        Ok(())
    }

    /// Whole-file overwrite, through a temp file when atomic writes are on
    fn write_replace(&self, id: u64, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.options.atomic_writes {
            let tmp = self.write_temp(id, bytes)?;
            fs::rename(&tmp, path)?;
        } else {
            fs::write(path, bytes)?;
        }
        Ok(())
    }

    /// Write and sync a hidden temp file next to the entry
    fn write_temp(&self, id: u64, bytes: &[u8]) -> Result<PathBuf> {
        let tmp = self.dir.join(format!(".{}.tmp", id));
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(tmp)
    }

    fn not_found(&self, id: u64) -> FlatDbError {
        FlatDbError::EntryNotFound {
            table: self.table.clone(),
            id,
        }
    }

    fn with_location(&self, id: u64, error: FlatDbError) -> FlatDbError {
        match error {
            FlatDbError::CorruptEntry(reason) => {
                FlatDbError::CorruptEntry(format!("{}/{}: {}", self.table, id, reason))
            }
            other => other,
        }
    }
}
