//! Table handle
//!
//! A table is an `EntryStore` plus a post-decode transform. Everything a
//! caller gets back, and everything a query predicate looks at, has been
//! through the transform. Stored data is never rewritten by it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::BulkPolicy;
use crate::error::Result;
use crate::schema::Schema;
use crate::storage::EntryStore;
use crate::Entry;

/// Post-decode transform: raw entry in, caller type out
pub type Transform<T> = Arc<dyn Fn(Entry) -> Result<T> + Send + Sync>;

/// An entry together with its id. Serializes as `{"id": .., "value": ..}`
/// so a stored field named `id` never collides with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: u64,
    pub value: T,
}

/// Handle to one table
///
/// Cloning is cheap; clones share the store, its lock and the transform.
pub struct Table<T = Entry> {
    pub(crate) store: Arc<EntryStore>,
    transform: Arc<RwLock<Transform<T>>>,
    pub(crate) bulk_policy: BulkPolicy,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transform: Arc::clone(&self.transform),
            bulk_policy: self.bulk_policy,
        }
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("store", &self.store)
            .field("bulk_policy", &self.bulk_policy)
            .finish_non_exhaustive()
    }
}

impl Table<Entry> {
    /// Table with the identity transform
    pub fn new(store: Arc<EntryStore>, bulk_policy: BulkPolicy) -> Self {
        Self::with_transform(store, bulk_policy, Ok)
    }
}

impl<T> Table<T> {
    /// Table whose reads go through `transform`
    pub fn with_transform<F>(store: Arc<EntryStore>, bulk_policy: BulkPolicy, transform: F) -> Self
    where
        F: Fn(Entry) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            store,
            transform: Arc::new(RwLock::new(Arc::new(transform))),
            bulk_policy,
        }
    }

    /// Replace the transform; affects every later read through any clone
    pub fn set_transform<F>(&self, transform: F)
    where
        F: Fn(Entry) -> Result<T> + Send + Sync + 'static,
    {
        *self.transform.write() = Arc::new(transform);
    }

    // =========================================================================
    // Single-entry operations
    // =========================================================================

    /// Get an entry; `None` if the id does not exist
    pub fn get(&self, id: u64) -> Result<Option<T>> {
        self.store.get(id)?.map(|entry| self.apply(entry)).transpose()
    }

    /// Create an entry under the next free id. The transform runs before
    /// the file is written; if it fails nothing is stored.
    pub fn post(&self, entry: Entry) -> Result<Record<T>> {
        let (id, value) = self.store.post_with(entry, |e| self.apply(e))?;
        Ok(Record { id, value })
    }

    /// Shallow-merge `partial` into the stored entry. The merged entry is
    /// transformed before the rewrite; a failing transform leaves it as it was.
    pub fn patch(&self, id: u64, partial: Entry) -> Result<T> {
        self.store.patch_with(id, &partial, |merged| self.apply(merged))
    }

    /// Delete an entry, returning what it held. A failing transform keeps
    /// the entry.
    pub fn delete(&self, id: u64) -> Result<T> {
        self.store.delete_with(id, |removed| self.apply(removed))
    }

    /// Next id a `post` would use
    pub fn next_id(&self) -> Result<u64> {
        self.store.next_id()
    }

    /// All stored ids, unsorted
    pub fn all_ids(&self) -> Result<Vec<u64>> {
        self.store.all_ids()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn schema(&self) -> &Schema {
        self.store.schema()
    }

    pub fn dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Typed view over the same store and lock
    pub fn with_view<U, F>(&self, transform: F) -> Table<U>
    where
        F: Fn(Entry) -> Result<U> + Send + Sync + 'static,
    {
        Table::with_transform(Arc::clone(&self.store), self.bulk_policy, transform)
    }

    pub(crate) fn apply(&self, entry: Entry) -> Result<T> {
        // Clone the Arc so the lock is not held while user code runs
        let transform = Arc::clone(&*self.transform.read());
        transform(entry)
    }
}
