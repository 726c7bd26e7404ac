//! Scan-and-filter execution for tables

use tracing::{debug, warn};

use crate::config::BulkPolicy;
use crate::error::Result;
use crate::table::{Record, Table};
use crate::Entry;

use super::condition::Condition;
use super::value::FieldSource;

impl<T> Table<T> {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Every entry of the table, transformed, sorted by id.
    ///
    /// An id whose file disappears between listing and reading is skipped.
    pub fn get_all(&self) -> Result<Vec<Record<T>>> {
        let mut ids = self.store.all_ids()?;
        ids.sort_unstable();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let loaded = self
                .store
                .get(id)
                .and_then(|entry| entry.map(|e| self.apply(e)).transpose());

            match loaded {
                Ok(Some(value)) => records.push(Record { id, value }),
                Ok(None) => debug!(table = %self.name(), id, "entry vanished during scan"),
                Err(e) => self.on_row_error(id, e)?,
            }
        }

        Ok(records)
    }

    /// Entries matching an arbitrary predicate
    pub fn get_with_filter<F>(&self, filter: F) -> Result<Vec<Record<T>>>
    where
        F: Fn(&Record<T>) -> bool,
    {
        Ok(self.get_all()?.into_iter().filter(|r| filter(r)).collect())
    }

    /// Entries matching a named-field condition
    pub fn get_where(&self, condition: &Condition) -> Result<Vec<Record<T>>>
    where
        T: FieldSource,
    {
        self.get_with_filter(|record| condition.matches(&record.value))
    }

    // =========================================================================
    // Bulk patches
    // =========================================================================

    /// Patch every entry the filter accepts with the fields `patch` returns
    /// for it. Returns the patched entries.
    pub fn patch_with_filter<F, P>(&self, filter: F, patch: P) -> Result<Vec<Record<T>>>
    where
        F: Fn(&Record<T>) -> bool,
        P: Fn(&Record<T>) -> Entry,
    {
        let _guard = self.store.lock()?;

        let mut patched = Vec::new();
        for record in self.get_all()?.into_iter().filter(|r| filter(r)) {
            let partial = patch(&record);
            let result = self
                .store
                .patch_with_unlocked(record.id, &partial, |merged| self.apply(merged));

            match result {
                Ok(value) => patched.push(Record {
                    id: record.id,
                    value,
                }),
                Err(e) => self.on_row_error(record.id, e)?,
            }
        }

        debug!(table = %self.name(), count = patched.len(), "bulk patch");
        Ok(patched)
    }

    /// Patch every entry matching a condition with the same fields
    pub fn patch_where(&self, condition: &Condition, partial: &Entry) -> Result<Vec<Record<T>>>
    where
        T: FieldSource,
    {
        self.patch_with_filter(|r| condition.matches(&r.value), |_| partial.clone())
    }

    /// Patch every entry of the table
    pub fn patch_all(&self, partial: &Entry) -> Result<Vec<Record<T>>> {
        self.patch_with_filter(|_| true, |_| partial.clone())
    }

    // =========================================================================
    // Bulk deletes
    // =========================================================================

    /// Delete every entry the filter accepts. Returns the deleted entries.
    pub fn delete_with_filter<F>(&self, filter: F) -> Result<Vec<Record<T>>>
    where
        F: Fn(&Record<T>) -> bool,
    {
        let _guard = self.store.lock()?;

        let mut deleted = Vec::new();
        for record in self.get_all()?.into_iter().filter(|r| filter(r)) {
            let result = self
                .store
                .delete_with_unlocked(record.id, |removed| self.apply(removed));

            match result {
                Ok(value) => deleted.push(Record {
                    id: record.id,
                    value,
                }),
                Err(e) => self.on_row_error(record.id, e)?,
            }
        }

        debug!(table = %self.name(), count = deleted.len(), "bulk delete");
        Ok(deleted)
    }

    /// Delete every entry matching a condition
    pub fn delete_where(&self, condition: &Condition) -> Result<Vec<Record<T>>>
    where
        T: FieldSource,
    {
        self.delete_with_filter(|r| condition.matches(&r.value))
    }

    /// Empty the table
    pub fn delete_all(&self) -> Result<Vec<Record<T>>> {
        self.delete_with_filter(|_| true)
    }

    /// Apply the bulk policy to a failed row
    fn on_row_error(&self, id: u64, error: crate::FlatDbError) -> Result<()> {
        match self.bulk_policy {
            BulkPolicy::Abort => Err(error),
            BulkPolicy::SkipAndLog => {
                warn!(table = %self.name(), id, error = %error, "skipping row");
                Ok(())
            }
        }
    }
}
