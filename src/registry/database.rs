//! Database handle

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::{Config, LockMode};
use crate::error::{FlatDbError, Result};
use crate::query::Condition;
use crate::storage::{EntryStore, LockFile, MutexLock, NoLock, StoreOptions, TableLock};
use crate::table::{Record, Table};
use crate::Entry;

use super::manifest::{Manifest, TableDescriptor};

/// A database: the tables listed in one manifest
///
/// Nothing is shared between handles; two handles on the same directory
/// each get their own table locks (relevant for `LockMode::InProcess`).
#[derive(Debug)]
pub struct Database {
    config: Config,

    /// Loaded tables by name; `None` until `connect` succeeds
    tables: Option<HashMap<String, Table>>,
}

impl Database {
    /// Create an unconnected handle
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tables: None,
        }
    }

    /// Create a handle and connect it
    pub fn open(config: Config) -> Result<Self> {
        let mut db = Self::new(config);
        db.connect()?;
        Ok(db)
    }

    /// Load the manifest and open every table it lists.
    ///
    /// Reconnecting reloads the manifest and drops transforms set on the
    /// previous tables.
    pub fn connect(&mut self) -> Result<()> {
        self.config.validate()?;

        let manifest_path = self.config.manifest_path();
        let manifest = Manifest::load(&manifest_path)?;

        let mut tables = HashMap::with_capacity(manifest.len());
        for descriptor in manifest.tables() {
            let table = self.open_table(descriptor)?;
            tables.insert(descriptor.name.clone(), table);
        }

        info!(
            manifest = %manifest_path.display(),
            tables = tables.len(),
            "database connected"
        );

        self.tables = Some(tables);
        Ok(())
    }

    /// Drop all table handles; later operations fail with `NotConnected`
    pub fn disconnect(&mut self) {
        self.tables = None;
    }

    pub fn is_connected(&self) -> bool {
        self.tables.is_some()
    }

    /// Names of all loaded tables, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Table handle by name (identity transform unless replaced)
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables()?
            .get(name)
            .ok_or_else(|| FlatDbError::TableNotFound(name.to_string()))
    }

    /// Typed handle on a table, sharing its store and lock
    pub fn typed_table<T, F>(&self, name: &str, transform: F) -> Result<Table<T>>
    where
        F: Fn(Entry) -> Result<T> + Send + Sync + 'static,
    {
        Ok(self.table(name)?.with_view(transform))
    }

    /// Replace the transform of a named table
    pub fn set_transform<F>(&self, name: &str, transform: F) -> Result<()>
    where
        F: Fn(Entry) -> Result<Entry> + Send + Sync + 'static,
    {
        self.table(name)?.set_transform(transform);
        Ok(())
    }

    // =========================================================================
    // Named-table dispatch
    // =========================================================================

    pub fn get(&self, table: &str, id: u64) -> Result<Option<Entry>> {
        self.table(table)?.get(id)
    }

    pub fn post(&self, table: &str, entry: Entry) -> Result<Record<Entry>> {
        self.table(table)?.post(entry)
    }

    pub fn patch(&self, table: &str, id: u64, partial: Entry) -> Result<Entry> {
        self.table(table)?.patch(id, partial)
    }

    pub fn delete(&self, table: &str, id: u64) -> Result<Entry> {
        self.table(table)?.delete(id)
    }

    pub fn get_where(&self, table: &str, condition: &Condition) -> Result<Vec<Record<Entry>>> {
        self.table(table)?.get_where(condition)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn tables(&self) -> Result<&HashMap<String, Table>> {
        self.tables.as_ref().ok_or(FlatDbError::NotConnected)
    }

    fn open_table(&self, descriptor: &TableDescriptor) -> Result<Table> {
        let dir = self.config.resolve_folder(&descriptor.folder);

        let lock: Arc<dyn TableLock> = match self.config.lock_mode {
            LockMode::None => Arc::new(NoLock),
            LockMode::InProcess => Arc::new(MutexLock::new()),
            LockMode::LockFile => Arc::new(LockFile::new(&dir)),
        };

        let store = EntryStore::open(
            descriptor.name.clone(),
            &dir,
            descriptor.schema(),
            StoreOptions::from(&self.config),
            lock,
        )?;

        Ok(Table::new(Arc::new(store), self.config.bulk_policy))
    }
}
