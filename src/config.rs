//! Configuration for flatdb
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::codec::EntryFormat;
use crate::error::{FlatDbError, Result};

/// Main configuration for a flatdb database handle
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the manifest file.
    /// Internal structure (as written by the table tooling):
    ///   {data_dir}/
    ///     ├── table.info       (manifest, one table per line)
    ///     └── {table}/         (one file per entry, named by id)
    pub data_dir: PathBuf,

    /// File name of the manifest inside `data_dir`
    pub manifest_name: String,

    /// Relative `folder` values in the manifest resolve against this directory
    pub base_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Entry Configuration
    // -------------------------------------------------------------------------
    /// On-disk entry encoding
    pub format: EntryFormat,

    /// Write through a temp file + rename instead of overwriting in place
    pub atomic_writes: bool,

    /// Refuse to overwrite an existing id on post
    pub exclusive_create: bool,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// Per-table write lock
    pub lock_mode: LockMode,

    /// What a bulk operation does when one row fails
    pub bulk_policy: BulkPolicy,
}

/// Per-table lock used to serialize writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// No locking; safe for a single writer only
    #[default]
    None,

    /// One mutex per table, shared by every clone of a table from this
    /// `Database`. Separate `Database` values get separate mutexes.
    InProcess,

    /// `flock` on a `.lock` file inside the table directory (fails fast if
    /// held, released by the kernel if the holder dies)
    LockFile,
}

/// Failure handling for bulk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkPolicy {
    /// First failing row aborts the operation; rows already handled stay handled
    #[default]
    Abort,

    /// Failing rows are logged at warn level and skipped
    SkipAndLog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./database"),
            manifest_name: "table.info".to_string(),
            base_dir: PathBuf::from("."),
            format: EntryFormat::default(),
            atomic_writes: false,
            exclusive_create: false,
            lock_mode: LockMode::default(),
            bulk_policy: BulkPolicy::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(&self.manifest_name)
    }

    /// Resolve a manifest `folder` value to a table directory
    pub fn resolve_folder(&self, folder: &str) -> PathBuf {
        let folder = Path::new(folder);
        if folder.is_absolute() {
            folder.to_path_buf()
        } else {
            self.base_dir.join(folder)
        }
    }

    /// Check the config for values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.manifest_name.is_empty() {
            return Err(FlatDbError::Config("manifest name is empty".to_string()));
        }
        if self.manifest_name.contains(['/', '\\']) {
            return Err(FlatDbError::Config(format!(
                "manifest name must be a plain file name: {}",
                self.manifest_name
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (where the manifest lives)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the manifest file name
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.config.manifest_name = name.into();
        self
    }

    /// Set the directory relative table folders resolve against
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Set the entry format
    pub fn format(mut self, format: EntryFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Enable temp-file + rename writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.config.atomic_writes = enabled;
        self
    }

    /// Enable create-if-absent for post
    pub fn exclusive_create(mut self, enabled: bool) -> Self {
        self.config.exclusive_create = enabled;
        self
    }

    /// Set the per-table lock mode
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.config.lock_mode = mode;
        self
    }

    /// Set the bulk failure policy
    pub fn bulk_policy(mut self, policy: BulkPolicy) -> Self {
        self.config.bulk_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
