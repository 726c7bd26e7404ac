//! # flatdb
//!
//! A local flat-file database:
//! - One directory per table, one file per entry, named by its integer id
//! - Sentinel-delimited, positional entry encoding
//! - Filter queries (equality, ordering, substring/prefix/suffix) over full scans
//! - Pluggable post-decode transforms producing caller-chosen types
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Database (registry)                      │
//! │              manifest → name → Table handle                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Table<T> + query engine                      │
//! │      transform, get/post/patch/delete, *_where, *_all        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ EntryStore  │─────────▶│ EntryFormat │
//!   │ (+ lock)    │          │  (codec)    │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ IdAllocator │
//!   │ (dir scan)  │
//!   └─────────────┘
//! ```
//!
//! ## Concurrency
//!
//! One writer per table is safe. Anything more needs a `LockMode` other
//! than `None`, used by every writer of the table; the engine does not
//! detect concurrent writers on its own.

use std::collections::BTreeMap;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod codec;
pub mod storage;
pub mod table;
pub mod query;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatDbError, Result};
pub use config::{BulkPolicy, Config, LockMode};
pub use codec::EntryFormat;
pub use schema::Schema;
pub use table::{Record, Table};
pub use query::{Comparison, Condition, FieldSource, FieldValue, TypedEntry};
pub use registry::{Database, Manifest, TableDescriptor};

/// A decoded row: field name → value
pub type Entry = BTreeMap<String, String>;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
