//! Storage Module
//!
//! One directory per table, one file per entry.
//!
//! ## Responsibilities
//! - Derive entry ids from file names
//! - Read, write and remove whole entry files
//! - Hold the per-table lock writers go through
//!
//! ## Directory Layout
//! ```text
//! {table folder}/
//!   ├── 1          (entry id 1)
//!   ├── 2          (entry id 2)
//!   ├── .lock      (LockMode::LockFile only; holds the last locker's pid)
//!   └── .7.tmp     (only mid-write with atomic writes enabled)
//! ```
//! Names that do not parse as a decimal id are ignored.
//!
//! ## Concurrency
//! Nothing here serializes writers on its own. Id allocation and the
//! read-then-write steps of patch/delete are only safe with a single writer
//! per table, or with a `LockMode` other than `None` that every writer uses.

mod allocator;
mod lock;
mod store;

pub use allocator::{all_ids, next_id, parse_entry_id};
pub use lock::{LockFile, MutexLock, NoLock, TableGuard, TableLock};
pub use store::{EntryStore, StoreOptions};
