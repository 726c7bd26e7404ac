//! Query Module
//!
//! Filter queries layered on a table: every query is a full scan of the
//! table's decoded (and transformed) entries plus a predicate.
//!
//! ## Predicates
//! - custom closures over `Record<T>`
//! - named-field `Condition`s (`eq`, `ne`, `gt`, `lt`, `ge`, `le`,
//!   `contains`, `not_contains`, `starts_with`, `ends_with`)
//!
//! Ordering follows the value type the transform produces. Untransformed
//! entries only hold text, so `gt("age", "9")` is lexicographic there;
//! run the table through `infer_types` (or any transform producing numeric
//! `FieldValue`s) for numeric order.
//!
//! ## Bulk Writes
//! `patch_*`/`delete_*` scan afresh, then act on each matching id in turn
//! while holding the table lock. A failing row is handled according to the
//! table's `BulkPolicy`.

mod condition;
mod engine;
mod value;

pub use condition::{Comparison, Condition};
pub use value::{infer_types, FieldSource, FieldValue, TypedEntry};
