//! Registry Module
//!
//! Loads the table list from the database manifest and hands out table
//! handles by name.
//!
//! ## Manifest Format
//! One JSON object per line, as written by the table tooling:
//! ```text
//! {"name":"users","folder":"./database/users","fieldnames":["name","age"]}
//! {"name":"posts","folder":"./database/posts","fieldnames":["title","body"]}
//! ```

mod database;
mod manifest;

pub use database::Database;
pub use manifest::{Manifest, TableDescriptor};
