//! Id Allocator
//!
//! Derives entry ids from the file names of a table directory. There is no
//! reservation step: two writers calling `next_id` at the same time get the
//! same answer.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// All entry ids in the directory, in directory listing order (unsorted)
pub fn all_ids(dir: &Path) -> Result<Vec<u64>> {
    let mut ids = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(id) = parse_entry_id(&entry.path()) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Next unused id: max + 1, or 1 for an empty table
pub fn next_id(dir: &Path) -> Result<u64> {
    let max = all_ids(dir)?.into_iter().max();
    Ok(max.map(|id| id + 1).unwrap_or(1))
}

/// Parse an entry id from a file name
/// "42" → Some(42), ".lock" → None, "schema" → None
pub fn parse_entry_id(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}
