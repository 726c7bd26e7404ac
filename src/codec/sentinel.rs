//! Sentinel-delimited entry format

use crate::error::{FlatDbError, Result};
use crate::schema::Schema;

/// Token written immediately before and after every value
pub const SENTINEL: &str = "<|~|>";

pub(super) fn encode(schema: &Schema, values: &[&str]) -> Result<Vec<u8>> {
    let mut out = String::new();

    for (i, (field, value)) in schema.fields().iter().zip(values).enumerate() {
        if value.contains(SENTINEL) {
            return Err(FlatDbError::ReservedSequence {
                field: field.clone(),
            });
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(SENTINEL);
        out.push_str(value);
        out.push_str(SENTINEL);
    }

    Ok(out.into_bytes())
}

/// Extract every sentinel-delimited span, in order
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FlatDbError::CorruptEntry(format!("entry is not UTF-8: {}", e)))?;

    // Splitting on the sentinel puts values at odd positions:
    // "", value, "\n", value, ..., value, ""
    let parts: Vec<&str> = text.split(SENTINEL).collect();

    if parts.len() < 3 {
        return Err(FlatDbError::CorruptEntry(
            "no delimited fields found".to_string(),
        ));
    }
    if parts.len() % 2 == 0 {
        return Err(FlatDbError::CorruptEntry(
            "unterminated field".to_string(),
        ));
    }

    Ok(parts
        .iter()
        .skip(1)
        .step_by(2)
        .map(|value| value.to_string())
        .collect())
}
