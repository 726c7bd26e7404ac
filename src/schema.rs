//! Field schema
//!
//! Ordered list of field names. The order is the write order of the
//! positional entry encoding, and the set is the complete set of keys a
//! table accepts.

use crate::error::{FlatDbError, Result};
use crate::Entry;

/// Ordered field names of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// Create a schema from field names, in write order
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Field names in write order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate an entry for writing and return its values in schema order.
    ///
    /// Every schema field needs a non-empty value, and the entry may not hold
    /// more keys than the schema defines. Together the two checks rule out
    /// keys the schema does not know.
    pub fn ordered_values<'a>(&self, entry: &'a Entry) -> Result<Vec<&'a str>> {
        if entry.len() > self.fields.len() {
            return Err(FlatDbError::TooManyFields {
                expected: self.fields.len(),
                got: entry.len(),
            });
        }

        self.fields
            .iter()
            .map(|field| match entry.get(field) {
                Some(value) if !value.is_empty() => Ok(value.as_str()),
                _ => Err(FlatDbError::MissingField(field.clone())),
            })
            .collect()
    }

    /// Zip decoded values back onto field names
    pub(crate) fn zip_values(&self, values: Vec<String>) -> Result<Entry> {
        if values.len() != self.fields.len() {
            return Err(FlatDbError::CorruptEntry(format!(
                "expected {} fields, found {}",
                self.fields.len(),
                values.len()
            )));
        }
        Ok(self.fields.iter().cloned().zip(values).collect())
    }
}
