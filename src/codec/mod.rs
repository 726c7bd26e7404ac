//! Entry Codec Module
//!
//! Turns an entry (field name → value) into the bytes of an entry file and
//! back, given the table's ordered schema.
//!
//! ## Default Format (sentinel)
//! ```text
//! <|~|>Alice<|~|>\n
//! <|~|>30<|~|>
//! ```
//! One field per line, in schema order, each value wrapped by the sentinel,
//! no trailing newline. Values are not escaped, so a value may never contain
//! the sentinel itself.
//!
//! ## Framed Format (`framed` feature)
//! ```text
//! ┌──────────┬───────────┬───────────────────────────┬─────────┐
//! │Magic (4) │ Count (4) │ [Len (4) │ Value] ...     │ CRC (4) │
//! └──────────┴───────────┴───────────────────────────┴─────────┘
//! ```

mod sentinel;
#[cfg(feature = "framed")]
mod framed;

pub use sentinel::SENTINEL;

use crate::error::Result;
use crate::schema::Schema;
use crate::Entry;

/// On-disk entry encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFormat {
    /// Sentinel-delimited UTF-8 text, one field per line
    #[default]
    Sentinel,

    /// Length-prefixed fields with a CRC32 trailer
    #[cfg(feature = "framed")]
    Framed,
}

impl EntryFormat {
    /// Encode an entry in schema order.
    ///
    /// Fails with `TooManyFields` or `MissingField` before producing any
    /// bytes, so a rejected entry never reaches the disk.
    pub fn encode(&self, schema: &Schema, entry: &Entry) -> Result<Vec<u8>> {
        let values = schema.ordered_values(entry)?;
        match self {
            EntryFormat::Sentinel => sentinel::encode(schema, &values),
            #[cfg(feature = "framed")]
            EntryFormat::Framed => Ok(framed::encode(&values)),
        }
    }

    /// Decode the bytes of an entry file positionally against the schema
    pub fn decode(&self, schema: &Schema, bytes: &[u8]) -> Result<Entry> {
        let values = match self {
            EntryFormat::Sentinel => sentinel::decode(bytes)?,
            #[cfg(feature = "framed")]
            EntryFormat::Framed => framed::decode(bytes)?,
        };
        schema.zip_values(values)
    }
}
