//! Manifest parsing

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatDbError, Result};
use crate::schema::Schema;

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, unique within the database
    pub name: String,
    /// Directory holding the entry files
    pub folder: String,
    /// Field names in write order
    pub fieldnames: Vec<String>,
}

impl TableDescriptor {
    pub fn new<I, S>(name: impl Into<String>, folder: impl Into<String>, fieldnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            folder: folder.into(),
            fieldnames: fieldnames.into_iter().map(Into::into).collect(),
        }
    }

    /// Serialize to a single manifest line (no newline)
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.fieldnames.iter().cloned())
    }
}

/// The parsed manifest of a database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    tables: Vec<TableDescriptor>,
}

impl Manifest {
    /// Load a manifest file; a missing file is an empty database
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse manifest text, validating every line
    pub fn parse(text: &str) -> Result<Self> {
        let mut tables = Vec::new();
        let mut seen = HashSet::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let descriptor: TableDescriptor =
                serde_json::from_str(line).map_err(|e| FlatDbError::Manifest {
                    line: line_no,
                    reason: e.to_string(),
                })?;

            validate(&descriptor).map_err(|reason| FlatDbError::Manifest {
                line: line_no,
                reason,
            })?;

            if !seen.insert(descriptor.name.clone()) {
                return Err(FlatDbError::Manifest {
                    line: line_no,
                    reason: format!("duplicate table name: {}", descriptor.name),
                });
            }

            tables.push(descriptor);
        }

        Ok(Self { tables })
    }

    /// Render back to manifest text, one line per table
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(&table.to_line()?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Name rules of the table tooling: alphanumeric plus underscore
fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn validate(descriptor: &TableDescriptor) -> std::result::Result<(), String> {
    if !is_identifier(&descriptor.name) {
        return Err(format!("invalid table name: {:?}", descriptor.name));
    }
    if descriptor.folder.is_empty() {
        return Err(format!("table {} has no folder", descriptor.name));
    }
    if descriptor.fieldnames.is_empty() {
        return Err(format!("table {} has no fields", descriptor.name));
    }

    let mut fields = HashSet::new();
    for field in &descriptor.fieldnames {
        if !is_identifier(field) {
            return Err(format!("invalid field name in {}: {:?}", descriptor.name, field));
        }
        if !fields.insert(field.as_str()) {
            return Err(format!("duplicate field in {}: {}", descriptor.name, field));
        }
    }
    Ok(())
}
