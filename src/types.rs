use crate::error::{PropertyError, Result};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Name of the identifier column shared by every property table
pub const ID_COLUMN: &str = "Protein_ID";

/// A single FASTA record: identifier plus upper-cased residue string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub residues: String,
}

/// Identifier → residues mapping that keeps the order records were first seen in.
///
/// Identifiers are unique; inserting a duplicate is rejected.
#[derive(Debug, Clone, Default)]
pub struct SequenceCollection {
    records: Vec<SequenceRecord>,
    seen: HashSet<String>,
}

impl SequenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, failing with `InvalidFileFormat` if the identifier already exists
    pub fn insert(&mut self, id: impl Into<String>, residues: impl Into<String>) -> Result<()> {
        let id = id.into();
        if !self.seen.insert(id.clone()) {
            return Err(PropertyError::InvalidFileFormat(format!(
                "Duplicate sequence identifier: {}",
                id
            )));
        }
        self.records.push(SequenceRecord {
            id,
            residues: residues.into(),
        });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        if !self.seen.contains(id) {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.residues.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a SequenceCollection {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The two per-sequence properties the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    MolecularWeight,
    IsoelectricPoint,
}

impl Property {
    /// Header of the value column in the on-disk table
    pub fn column_name(&self) -> &'static str {
        match self {
            Property::MolecularWeight => "Molecular_Weight(Da)",
            Property::IsoelectricPoint => "Isoelectric_Point",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub id: String,
    pub value: f64,
}

/// Ordered `(identifier, value)` records for one property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTable {
    pub property: Property,
    pub records: Vec<PropertyRecord>,
}

impl PropertyTable {
    pub fn new(property: Property) -> Self {
        Self {
            property,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, id: impl Into<String>, value: f64) {
        self.records.push(PropertyRecord {
            id: id.into(),
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.value).collect()
    }

    /// Converts the table into a two-column DataFrame (`Protein_ID`, property column)
    ///
    /// # Errors
    /// * Returns `PropertyError::DataError` if DataFrame creation fails
    pub fn to_frame(&self) -> Result<DataFrame> {
        let ids: Vec<String> = self.records.iter().map(|r| r.id.clone()).collect();
        DataFrame::new(vec![
            Column::new(ID_COLUMN.into(), ids),
            Column::new(self.property.column_name().into(), self.values()),
        ])
        .map_err(|e| PropertyError::DataError(e.to_string()))
    }
}
