//! Datasets: named collections of tables persisted as one archive.

use std::collections::BTreeMap;
use std::path::Path;

use crate::codec;
use crate::error::{CollectionError, CollectionResult};
use crate::table::Table;

/// An ordered collection of [`Table`]s, unique by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` when the dataset holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The tables, in sequence order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// The table at position `i`, if any.
    pub fn get(&self, i: usize) -> Option<&Table> {
        self.tables.get(i)
    }

    /// The table with this (case-insensitive) name, if any.
    pub fn get_by_name(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Returns `true` when a table with this (case-insensitive) name is
    /// present.
    pub fn contains(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    /// Add a table.
    ///
    /// Fails with [`CollectionError::DuplicateTable`] on a case-insensitive
    /// name collision.
    pub fn add(&mut self, table: Table) -> CollectionResult<()> {
        if self.contains(table.name()) {
            return Err(CollectionError::DuplicateTable {
                name: table.name().to_owned(),
            });
        }
        self.tables.push(table);
        Ok(())
    }

    /// Remove the table at `i` by swapping the last table into its place.
    /// Positions are not stable across removals.
    pub fn remove(&mut self, i: usize) -> CollectionResult<Table> {
        if i >= self.tables.len() {
            return Err(CollectionError::OutOfBounds {
                index: i,
                len: self.tables.len(),
            });
        }
        Ok(self.tables.swap_remove(i))
    }

    /// Remove the table with this (case-insensitive) name. Same
    /// swap-with-last semantics as [`Dataset::remove`].
    pub fn remove_by_name(&mut self, name: &str) -> CollectionResult<Table> {
        let i = self
            .tables
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or(CollectionError::NotFound)?;
        Ok(self.tables.swap_remove(i))
    }

    /// Serialize to the Dataset binary format: a bincode-encoded map from
    /// table name to that table's already-serialized (base64-wrapped) blob.
    ///
    /// Unlike lists and tables there is *no* base64 layer at the dataset
    /// level; the asymmetry is part of the format.
    pub fn serialize(&self) -> CollectionResult<Vec<u8>> {
        let mut archive: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
        for table in &self.tables {
            archive.insert(table.name(), table.serialize()?);
        }
        Ok(bincode::serialize(&archive)?)
    }

    /// Reverse of [`Dataset::serialize`]. Tables come back in the archive's
    /// natural (sorted-name) order; an empty archive yields an empty
    /// dataset.
    pub fn deserialize(data: &[u8]) -> CollectionResult<Dataset> {
        let archive: BTreeMap<String, Vec<u8>> = bincode::deserialize(data)?;

        let mut dataset = Dataset::new();
        for blob in archive.values() {
            dataset.add(Table::deserialize(blob)?)?;
        }
        Ok(dataset)
    }

    /// [`Dataset::serialize`], then gzip the raw bincode bytes into `path`.
    pub fn serialize_to_file(&self, path: impl AsRef<Path>) -> CollectionResult<()> {
        let data = self.serialize()?;
        codec::write_gzip(path.as_ref(), &data)
    }

    /// Gunzip `path` and [`Dataset::deserialize`] the contents.
    pub fn deserialize_from_file(path: impl AsRef<Path>) -> CollectionResult<Dataset> {
        let data = codec::read_gzip(path.as_ref())?;
        Dataset::deserialize(&data)
    }
}
