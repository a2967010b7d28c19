//! Mapping tables
//!
//! A table maps a channel name to exactly `width` target vectors. The width
//! is fixed when the table is created and every row is checked against it,
//! so lookups never have to deal with short rows.

use std::collections::HashMap;

use rigstream_core::{MappingError, Vec3};

/// Sparse row: `(target index, vector)` pairs, every other target zero
pub type SparseRow<'a> = &'a [(usize, [f32; 3])];

#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    width: usize,
    rows: HashMap<String, Vec<Vec3>>,
}

impl MappingTable {
    /// Empty table with `width` targets per channel
    pub fn new(width: usize) -> Self {
        MappingTable {
            width,
            rows: HashMap::new(),
        }
    }

    /// Build from dense rows
    pub fn from_dense<'a, I>(width: usize, rows: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (&'a str, Vec<Vec3>)>,
    {
        let mut table = MappingTable::new(width);
        for (name, vectors) in rows {
            table.insert_dense(name, vectors)?;
        }
        Ok(table)
    }

    /// Build from sparse rows
    pub fn from_sparse(width: usize, rows: &[(&str, SparseRow<'_>)]) -> Result<Self, MappingError> {
        let mut table = MappingTable::new(width);
        for (name, entries) in rows {
            table.insert_sparse(name, entries)?;
        }
        Ok(table)
    }

    pub fn insert_dense(&mut self, channel: &str, vectors: Vec<Vec3>) -> Result<(), MappingError> {
        if vectors.len() != self.width {
            return Err(MappingError::WidthMismatch {
                channel: channel.to_string(),
                expected: self.width,
                actual: vectors.len(),
            });
        }
        self.insert_row(channel, vectors)
    }

    pub fn insert_sparse(&mut self, channel: &str, entries: SparseRow<'_>) -> Result<(), MappingError> {
        let mut vectors = vec![Vec3::ZERO; self.width];
        for &(index, v) in entries {
            let slot = vectors
                .get_mut(index)
                .ok_or_else(|| MappingError::TargetOutOfRange {
                    channel: channel.to_string(),
                    index,
                    width: self.width,
                })?;
            *slot += Vec3::from_array(v);
        }
        self.insert_row(channel, vectors)
    }

    fn insert_row(&mut self, channel: &str, vectors: Vec<Vec3>) -> Result<(), MappingError> {
        if self.rows.contains_key(channel) {
            return Err(MappingError::DuplicateChannel(channel.to_string()));
        }
        self.rows.insert(channel.to_string(), vectors);
        Ok(())
    }

    /// Targets per channel
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of mapped channels
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `channel`; `None` means the channel does not drive this rig
    pub fn get(&self, channel: &str) -> Option<&[Vec3]> {
        self.rows.get(channel).map(Vec::as_slice)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.rows.contains_key(channel)
    }

    /// Mapped channel names, sorted
    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_width_checked() {
        let err = MappingTable::from_dense(3, [("A", vec![Vec3::ZERO; 2])]).unwrap_err();
        assert_eq!(
            err,
            MappingError::WidthMismatch {
                channel: "A".into(),
                expected: 3,
                actual: 2,
            }
        );
        assert!(MappingTable::from_dense(3, [("A", vec![Vec3::ZERO; 3])]).is_ok());
    }

    #[test]
    fn test_sparse_expands_to_width() {
        let table = MappingTable::from_sparse(4, &[("A", &[(2, [1.0, 2.0, 3.0])])]).unwrap();
        let row = table.get("A").unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row[2], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(row[0], Vec3::ZERO);
        assert!(table.get("B").is_none());
    }

    #[test]
    fn test_sparse_out_of_range() {
        let err = MappingTable::from_sparse(4, &[("A", &[(4, [1.0, 0.0, 0.0])])]).unwrap_err();
        assert!(matches!(err, MappingError::TargetOutOfRange { index: 4, width: 4, .. }));
    }

    #[test]
    fn test_duplicate_channel() {
        let mut table = MappingTable::new(2);
        table.insert_dense("A", vec![Vec3::ZERO; 2]).unwrap();
        assert_eq!(
            table.insert_sparse("A", &[]),
            Err(MappingError::DuplicateChannel("A".into()))
        );
        assert_eq!(table.channels(), vec!["A"]);
    }
}
