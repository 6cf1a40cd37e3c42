// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::fmt;

use itertools::Itertools;
use smallvec::SmallVec;

use super::Vector;
use crate::types::{DataValue, LogicalType, Row};

/// A collection of vectors sharing one cardinality.
///
/// A chunk is a horizontal subset of a row sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataChunk {
    data: SmallVec<[Vector; 16]>,
    count: usize,
}

impl DataChunk {
    /// An empty chunk with one vector per type.
    pub fn new(types: &[LogicalType]) -> Self {
        DataChunk {
            data: types.iter().map(|ty| Vector::new(ty.clone())).collect(),
            count: 0,
        }
    }

    /// Return the number of rows in the chunk.
    pub fn cardinality(&self) -> usize {
        self.count
    }

    pub fn set_cardinality(&mut self, count: usize) {
        self.count = count;
    }

    pub fn column_count(&self) -> usize {
        self.data.len()
    }

    pub fn columns(&self) -> &[Vector] {
        &self.data
    }

    pub fn columns_mut(&mut self) -> &mut [Vector] {
        &mut self.data
    }

    /// Get the reference of a column by index.
    pub fn column_at(&self, idx: usize) -> &Vector {
        &self.data[idx]
    }

    pub fn types(&self) -> Vec<LogicalType> {
        self.data
            .iter()
            .map(|v| v.logical_type().clone())
            .collect()
    }

    pub fn get_row(&self, idx: usize) -> Row {
        assert!(idx < self.count, "row index out of bounds");
        self.data.iter().map(|v| v.get_value(idx)).collect()
    }

    /// Append one row of values across all columns.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = DataValue>) {
        for (vector, value) in self.data.iter_mut().zip_eq(row) {
            vector.push_value(&value);
        }
        self.count += 1;
    }

    /// Clear all rows, keeping the schema.
    pub fn reset(&mut self) {
        for vector in &mut self.data {
            *vector = Vector::new(vector.logical_type().clone());
        }
        self.count = 0;
    }

    pub(crate) fn verify(&self) {
        #[cfg(debug_assertions)]
        for vector in &self.data {
            debug_assert!(vector.len() >= self.count || self.count == 0);
        }
    }
}

impl FromIterator<Vector> for DataChunk {
    fn from_iter<I: IntoIterator<Item = Vector>>(iter: I) -> Self {
        let data: SmallVec<[Vector; 16]> = iter.into_iter().collect();
        assert!(!data.is_empty());
        let count = data[0].len();
        assert!(
            data.iter().map(|v| v.len()).all(|l| l == count),
            "all vectors must have the same length"
        );
        DataChunk { data, count }
    }
}

/// Print the chunk as a pretty table.
impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use prettytable::{format, Table};
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for i in 0..self.cardinality() {
            let row: Vec<String> = self.data.iter().map(|v| v.get_value(i).to_string()).collect();
            table.add_row(prettytable::Row::from(row));
        }
        write!(f, "{}", table)
    }
}

/// Builds [`DataChunk`]s row by row, emitting a chunk whenever `capacity`
/// rows have accumulated.
pub struct DataChunkBuilder {
    types: Vec<LogicalType>,
    chunk: DataChunk,
    capacity: usize,
}

impl DataChunkBuilder {
    pub fn new(types: impl IntoIterator<Item = LogicalType>, capacity: usize) -> Self {
        assert_ne!(capacity, 0);
        let types: Vec<LogicalType> = types.into_iter().collect();
        let chunk = DataChunk::new(&types);
        DataChunkBuilder {
            types,
            chunk,
            capacity,
        }
    }

    /// Push a row; returns a full chunk once `capacity` rows are buffered.
    ///
    /// The row must have exactly one value per column.
    #[must_use]
    pub fn push_row(&mut self, row: impl IntoIterator<Item = DataValue>) -> Option<DataChunk> {
        self.chunk.push_row(row);
        if self.chunk.cardinality() == self.capacity {
            self.take()
        } else {
            None
        }
    }

    /// Take the buffered rows as a chunk, if any.
    #[must_use]
    pub fn take(&mut self) -> Option<DataChunk> {
        if self.chunk.cardinality() == 0 {
            return None;
        }
        let chunk = std::mem::replace(&mut self.chunk, DataChunk::new(&self.types));
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_and_display() {
        let mut chunk = DataChunk::new(&[LogicalType::Integer, LogicalType::Varchar]);
        chunk.push_row([DataValue::Int32(1), DataValue::String("a".into())]);
        chunk.push_row([DataValue::Null, DataValue::Null]);
        assert_eq!(chunk.cardinality(), 2);
        assert_eq!(
            chunk.get_row(1),
            vec![DataValue::Null, DataValue::Null]
        );
        assert!(chunk.to_string().contains("'a'"));
    }

    #[test]
    fn test_builder_emits_at_capacity() {
        let mut builder = DataChunkBuilder::new([LogicalType::Integer], 2);
        assert!(builder.push_row([DataValue::Int32(1)]).is_none());
        let full = builder.push_row([DataValue::Int32(2)]).unwrap();
        assert_eq!(full.cardinality(), 2);
        assert!(builder.push_row([DataValue::Int32(3)]).is_none());
        let rest = builder.take().unwrap();
        assert_eq!(rest.cardinality(), 1);
        assert!(builder.take().is_none());
    }
}
