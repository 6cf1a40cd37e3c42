// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! Lazy chunk/row iteration and the eager row table.

use super::scan::ColumnDataScanState;
use super::ColumnDataCollection;
use crate::types::{DataValue, Row};
use crate::vector::DataChunk;

/// Lazy, single-pass iterator over the chunks of a collection.
///
/// The collection must outlive the iterator; each step materializes one
/// owned chunk.
pub struct ColumnDataChunkIterator<'a> {
    collection: &'a ColumnDataCollection,
    state: ColumnDataScanState,
}

impl<'a> ColumnDataChunkIterator<'a> {
    pub(crate) fn new(collection: &'a ColumnDataCollection, column_ids: Vec<usize>) -> Self {
        let mut state = ColumnDataScanState::default();
        collection.initialize_scan_with(&mut state, Some(column_ids), Default::default());
        ColumnDataChunkIterator { collection, state }
    }
}

impl Iterator for ColumnDataChunkIterator<'_> {
    type Item = DataChunk;

    fn next(&mut self) -> Option<DataChunk> {
        let mut chunk = DataChunk::default();
        self.collection
            .initialize_scan_chunk_with(&self.state, &mut chunk);
        self.collection
            .scan(&mut self.state, &mut chunk)
            .then_some(chunk)
    }
}

/// Lazy, single-pass iterator over the rows of a collection.
pub struct ColumnDataRowIterator<'a> {
    collection: &'a ColumnDataCollection,
    state: ColumnDataScanState,
    chunk: DataChunk,
    row_index: usize,
}

impl<'a> ColumnDataRowIterator<'a> {
    pub(crate) fn new(collection: &'a ColumnDataCollection) -> Self {
        let mut state = ColumnDataScanState::default();
        collection.initialize_scan(&mut state);
        let mut chunk = DataChunk::default();
        collection.initialize_scan_chunk(&mut chunk);
        ColumnDataRowIterator {
            collection,
            state,
            chunk,
            row_index: 0,
        }
    }
}

impl Iterator for ColumnDataRowIterator<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        while self.row_index >= self.chunk.cardinality() {
            if !self.collection.scan(&mut self.state, &mut self.chunk) {
                return None;
            }
            self.row_index = 0;
        }
        let row = self.chunk.get_row(self.row_index);
        self.row_index += 1;
        Some(row)
    }
}

/// A view of one row inside a materialized row table.
pub struct ColumnDataRow<'a> {
    chunk: &'a DataChunk,
    row_index: usize,
    base_index: usize,
}

impl ColumnDataRow<'_> {
    pub fn get_value(&self, column: usize) -> DataValue {
        self.chunk.column_at(column).get_value(self.row_index)
    }

    /// Position of this row within the collection.
    pub fn row_index(&self) -> usize {
        self.base_index + self.row_index
    }
}

/// Every chunk of a collection, materialized, with a random-access row
/// table pointing into them.
///
/// Costs memory proportional to the total row count; intended for small
/// result sets and equality checks.
pub struct ColumnDataRowCollection {
    chunks: Vec<DataChunk>,
    rows: Vec<(usize, usize, usize)>,
}

impl ColumnDataRowCollection {
    pub(crate) fn new(collection: &ColumnDataCollection) -> Self {
        let chunks: Vec<DataChunk> = collection.chunks().collect();
        let mut rows = Vec::with_capacity(collection.count());
        let mut base_index = 0;
        for (chunk_idx, chunk) in chunks.iter().enumerate() {
            for row_idx in 0..chunk.cardinality() {
                rows.push((chunk_idx, row_idx, base_index));
            }
            base_index += chunk.cardinality();
        }
        ColumnDataRowCollection { chunks, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> ColumnDataRow<'_> {
        let (chunk_idx, row_index, base_index) = self.rows[index];
        ColumnDataRow {
            chunk: &self.chunks[chunk_idx],
            row_index,
            base_index,
        }
    }

    pub fn get_value(&self, column: usize, index: usize) -> DataValue {
        self.row(index).get_value(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = ColumnDataRow<'_>> {
        (0..self.rows.len()).map(|i| self.row(i))
    }
}
