// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! The column data collection: an append-only, chunked columnar buffer.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use self::copy::{get_copy_function, ColumnDataCopyFunction, ColumnDataMetaData};
use self::segment::ColumnDataCollectionSegment;
use crate::buffer::{BufferManager, ClientContext};
use crate::error::{ColumnDataError, ColumnDataResult};
use crate::types::{values_are_equal, LogicalType, PhysicalType};
use crate::vector::DataChunk;
use crate::STANDARD_VECTOR_SIZE;

mod allocator;
mod copy;
mod encode;
mod row;
mod scan;
mod segment;

#[cfg(test)]
mod tests;

pub use self::allocator::{ChunkManagementState, ColumnDataAllocator};
pub use self::copy::ColumnDataAppendState;
pub use self::row::{
    ColumnDataChunkIterator, ColumnDataRow, ColumnDataRowCollection, ColumnDataRowIterator,
};
pub use self::scan::{
    ColumnDataLocalScanState, ColumnDataParallelScanState, ColumnDataScanProperties,
    ColumnDataScanState,
};
pub use self::segment::VectorDataIndex;

/// An in-memory, append-only, chunked columnar buffer with a fixed schema.
///
/// Rows are appended chunk-wise and scanned back in order, serially or from
/// multiple threads. Segments can be moved wholesale between collections
/// with [`combine`](Self::combine).
pub struct ColumnDataCollection {
    types: Vec<LogicalType>,
    count: usize,
    segments: Vec<ColumnDataCollectionSegment>,
    allocator: Arc<ColumnDataAllocator>,
    copy_functions: Vec<ColumnDataCopyFunction>,
    finished_append: bool,
}

impl ColumnDataCollection {
    /// An empty collection with no schema yet; the schema of the first
    /// appended chunk is adopted.
    pub fn new() -> Self {
        ColumnDataCollection {
            types: vec![],
            count: 0,
            segments: vec![],
            allocator: Arc::new(ColumnDataAllocator::new()),
            copy_functions: vec![],
            finished_append: false,
        }
    }

    pub fn with_types(types: Vec<LogicalType>) -> Self {
        Self::with_allocator(Arc::new(ColumnDataAllocator::new()), types)
    }

    pub fn with_buffer_manager(
        buffer_manager: Arc<BufferManager>,
        types: Vec<LogicalType>,
    ) -> Self {
        Self::with_allocator(
            Arc::new(ColumnDataAllocator::with_buffer_manager(buffer_manager)),
            types,
        )
    }

    pub fn with_allocator(allocator: Arc<ColumnDataAllocator>, types: Vec<LogicalType>) -> Self {
        assert!(!types.is_empty(), "schema must not be empty");
        let mut collection = ColumnDataCollection {
            types: vec![],
            count: 0,
            segments: vec![],
            allocator,
            copy_functions: vec![],
            finished_append: false,
        };
        collection.initialize_types(types);
        collection
    }

    pub fn with_context(context: &ClientContext, types: Vec<LogicalType>) -> Self {
        Self::with_buffer_manager(context.buffer_manager().clone(), types)
    }

    /// An empty collection with this collection's schema, sharing its
    /// allocator. The source is marked finished: no further appends.
    pub fn clone_empty(&mut self) -> Self {
        self.finished_append = true;
        Self::with_allocator(self.allocator.clone(), self.types.clone())
    }

    fn initialize_types(&mut self, types: Vec<LogicalType>) {
        assert!(self.segments.is_empty() && self.count == 0);
        self.copy_functions = types.iter().map(get_copy_function).collect();
        self.types = types;
    }

    fn create_segment(&mut self) {
        self.segments.push(ColumnDataCollectionSegment::new(
            self.allocator.clone(),
            self.types.clone(),
        ));
    }

    /// Number of rows in the collection.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn column_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> &[LogicalType] {
        &self.types
    }

    /// Number of chunks across all segments.
    pub fn chunk_count(&self) -> usize {
        self.segments.iter().map(|s| s.chunk_count()).sum()
    }

    // Append

    /// Ensure a segment and chunk exist and prime the append pin cache.
    pub fn initialize_append(&mut self, state: &mut ColumnDataAppendState) -> ColumnDataResult<()> {
        assert!(!self.finished_append, "cannot append to a finished collection");
        assert!(!self.types.is_empty(), "schema must be set before appending");
        if self.segments.is_empty() {
            self.create_segment();
        }
        let segment = self.segments.last_mut().unwrap();
        if segment.chunk_count() == 0 {
            segment.allocate_new_chunk()?;
        }
        segment.init_chunk_state(segment.chunk_count() - 1, &mut state.current_chunk_state);
        Ok(())
    }

    /// Append all rows of `input`.
    ///
    /// Complex-typed columns are flattened in place first. Input chunks may
    /// hold any number of rows; new chunks are allocated as the current one
    /// fills up.
    pub fn append(
        &mut self,
        state: &mut ColumnDataAppendState,
        input: &mut DataChunk,
    ) -> ColumnDataResult<()> {
        assert!(!self.finished_append, "cannot append to a finished collection");
        if !self
            .types
            .iter()
            .eq(input.columns().iter().map(|v| v.logical_type()))
        {
            return Err(ColumnDataError::SchemaMismatch {
                expected: self.types.clone(),
                actual: input.types(),
            });
        }

        let input_size = input.cardinality();
        for vector in input.columns_mut() {
            if matches!(
                vector.physical_type(),
                PhysicalType::List | PhysicalType::Struct
            ) {
                vector.flatten(input_size);
            }
        }

        let segment = self
            .segments
            .last_mut()
            .expect("initialize_append must run before append");
        let mut remaining = input_size;
        while remaining > 0 {
            let chunk_index = segment.chunk_count() - 1;
            let append_amount = remaining.min(STANDARD_VECTOR_SIZE - segment.chunk(chunk_index).count);
            if append_amount > 0 {
                let offset = input_size - remaining;
                for (vector_idx, copy_function) in self.copy_functions.iter().enumerate() {
                    let source = input.column_at(vector_idx);
                    let format = source.to_unified_format();
                    let vector_data_index = segment.chunk(chunk_index).vector_data[vector_idx];
                    let mut meta_data = ColumnDataMetaData {
                        segment: &mut *segment,
                        state: &mut *state,
                        chunk_index,
                        vector_data_index,
                        child_list_size: 0,
                    };
                    (copy_function.function)(
                        copy_function,
                        &mut meta_data,
                        &format,
                        source,
                        offset,
                        append_amount,
                    )?;
                }
                segment.chunk_mut(chunk_index).count += append_amount;
            }
            remaining -= append_amount;
            if remaining > 0 {
                let new_chunk = segment.allocate_new_chunk()?;
                segment.init_chunk_state(new_chunk, &mut state.current_chunk_state);
            }
        }
        segment.count += input_size;
        self.count += input_size;
        Ok(())
    }

    /// Append with a one-shot state. An empty collection adopts the schema
    /// of the first chunk.
    pub fn append_chunk(&mut self, input: &mut DataChunk) -> ColumnDataResult<()> {
        if self.types.is_empty() && self.count == 0 {
            // schema is fixed at first use
            self.initialize_types(input.types());
        }
        let mut state = ColumnDataAppendState::default();
        self.initialize_append(&mut state)?;
        self.append(&mut state, input)
    }

    // Scan

    /// Initialize a serial scan over all columns with default properties.
    pub fn initialize_scan(&self, state: &mut ColumnDataScanState) {
        self.initialize_scan_with(state, None, ColumnDataScanProperties::default());
    }

    /// Initialize a serial scan with an optional projection and properties.
    pub fn initialize_scan_with(
        &self,
        state: &mut ColumnDataScanState,
        column_ids: Option<Vec<usize>>,
        properties: ColumnDataScanProperties,
    ) {
        let column_ids = column_ids.unwrap_or_else(|| (0..self.types.len()).collect());
        debug_assert!(column_ids.iter().all(|&i| i < self.types.len()));
        state.chunk_index = 0;
        state.segment_index = 0;
        state.current_row_index = 0;
        state.next_row_index = 0;
        state.current_chunk_state.handles.clear();
        state.properties = properties;
        state.column_ids = column_ids;
    }

    pub fn initialize_parallel_scan(&self, state: &mut ColumnDataParallelScanState) {
        self.initialize_parallel_scan_with(state, None, ColumnDataScanProperties::default());
    }

    pub fn initialize_parallel_scan_with(
        &self,
        state: &mut ColumnDataParallelScanState,
        column_ids: Option<Vec<usize>>,
        properties: ColumnDataScanProperties,
    ) {
        self.initialize_scan_with(state.scan_state.get_mut(), column_ids, properties);
    }

    /// Initialize `chunk` for scans over the full schema.
    pub fn initialize_scan_chunk(&self, chunk: &mut DataChunk) {
        *chunk = DataChunk::new(&self.types);
    }

    /// Initialize `chunk` for the projection of `state`.
    pub fn initialize_scan_chunk_with(&self, state: &ColumnDataScanState, chunk: &mut DataChunk) {
        let types: Vec<LogicalType> = state
            .column_ids
            .iter()
            .map(|&i| self.types[i].clone())
            .collect();
        *chunk = DataChunk::new(&types);
    }

    /// Advance to the next chunk position, clearing the pin cache on
    /// segment boundaries. Returns `(chunk_index, segment_index, row_index)`.
    fn next_scan_index(&self, state: &mut ColumnDataScanState) -> Option<(usize, usize, usize)> {
        state.current_row_index = state.next_row_index;
        let row_index = state.next_row_index;
        if state.segment_index >= self.segments.len() {
            return None;
        }
        while state.chunk_index >= self.segments[state.segment_index].chunk_count() {
            state.chunk_index = 0;
            state.segment_index += 1;
            state.current_chunk_state.handles.clear();
            if state.segment_index >= self.segments.len() {
                return None;
            }
        }
        state.next_row_index += self.segments[state.segment_index]
            .chunk(state.chunk_index)
            .count;
        let result = (state.chunk_index, state.segment_index, row_index);
        state.chunk_index += 1;
        Some(result)
    }

    /// Scan the next chunk into `result`; returns `false` once exhausted.
    ///
    /// `result` must be initialized for this scan's projection, e.g. via
    /// [`initialize_scan_chunk_with`](Self::initialize_scan_chunk_with).
    pub fn scan(&self, state: &mut ColumnDataScanState, result: &mut DataChunk) -> bool {
        result.reset();
        let Some((chunk_index, segment_index, _row_index)) = self.next_scan_index(state) else {
            return false;
        };
        let segment = &self.segments[segment_index];
        segment.read_chunk(
            chunk_index,
            &mut state.current_chunk_state,
            result,
            &state.column_ids,
        );
        if state.properties == ColumnDataScanProperties::DisallowZeroCopy {
            state.current_chunk_state.handles.clear();
        }
        true
    }

    /// Work-stealing scan: the shared cursor is advanced under its lock,
    /// then the chunk is materialized into this thread's local state.
    pub fn scan_parallel(
        &self,
        state: &ColumnDataParallelScanState,
        local_state: &mut ColumnDataLocalScanState,
        result: &mut DataChunk,
    ) -> bool {
        result.reset();
        let (chunk_index, segment_index, row_index) = {
            let mut shared = state.scan_state.lock();
            if local_state.column_ids.is_empty() {
                local_state.column_ids = shared.column_ids.clone();
                local_state.properties = shared.properties;
            }
            match self.next_scan_index(&mut shared) {
                Some(indices) => indices,
                None => return false,
            }
        };
        self.scan_at_index(local_state, result, chunk_index, segment_index, row_index);
        true
    }

    fn scan_at_index(
        &self,
        local_state: &mut ColumnDataLocalScanState,
        result: &mut DataChunk,
        chunk_index: usize,
        segment_index: usize,
        row_index: usize,
    ) {
        if local_state.current_segment_index != Some(segment_index) {
            local_state.current_chunk_state.handles.clear();
            local_state.current_segment_index = Some(segment_index);
        }
        let segment = &self.segments[segment_index];
        segment.read_chunk(
            chunk_index,
            &mut local_state.current_chunk_state,
            result,
            &local_state.column_ids,
        );
        local_state.current_row_index = row_index;
        if local_state.properties == ColumnDataScanProperties::DisallowZeroCopy {
            local_state.current_chunk_state.handles.clear();
        }
    }

    // Iteration

    /// Iterate over all chunks.
    pub fn chunks(&self) -> ColumnDataChunkIterator<'_> {
        self.chunks_projected((0..self.types.len()).collect())
    }

    /// Iterate over the given columns, chunk at a time.
    pub fn chunks_projected(&self, column_ids: Vec<usize>) -> ColumnDataChunkIterator<'_> {
        ColumnDataChunkIterator::new(self, column_ids)
    }

    /// Iterate over all rows, one at a time.
    pub fn rows(&self) -> ColumnDataRowIterator<'_> {
        ColumnDataRowIterator::new(self)
    }

    /// Materialize every chunk and build a random-access row table.
    pub fn collect_rows(&self) -> ColumnDataRowCollection {
        ColumnDataRowCollection::new(self)
    }

    // Fetch

    /// Read chunk `chunk_idx` (all columns) into `result`.
    pub fn fetch_chunk(&self, chunk_idx: usize, result: &mut DataChunk) -> ColumnDataResult<()> {
        let mut index = chunk_idx;
        for segment in &self.segments {
            if index >= segment.chunk_count() {
                index -= segment.chunk_count();
            } else {
                *result = DataChunk::new(&self.types);
                segment.fetch_chunk(index, result);
                return Ok(());
            }
        }
        Err(ColumnDataError::ChunkIndexOutOfBounds {
            index: chunk_idx,
            chunk_count: self.chunk_count(),
        })
    }

    // Combine

    /// Move all segments of `other` into this collection, in order. `other`
    /// is left empty; no rows are copied.
    pub fn combine(&mut self, other: &mut ColumnDataCollection) -> ColumnDataResult<()> {
        if other.count == 0 {
            return Ok(());
        }
        if self.types != other.types {
            return Err(ColumnDataError::SchemaMismatch {
                expected: self.types.clone(),
                actual: other.types.clone(),
            });
        }
        debug!(
            count = self.count,
            other_count = other.count,
            "combining collections"
        );
        self.count += other.count;
        self.segments.append(&mut other.segments);
        other.count = 0;
        self.verify();
        Ok(())
    }

    // Helpers

    /// Debug-only reconciliation of segment and chunk counts.
    pub fn verify(&self) {
        #[cfg(debug_assertions)]
        {
            let mut total = 0;
            for segment in &self.segments {
                segment.verify();
                total += segment.count;
            }
            debug_assert_eq!(total, self.count);
        }
    }

    /// Drop all rows, keeping the schema.
    pub fn reset(&mut self) {
        debug!("resetting collection");
        self.count = 0;
        self.segments.clear();
    }

    pub fn print(&self) {
        println!("{}", self);
    }

    /// Compare two collections value by value.
    ///
    /// NULL compares equal to NULL. On the first difference a human-readable
    /// mismatch is written to `error_message` and `false` is returned.
    pub fn result_equals(
        left: &ColumnDataCollection,
        right: &ColumnDataCollection,
        error_message: &mut String,
    ) -> bool {
        if left.column_count() != right.column_count() {
            *error_message = "Column count mismatch".to_string();
            return false;
        }
        if left.count() != right.count() {
            *error_message = "Row count mismatch".to_string();
            return false;
        }
        let left_rows = left.collect_rows();
        let right_rows = right.collect_rows();
        for row in 0..left.count() {
            for column in 0..left.column_count() {
                let lvalue = left_rows.get_value(column, row);
                let rvalue = right_rows.get_value(column, row);
                if !values_are_equal(&lvalue, &rvalue) {
                    *error_message =
                        format!("{} <> {} (row: {}, col: {})", lvalue, rvalue, row, column);
                    return false;
                }
            }
        }
        true
    }
}

impl Default for ColumnDataCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ColumnDataCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use prettytable::{format, Table};
        writeln!(f, "Column Data Collection [{} rows]", self.count)?;
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for row in self.rows() {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            table.add_row(prettytable::Row::from(cells));
        }
        write!(f, "{}", table)
    }
}

impl fmt::Debug for ColumnDataCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDataCollection")
            .field("types", &self.types)
            .field("count", &self.count)
            .field("segments", &self.segments.len())
            .finish()
    }
}
