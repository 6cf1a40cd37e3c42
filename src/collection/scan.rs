// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use parking_lot::Mutex;

use super::allocator::ChunkManagementState;

/// Read hints for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnDataScanProperties {
    /// Output may keep referring to pinned blocks; pins are held until the
    /// scan crosses a segment boundary.
    #[default]
    AllowZeroCopy,
    /// Output must be fully materialized; pins are dropped after every
    /// chunk.
    DisallowZeroCopy,
}

/// Cursor of a serial scan.
#[derive(Debug, Default)]
pub struct ColumnDataScanState {
    pub(crate) chunk_index: usize,
    pub(crate) segment_index: usize,
    pub(crate) current_row_index: usize,
    pub(crate) next_row_index: usize,
    pub(crate) current_chunk_state: ChunkManagementState,
    pub(crate) properties: ColumnDataScanProperties,
    pub(crate) column_ids: Vec<usize>,
}

impl ColumnDataScanState {
    /// Row index of the first row in the most recently scanned chunk.
    pub fn current_row_index(&self) -> usize {
        self.current_row_index
    }

    pub fn column_ids(&self) -> &[usize] {
        &self.column_ids
    }
}

/// Shared state of a parallel scan. Threads serialize only the index
/// advance; chunk materialization runs unsynchronized per thread.
#[derive(Debug, Default)]
pub struct ColumnDataParallelScanState {
    pub(crate) scan_state: Mutex<ColumnDataScanState>,
}

/// Per-thread state of a parallel scan.
#[derive(Debug, Default)]
pub struct ColumnDataLocalScanState {
    pub(crate) current_chunk_state: ChunkManagementState,
    pub(crate) current_segment_index: Option<usize>,
    pub(crate) current_row_index: usize,
    pub(crate) column_ids: Vec<usize>,
    pub(crate) properties: ColumnDataScanProperties,
}

impl ColumnDataLocalScanState {
    /// Row index of the first row in the chunk this thread last scanned.
    pub fn current_row_index(&self) -> usize {
        self.current_row_index
    }
}
