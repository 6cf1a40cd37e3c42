// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use thiserror::Error;

use crate::types::LogicalType;

/// Errors produced by the column data collection.
///
/// Every variant signals a violated caller contract and is fatal to the
/// operation that raised it; there are no recoverable, user-surfaced errors
/// at this layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColumnDataError {
    #[error("schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<LogicalType>,
        actual: Vec<LogicalType>,
    },
    #[error("chunk index {index} out of bounds (collection has {chunk_count} chunks)")]
    ChunkIndexOutOfBounds { index: usize, chunk_count: usize },
    #[error("buffer pool limit exceeded: requested {requested} bytes with {used} of {limit} in use")]
    OutOfMemory {
        requested: usize,
        used: usize,
        limit: usize,
    },
}

pub type ColumnDataResult<T> = Result<T, ColumnDataError>;
