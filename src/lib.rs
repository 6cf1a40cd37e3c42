// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! An in-memory, append-only, chunked columnar buffer.
//!
//! A [`ColumnDataCollection`] holds an ordered sequence of rows with a fixed
//! schema. Rows are appended in bulk as [`DataChunk`]s and read back through
//! serial or parallel forward scans, chunk/row iterators, or random chunk
//! fetches. Internally the collection is a list of segments, each owning
//! block-backed vectors of at most [`STANDARD_VECTOR_SIZE`] rows, a string
//! heap for out-of-line blobs, and descriptor chains for nested list and
//! struct columns.
//!
//! The collection is an ephemeral staging structure: rows can never be
//! updated or deleted, and row positions are not stable across
//! [`ColumnDataCollection::combine`].

#![deny(unused_must_use)]

pub mod buffer;
pub mod collection;
pub mod error;
pub mod types;
pub mod vector;

pub use self::buffer::{BufferManager, BufferPoolOptions, ClientContext};
pub use self::collection::{
    ColumnDataAllocator, ColumnDataAppendState, ColumnDataCollection, ColumnDataLocalScanState,
    ColumnDataParallelScanState, ColumnDataRow, ColumnDataRowCollection,
    ColumnDataScanProperties, ColumnDataScanState,
};
pub use self::error::{ColumnDataError, ColumnDataResult};
pub use self::types::{DataValue, LogicalType, PhysicalType, Row};
pub use self::vector::{DataChunk, DataChunkBuilder, Vector};

/// The maximum number of rows held by a single vector instance.
///
/// Every chunk, and every vector descriptor inside a segment, is bounded by
/// this constant. Keeping it a build-time constant keeps block sizing and
/// index arithmetic trivial.
pub const STANDARD_VECTOR_SIZE: usize = 1024;
