// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use tracing::trace;

use super::allocator::{ChunkManagementState, ColumnDataAllocator};
use super::encode::{
    read_string_slot, validity_offset, validity_row_is_valid, vector_region_size, FixedSizeCodec,
};
use crate::buffer::{BlockId, BufferHandle};
use crate::error::ColumnDataResult;
use crate::types::{Interval, LogicalType, F32, F64};
use crate::vector::{DataChunk, ListEntry, Vector, VectorData};

/// Handle into a segment's vector-descriptor table.
///
/// Valid for the lifetime of its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDataIndex(pub(crate) usize);

/// Handle into a segment's child-index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VectorChildIndex(pub(crate) usize);

/// Descriptor of one vector of at most `STANDARD_VECTOR_SIZE` rows.
#[derive(Debug)]
pub(crate) struct VectorMetaData {
    /// Rows written into this vector so far.
    pub count: usize,
    pub block_id: BlockId,
    /// Byte offset of the vector region inside the block.
    pub offset: usize,
    /// Overflow link: the next vector holding rows of the same chunk column.
    pub next_data: Option<VectorDataIndex>,
    /// For list/struct vectors: first entry in the child-index table.
    pub child_index: Option<VectorChildIndex>,
}

/// Per-chunk metadata: one root descriptor per schema column.
#[derive(Debug)]
pub(crate) struct ChunkMetaData {
    pub count: usize,
    pub vector_data: Vec<VectorDataIndex>,
}

/// Arena for out-of-line string blobs, one per segment.
#[derive(Debug, Default)]
pub(crate) struct StringHeap {
    data: Vec<u8>,
}

impl StringHeap {
    /// Copy `bytes` into the heap and return their offset.
    pub fn add_blob(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        offset
    }

    pub fn get(&self, offset: u64, len: usize) -> &[u8] {
        &self.data[offset as usize..offset as usize + len]
    }
}

/// A batch of chunks sharing a block pool and string heap.
///
/// Vector descriptors live in an arena addressed by [`VectorDataIndex`];
/// overflow chains and nested children are links between arena entries, so
/// the segment owns every descriptor it ever created.
pub(crate) struct ColumnDataCollectionSegment {
    pub(crate) allocator: Arc<ColumnDataAllocator>,
    types: Vec<LogicalType>,
    /// Total rows across all chunks.
    pub(crate) count: usize,
    vector_data: Vec<VectorMetaData>,
    chunk_data: Vec<ChunkMetaData>,
    child_indices: Vec<VectorDataIndex>,
    pub(crate) heap: StringHeap,
}

impl ColumnDataCollectionSegment {
    pub fn new(allocator: Arc<ColumnDataAllocator>, types: Vec<LogicalType>) -> Self {
        ColumnDataCollectionSegment {
            allocator,
            types,
            count: 0,
            vector_data: vec![],
            chunk_data: vec![],
            child_indices: vec![],
            heap: StringHeap::default(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_data.len()
    }

    pub fn chunk(&self, chunk_idx: usize) -> &ChunkMetaData {
        &self.chunk_data[chunk_idx]
    }

    pub fn chunk_mut(&mut self, chunk_idx: usize) -> &mut ChunkMetaData {
        &mut self.chunk_data[chunk_idx]
    }

    pub fn vector_data(&self, index: VectorDataIndex) -> &VectorMetaData {
        &self.vector_data[index.0]
    }

    pub fn vector_data_mut(&mut self, index: VectorDataIndex) -> &mut VectorMetaData {
        &mut self.vector_data[index.0]
    }

    /// Total row count of a descriptor chain.
    pub fn chain_count(&self, head: VectorDataIndex) -> usize {
        let mut total = 0;
        let mut index = Some(head);
        while let Some(current) = index {
            let meta = self.vector_data(current);
            total += meta.count;
            index = meta.next_data;
        }
        total
    }

    pub fn add_child_index(&mut self, index: VectorDataIndex) -> VectorChildIndex {
        self.child_indices.push(index);
        VectorChildIndex(self.child_indices.len() - 1)
    }

    pub fn get_child_index(&self, parent: VectorChildIndex, child: usize) -> VectorDataIndex {
        self.child_indices[parent.0 + child]
    }

    /// Allocate one vector descriptor with its block region.
    ///
    /// Struct vectors allocate their field descriptors eagerly; the single
    /// child of a list vector is allocated lazily on first copy. A
    /// `predecessor` is linked via its `next_data`.
    pub fn allocate_vector(
        &mut self,
        ty: &LogicalType,
        predecessor: Option<VectorDataIndex>,
    ) -> ColumnDataResult<VectorDataIndex> {
        let type_size = ty.physical_type().type_size();
        let (block_id, offset) = self.allocator.allocate_data(vector_region_size(type_size))?;
        let index = VectorDataIndex(self.vector_data.len());
        self.vector_data.push(VectorMetaData {
            count: 0,
            block_id,
            offset,
            next_data: None,
            child_index: None,
        });
        if let Some(prev) = predecessor {
            self.vector_data[prev.0].next_data = Some(index);
        }
        if let LogicalType::Struct(fields) = ty {
            let children = fields
                .iter()
                .map(|(_, field_ty)| self.allocate_vector(field_ty, None))
                .collect::<ColumnDataResult<Vec<_>>>()?;
            let start = VectorChildIndex(self.child_indices.len());
            self.child_indices.extend(children);
            self.vector_data[index.0].child_index = Some(start);
        }
        Ok(index)
    }

    /// Append an empty chunk with one root descriptor per schema column.
    pub fn allocate_new_chunk(&mut self) -> ColumnDataResult<usize> {
        let mut vector_data = Vec::with_capacity(self.types.len());
        for i in 0..self.types.len() {
            let ty = self.types[i].clone();
            vector_data.push(self.allocate_vector(&ty, None)?);
        }
        self.chunk_data.push(ChunkMetaData {
            count: 0,
            vector_data,
        });
        trace!(chunk_index = self.chunk_data.len() - 1, "allocated chunk");
        Ok(self.chunk_data.len() - 1)
    }

    pub fn pin_block(&self, state: &mut ChunkManagementState, block_id: BlockId) -> BufferHandle {
        self.allocator.pin(state, block_id)
    }

    /// Pin every block referenced by the chunk's descriptor trees.
    pub fn init_chunk_state(&self, chunk_idx: usize, state: &mut ChunkManagementState) {
        state.handles.clear();
        let chunk_meta = &self.chunk_data[chunk_idx];
        for (column, &head) in chunk_meta.vector_data.iter().enumerate() {
            self.pin_vector(state, &self.types[column], head);
        }
    }

    fn pin_vector(&self, state: &mut ChunkManagementState, ty: &LogicalType, head: VectorDataIndex) {
        let mut index = Some(head);
        while let Some(current) = index {
            let meta = self.vector_data(current);
            self.allocator.pin(state, meta.block_id);
            index = meta.next_data;
        }
        match ty {
            LogicalType::List(child_ty) => {
                if let Some(child_index) = self.vector_data(head).child_index {
                    self.pin_vector(state, child_ty, self.get_child_index(child_index, 0));
                }
            }
            LogicalType::Struct(fields) => {
                if let Some(child_index) = self.vector_data(head).child_index {
                    for (i, (_, field_ty)) in fields.iter().enumerate() {
                        self.pin_vector(state, field_ty, self.get_child_index(child_index, i));
                    }
                }
            }
            _ => {}
        }
    }

    /// Rehydrate the selected columns of a chunk into `chunk`.
    ///
    /// `chunk` must be initialized with the projected column types.
    pub fn read_chunk(
        &self,
        chunk_idx: usize,
        state: &mut ChunkManagementState,
        chunk: &mut DataChunk,
        column_ids: &[usize],
    ) {
        assert_eq!(
            chunk.column_count(),
            column_ids.len(),
            "output chunk does not match the projection"
        );
        chunk.reset();
        let chunk_meta = &self.chunk_data[chunk_idx];
        for (out_idx, &column) in column_ids.iter().enumerate() {
            let vector = self.read_vector(state, &self.types[column], chunk_meta.vector_data[column]);
            chunk.columns_mut()[out_idx] = vector;
        }
        chunk.set_cardinality(chunk_meta.count);
        chunk.verify();
    }

    /// Scan a single chunk with all columns.
    pub fn fetch_chunk(&self, chunk_idx: usize, chunk: &mut DataChunk) {
        let mut state = ChunkManagementState::default();
        let column_ids: Vec<usize> = (0..self.types.len()).collect();
        self.read_chunk(chunk_idx, &mut state, chunk, &column_ids);
    }

    /// Materialize a descriptor chain into a flat vector.
    ///
    /// List children are materialized recursively from the chain head's
    /// child link; the stored entries are already relative to that head.
    fn read_vector(
        &self,
        state: &mut ChunkManagementState,
        ty: &LogicalType,
        head: VectorDataIndex,
    ) -> Vector {
        let mut out = Vector::new(ty.clone());
        let type_size = ty.physical_type().type_size();
        let mut index = Some(head);
        while let Some(current) = index {
            let meta = self.vector_data(current);
            let handle = self.allocator.pin(state, meta.block_id);
            let guard = handle.read();
            let region = &guard[meta.offset..meta.offset + vector_region_size(type_size)];
            let (data_region, validity_region) = region.split_at(validity_offset(type_size));
            for i in 0..meta.count {
                let valid = validity_row_is_valid(validity_region, i);
                out.validity_mut().push(valid);
                let slot = &data_region[i * type_size..(i + 1) * type_size];
                match out.data_mut() {
                    VectorData::Bool(v) => v.push(valid && bool::read_slot(slot)),
                    VectorData::Int8(v) => v.push(if valid { i8::read_slot(slot) } else { 0 }),
                    VectorData::Int16(v) => v.push(if valid { i16::read_slot(slot) } else { 0 }),
                    VectorData::Int32(v) => v.push(if valid { i32::read_slot(slot) } else { 0 }),
                    VectorData::Int64(v) => v.push(if valid { i64::read_slot(slot) } else { 0 }),
                    VectorData::Int128(v) => v.push(if valid { i128::read_slot(slot) } else { 0 }),
                    VectorData::UInt8(v) => v.push(if valid { u8::read_slot(slot) } else { 0 }),
                    VectorData::UInt16(v) => v.push(if valid { u16::read_slot(slot) } else { 0 }),
                    VectorData::UInt32(v) => v.push(if valid { u32::read_slot(slot) } else { 0 }),
                    VectorData::UInt64(v) => v.push(if valid { u64::read_slot(slot) } else { 0 }),
                    VectorData::Float32(v) => v.push(if valid {
                        F32::read_slot(slot)
                    } else {
                        F32::from(0.0)
                    }),
                    VectorData::Float64(v) => v.push(if valid {
                        F64::read_slot(slot)
                    } else {
                        F64::from(0.0)
                    }),
                    VectorData::Interval(v) => v.push(if valid {
                        Interval::read_slot(slot)
                    } else {
                        Interval::default()
                    }),
                    VectorData::Varchar(v) => v.push(if valid {
                        read_string_slot(slot, &self.heap)
                    } else {
                        String::new()
                    }),
                    VectorData::List { entries, .. } => entries.push(if valid {
                        ListEntry::read_slot(slot)
                    } else {
                        ListEntry::default()
                    }),
                    VectorData::Struct(_) => {}
                }
            }
            index = meta.next_data;
        }
        match ty {
            LogicalType::List(child_ty) => {
                if let Some(child_index) = self.vector_data(head).child_index {
                    let child_head = self.get_child_index(child_index, 0);
                    let child = self.read_vector(state, child_ty, child_head);
                    let VectorData::List { child: slot, .. } = out.data_mut() else {
                        unreachable!()
                    };
                    **slot = child;
                }
            }
            LogicalType::Struct(fields) => {
                if let Some(child_index) = self.vector_data(head).child_index {
                    for (i, (_, field_ty)) in fields.iter().enumerate() {
                        let child_head = self.get_child_index(child_index, i);
                        let child = self.read_vector(state, field_ty, child_head);
                        let VectorData::Struct(children) = out.data_mut() else {
                            unreachable!()
                        };
                        children[i] = child;
                    }
                }
            }
            _ => {}
        }
        out
    }

    /// Debug-only reconciliation of descriptor, chunk, and segment counts.
    pub fn verify(&self) {
        #[cfg(debug_assertions)]
        {
            let mut total = 0;
            for chunk in &self.chunk_data {
                for &head in &chunk.vector_data {
                    debug_assert_eq!(self.chain_count(head), chunk.count);
                }
                total += chunk.count;
            }
            debug_assert_eq!(total, self.count);
        }
    }
}

impl std::fmt::Debug for ColumnDataCollectionSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDataCollectionSegment")
            .field("types", &self.types)
            .field("count", &self.count)
            .field("chunks", &self.chunk_data.len())
            .field("vectors", &self.vector_data.len())
            .finish()
    }
}
