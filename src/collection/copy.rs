// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! Type-specialized copy of unified vector views into segment vectors.
//!
//! Each schema column resolves, once at collection construction, to a tree
//! of copy functions shaped like the column's type: scalars are leaves,
//! lists carry one child function, structs one per field. Appends walk the
//! tree; the shared engine handles windowing, validity initialization, and
//! overflow chaining, while each leaf writes its slot format.

use itertools::Itertools;

use super::allocator::ChunkManagementState;
use super::encode::{
    validity_offset, validity_set_all_valid, validity_set_invalid, vector_region_size,
    write_string_slot, FixedSizeCodec, STRING_SLOT_SIZE,
};
use super::segment::{ColumnDataCollectionSegment, StringHeap, VectorDataIndex};
use crate::error::ColumnDataResult;
use crate::types::{Interval, LogicalType, PhysicalType, F32, F64};
use crate::vector::{UnifiedVectorFormat, Vector, VectorData};
use crate::STANDARD_VECTOR_SIZE;

/// Append state: the pin cache of the chunk currently being written.
#[derive(Debug, Default)]
pub struct ColumnDataAppendState {
    pub(crate) current_chunk_state: ChunkManagementState,
}

pub(crate) type ColumnDataCopyFn = fn(
    &ColumnDataCopyFunction,
    &mut ColumnDataMetaData<'_>,
    &UnifiedVectorFormat<'_>,
    &Vector,
    usize,
    usize,
) -> ColumnDataResult<()>;

/// One node of the per-column copy tree.
pub(crate) struct ColumnDataCopyFunction {
    pub function: ColumnDataCopyFn,
    pub child_functions: Vec<ColumnDataCopyFunction>,
}

/// Mutable context threaded through one column's copy.
pub(crate) struct ColumnDataMetaData<'a> {
    pub segment: &'a mut ColumnDataCollectionSegment,
    pub state: &'a mut ColumnDataAppendState,
    pub chunk_index: usize,
    pub vector_data_index: VectorDataIndex,
    /// Rows already present in the child chain when copying list entries;
    /// stored entry offsets are shifted by this amount.
    pub child_list_size: usize,
}

/// The shared copy engine.
///
/// Writes `count` source rows starting at `offset` into the descriptor chain
/// rooted at `meta.vector_data_index`, at most `STANDARD_VECTOR_SIZE -
/// current.count` per step, allocating or following `next_data` on overflow.
/// A descriptor's validity region is set all-valid on first touch; null
/// source rows skip the data write and clear their validity bit.
fn templated_copy(
    meta: &mut ColumnDataMetaData<'_>,
    format: &UnifiedVectorFormat<'_>,
    ty: &LogicalType,
    mut offset: usize,
    count: usize,
    type_size: usize,
    assign: &mut dyn FnMut(&mut StringHeap, usize, &mut [u8], usize, usize),
) -> ColumnDataResult<()> {
    let mut current_index = meta.vector_data_index;
    let mut remaining = count;
    while remaining > 0 {
        let (block_id, block_offset, current_count) = {
            let vector_meta = meta.segment.vector_data(current_index);
            (vector_meta.block_id, vector_meta.offset, vector_meta.count)
        };
        let append_count = remaining.min(STANDARD_VECTOR_SIZE - current_count);
        let handle = meta
            .segment
            .pin_block(&mut meta.state.current_chunk_state, block_id);
        {
            let mut guard = handle.write();
            let region = &mut guard[block_offset..block_offset + vector_region_size(type_size)];
            let (data_region, validity_region) = region.split_at_mut(validity_offset(type_size));
            if current_count == 0 {
                // first write into this vector: the region is uninitialized
                validity_set_all_valid(validity_region);
            }
            for i in 0..append_count {
                let source_idx = format.sel.get(offset + i);
                if format.validity.row_is_valid(source_idx) {
                    assign(
                        &mut meta.segment.heap,
                        meta.child_list_size,
                        data_region,
                        current_count + i,
                        source_idx,
                    );
                } else {
                    validity_set_invalid(validity_region, current_count + i);
                }
            }
        }
        meta.segment.vector_data_mut(current_index).count += append_count;
        offset += append_count;
        remaining -= append_count;
        if remaining > 0 {
            current_index = match meta.segment.vector_data(current_index).next_data {
                Some(next) => next,
                None => meta.segment.allocate_vector(ty, Some(current_index))?,
            };
        }
    }
    Ok(())
}

fn copy_fixed<T: FixedSizeCodec>(
    _function: &ColumnDataCopyFunction,
    meta: &mut ColumnDataMetaData<'_>,
    format: &UnifiedVectorFormat<'_>,
    source: &Vector,
    offset: usize,
    copy_count: usize,
) -> ColumnDataResult<()> {
    let values = T::data_slice(format.data);
    templated_copy(
        meta,
        format,
        source.logical_type(),
        offset,
        copy_count,
        T::SIZE,
        &mut |_heap, _child_list_size, data, target_idx, source_idx| {
            values[source_idx].write_slot(&mut data[target_idx * T::SIZE..(target_idx + 1) * T::SIZE]);
        },
    )
}

fn copy_varchar(
    _function: &ColumnDataCopyFunction,
    meta: &mut ColumnDataMetaData<'_>,
    format: &UnifiedVectorFormat<'_>,
    source: &Vector,
    offset: usize,
    copy_count: usize,
) -> ColumnDataResult<()> {
    let VectorData::Varchar(values) = format.data else {
        panic!("vector data does not match physical type");
    };
    templated_copy(
        meta,
        format,
        source.logical_type(),
        offset,
        copy_count,
        STRING_SLOT_SIZE,
        &mut |heap, _child_list_size, data, target_idx, source_idx| {
            let slot = &mut data[target_idx * STRING_SLOT_SIZE..(target_idx + 1) * STRING_SLOT_SIZE];
            write_string_slot(slot, &values[source_idx], heap);
        },
    )
}

fn copy_list(
    function: &ColumnDataCopyFunction,
    meta: &mut ColumnDataMetaData<'_>,
    format: &UnifiedVectorFormat<'_>,
    source: &Vector,
    offset: usize,
    copy_count: usize,
) -> ColumnDataResult<()> {
    let VectorData::List { entries, child } = format.data else {
        panic!("vector data does not match physical type");
    };
    let child_size = child.len();
    let child_format = child.to_unified_format();

    let child_index = match meta.segment.vector_data(meta.vector_data_index).child_index {
        Some(child_index) => child_index,
        None => {
            let child_head = meta.segment.allocate_vector(child.logical_type(), None)?;
            let child_index = meta.segment.add_child_index(child_head);
            meta.segment
                .vector_data_mut(meta.vector_data_index)
                .child_index = Some(child_index);
            child_index
        }
    };
    let child_head = meta.segment.get_child_index(child_index, 0);

    // rows already in the child chain; entry offsets are rebased against
    // the head of the chain
    let current_list_size = meta.segment.chain_count(child_head);

    // append the entire child vector
    // TODO: only the entries referenced by [offset, offset + copy_count)
    // need to be copied, at the cost of remapping their offsets here
    let child_function = &function.child_functions[0];
    let mut child_meta = ColumnDataMetaData {
        segment: &mut *meta.segment,
        state: &mut *meta.state,
        chunk_index: meta.chunk_index,
        vector_data_index: child_head,
        child_list_size: 0,
    };
    (child_function.function)(
        child_function,
        &mut child_meta,
        &child_format,
        child,
        0,
        child_size,
    )?;

    // now copy the list entries, shifted past the pre-existing child rows
    meta.child_list_size = current_list_size;
    templated_copy(
        meta,
        format,
        source.logical_type(),
        offset,
        copy_count,
        <crate::vector::ListEntry as FixedSizeCodec>::SIZE,
        &mut |_heap, child_list_size, data, target_idx, source_idx| {
            let mut entry = entries[source_idx];
            entry.offset += child_list_size as u64;
            let size = <crate::vector::ListEntry as FixedSizeCodec>::SIZE;
            entry.write_slot(&mut data[target_idx * size..(target_idx + 1) * size]);
        },
    )
}

fn copy_struct(
    function: &ColumnDataCopyFunction,
    meta: &mut ColumnDataMetaData<'_>,
    format: &UnifiedVectorFormat<'_>,
    source: &Vector,
    offset: usize,
    copy_count: usize,
) -> ColumnDataResult<()> {
    // the root stores only the struct-level validity
    templated_copy(
        meta,
        format,
        source.logical_type(),
        offset,
        copy_count,
        0,
        &mut |_heap, _child_list_size, _data, _target_idx, _source_idx| {},
    )?;

    let VectorData::Struct(children) = format.data else {
        panic!("vector data does not match physical type");
    };
    let child_index = meta
        .segment
        .vector_data(meta.vector_data_index)
        .child_index
        .expect("struct vector missing child descriptors");
    for (child_idx, (child_function, child_vector)) in
        function.child_functions.iter().zip_eq(children).enumerate()
    {
        let child_data_index = meta.segment.get_child_index(child_index, child_idx);
        let child_format = child_vector.to_unified_format();
        let mut child_meta = ColumnDataMetaData {
            segment: &mut *meta.segment,
            state: &mut *meta.state,
            chunk_index: meta.chunk_index,
            vector_data_index: child_data_index,
            child_list_size: 0,
        };
        (child_function.function)(
            child_function,
            &mut child_meta,
            &child_format,
            child_vector,
            offset,
            copy_count,
        )?;
    }
    Ok(())
}

/// Resolve the copy tree for one column type.
pub(crate) fn get_copy_function(ty: &LogicalType) -> ColumnDataCopyFunction {
    let mut child_functions = vec![];
    let function: ColumnDataCopyFn = match ty.physical_type() {
        PhysicalType::Bool => copy_fixed::<bool>,
        PhysicalType::Int8 => copy_fixed::<i8>,
        PhysicalType::Int16 => copy_fixed::<i16>,
        PhysicalType::Int32 => copy_fixed::<i32>,
        PhysicalType::Int64 => copy_fixed::<i64>,
        PhysicalType::Int128 => copy_fixed::<i128>,
        PhysicalType::UInt8 => copy_fixed::<u8>,
        PhysicalType::UInt16 => copy_fixed::<u16>,
        PhysicalType::UInt32 => copy_fixed::<u32>,
        PhysicalType::UInt64 => copy_fixed::<u64>,
        PhysicalType::Float32 => copy_fixed::<F32>,
        PhysicalType::Float64 => copy_fixed::<F64>,
        PhysicalType::Interval => copy_fixed::<Interval>,
        PhysicalType::Varchar => copy_varchar,
        PhysicalType::List => {
            let LogicalType::List(child) = ty else {
                unreachable!()
            };
            child_functions.push(get_copy_function(child));
            copy_list
        }
        PhysicalType::Struct => {
            let LogicalType::Struct(fields) = ty else {
                unreachable!()
            };
            for (_, field_ty) in fields {
                child_functions.push(get_copy_function(field_ty));
            }
            copy_struct
        }
    };
    ColumnDataCopyFunction {
        function,
        child_functions,
    }
}
