// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::buffer::{Block, BlockId, BufferHandle, BufferManager, BLOCK_CAPACITY};
use crate::error::ColumnDataResult;

/// The pin cache of an append or scan state.
///
/// Holding a handle keeps its block resident; the cache is cleared when a
/// scan crosses a segment boundary, bounding the number of live pins.
#[derive(Debug, Default)]
pub struct ChunkManagementState {
    pub(crate) handles: HashMap<BlockId, BufferHandle>,
}

/// Hands out vector regions inside fixed-size blocks.
///
/// Regions are bump-allocated: a region that does not fit in the current
/// block opens a new one. The allocator is shared between collections cloned
/// from a common source, so all access goes through an internal lock.
#[derive(Debug, Default)]
pub struct ColumnDataAllocator {
    buffer_manager: Option<Arc<BufferManager>>,
    inner: Mutex<AllocatorInner>,
}

#[derive(Debug, Default)]
struct AllocatorInner {
    blocks: Vec<Arc<Block>>,
    /// Unused bytes at the tail of the last block.
    free_space: usize,
}

impl ColumnDataAllocator {
    /// An allocator whose blocks are plain heap memory.
    pub fn new() -> Self {
        ColumnDataAllocator::default()
    }

    /// An allocator whose blocks are reserved against a buffer pool.
    pub fn with_buffer_manager(buffer_manager: Arc<BufferManager>) -> Self {
        ColumnDataAllocator {
            buffer_manager: Some(buffer_manager),
            inner: Mutex::new(AllocatorInner::default()),
        }
    }

    /// Bump-allocate a region of `size` bytes; returns its block and offset.
    pub(crate) fn allocate_data(&self, size: usize) -> ColumnDataResult<(BlockId, usize)> {
        assert!(size <= BLOCK_CAPACITY, "region larger than a block");
        let mut inner = self.inner.lock();
        if inner.blocks.is_empty() || inner.free_space < size {
            if let Some(buffer_manager) = &self.buffer_manager {
                buffer_manager.reserve(BLOCK_CAPACITY)?;
            }
            inner.blocks.push(Arc::new(Block::new()));
            inner.free_space = BLOCK_CAPACITY;
            trace!(block_id = inner.blocks.len() - 1, "allocated block");
        }
        let block_id = (inner.blocks.len() - 1) as BlockId;
        let offset = BLOCK_CAPACITY - inner.free_space;
        inner.free_space -= size;
        Ok((block_id, offset))
    }

    /// Pin a block through the state's handle cache.
    pub(crate) fn pin(
        &self,
        state: &mut ChunkManagementState,
        block_id: BlockId,
    ) -> BufferHandle {
        if let Some(handle) = state.handles.get(&block_id) {
            return handle.clone();
        }
        let handle = {
            let inner = self.inner.lock();
            BufferHandle::new(inner.blocks[block_id as usize].clone())
        };
        state.handles.insert(block_id, handle.clone());
        handle
    }
}

impl Drop for ColumnDataAllocator {
    fn drop(&mut self) {
        if let Some(buffer_manager) = &self.buffer_manager {
            let blocks = self.inner.get_mut().blocks.len();
            buffer_manager.release(blocks * BLOCK_CAPACITY);
        }
    }
}
