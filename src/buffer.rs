// Copyright 2026 ColData Project Authors. Licensed under Apache-2.0.

//! Fixed-size memory blocks and the buffer manager that accounts for them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ColumnDataError, ColumnDataResult};
use crate::STANDARD_VECTOR_SIZE;

/// Widest value slot of any physical type.
const MAX_TYPE_SIZE: usize = 16;

/// Capacity of one block: one standard vector of the widest physical type
/// plus its validity bitmap.
pub const BLOCK_CAPACITY: usize =
    STANDARD_VECTOR_SIZE * MAX_TYPE_SIZE + STANDARD_VECTOR_SIZE / 8;

pub type BlockId = u32;

/// One fixed-capacity byte region. Vector regions are bump-allocated inside.
#[derive(Debug)]
pub struct Block {
    data: RwLock<Box<[u8]>>,
}

impl Block {
    pub(crate) fn new() -> Self {
        Block {
            data: RwLock::new(vec![0u8; BLOCK_CAPACITY].into_boxed_slice()),
        }
    }
}

/// A pin on a block: holding the handle keeps the block resident and its
/// contents addressable. The set of live handles is owned by the scan or
/// append state that obtained them.
#[derive(Debug, Clone)]
pub struct BufferHandle {
    block: Arc<Block>,
}

impl BufferHandle {
    pub(crate) fn new(block: Arc<Block>) -> Self {
        BufferHandle { block }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.block.data.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.block.data.write()
    }
}

/// Options for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolOptions {
    /// Upper bound on block memory, in bytes.
    pub memory_limit: usize,
}

impl Default for BufferPoolOptions {
    fn default() -> Self {
        BufferPoolOptions {
            memory_limit: usize::MAX,
        }
    }
}

/// Tracks block memory against a configurable limit.
///
/// Blocks are never evicted: this buffer is purely in-memory, so exceeding
/// the limit fails the reservation instead of spilling.
#[derive(Debug)]
pub struct BufferManager {
    memory_limit: usize,
    memory_used: AtomicUsize,
}

impl BufferManager {
    pub fn new(options: BufferPoolOptions) -> Self {
        BufferManager {
            memory_limit: options.memory_limit,
            memory_used: AtomicUsize::new(0),
        }
    }

    pub fn memory_used(&self) -> usize {
        self.memory_used.load(Ordering::Relaxed)
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    /// Reserve `bytes` of block memory.
    pub fn reserve(&self, bytes: usize) -> ColumnDataResult<()> {
        let mut used = self.memory_used.load(Ordering::Relaxed);
        loop {
            if used.saturating_add(bytes) > self.memory_limit {
                return Err(ColumnDataError::OutOfMemory {
                    requested: bytes,
                    used,
                    limit: self.memory_limit,
                });
            }
            match self.memory_used.compare_exchange_weak(
                used,
                used + bytes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(current) => used = current,
            }
        }
    }

    /// Release a previous reservation.
    pub fn release(&self, bytes: usize) {
        self.memory_used.fetch_sub(bytes, Ordering::Relaxed);
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        BufferManager::new(BufferPoolOptions::default())
    }
}

/// Per-client plumbing handed to collection constructors.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    buffer_manager: Arc<BufferManager>,
}

impl ClientContext {
    pub fn new(options: BufferPoolOptions) -> Self {
        ClientContext {
            buffer_manager: Arc::new(BufferManager::new(options)),
        }
    }

    pub fn buffer_manager(&self) -> &Arc<BufferManager> {
        &self.buffer_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_until_limit() {
        let manager = BufferManager::new(BufferPoolOptions { memory_limit: 100 });
        manager.reserve(60).unwrap();
        manager.reserve(40).unwrap();
        let err = manager.reserve(1).unwrap_err();
        assert!(matches!(err, ColumnDataError::OutOfMemory { .. }));
        manager.release(50);
        manager.reserve(50).unwrap();
    }
}
