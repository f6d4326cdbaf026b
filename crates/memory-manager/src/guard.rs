// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII buffer guard that frees its bytes back to the heap on drop.
//!
//! A [`BufferGuard`] is the only handle to a heap allocation. It derefs to
//! `[u8]`, so an executor can be constructed over it exactly as over a
//! caller-supplied `&mut [u8]`.

use crate::pool::PoolInner;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// An RAII guard wrapping one heap allocation.
///
/// # Example
/// ```
/// use memory_manager::{MemoryBudget, MemoryPool};
///
/// let heap = MemoryPool::new(MemoryBudget::from_kb(8));
/// let mut buf = heap.allocate(1024).unwrap();
/// buf[0] = 7;
/// assert_eq!(buf.len(), 1024);
/// drop(buf);
/// assert_eq!(heap.allocated_bytes(), 0);
/// ```
pub struct BufferGuard {
    /// `None` only after the bytes were handed back in `drop()`.
    data: Option<Vec<u8>>,
    pool: Arc<PoolInner>,
    size_bytes: usize,
}

impl BufferGuard {
    pub(crate) fn new(data: Vec<u8>, pool: Arc<PoolInner>) -> Self {
        let size_bytes = data.len();
        Self {
            data: Some(data),
            pool,
            size_bytes,
        }
    }

    /// Returns the size of this allocation in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Returns the start address of the allocation.
    pub fn as_ptr(&self) -> *const u8 {
        self.deref().as_ptr()
    }
}

impl Deref for BufferGuard {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for BufferGuard {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for BufferGuard {
    fn drop(&mut self) {
        if let Some(buffer) = self.data.take() {
            self.pool.release(buffer);
        }
    }
}

impl std::fmt::Debug for BufferGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferGuard")
            .field("size_bytes", &self.size_bytes)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
