// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforced platform heap.
//!
//! The [`MemoryPool`] models the fixed heap of a device without virtual
//! memory:
//!
//! 1. Requests that would exceed the budget fail with `OutOfMemory` and
//!    nothing is reserved.
//! 2. Every allocation is a fresh zeroed `Vec<u8>` handed out inside a
//!    [`BufferGuard`]; there is no free list, so freed bytes go straight
//!    back to the host allocator.
//! 3. Allocation, failure and deallocation counts are recorded so callers
//!    can check that a failed load left no outstanding allocation behind.
//!
//! # Thread Safety
//! `MemoryPool` is cheap to clone; clones share one heap through an
//! `Arc<PoolInner>`.

use crate::{AllocationStats, BufferGuard, MemoryBudget, MemoryError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Internal heap state, shared between the pool and buffer guards via `Arc`.
pub struct PoolInner {
    budget: MemoryBudget,
    /// Currently allocated bytes (live, not yet freed).
    allocated_bytes: AtomicUsize,
    stats: Mutex<AllocationStats>,
}

impl PoolInner {
    /// Called by `BufferGuard::drop` to give the bytes back.
    pub(crate) fn release(&self, buffer: Vec<u8>) {
        self.allocated_bytes.fetch_sub(buffer.len(), Ordering::AcqRel);
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_deallocation();
        }
        drop(buffer);
    }
}

/// The platform heap that runtime arenas are allocated from.
///
/// # Example
/// ```
/// use memory_manager::{MemoryPool, MemoryBudget, MemoryError};
///
/// let heap = MemoryPool::new(MemoryBudget::from_kb(4));
/// let a = heap.allocate(3 * 1024).unwrap();
/// assert!(matches!(heap.allocate(2 * 1024), Err(MemoryError::OutOfMemory { .. })));
/// drop(a);
/// assert!(heap.allocate(2 * 1024).is_ok());
/// ```
#[derive(Clone)]
pub struct MemoryPool {
    inner: Arc<PoolInner>,
}

impl MemoryPool {
    /// Creates a new heap with the given budget.
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                budget,
                allocated_bytes: AtomicUsize::new(0),
                stats: Mutex::new(AllocationStats::default()),
            }),
        }
    }

    /// Allocates a zeroed buffer of `size_bytes`.
    ///
    /// Returns `Err(OutOfMemory)` if the allocation would exceed the budget.
    /// The returned [`BufferGuard`] frees the bytes when dropped.
    pub fn allocate(&self, size_bytes: usize) -> Result<BufferGuard, MemoryError> {
        if size_bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let budget = self.inner.budget.as_bytes();
        let reserved = self.inner.allocated_bytes.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |current| {
                current
                    .checked_add(size_bytes)
                    .filter(|&total| total <= budget)
            },
        );

        let previous = match reserved {
            Ok(previous) => previous,
            Err(current) => {
                tracing::trace!(
                    requested = size_bytes,
                    available = budget.saturating_sub(current),
                    "heap allocation refused"
                );
                if let Ok(mut stats) = self.inner.stats.lock() {
                    stats.record_failure();
                }
                return Err(MemoryError::OutOfMemory {
                    requested_bytes: size_bytes,
                    available_bytes: budget.saturating_sub(current),
                    budget_bytes: budget,
                });
            }
        };

        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_allocation(size_bytes, previous + size_bytes);
        }

        Ok(BufferGuard::new(vec![0u8; size_bytes], Arc::clone(&self.inner)))
    }

    /// Returns the number of bytes currently allocated (live, not yet freed).
    pub fn allocated_bytes(&self) -> usize {
        self.inner.allocated_bytes.load(Ordering::Acquire)
    }

    /// Returns the number of bytes remaining before hitting the budget.
    pub fn available_bytes(&self) -> usize {
        self.inner
            .budget
            .as_bytes()
            .saturating_sub(self.allocated_bytes())
    }

    /// Returns the heap budget.
    pub fn budget(&self) -> MemoryBudget {
        self.inner.budget
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> AllocationStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPool")
            .field("budget", &self.inner.budget)
            .field("allocated_bytes", &self.allocated_bytes())
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
