// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! A budget-enforced platform heap for runtime arenas on targets without
//! virtual memory. The heap stands in for the device's `malloc`/`free`: every
//! runtime arena and every scratch buffer probed by the sizing search is
//! carved out of it, and every byte is accounted for.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: a hard heap size with human-readable parsing
//!   (`"512K"`, `"2M"`, etc.).
//! - [`MemoryPool`]: the heap: enforces the budget and tracks live bytes.
//! - [`BufferGuard`]: an RAII wrapper around one allocation. Dropping the
//!   guard frees the bytes back to the heap.
//! - [`AllocationStats`]: cumulative heap metrics (peak usage, failed
//!   requests, outstanding allocations) used for leak accounting.
//!
//! # Ownership Model
//!
//! ```text
//! MemoryPool::allocate(size)
//!       │
//!       ▼
//!   BufferGuard  ◄─── owns Vec<u8>, holds Arc<PoolInner>
//!       │
//!       │  drop()
//!       ▼
//!   PoolInner::release()  ──► live bytes decremented
//! ```
//!
//! # Example
//! ```
//! use memory_manager::{MemoryPool, MemoryBudget};
//!
//! let heap = MemoryPool::new(MemoryBudget::from_kb(64));
//!
//! let arena = heap.allocate(16 * 1024).unwrap();
//! assert_eq!(heap.allocated_bytes(), 16 * 1024);
//!
//! drop(arena);
//! assert_eq!(heap.allocated_bytes(), 0);
//! assert_eq!(heap.stats().outstanding(), 0);
//! ```

mod budget;
mod error;
mod guard;
pub mod pool;
mod stats;

pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use guard::BufferGuard;
pub use pool::MemoryPool;
pub use stats::AllocationStats;
