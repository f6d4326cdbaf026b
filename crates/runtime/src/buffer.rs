// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The runtime buffer backing a loaded model's arena.

use memory_manager::BufferGuard;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Working memory handed to the executor.
///
/// A caller buffer is only borrowed and goes back to the caller on unload.
/// An owned buffer came from the platform heap and returns to it when
/// dropped.
pub enum RuntimeBuffer<'a> {
    Caller(&'a mut [u8]),
    Owned(BufferGuard),
}

impl RuntimeBuffer<'_> {
    /// Whether the model owns this buffer.
    pub fn is_owned(&self) -> bool {
        matches!(self, RuntimeBuffer::Owned(_))
    }
}

impl Deref for RuntimeBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            RuntimeBuffer::Caller(bytes) => bytes,
            RuntimeBuffer::Owned(guard) => guard,
        }
    }
}

impl DerefMut for RuntimeBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            RuntimeBuffer::Caller(bytes) => bytes,
            RuntimeBuffer::Owned(guard) => guard,
        }
    }
}

impl fmt::Debug for RuntimeBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_owned() { "Owned" } else { "Caller" };
        f.debug_struct("RuntimeBuffer")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

/// Which strategy produced the runtime buffer of a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferSource {
    /// Supplied by the caller.
    Caller,
    /// Sized from the model's `runtime_memory_size` parameter.
    Hint,
    /// Sized by the binary search.
    Search,
}

impl fmt::Display for BufferSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BufferSource::Caller => "caller buffer",
            BufferSource::Hint => "embedded size hint",
            BufferSource::Search => "size search",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::{MemoryBudget, MemoryPool};

    #[test]
    fn test_caller_buffer_is_borrowed() {
        let mut backing = vec![0u8; 32];
        {
            let mut buf = RuntimeBuffer::Caller(&mut backing);
            assert!(!buf.is_owned());
            buf[0] = 7;
            assert_eq!(buf.len(), 32);
        }
        assert_eq!(backing[0], 7);
    }

    #[test]
    fn test_owned_buffer_returns_to_heap() {
        let heap = MemoryPool::new(MemoryBudget::from_kb(4));
        let buf = RuntimeBuffer::Owned(heap.allocate(1024).unwrap());
        assert!(buf.is_owned());
        assert_eq!(heap.allocated_bytes(), 1024);
        drop(buf);
        assert_eq!(heap.allocated_bytes(), 0);
    }
}
