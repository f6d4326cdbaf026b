// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the platform heap.

/// Errors that can occur while allocating from the platform heap.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The heap cannot satisfy the request.
    #[error("out of memory: requested {requested_bytes} bytes, but only {available_bytes} available (heap: {budget_bytes})")]
    OutOfMemory {
        requested_bytes: usize,
        available_bytes: usize,
        budget_bytes: usize,
    },

    /// Attempted to allocate a zero-sized buffer.
    #[error("cannot allocate zero-sized buffer")]
    ZeroSizedAllocation,

    /// A human-readable size string could not be parsed.
    #[error("invalid size '{input}': {detail}")]
    InvalidSize { input: String, detail: String },
}
