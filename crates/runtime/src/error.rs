// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the model lifecycle.

use interpreter::InterpreterError;

/// Errors returned by [`Model`](crate::Model) and the sizing engine.
///
/// Every error that ends a `load()` leaves the model fully unloaded.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// An operation that needs a loaded model was called on an unloaded one.
    #[error("model not loaded")]
    NotLoaded,

    /// `load()` or a diagnostics toggle was called while a model is loaded.
    #[error("model already loaded")]
    AlreadyLoaded,

    /// The platform heap could not provide the runtime buffer.
    #[error("failed to allocate runtime buffer of {size} bytes: {source}")]
    AllocationFailed {
        size: usize,
        #[source]
        source: memory_manager::MemoryError,
    },

    /// The executor rejected the runtime buffer.
    #[error("failed to construct executor: {0}")]
    ExecutorConstructionFailed(#[source] InterpreterError),

    /// The sizing search found no buffer size that works within the heap.
    #[error("no working runtime buffer size found below {ceiling} bytes (likely heap overflow)")]
    AllocationSizingFailed { ceiling: usize },

    /// The model's parameter block exists but could not be decoded.
    #[error("failed to parse model parameters: {0}")]
    MetadataParseFailed(#[source] model_format::FormatError),

    /// The executor failed while running the model.
    #[error("inference failed: {0}")]
    InvokeFailed(#[source] InterpreterError),

    /// An input or output index is out of range.
    #[error("{kind} index {index} out of range (model has {len})")]
    TensorIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// A diagnostic feature is disabled for this platform.
    #[error("{0} support is not enabled")]
    FeatureUnavailable(&'static str),

    /// The model blob is malformed.
    #[error("invalid model: {0}")]
    Format(#[from] model_format::FormatError),

    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    #[error("memory error: {0}")]
    Memory(#[from] memory_manager::MemoryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    /// Maps an executor error raised by a tensor accessor.
    pub(crate) fn from_accessor(err: InterpreterError) -> Self {
        match err {
            InterpreterError::TensorIndex { kind, index, len } => {
                RuntimeError::TensorIndex { kind, index, len }
            }
            InterpreterError::NotAllocated => RuntimeError::NotLoaded,
            InterpreterError::Tensor(e) => RuntimeError::Tensor(e),
            other => RuntimeError::InvokeFailed(other),
        }
    }
}
