// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for executor construction and invocation.

use model_format::BuiltinOp;
use tensor_core::TensorError;

/// Errors raised by the executor.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// The arena cannot hold the planned tensors plus persistent bookkeeping.
    #[error("arena too small: {required} bytes required, {available} available")]
    ArenaTooSmall { required: usize, available: usize },

    /// No kernel is registered for an operator used by the model.
    #[error("operator {index} ({op}) has no registered kernel")]
    UnsupportedOp { index: usize, op: BuiltinOp },

    /// A kernel rejected its node during prepare or failed during eval.
    #[error("operator {index} ({op}) failed: {source}")]
    Kernel {
        index: usize,
        op: BuiltinOp,
        #[source]
        source: KernelError,
    },

    /// `invoke()` or a tensor accessor was called before `allocate_tensors()`.
    #[error("tensors have not been allocated")]
    NotAllocated,

    /// An input or output index is out of range.
    #[error("{kind} index {index} out of range (model has {len})")]
    TensorIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// A tensor view could not be created.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Errors raised by an individual kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// The node has the wrong number of inputs or outputs.
    #[error("expected {expected} {kind}, got {actual}")]
    Arity {
        kind: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// The node's tensors are inconsistent with the operator's contract.
    #[error("invalid node: {0}")]
    Invalid(String),

    /// Tensor data could not be read or written.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
