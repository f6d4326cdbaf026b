// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pointer-width dependent sizes of the executor's bookkeeping structures.
//!
//! The executor keeps its persistent state (allocators, planner, per-tensor
//! and per-node records) at the tail of the arena. Those records contain
//! pointers, so the arena a model needs depends on the pointer width of the
//! machine running it. The same table is used to report what a model
//! measured on a 64-bit host would need on a 32-bit target.

use std::fmt;

/// Pointer width of a host or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    W32,
    W64,
}

impl PointerWidth {
    /// Returns the pointer width this crate was compiled for.
    pub fn host() -> Self {
        if cfg!(target_pointer_width = "64") {
            PointerWidth::W64
        } else {
            PointerWidth::W32
        }
    }

    /// Converts a bit count (32 or 64).
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(PointerWidth::W32),
            64 => Some(PointerWidth::W64),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            PointerWidth::W32 => 32,
            PointerWidth::W64 => 64,
        }
    }

    /// Size of a pointer in bytes.
    pub fn pointer_bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Returns the struct-size table for this width.
    pub fn struct_sizes(self) -> StructSizes {
        StructSizes::for_width(self)
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Sizes in bytes of each bookkeeping structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructSizes {
    pub simple_allocator: usize,
    pub planner: usize,
    pub micro_allocator: usize,
    pub builtin_data_allocator: usize,
    pub subgraph_allocations: usize,
    pub eval_tensor: usize,
    pub node: usize,
    pub scratch_handle: usize,
    pub pointer: usize,
    pub full_tensor: usize,
    pub quantization: usize,
}

impl StructSizes {
    pub const fn for_width(width: PointerWidth) -> Self {
        match width {
            PointerWidth::W64 => Self {
                simple_allocator: 56,
                planner: 72,
                micro_allocator: 64,
                builtin_data_allocator: 16,
                subgraph_allocations: 16,
                eval_tensor: 24,
                node: 64,
                scratch_handle: 8,
                pointer: 8,
                full_tensor: 64,
                quantization: 24,
            },
            PointerWidth::W32 => Self {
                simple_allocator: 28,
                planner: 44,
                micro_allocator: 32,
                builtin_data_allocator: 8,
                subgraph_allocations: 8,
                eval_tensor: 12,
                node: 32,
                scratch_handle: 4,
                pointer: 4,
                full_tensor: 32,
                quantization: 12,
            },
        }
    }

    /// Fixed cost independent of the model: two simple allocators, the
    /// planner, the micro allocator, the builtin-data allocator and the
    /// subgraph allocation record.
    pub fn fixed_bytes(&self) -> usize {
        self.simple_allocator * 2
            + self.planner
            + self.micro_allocator
            + self.builtin_data_allocator
            + self.subgraph_allocations
    }

    /// Total bookkeeping bytes for a model with the given counts.
    pub fn overhead(&self, counts: &OverheadCounts) -> usize {
        self.fixed_bytes()
            + self.eval_tensor * counts.tensors
            + self.node * counts.nodes
            + self.scratch_handle * counts.scratch_buffers
            + (self.pointer + self.full_tensor) * counts.io_tensors
            + self.quantization * counts.quantized_io
            + self.pointer * counts.extra_pointers
    }
}

/// Model-dependent counts feeding [`StructSizes::overhead`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct OverheadCounts {
    pub tensors: usize,
    pub nodes: usize,
    pub scratch_buffers: usize,
    /// Subgraph inputs plus outputs.
    pub io_tensors: usize,
    /// Inputs and outputs that carry quantization parameters.
    pub quantized_io: usize,
    /// Additional pointers held by an accelerator's kernels.
    pub extra_pointers: usize,
}
