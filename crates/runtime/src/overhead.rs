// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Converts a runtime memory size measured on the host into what the model
//! would need on the target.
//!
//! ```text
//! adjusted = size - overhead(host) + overhead(target)
//! ```
//!
//! The result is only reported. It never drives an allocation.

use crate::accelerator::MVP_ACCELERATOR;
use interpreter::{OverheadCounts, PointerWidth};
use model_format::{BuiltinOp, FlatModel};

/// Pointers kept by MVP accelerator kernels for one operator.
pub fn mvp_pointers(op: BuiltinOp) -> usize {
    match op {
        BuiltinOp::Add => 3,
        BuiltinOp::Conv2d | BuiltinOp::DepthwiseConv2d => 7,
        BuiltinOp::FullyConnected => 5,
        BuiltinOp::AveragePool2d | BuiltinOp::MaxPool2d => 2,
        BuiltinOp::TransposeConv => 8,
        BuiltinOp::Relu | BuiltinOp::Softmax | BuiltinOp::Reshape => 0,
    }
}

/// Extra pointers held by the named accelerator's kernels for `model`.
pub fn extra_pointers(model: &FlatModel<'_>, accelerator: Option<&str>) -> usize {
    if accelerator != Some(MVP_ACCELERATOR) {
        return 0;
    }
    let header = model.header();
    header
        .subgraph
        .operators
        .iter()
        .filter_map(|op| header.op_of(op))
        .map(mvp_pointers)
        .sum()
}

/// Re-expresses `size` for a target with a different pointer width.
pub fn adjust_runtime_size(
    size: usize,
    counts: &OverheadCounts,
    host: PointerWidth,
    target: PointerWidth,
) -> usize {
    let host_overhead = host.struct_sizes().overhead(counts);
    let target_overhead = target.struct_sizes().overhead(counts);
    size.saturating_sub(host_overhead) + target_overhead
}
