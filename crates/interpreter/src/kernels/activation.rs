// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{require_elements, require_f32};
use crate::{EvalContext, Kernel, KernelError, NodeInfo};

/// `max(x, 0)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Relu;

impl Kernel for Relu {
    fn name(&self) -> &'static str {
        "relu"
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        node.expect_arity(1, 1)?;
        require_f32(node)?;
        require_elements(node.output(0)?, node.input(0)?.shape.num_elements())?;
        Ok(Vec::new())
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let out: Vec<f32> = ctx.input_f32(0)?.into_iter().map(|v| v.max(0.0)).collect();
        ctx.write_output_f32(0, &out)
    }
}

/// Softmax over the innermost dimension, scaled by `beta` (default 1).
///
/// Requests one scratch row to hold the exponentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct Softmax;

impl Kernel for Softmax {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        node.expect_arity(1, 1)?;
        require_f32(node)?;
        let input = node.input(0)?;
        require_elements(node.output(0)?, input.shape.num_elements())?;
        Ok(vec![input.shape.last_dim() * 4])
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let beta = ctx.options().beta.unwrap_or(1.0);
        let row_len = ctx.input_def(0)?.shape.last_dim().max(1);
        let x = ctx.input_f32(0)?;
        let mut out = Vec::with_capacity(x.len());

        for row in x.chunks(row_len) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let scratch = ctx.scratch(0)?;
            let mut sum = 0.0f32;
            for (slot, v) in scratch.chunks_exact_mut(4).zip(row) {
                let e = ((v - max) * beta).exp();
                sum += e;
                slot.copy_from_slice(&e.to_le_bytes());
            }
            out.extend(
                scratch
                    .chunks_exact(4)
                    .take(row.len())
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) / sum),
            );
        }
        ctx.write_output_f32(0, &out)
    }
}
