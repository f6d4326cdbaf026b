// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{require_elements, require_f32};
use crate::{EvalContext, Kernel, KernelError, NodeInfo};

/// Element-wise addition. The right operand may be a full tensor, a scalar,
/// or a vector matching the left operand's innermost dimension.
#[derive(Debug, Default, Clone, Copy)]
pub struct Add;

impl Kernel for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        node.expect_arity(2, 2)?;
        require_f32(node)?;
        let (lhs, rhs) = (node.input(0)?, node.input(1)?);
        let n = lhs.shape.num_elements();
        let m = rhs.shape.num_elements();
        if m != n && m != 1 && m != lhs.shape.last_dim() {
            return Err(KernelError::Invalid(format!(
                "cannot broadcast {} onto {}",
                rhs.shape, lhs.shape
            )));
        }
        require_elements(node.output(0)?, n)?;
        Ok(Vec::new())
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let lhs = ctx.input_f32(0)?;
        let rhs = ctx.input_f32(1)?;
        let out: Vec<f32> = lhs
            .iter()
            .enumerate()
            .map(|(i, a)| a + rhs[i % rhs.len()])
            .collect();
        ctx.write_output_f32(0, &out)
    }
}
