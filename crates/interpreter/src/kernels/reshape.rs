// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::require_elements;
use crate::{EvalContext, Kernel, KernelError, NodeInfo};

/// Copies the input into an output of a different shape. Works for any dtype.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reshape;

impl Kernel for Reshape {
    fn name(&self) -> &'static str {
        "reshape"
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        // An optional second input carries the target shape as a tensor.
        node.expect_arity(1, 2)?;
        let (input, output) = (node.input(0)?, node.output(0)?);
        if input.dtype != output.dtype {
            return Err(KernelError::Invalid(format!(
                "reshape cannot convert {} to {}",
                input.dtype, output.dtype
            )));
        }
        require_elements(output, input.shape.num_elements())?;
        if let Some(new_shape) = &node.options.new_shape {
            if new_shape.as_slice() != output.shape.dims() {
                return Err(KernelError::Invalid(format!(
                    "new_shape {new_shape:?} does not match output {}",
                    output.shape
                )));
            }
        }
        Ok(Vec::new())
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let bytes = ctx.input(0)?.as_bytes().to_vec();
        ctx.output(0)?.copy_from_bytes(&bytes)?;
        Ok(())
    }
}
