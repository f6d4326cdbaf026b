// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{require_elements, require_f32};
use crate::{EvalContext, Kernel, KernelError, NodeInfo};

/// `y = x · Wᵀ + b` with weights laid out `[out_features, in_features]`.
///
/// Inputs: activations, weights, optional bias of `out_features`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullyConnected;

impl Kernel for FullyConnected {
    fn name(&self) -> &'static str {
        "fully_connected"
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        node.expect_arity(2, 3)?;
        require_f32(node)?;
        let weights = node.input(1)?;
        let &[out_features, in_features] = weights.shape.dims() else {
            return Err(KernelError::Invalid(format!(
                "weights must be rank 2, got {}",
                weights.shape
            )));
        };
        let input_elems = node.input(0)?.shape.num_elements();
        if in_features == 0 || input_elems % in_features != 0 {
            return Err(KernelError::Invalid(format!(
                "input of {input_elems} elements is not a multiple of {in_features} features"
            )));
        }
        if let Ok(bias) = node.input(2) {
            require_elements(bias, out_features)?;
        }
        let batch = input_elems / in_features;
        require_elements(node.output(0)?, batch * out_features)?;
        Ok(Vec::new())
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let x = ctx.input_f32(0)?;
        let w = ctx.input_f32(1)?;
        let bias = if ctx.num_inputs() > 2 {
            Some(ctx.input_f32(2)?)
        } else {
            None
        };
        let dims = ctx.input_def(1)?.shape.dims();
        let (out_features, in_features) = (dims[0], dims[1]);

        let mut out = Vec::with_capacity(x.len() / in_features * out_features);
        for row in x.chunks_exact(in_features) {
            for (o, w_row) in w.chunks_exact(in_features).enumerate() {
                let dot: f32 = row.iter().zip(w_row).map(|(a, b)| a * b).sum();
                out.push(dot + bias.as_ref().map_or(0.0, |b| b[o]));
            }
        }
        ctx.write_output_f32(0, &out)
    }
}
