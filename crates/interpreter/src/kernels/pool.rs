// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::require_f32;
use crate::{EvalContext, Kernel, KernelError, NodeInfo};
use model_format::OpOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Max,
    Average,
}

/// 2-D pooling over NHWC tensors with VALID padding.
///
/// The window comes from `options.filter`; the stride defaults to the
/// window size.
#[derive(Debug, Clone, Copy)]
pub struct Pool2d {
    kind: PoolKind,
}

impl Pool2d {
    pub fn new(kind: PoolKind) -> Self {
        Self { kind }
    }
}

struct Geometry {
    batch: usize,
    in_h: usize,
    in_w: usize,
    channels: usize,
    out_h: usize,
    out_w: usize,
    filter: [usize; 2],
    stride: [usize; 2],
}

fn geometry(dims: &[usize], options: &OpOptions) -> Result<Geometry, KernelError> {
    let &[batch, in_h, in_w, channels] = dims else {
        return Err(KernelError::Invalid(format!("pooling needs NHWC input, got rank {}", dims.len())));
    };
    let filter = options
        .filter
        .ok_or_else(|| KernelError::Invalid("pooling requires a filter size".into()))?;
    let stride = options.stride.unwrap_or(filter);
    if filter.contains(&0) || stride.contains(&0) || filter[0] > in_h || filter[1] > in_w {
        return Err(KernelError::Invalid(format!(
            "filter {filter:?} / stride {stride:?} invalid for {in_h}x{in_w} input"
        )));
    }
    Ok(Geometry {
        batch,
        in_h,
        in_w,
        channels,
        out_h: (in_h - filter[0]) / stride[0] + 1,
        out_w: (in_w - filter[1]) / stride[1] + 1,
        filter,
        stride,
    })
}

impl Kernel for Pool2d {
    fn name(&self) -> &'static str {
        match self.kind {
            PoolKind::Max => "max_pool2d",
            PoolKind::Average => "average_pool2d",
        }
    }

    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        node.expect_arity(1, 1)?;
        require_f32(node)?;
        let g = geometry(node.input(0)?.shape.dims(), node.options)?;
        let expected = [g.batch, g.out_h, g.out_w, g.channels];
        let output = node.output(0)?;
        if output.shape.dims() != expected {
            return Err(KernelError::Invalid(format!(
                "output shape {} does not match pooled shape {expected:?}",
                output.shape
            )));
        }
        Ok(Vec::new())
    }

    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError> {
        let g = geometry(ctx.input_def(0)?.shape.dims(), ctx.options())?;
        let x = ctx.input_f32(0)?;
        let window = (g.filter[0] * g.filter[1]) as f32;

        let mut out = Vec::with_capacity(g.batch * g.out_h * g.out_w * g.channels);
        for n in 0..g.batch {
            for oy in 0..g.out_h {
                for ox in 0..g.out_w {
                    for c in 0..g.channels {
                        let mut acc = match self.kind {
                            PoolKind::Max => f32::NEG_INFINITY,
                            PoolKind::Average => 0.0,
                        };
                        for fy in 0..g.filter[0] {
                            for fx in 0..g.filter[1] {
                                let y = oy * g.stride[0] + fy;
                                let xx = ox * g.stride[1] + fx;
                                let v = x[((n * g.in_h + y) * g.in_w + xx) * g.channels + c];
                                acc = match self.kind {
                                    PoolKind::Max => acc.max(v),
                                    PoolKind::Average => acc + v,
                                };
                            }
                        }
                        out.push(match self.kind {
                            PoolKind::Max => acc,
                            PoolKind::Average => acc / window,
                        });
                    }
                }
            }
        }
        ctx.write_output_f32(0, &out)
    }
}
