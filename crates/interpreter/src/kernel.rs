// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The kernel interface and the operator-resolution table.
//!
//! A kernel is prepared once per node while tensors are being allocated
//! (to validate shapes and request scratch memory) and evaluated once per
//! node on every invocation.

use crate::KernelError;
use model_format::{BuiltinOp, OpOptions, TensorDef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tensor_core::{TensorView, TensorViewMut};

/// An operator implementation.
pub trait Kernel: Send + Sync {
    /// Short name used in logs and profiles.
    fn name(&self) -> &'static str;

    /// Validates the node and returns the sizes of the scratch buffers the
    /// kernel needs during `eval`.
    fn prepare(&self, node: &NodeInfo<'_>) -> Result<Vec<usize>, KernelError> {
        let _ = node;
        Ok(Vec::new())
    }

    /// Computes the node's outputs.
    fn eval(&self, ctx: &mut EvalContext<'_>) -> Result<(), KernelError>;
}

/// Static description of a node, available while preparing.
#[derive(Debug)]
pub struct NodeInfo<'n> {
    pub inputs: Vec<&'n TensorDef>,
    pub outputs: Vec<&'n TensorDef>,
    pub options: &'n OpOptions,
}

impl<'n> NodeInfo<'n> {
    /// Fails unless the node has between `min` and `max` inputs and exactly
    /// one output.
    pub fn expect_arity(&self, min: usize, max: usize) -> Result<(), KernelError> {
        if self.inputs.len() < min || self.inputs.len() > max {
            return Err(KernelError::Arity {
                kind: "inputs",
                expected: if min == max { arity_label(min) } else { "a variable number of" },
                actual: self.inputs.len(),
            });
        }
        if self.outputs.len() != 1 {
            return Err(KernelError::Arity {
                kind: "outputs",
                expected: "1",
                actual: self.outputs.len(),
            });
        }
        Ok(())
    }

    pub fn input(&self, i: usize) -> Result<&'n TensorDef, KernelError> {
        self.inputs.get(i).copied().ok_or(KernelError::Arity {
            kind: "inputs",
            expected: "more",
            actual: self.inputs.len(),
        })
    }

    pub fn output(&self, i: usize) -> Result<&'n TensorDef, KernelError> {
        self.outputs.get(i).copied().ok_or(KernelError::Arity {
            kind: "outputs",
            expected: "more",
            actual: self.outputs.len(),
        })
    }
}

fn arity_label(n: usize) -> &'static str {
    match n {
        0 => "0",
        1 => "1",
        2 => "2",
        3 => "3",
        _ => "several",
    }
}

/// Where a node's tensor lives during evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Region<'c> {
    Arena { offset: usize, len: usize },
    Constant(&'c [u8]),
}

/// Runtime access to one node's tensors and scratch buffers.
pub struct EvalContext<'c> {
    pub(crate) inputs: Vec<(&'c TensorDef, Region<'c>)>,
    pub(crate) outputs: Vec<(&'c TensorDef, Region<'c>)>,
    pub(crate) scratch: &'c [(usize, usize)],
    pub(crate) options: &'c OpOptions,
    pub(crate) arena: &'c mut [u8],
}

impl<'c> EvalContext<'c> {
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn options(&self) -> &OpOptions {
        self.options
    }

    pub fn input_def(&self, i: usize) -> Result<&'c TensorDef, KernelError> {
        self.inputs.get(i).map(|(d, _)| *d).ok_or(KernelError::Arity {
            kind: "inputs",
            expected: "more",
            actual: self.inputs.len(),
        })
    }

    /// Returns a read-only view of input `i`.
    pub fn input(&self, i: usize) -> Result<TensorView<'_>, KernelError> {
        let (def, region) = self.inputs.get(i).copied().ok_or(KernelError::Arity {
            kind: "inputs",
            expected: "more",
            actual: self.inputs.len(),
        })?;
        let bytes = match region {
            Region::Constant(bytes) => bytes,
            Region::Arena { offset, len } => &self.arena[offset..offset + len],
        };
        Ok(TensorView::new(&def.shape, def.dtype, bytes)?)
    }

    /// Decodes input `i` as `f32` values.
    pub fn input_f32(&self, i: usize) -> Result<Vec<f32>, KernelError> {
        Ok(self.input(i)?.to_f32_vec()?)
    }

    /// Returns a writable view of output `i`.
    pub fn output(&mut self, i: usize) -> Result<TensorViewMut<'_>, KernelError> {
        let (def, region) = self.outputs.get(i).copied().ok_or(KernelError::Arity {
            kind: "outputs",
            expected: "more",
            actual: self.outputs.len(),
        })?;
        match region {
            Region::Arena { offset, len } => Ok(TensorViewMut::new(
                &def.shape,
                def.dtype,
                &mut self.arena[offset..offset + len],
            )?),
            Region::Constant(_) => Err(KernelError::Invalid(format!(
                "output tensor '{}' is a constant",
                def.name
            ))),
        }
    }

    /// Writes `values` into output `i`.
    pub fn write_output_f32(&mut self, i: usize, values: &[f32]) -> Result<(), KernelError> {
        self.output(i)?.copy_from_f32(values)?;
        Ok(())
    }

    /// Returns scratch buffer `i` as requested in `prepare`.
    pub fn scratch(&mut self, i: usize) -> Result<&mut [u8], KernelError> {
        let &(offset, len) = self.scratch.get(i).ok_or_else(|| {
            KernelError::Invalid(format!("scratch buffer {i} was not requested"))
        })?;
        Ok(&mut self.arena[offset..offset + len])
    }
}

/// Maps operator kinds to kernels.
///
/// # Example
/// ```
/// use interpreter::OpResolver;
/// use model_format::BuiltinOp;
///
/// let resolver = OpResolver::with_builtins();
/// assert!(resolver.find(BuiltinOp::FullyConnected).is_some());
/// assert!(resolver.find(BuiltinOp::Conv2d).is_none());
/// ```
#[derive(Clone, Default)]
pub struct OpResolver {
    kernels: BTreeMap<BuiltinOp, Arc<dyn Kernel>>,
}

impl OpResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with every reference kernel registered.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        crate::kernels::register_builtins(&mut r);
        r
    }

    /// Registers (or replaces) the kernel for `op`.
    pub fn register(&mut self, op: BuiltinOp, kernel: Arc<dyn Kernel>) -> &mut Self {
        self.kernels.insert(op, kernel);
        self
    }

    pub fn find(&self, op: BuiltinOp) -> Option<&dyn Kernel> {
        self.kernels.get(&op).map(|k| k.as_ref())
    }

    /// Returns the registered operator kinds.
    pub fn ops(&self) -> impl Iterator<Item = BuiltinOp> + '_ {
        self.kernels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

impl std::fmt::Debug for OpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kernels.keys()).finish()
    }
}
