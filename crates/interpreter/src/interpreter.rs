// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The executor: binds a model to a fixed arena and runs it.
//!
//! Construction never fails and never touches the arena. All validation
//! happens in [`Interpreter::allocate_tensors`], which is where an arena
//! that is too small is detected:
//!
//! ```text
//! arena
//! ┌───────────────────────────────┬──────────────┬────────────────────┐
//! │ planned activations + scratch │   (unused)   │ persistent records │
//! └───────────────────────────────┴──────────────┴────────────────────┘
//! 0                        head_bytes      len - persistent        len
//! ```
//!
//! The requirement `head_bytes + persistent_bytes` depends only on the
//! model, the resolver and the pointer width, so an arena either fits or it
//! does not, regardless of its address.

use crate::kernel::Region;
use crate::layout::{OverheadCounts, PointerWidth};
use crate::planner::{self, BufferRequirement};
use crate::{
    ErrorReporter, EvalContext, InterpreterError, Kernel, NodeInfo, OpResolver, Profiler,
    RecordedOp, RecordedTensor, Recorder,
};
use model_format::{BuiltinOp, FlatModel};
use std::ops::DerefMut;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::{TensorView, TensorViewMut};

/// Construction options.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Pointer width used to size the persistent bookkeeping.
    pub pointer_width: PointerWidth,
    pub reporter: ErrorReporter,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            pointer_width: PointerWidth::host(),
            reporter: ErrorReporter::new(),
        }
    }
}

/// Optional collaborators for one [`Interpreter::invoke`] call.
#[derive(Default)]
pub struct InvokeHooks<'h> {
    pub profiler: Option<&'h Profiler>,
    pub recorder: Option<&'h Recorder>,
    /// Called after each operator with its index.
    pub callback: Option<&'h mut (dyn FnMut(usize) + Send)>,
}

struct ArenaPlan<'a> {
    kernels: Vec<(BuiltinOp, &'a dyn Kernel)>,
    /// `(offset, len)` per tensor; `None` for constants and unused tensors.
    regions: Vec<Option<(usize, usize)>>,
    /// `(offset, len)` per scratch buffer, per operator.
    scratch: Vec<Vec<(usize, usize)>>,
    counts: OverheadCounts,
    head_bytes: usize,
    persistent_bytes: usize,
}

/// A model bound to an arena.
///
/// `B` is anything that derefs to a mutable byte slice: a caller-owned
/// `&mut [u8]`, a heap `BufferGuard`, or a `Vec<u8>` in tests. Destroying
/// the interpreter with [`into_arena`](Self::into_arena) hands the arena
/// back, so the arena can never be released while the executor still
/// references it.
pub struct Interpreter<'a, B> {
    model: Arc<FlatModel<'a>>,
    resolver: &'a OpResolver,
    arena: B,
    options: InterpreterOptions,
    plan: Option<ArenaPlan<'a>>,
}

impl<'a, B> Interpreter<'a, B>
where
    B: DerefMut<Target = [u8]>,
{
    /// Binds `model` and `resolver` to `arena`. Does not validate anything.
    pub fn new(
        model: Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
        arena: B,
        options: InterpreterOptions,
    ) -> Self {
        Self {
            model,
            resolver,
            arena,
            options,
            plan: None,
        }
    }

    /// Resolves and prepares every operator, then plans all tensors into
    /// the arena.
    ///
    /// On failure the error is also sent to the configured
    /// [`ErrorReporter`], and the interpreter stays unallocated.
    pub fn allocate_tensors(&mut self) -> Result<(), InterpreterError> {
        match self.build_plan() {
            Ok(plan) => {
                let arena: &mut [u8] = &mut self.arena;
                arena[..plan.head_bytes].fill(0);
                tracing::debug!(
                    head = plan.head_bytes,
                    persistent = plan.persistent_bytes,
                    arena = arena.len(),
                    "tensors allocated"
                );
                self.plan = Some(plan);
                Ok(())
            }
            Err(e) => {
                self.options.reporter.report(&e);
                Err(e)
            }
        }
    }

    fn build_plan(&self) -> Result<ArenaPlan<'a>, InterpreterError> {
        let resolver: &'a OpResolver = self.resolver;
        let header = self.model.header();
        let graph = &header.subgraph;

        let mut kernels = Vec::with_capacity(graph.operators.len());
        let mut scratch_sizes = Vec::with_capacity(graph.operators.len());
        for (index, op) in graph.operators.iter().enumerate() {
            let builtin = header.op_of(op).ok_or(InterpreterError::TensorIndex {
                kind: "operator code",
                index: op.opcode_index,
                len: header.operator_codes.len(),
            })?;
            let kernel = resolver
                .find(builtin)
                .ok_or(InterpreterError::UnsupportedOp { index, op: builtin })?;
            let node = NodeInfo {
                inputs: op.inputs.iter().map(|&t| &graph.tensors[t]).collect(),
                outputs: op.outputs.iter().map(|&t| &graph.tensors[t]).collect(),
                options: &op.options,
            };
            let sizes = kernel
                .prepare(&node)
                .map_err(|source| InterpreterError::Kernel {
                    index,
                    op: builtin,
                    source,
                })?;
            kernels.push((builtin, kernel));
            scratch_sizes.push(sizes);
        }

        // Live ranges in operator steps. Graph inputs are live from the
        // start, graph outputs until the end.
        let last_step = graph.operators.len().saturating_sub(1);
        let mut spans: Vec<Option<(usize, usize)>> = vec![None; graph.tensors.len()];
        for &t in &graph.inputs {
            widen(&mut spans[t], 0);
        }
        for (step, op) in graph.operators.iter().enumerate() {
            for &t in op.inputs.iter().chain(&op.outputs) {
                widen(&mut spans[t], step);
            }
        }
        for &t in &graph.outputs {
            widen(&mut spans[t], last_step);
        }

        let mut requirements = Vec::new();
        let mut planned_tensors = Vec::new();
        for (t, span) in spans.iter().enumerate() {
            let tensor = &graph.tensors[t];
            if let (Some((first_use, last_use)), false) = (*span, tensor.is_constant()) {
                requirements.push(BufferRequirement {
                    size: tensor.size_bytes(),
                    first_use,
                    last_use,
                });
                planned_tensors.push(t);
            }
        }
        let tensor_count = requirements.len();
        for (step, sizes) in scratch_sizes.iter().enumerate() {
            for &size in sizes {
                requirements.push(BufferRequirement {
                    size,
                    first_use: step,
                    last_use: step,
                });
            }
        }

        let memory_plan = planner::plan(&requirements);
        let mut regions = vec![None; graph.tensors.len()];
        for (i, &t) in planned_tensors.iter().enumerate() {
            regions[t] = Some((memory_plan.offsets[i], requirements[i].size));
        }
        let mut next = tensor_count;
        let scratch: Vec<Vec<(usize, usize)>> = scratch_sizes
            .iter()
            .map(|sizes| {
                sizes
                    .iter()
                    .map(|&size| {
                        let slot = (memory_plan.offsets[next], size);
                        next += 1;
                        slot
                    })
                    .collect()
            })
            .collect();

        let counts = OverheadCounts {
            tensors: graph.tensors.len(),
            nodes: graph.operators.len(),
            scratch_buffers: requirements.len() - tensor_count,
            io_tensors: graph.inputs.len() + graph.outputs.len(),
            quantized_io: graph
                .inputs
                .iter()
                .chain(&graph.outputs)
                .filter(|&&t| graph.tensors[t].quantization.is_some())
                .count(),
            extra_pointers: 0,
        };
        let persistent_bytes =
            planner::align_up(self.options.pointer_width.struct_sizes().overhead(&counts));
        let required = memory_plan.head_bytes + persistent_bytes;
        if required > self.arena.len() {
            return Err(InterpreterError::ArenaTooSmall {
                required,
                available: self.arena.len(),
            });
        }

        Ok(ArenaPlan {
            kernels,
            regions,
            scratch,
            counts,
            head_bytes: memory_plan.head_bytes,
            persistent_bytes,
        })
    }

    /// Runs every operator once, in order.
    pub fn invoke(&mut self, hooks: &mut InvokeHooks<'_>) -> Result<(), InterpreterError> {
        let plan = self.plan.as_ref().ok_or(InterpreterError::NotAllocated)?;
        let model = &self.model;
        let graph = &model.header().subgraph;
        let arena: &mut [u8] = &mut self.arena;

        let region = |t: usize| match model.constant_data(t) {
            Some(bytes) => Region::Constant(bytes),
            None => {
                let (offset, len) = plan.regions[t].unwrap_or((0, 0));
                Region::Arena { offset, len }
            }
        };

        for (index, op) in graph.operators.iter().enumerate() {
            let (builtin, kernel) = plan.kernels[index];
            let mut ctx = EvalContext {
                inputs: op.inputs.iter().map(|&t| (&graph.tensors[t], region(t))).collect(),
                outputs: op.outputs.iter().map(|&t| (&graph.tensors[t], region(t))).collect(),
                scratch: &plan.scratch[index],
                options: &op.options,
                arena: &mut *arena,
            };

            let started = Instant::now();
            let outcome = kernel.eval(&mut ctx);
            drop(ctx);
            if let Err(source) = outcome {
                let err = InterpreterError::Kernel {
                    index,
                    op: builtin,
                    source,
                };
                self.options.reporter.report(&err);
                return Err(err);
            }
            let elapsed = started.elapsed();

            if let Some(profiler) = hooks.profiler {
                profiler.record(index, kernel.name(), elapsed);
            }
            if let Some(recorder) = hooks.recorder {
                let outputs = op
                    .outputs
                    .iter()
                    .map(|&t| {
                        let def = &graph.tensors[t];
                        let data = match region(t) {
                            Region::Constant(bytes) => bytes.to_vec(),
                            Region::Arena { offset, len } => arena[offset..offset + len].to_vec(),
                        };
                        RecordedTensor {
                            name: def.name.clone(),
                            shape: def.shape.dims().to_vec(),
                            dtype: def.dtype.as_str().to_string(),
                            data,
                        }
                    })
                    .collect();
                recorder.record(RecordedOp {
                    index,
                    op: kernel.name().to_string(),
                    outputs,
                });
            }
            if let Some(callback) = hooks.callback.as_mut() {
                callback(index);
            }
        }
        Ok(())
    }

    /// Destroys the executor and returns the arena.
    pub fn into_arena(self) -> B {
        self.arena
    }

    pub fn is_allocated(&self) -> bool {
        self.plan.is_some()
    }

    pub fn model(&self) -> &FlatModel<'a> {
        &self.model
    }

    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Start address of the arena, for memory maps such as a simulator's.
    pub fn arena_ptr(&self) -> *const u8 {
        self.arena.as_ptr()
    }

    /// Bytes of the arena actually needed, or 0 before allocation.
    pub fn arena_used_bytes(&self) -> usize {
        self.plan
            .as_ref()
            .map_or(0, |p| p.head_bytes + p.persistent_bytes)
    }

    /// Bytes of persistent bookkeeping at the arena tail, or 0 before allocation.
    pub fn persistent_bytes(&self) -> usize {
        self.plan.as_ref().map_or(0, |p| p.persistent_bytes)
    }

    /// Number of scratch buffers requested by kernels, or 0 before allocation.
    pub fn scratch_buffer_count(&self) -> usize {
        self.plan.as_ref().map_or(0, |p| p.counts.scratch_buffers)
    }

    /// The counts used to size the persistent bookkeeping.
    pub fn overhead_counts(&self) -> Option<OverheadCounts> {
        self.plan.as_ref().map(|p| p.counts)
    }

    pub fn inputs_len(&self) -> usize {
        self.model.subgraph().inputs.len()
    }

    pub fn outputs_len(&self) -> usize {
        self.model.subgraph().outputs.len()
    }

    pub fn input(&self, index: usize) -> Result<TensorView<'_>, InterpreterError> {
        let t = io_tensor("input", &self.model.subgraph().inputs, index)?;
        self.tensor(t)
    }

    pub fn output(&self, index: usize) -> Result<TensorView<'_>, InterpreterError> {
        let t = io_tensor("output", &self.model.subgraph().outputs, index)?;
        self.tensor(t)
    }

    /// Returns a writable view of an input so the caller can fill it.
    pub fn input_mut(&mut self, index: usize) -> Result<TensorViewMut<'_>, InterpreterError> {
        let graph = self.model.subgraph();
        let t = io_tensor("input", &graph.inputs, index)?;
        let plan = self.plan.as_ref().ok_or(InterpreterError::NotAllocated)?;
        let (offset, len) = plan.regions[t].ok_or(InterpreterError::TensorIndex {
            kind: "writable input",
            index,
            len: graph.inputs.len(),
        })?;
        let def = &graph.tensors[t];
        let arena: &mut [u8] = &mut self.arena;
        Ok(TensorViewMut::new(
            &def.shape,
            def.dtype,
            &mut arena[offset..offset + len],
        )?)
    }

    fn tensor(&self, t: usize) -> Result<TensorView<'_>, InterpreterError> {
        let plan = self.plan.as_ref().ok_or(InterpreterError::NotAllocated)?;
        let def = &self.model.subgraph().tensors[t];
        let bytes = match (self.model.constant_data(t), plan.regions[t]) {
            (Some(bytes), _) => bytes,
            (None, Some((offset, len))) => &self.arena[offset..offset + len],
            (None, None) => &[],
        };
        Ok(TensorView::new(&def.shape, def.dtype, bytes)?)
    }
}

impl<B: DerefMut<Target = [u8]>> std::fmt::Debug for Interpreter<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("arena_len", &self.arena.len())
            .field("allocated", &self.is_allocated())
            .field("arena_used_bytes", &self.arena_used_bytes())
            .finish()
    }
}

fn widen(span: &mut Option<(usize, usize)>, step: usize) {
    *span = Some(match *span {
        Some((first, last)) => (first.min(step), last.max(step)),
        None => (step, step),
    });
}

fn io_tensor(kind: &'static str, list: &[usize], index: usize) -> Result<usize, InterpreterError> {
    list.get(index).copied().ok_or(InterpreterError::TensorIndex {
        kind,
        index,
        len: list.len(),
    })
}
