// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # interpreter
//!
//! A reference executor that runs a [`model_format::FlatModel`] inside one
//! fixed, caller-provided arena.
//!
//! The runtime treats the executor as opaque: it constructs one over an
//! arena, asks it to allocate tensors, and either keeps it (success) or
//! destroys it and reclaims the arena (failure). This crate provides that
//! contract:
//!
//! - [`Interpreter`]: construct, [`allocate_tensors`](Interpreter::allocate_tensors),
//!   [`invoke`](Interpreter::invoke), tensor access, [`into_arena`](Interpreter::into_arena).
//! - [`OpResolver`] / [`Kernel`]: the operator-resolution table.
//! - [`ErrorReporter`]: error reporting with scoped suppression.
//! - [`Profiler`] / [`Recorder`]: optional per-operator diagnostics.
//! - [`PointerWidth`] / [`StructSizes`]: the bookkeeping size table.
//!
//! # Example
//! ```
//! use interpreter::{Interpreter, InterpreterOptions, InvokeHooks, OpResolver};
//! use model_format::{BuiltinOp, FlatModel, ModelBuilder};
//! use std::sync::Arc;
//! use tensor_core::{DType, Shape};
//!
//! let mut b = ModelBuilder::new();
//! let x = b.add_tensor("x", Shape::vector(4), DType::F32);
//! let y = b.add_tensor("y", Shape::vector(4), DType::F32);
//! b.add_operator(BuiltinOp::Relu, &[x], &[y]);
//! b.set_io(&[x], &[y]);
//! let blob = b.to_bytes().unwrap();
//!
//! let model = Arc::new(FlatModel::parse(&blob).unwrap());
//! let resolver = OpResolver::with_builtins();
//! let mut interp = Interpreter::new(model, &resolver, vec![0u8; 4096], InterpreterOptions::default());
//! interp.allocate_tensors().unwrap();
//! interp.input_mut(0).unwrap().copy_from_f32(&[-1.0, 2.0, -3.0, 4.0]).unwrap();
//! interp.invoke(&mut InvokeHooks::default()).unwrap();
//! assert_eq!(interp.output(0).unwrap().to_f32_vec().unwrap(), vec![0.0, 2.0, 0.0, 4.0]);
//! ```

mod diagnostics;
mod error;
#[allow(clippy::module_inception)]
mod interpreter;
mod kernel;
pub mod kernels;
pub mod layout;
pub mod planner;
mod reporter;

pub use diagnostics::{OpProfile, Profiler, RecordedOp, RecordedTensor, Recorder};
pub use error::{InterpreterError, KernelError};
pub use interpreter::{Interpreter, InterpreterOptions, InvokeHooks};
pub use kernel::{EvalContext, Kernel, NodeInfo, OpResolver};
pub use layout::{OverheadCounts, PointerWidth, StructSizes};
pub use reporter::{ErrorReporter, SuppressGuard};
