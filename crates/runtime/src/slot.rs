// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed storage for the model's executor.
//!
//! The slot is either empty or holds one executor bound to one runtime
//! buffer. Occupancy is the definition of "loaded". Destroying the executor
//! yields its buffer, so a buffer is never released while an executor
//! still points into it.

use crate::RuntimeBuffer;
use interpreter::{Interpreter, InterpreterError, InterpreterOptions, OpResolver};
use model_format::FlatModel;
use std::sync::Arc;

/// The executor type stored in a slot.
pub type Executor<'a> = Interpreter<'a, RuntimeBuffer<'a>>;

/// A buffer the executor rejected, handed back for freeing or retrying.
#[derive(Debug)]
pub struct Rejected<'a> {
    pub buffer: RuntimeBuffer<'a>,
    pub source: InterpreterError,
}

#[derive(Debug, Default)]
pub struct ExecutorSlot<'a> {
    executor: Option<Executor<'a>>,
}

impl<'a> ExecutorSlot<'a> {
    pub fn new() -> Self {
        Self { executor: None }
    }

    /// Constructs an executor over `buffer` and allocates its tensors.
    ///
    /// On failure the executor is destroyed again, the slot is left empty
    /// and the buffer comes back inside [`Rejected`].
    pub fn construct(
        &mut self,
        model: Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
        buffer: RuntimeBuffer<'a>,
        options: InterpreterOptions,
    ) -> Result<&mut Executor<'a>, Rejected<'a>> {
        if self.executor.is_some() {
            tracing::warn!("replacing an executor that was never destroyed");
            drop(self.destroy());
        }

        let mut executor = Interpreter::new(model, resolver, buffer, options);
        match executor.allocate_tensors() {
            Ok(()) => Ok(self.executor.insert(executor)),
            Err(source) => Err(Rejected {
                buffer: executor.into_arena(),
                source,
            }),
        }
    }

    /// Destroys the executor, if any, and returns its buffer.
    pub fn destroy(&mut self) -> Option<RuntimeBuffer<'a>> {
        self.executor.take().map(Interpreter::into_arena)
    }

    pub fn get(&self) -> Option<&Executor<'a>> {
        self.executor.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Executor<'a>> {
        self.executor.as_mut()
    }

    pub fn is_occupied(&self) -> bool {
        self.executor.is_some()
    }
}
