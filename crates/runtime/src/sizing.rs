// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bounded binary search for the smallest working runtime buffer.
//!
//! ```text
//! lower = 1024, upper = heap size - safety margin
//! while upper - lower > 128:
//!     mid = (lower + upper) / 2
//!     heap refuses mid          -> upper -= 8K
//!     executor fits in mid      -> upper = mid, remember mid
//!     executor does not fit     -> lower = mid + 1
//! result = smallest working mid + 256
//! ```
//!
//! The ceiling is taken from the heap's total size, not from what is still
//! free, so it may be optimistic when other allocations are live. Probes the
//! heap refuses walk the upper bound down until they fit.
//!
//! Each probe allocates a scratch buffer from the heap, builds an executor
//! over it and destroys both before the next probe, so at most one probe
//! buffer is outstanding at any time. Executor error reporting is silenced
//! for the duration of the search.

use crate::RuntimeError;
use interpreter::{Interpreter, InterpreterOptions, OpResolver};
use memory_manager::MemoryPool;
use model_format::FlatModel;
use std::sync::Arc;

/// Smallest buffer the search will try.
pub const SEARCH_LOWER_BOUND: usize = 1024;
/// The search stops once the bounds are this close.
pub const SEARCH_GRANULARITY: usize = 128;
/// How far the upper bound drops when the heap refuses a probe.
pub const ALLOCATION_BACKOFF: usize = 8 * 1024;
/// Added to the smallest working size for alignment slack and temporary
/// tensors requested during `invoke()`.
pub const SIZE_PADDING: usize = 256;

/// What happened to one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The heap could not provide the probe buffer.
    AllocationFailed,
    /// The executor allocated its tensors.
    Fits,
    /// The executor rejected the buffer.
    TooSmall,
}

/// One step of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Probe {
    pub size: usize,
    pub outcome: ProbeOutcome,
}

/// The outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SizingResult {
    /// Recommended buffer size (`last_working + 256`).
    pub size: usize,
    /// Smallest probe size the executor accepted.
    pub last_working: usize,
    /// Heap ceiling the search started from.
    pub ceiling: usize,
    pub probes: Vec<Probe>,
}

impl SizingResult {
    /// Human-readable summary of the search.
    pub fn summary(&self) -> String {
        let count = |outcome: ProbeOutcome| {
            self.probes.iter().filter(|p| p.outcome == outcome).count()
        };
        format!(
            "Sizing: {} bytes (smallest working {} + {SIZE_PADDING}), {} probes \
             ({} fit, {} too small, {} refused by heap), ceiling {} bytes",
            self.size,
            self.last_working,
            self.probes.len(),
            count(ProbeOutcome::Fits),
            count(ProbeOutcome::TooSmall),
            count(ProbeOutcome::AllocationFailed),
            self.ceiling,
        )
    }
}

/// Runs the sizing search against a platform heap.
#[derive(Debug, Clone)]
pub struct BufferSizer<'h> {
    heap: &'h MemoryPool,
    safety_margin: usize,
    options: InterpreterOptions,
}

impl<'h> BufferSizer<'h> {
    /// `options` are the executor options used for every probe; the error
    /// reporter inside them is suppressed while searching.
    pub fn new(heap: &'h MemoryPool, safety_margin: usize, options: InterpreterOptions) -> Self {
        Self {
            heap,
            safety_margin,
            options,
        }
    }

    /// Upper bound of the search: the heap size less the safety margin.
    pub fn ceiling(&self) -> usize {
        self.heap.budget().as_bytes().saturating_sub(self.safety_margin)
    }

    /// Finds the smallest runtime buffer the executor accepts for `model`.
    ///
    /// Returns [`RuntimeError::AllocationSizingFailed`] when no probe fits.
    pub fn search<'a>(
        &self,
        model: &Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
    ) -> Result<SizingResult, RuntimeError> {
        let ceiling = self.ceiling();
        let mut lower = SEARCH_LOWER_BOUND;
        let mut upper = ceiling;
        let mut last_working = None;
        let mut probes = Vec::new();

        tracing::info!(ceiling, "searching for optimal runtime memory size");
        let _quiet = self.options.reporter.suppress();

        while upper.saturating_sub(lower) > SEARCH_GRANULARITY {
            let mid = lower + (upper - lower) / 2;
            let outcome = self.probe(model, resolver, mid);
            tracing::debug!(size = mid, ?outcome, lower, upper, "probe");
            match outcome {
                ProbeOutcome::AllocationFailed => upper = upper.saturating_sub(ALLOCATION_BACKOFF),
                ProbeOutcome::Fits => {
                    last_working = Some(mid);
                    upper = mid;
                }
                ProbeOutcome::TooSmall => lower = mid + 1,
            }
            probes.push(Probe { size: mid, outcome });
        }

        let last_working = last_working.ok_or(RuntimeError::AllocationSizingFailed { ceiling })?;
        let size = last_working + SIZE_PADDING;
        tracing::info!(size, probes = probes.len(), "determined optimal runtime memory size");
        Ok(SizingResult {
            size,
            last_working,
            ceiling,
            probes,
        })
    }

    fn probe<'a>(
        &self,
        model: &Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
        size: usize,
    ) -> ProbeOutcome {
        let Ok(buffer) = self.heap.allocate(size) else {
            return ProbeOutcome::AllocationFailed;
        };
        let mut executor =
            Interpreter::new(Arc::clone(model), resolver, buffer, self.options.clone());
        match executor.allocate_tensors() {
            Ok(()) => ProbeOutcome::Fits,
            Err(_) => ProbeOutcome::TooSmall,
        }
        // The executor, and with it the probe buffer, is dropped here.
    }
}
