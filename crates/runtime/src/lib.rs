// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Lifecycle of an inference model on a memory-constrained device: load a
//! model blob, find and allocate the runtime arena its executor needs, run
//! inference and release everything on unload.
//!
//! The runtime takes:
//! - A model blob from `model-format` (borrowed, never copied).
//! - An [`OpResolver`](interpreter::OpResolver) mapping operators to kernels.
//! - A [`MemoryPool`](memory_manager::MemoryPool) standing in for the
//!   platform heap.
//!
//! # Buffer strategies
//! ```text
//! caller buffer ──▶ bind (fatal on failure)
//! Auto ──▶ runtime_memory_size hint ──fail──▶ sizing search ──▶ bind
//! Search ────────────────────────────────────▶ sizing search ──▶ bind
//! ```
//!
//! The [`BufferSizer`] binary search probes the heap with scratch buffers
//! until it knows the smallest arena the executor accepts to within 128
//! bytes. Sizes measured on a host with wider pointers than the target are
//! converted back for reporting by the [`overhead`] module.

pub mod accelerator;
mod buffer;
mod config;
mod details;
mod error;
mod model;
pub mod overhead;
pub mod sizing;
mod slot;

pub use accelerator::Accelerator;
pub use buffer::{BufferSource, RuntimeBuffer};
pub use config::{DiagnosticsConfig, Platform, RuntimeConfig};
pub use details::{format_units, ModelDetails};
pub use error::RuntimeError;
pub use model::{BufferRequest, Collaborators, Model, HINT_FLOOR, RUNTIME_MEMORY_SIZE_KEY};
pub use sizing::{BufferSizer, Probe, ProbeOutcome, SizingResult};
pub use slot::{Executor, ExecutorSlot, Rejected};
