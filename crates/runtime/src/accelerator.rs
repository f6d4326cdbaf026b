// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Hook for an optional hardware accelerator.
//!
//! The runtime never owns the accelerator. It is shared through an `Arc`
//! and notified at load, unload and invoke time.

use interpreter::InterpreterError;

/// Name of the accelerator whose kernels keep extra pointers per operator.
pub const MVP_ACCELERATOR: &str = "MVP";

/// Size of the flash window exposed to the simulator for the model blob.
pub const SIMULATOR_FLASH_BYTES: usize = 2 * 1024 * 1024;

/// A registered accelerator.
pub trait Accelerator: Send + Sync {
    /// Short name, reported in model details.
    fn name(&self) -> &str;

    /// Called at the start of every `load()`.
    fn init(&self) {}

    /// Called on every `unload()`, including the one after a failed load.
    fn deinit(&self) {}

    /// Describes a memory region to the accelerator simulator.
    ///
    /// `base` is only an address for the simulator's memory map; it is never
    /// dereferenced through this call.
    fn set_simulator_memory(&self, region: &str, base: *const u8, len: usize) {
        let _ = (region, base, len);
    }

    /// Runs one inference under the simulator.
    fn invoke_simulator(
        &self,
        invoke: &mut dyn FnMut() -> Result<(), InterpreterError>,
    ) -> Result<(), InterpreterError> {
        invoke()
    }
}

impl std::fmt::Debug for dyn Accelerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accelerator").field("name", &self.name()).finish()
    }
}
