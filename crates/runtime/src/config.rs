// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! heap_size = "512K"            # omit to use MemAvailable from /proc/meminfo
//! heap_safety_margin = "8K"
//! target_pointer_width = 32
//! host_pointer_width = 64       # omit to use the compiled pointer width
//! hint_pointer_pad = "1M"
//! search_pointer_pad = "1K"
//!
//! [diagnostics]
//! profiler = true
//! recorder = true
//! simulator = false
//! ```
//!
//! A config is resolved once into an immutable [`Platform`], which is what
//! the rest of the runtime reads.

use crate::RuntimeError;
use interpreter::PointerWidth;
use memory_manager::{MemoryBudget, MemoryPool};
use std::path::Path;

/// Bytes kept back from the heap ceiling during the sizing search.
pub const DEFAULT_HEAP_SAFETY_MARGIN: usize = 8 * 1024;
/// Pad added to an embedded size hint on a host with wider pointers.
pub const DEFAULT_HINT_POINTER_PAD: usize = 1024 * 1024;
/// Pad added to a searched size on a host with wider pointers.
pub const DEFAULT_SEARCH_POINTER_PAD: usize = 1024;

/// Configuration for the model runtime.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Platform heap size (human-readable, e.g. `"512K"`).
    pub heap_size: Option<String>,
    /// Margin subtracted from the heap ceiling before searching.
    pub heap_safety_margin: String,
    /// Pointer width of the device the model is meant for.
    pub target_pointer_width: u32,
    /// Pointer width of the machine running the model.
    pub host_pointer_width: Option<u32>,
    pub hint_pointer_pad: String,
    pub search_pointer_pad: String,
    pub diagnostics: DiagnosticsConfig,
}

/// Diagnostic features compiled into (or allowed on) this platform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub profiler: bool,
    pub recorder: bool,
    /// Route `invoke()` and memory layout through the accelerator simulator.
    pub simulator: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            profiler: true,
            recorder: true,
            simulator: false,
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::Config(format!("TOML serialise error: {e}")))
    }

    /// Resolves the configuration into a [`Platform`].
    ///
    /// Without an explicit `heap_size` the heap is sized from the memory the
    /// operating system reports as available.
    pub fn resolve(&self) -> Result<Platform, RuntimeError> {
        let heap_budget = match &self.heap_size {
            Some(size) => parse_size("heap_size", size)?,
            None => {
                let info = resource_monitor::MemoryInfo::read().map_err(|e| {
                    RuntimeError::Config(format!("cannot determine heap size: {e}"))
                })?;
                MemoryBudget::from_bytes(info.available_usize())
            }
        };
        if heap_budget.as_bytes() == 0 {
            return Err(RuntimeError::Config("heap_size must be non-zero".into()));
        }

        let target_width = pointer_width("target_pointer_width", self.target_pointer_width)?;
        let host_width = match self.host_pointer_width {
            Some(bits) => pointer_width("host_pointer_width", bits)?,
            None => PointerWidth::host(),
        };

        Ok(Platform {
            heap_budget,
            heap_safety_margin: parse_size("heap_safety_margin", &self.heap_safety_margin)?
                .as_bytes(),
            host_width,
            target_width,
            hint_pointer_pad: parse_size("hint_pointer_pad", &self.hint_pointer_pad)?.as_bytes(),
            search_pointer_pad: parse_size("search_pointer_pad", &self.search_pointer_pad)?
                .as_bytes(),
            profiler_enabled: self.diagnostics.profiler,
            recorder_enabled: self.diagnostics.recorder,
            simulator_enabled: self.diagnostics.simulator,
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heap_size: None,
            heap_safety_margin: "8K".to_string(),
            target_pointer_width: 32,
            host_pointer_width: None,
            hint_pointer_pad: "1M".to_string(),
            search_pointer_pad: "1K".to_string(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

fn parse_size(field: &str, value: &str) -> Result<MemoryBudget, RuntimeError> {
    MemoryBudget::parse(value).map_err(|e| RuntimeError::Config(format!("invalid {field}: {e}")))
}

fn pointer_width(field: &str, bits: u32) -> Result<PointerWidth, RuntimeError> {
    PointerWidth::from_bits(bits)
        .ok_or_else(|| RuntimeError::Config(format!("{field} must be 32 or 64, got {bits}")))
}

/// Resolved platform properties, fixed for the lifetime of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Size of the platform heap runtime buffers are allocated from.
    pub heap_budget: MemoryBudget,
    pub heap_safety_margin: usize,
    pub host_width: PointerWidth,
    pub target_width: PointerWidth,
    pub hint_pointer_pad: usize,
    pub search_pointer_pad: usize,
    pub profiler_enabled: bool,
    pub recorder_enabled: bool,
    pub simulator_enabled: bool,
}

impl Platform {
    /// A platform with default settings and the given heap, running on a
    /// host whose pointers match the target's.
    pub fn with_heap(heap_budget: MemoryBudget) -> Self {
        Self {
            heap_budget,
            heap_safety_margin: DEFAULT_HEAP_SAFETY_MARGIN,
            host_width: PointerWidth::W32,
            target_width: PointerWidth::W32,
            hint_pointer_pad: DEFAULT_HINT_POINTER_PAD,
            search_pointer_pad: DEFAULT_SEARCH_POINTER_PAD,
            profiler_enabled: true,
            recorder_enabled: true,
            simulator_enabled: false,
        }
    }

    /// Whether the host uses wider pointers than the target, so executor
    /// bookkeeping takes more room here than on the device.
    pub fn is_wide_host(&self) -> bool {
        self.host_width.bits() > self.target_width.bits()
    }

    /// Pad added to an embedded size hint.
    pub fn hint_pad(&self) -> usize {
        if self.is_wide_host() {
            self.hint_pointer_pad
        } else {
            0
        }
    }

    /// Pad added to a searched size.
    pub fn search_pad(&self) -> usize {
        if self.is_wide_host() {
            self.search_pointer_pad
        } else {
            0
        }
    }

    /// Creates the platform heap.
    pub fn create_heap(&self) -> MemoryPool {
        MemoryPool::new(self.heap_budget)
    }
}
