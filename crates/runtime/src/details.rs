// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Descriptive information about a loaded model.

use model_format::ModelParameters;
use std::fmt;

/// Name, provenance and resource figures of a loaded model.
///
/// Filled from the model's parameter block at load time and completed once
/// the runtime buffer is bound. Cleared on unload.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ModelDetails {
    pub name: String,
    pub version: i64,
    pub date: String,
    pub hash: String,
    /// Name of the registered accelerator, if any.
    pub accelerator: String,
    /// Runtime memory the model needs on the target, in bytes.
    pub runtime_memory_size: usize,
    pub classes: Vec<String>,
    pub description: String,
}

impl ModelDetails {
    /// Copies the well-known keys out of a parameter block.
    pub fn load_parameters(&mut self, params: &ModelParameters) {
        let text = |key: &str| params.get_str(key).unwrap_or_default().to_string();
        self.name = text("name");
        self.date = text("date");
        self.hash = text("hash");
        self.version = params.get_i64("version").unwrap_or_default();
        self.classes = params.get_str_list("classes").unwrap_or_default().to_vec();
        if let Some(description) = params.get_str("description") {
            self.description = description.to_string();
        }
    }

    /// Resets every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Formats a byte count with three significant digits and a metric suffix,
/// e.g. `18.4k` or `1.05M`.
pub fn format_units(bytes: usize) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "G"), (1e6, "M"), (1e3, "k")];
    if bytes < 1000 {
        return bytes.to_string();
    }
    // Round first so that e.g. 999_600 lands in the next unit.
    let value = bytes as f64;
    let step = 10f64.powi(value.log10().floor() as i32 - 2);
    let rounded = (value / step).round() * step;
    for (scale, suffix) in UNITS {
        if rounded >= scale {
            let scaled = rounded / scale;
            let decimals = if scaled >= 100.0 {
                0
            } else if scaled >= 10.0 {
                1
            } else {
                2
            };
            return format!("{scaled:.decimals$}{suffix}");
        }
    }
    bytes.to_string()
}

impl fmt::Display for ModelDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Date: {}", self.date)?;
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Accelerator: {}", self.accelerator)?;
        write!(f, "Tensor runtime memory: {}", format_units(self.runtime_memory_size))
    }
}
