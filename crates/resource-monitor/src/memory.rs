// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! System memory state via `/proc/meminfo`.

use crate::MonitorError;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Default path to the kernel memory info file.
const MEMINFO_PATH: &str = "/proc/meminfo";

/// Total and available physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    /// Total physical memory in bytes.
    pub total_bytes: u64,
    /// `MemAvailable` in bytes: free memory plus what the kernel can reclaim
    /// without swapping.
    pub available_bytes: u64,
}

impl MemoryInfo {
    /// Reads current memory information from `/proc/meminfo`.
    pub fn read() -> Result<Self, MonitorError> {
        Self::read_from(Path::new(MEMINFO_PATH))
    }

    /// Reads memory information from a meminfo-formatted file.
    pub fn read_from(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MonitorError::NotAvailable {
                path: path.display().to_string(),
            },
            _ => MonitorError::ReadError {
                path: path.display().to_string(),
                source: e,
            },
        })?;

        let info = Self::parse(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            total_mb = info.total_mb(),
            available_mb = info.available_mb(),
            "read system memory"
        );
        Ok(info)
    }

    /// Parses the content of a `/proc/meminfo`-formatted string.
    pub(crate) fn parse(content: &str, source_path: &Path) -> Result<Self, MonitorError> {
        let mut total_kb: Option<u64> = None;
        let mut available_kb: Option<u64> = None;

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
                continue;
            };
            match key {
                "MemTotal:" => total_kb = Some(parse_kb(value, source_path)?),
                "MemAvailable:" => available_kb = Some(parse_kb(value, source_path)?),
                _ => continue,
            }
            if total_kb.is_some() && available_kb.is_some() {
                break;
            }
        }

        let missing = |field: &str| MonitorError::ParseError {
            path: source_path.display().to_string(),
            detail: format!("{field} not found"),
        };
        let total_kb = total_kb.ok_or_else(|| missing("MemTotal"))?;
        let available_kb = available_kb.ok_or_else(|| missing("MemAvailable"))?;

        Ok(Self {
            total_bytes: total_kb.saturating_mul(1024),
            available_bytes: available_kb.saturating_mul(1024),
        })
    }

    /// Memory in use (`total - available`) in bytes.
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Returns the memory utilisation as a fraction in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64
    }

    pub fn available_mb(&self) -> u64 {
        self.available_bytes / (1024 * 1024)
    }

    pub fn total_mb(&self) -> u64 {
        self.total_bytes / (1024 * 1024)
    }

    /// Available bytes clamped to the address space of this process.
    pub fn available_usize(&self) -> usize {
        usize::try_from(self.available_bytes).unwrap_or(usize::MAX)
    }
}

/// Parses a `/proc/meminfo` value (always in kB).
fn parse_kb(s: &str, source_path: &Path) -> Result<u64, MonitorError> {
    s.parse::<u64>().map_err(|_| MonitorError::ParseError {
        path: source_path.display().to_string(),
        detail: format!("expected integer kB value, got '{s}'"),
    })
}
