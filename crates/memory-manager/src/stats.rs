// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Heap statistics for leak accounting and diagnostics.

/// Cumulative statistics about heap usage.
///
/// `outstanding()` is the number of allocations not yet freed; a model that
/// failed to load or was unloaded must leave it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AllocationStats {
    /// Number of successful allocations.
    pub total_allocations: u64,
    /// Number of requests the heap could not satisfy.
    pub failed_allocations: u64,
    /// Number of allocations returned to the heap.
    pub total_deallocations: u64,
    /// High-water mark of live bytes.
    pub peak_allocated_bytes: usize,
    /// Total bytes ever handed out.
    pub cumulative_allocated_bytes: u64,
}

impl AllocationStats {
    /// Returns the number of allocations that are still live.
    pub fn outstanding(&self) -> u64 {
        self.total_allocations.saturating_sub(self.total_deallocations)
    }

    pub(crate) fn record_allocation(&mut self, size: usize, live_bytes: usize) {
        self.total_allocations += 1;
        self.cumulative_allocated_bytes += size as u64;
        if live_bytes > self.peak_allocated_bytes {
            self.peak_allocated_bytes = live_bytes;
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    pub(crate) fn record_deallocation(&mut self) {
        self.total_deallocations += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Heap: {} allocations ({} failed, {} outstanding), peak {:.1} KB, {} deallocations",
            self.total_allocations,
            self.failed_allocations,
            self.outstanding(),
            self.peak_allocated_bytes as f64 / 1024.0,
            self.total_deallocations,
        )
    }
}
