// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-operator profiling and recording.
//!
//! Both collectors are shared behind `Arc` by whoever owns the model; the
//! executor only appends to them while invoking.

use std::sync::Mutex;
use std::time::Duration;

/// Timing for one operator of the last invocation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OpProfile {
    pub index: usize,
    pub op: String,
    pub duration: Duration,
}

/// Collects operator timings.
#[derive(Debug, Default)]
pub struct Profiler {
    entries: Mutex<Vec<OpProfile>>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all recorded timings.
    pub fn reset(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn record(&self, index: usize, op: &str, duration: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(OpProfile {
                index,
                op: op.to_string(),
                duration,
            });
        }
    }

    /// Returns a snapshot of the recorded timings.
    pub fn results(&self) -> Vec<OpProfile> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Sum of all recorded operator durations.
    pub fn total(&self) -> Duration {
        self.results().iter().map(|p| p.duration).sum()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let results = self.results();
        let mut out = format!(
            "Profile: {} operators, {:.3}ms total",
            results.len(),
            self.total().as_secs_f64() * 1000.0
        );
        for p in &results {
            out.push_str(&format!(
                "\n  [{:>3}] {:<18} {:>9.3}ms",
                p.index,
                p.op,
                p.duration.as_secs_f64() * 1000.0
            ));
        }
        out
    }
}

/// One output tensor captured by the [`Recorder`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecordedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: String,
    pub data: Vec<u8>,
}

/// The outputs of one operator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecordedOp {
    pub index: usize,
    pub op: String,
    pub outputs: Vec<RecordedTensor>,
}

/// Captures every operator's outputs during an invocation.
#[derive(Debug, Default)]
pub struct Recorder {
    ops: Mutex<Vec<RecordedOp>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.clear();
        }
    }

    pub fn record(&self, op: RecordedOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }

    /// Returns a snapshot of everything recorded since the last clear.
    pub fn data(&self) -> Vec<RecordedOp> {
        self.ops.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.ops.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_reset() {
        let p = Profiler::new();
        p.record(0, "relu", Duration::from_millis(2));
        p.record(1, "softmax", Duration::from_millis(3));
        assert_eq!(p.results().len(), 2);
        assert_eq!(p.total(), Duration::from_millis(5));
        p.reset();
        assert!(p.results().is_empty());
    }

    #[test]
    fn test_profiler_summary() {
        let p = Profiler::new();
        p.record(0, "fully_connected", Duration::from_micros(1500));
        let s = p.summary();
        assert!(s.contains("1 operators"));
        assert!(s.contains("fully_connected"));
        assert!(s.contains("1.500ms"));
    }

    #[test]
    fn test_recorder_serializes() {
        let r = Recorder::new();
        r.record(RecordedOp {
            index: 0,
            op: "relu".into(),
            outputs: vec![RecordedTensor {
                name: "y".into(),
                shape: vec![1, 2],
                dtype: "float32".into(),
                data: vec![0; 8],
            }],
        });
        assert_eq!(r.len(), 1);
        let json = serde_json::to_string(&r.data()).unwrap();
        assert!(json.contains("\"op\":\"relu\""));
        r.clear();
        assert!(r.is_empty());
    }
}
