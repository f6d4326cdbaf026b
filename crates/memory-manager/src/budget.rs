// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Heap size configuration and parsing.
//!
//! A [`MemoryBudget`] is the total heap (or SRAM region) the runtime may
//! allocate arenas from. Embedded heaps are measured in kilobytes, so the
//! parser and the `Display` impl both favour `K` units.

use crate::MemoryError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// A hard ceiling on heap memory.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"512K"` or `"512KB"` → 512 × 1024 bytes
/// - `"2M"` or `"2MB"` → 2 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"4096"` or `"4096B"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::MemoryBudget;
///
/// let b = MemoryBudget::parse("256K").unwrap();
/// assert_eq!(b.as_bytes(), 256 * 1024);
/// assert_eq!(b.to_string(), "256 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in kilobytes (truncated).
    pub fn as_kb(&self) -> usize {
        self.bytes / KB
    }

    /// Parses a human-readable size string.
    ///
    /// Case-insensitive; surrounding whitespace is ignored. A zero size is
    /// accepted here because a zero safety margin or pad is meaningful;
    /// callers that need a non-empty heap check [`as_bytes`](Self::as_bytes).
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::InvalidSize {
                input: s.to_string(),
                detail: "empty string".into(),
            });
        }

        let upper = trimmed.to_uppercase();
        let (num_str, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
            (n, GB)
        } else if let Some(n) = upper.strip_suffix('G') {
            (n, GB)
        } else if let Some(n) = upper.strip_suffix("MB") {
            (n, MB)
        } else if let Some(n) = upper.strip_suffix('M') {
            (n, MB)
        } else if let Some(n) = upper.strip_suffix("KB") {
            (n, KB)
        } else if let Some(n) = upper.strip_suffix('K') {
            (n, KB)
        } else if let Some(n) = upper.strip_suffix('B') {
            (n, 1)
        } else {
            (upper.as_str(), 1)
        };

        let value: usize = num_str.trim().parse().map_err(|_| MemoryError::InvalidSize {
            input: s.to_string(),
            detail: "expected a number followed by an optional suffix (K, M, G)".into(),
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemoryError::InvalidSize {
                input: s.to_string(),
                detail: "size overflows usize".into(),
            })?;

        Ok(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kb() {
        let b = MemoryBudget::from_kb(256);
        assert_eq!(b.as_bytes(), 256 * 1024);
        assert_eq!(b.as_kb(), 256);
    }

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(MemoryBudget::parse("8K").unwrap().as_bytes(), 8192);
        assert_eq!(MemoryBudget::parse("8KB").unwrap().as_bytes(), 8192);
        assert_eq!(MemoryBudget::parse("8k").unwrap().as_bytes(), 8192);
    }

    #[test]
    fn test_parse_megabytes() {
        assert_eq!(MemoryBudget::parse("1M").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(MemoryBudget::parse("2mb").unwrap().as_kb(), 2048);
    }

    #[test]
    fn test_parse_raw_bytes() {
        assert_eq!(MemoryBudget::parse("4096").unwrap().as_bytes(), 4096);
        assert_eq!(MemoryBudget::parse("300B").unwrap().as_bytes(), 300);
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(MemoryBudget::parse("  512K  ").unwrap().as_kb(), 512);
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        assert_eq!(MemoryBudget::parse("0K").unwrap().as_bytes(), 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(MemoryBudget::parse("").is_err());
        assert!(MemoryBudget::parse("abc").is_err());
        assert!(MemoryBudget::parse("12Q").is_err());
        assert!(matches!(
            MemoryBudget::parse("99999999999999999999G"),
            Err(MemoryError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_mb(2).to_string(), "2 MB");
        assert_eq!(MemoryBudget::from_kb(384).to_string(), "384 KB");
        assert_eq!(MemoryBudget::from_bytes(3000).to_string(), "3000 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = MemoryBudget::from_kb(96);
        let json = serde_json::to_string(&b).unwrap();
        let back: MemoryBudget = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
