// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory monitoring.

/// Errors that can occur when reading system memory state.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The memory info file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    /// A required field was missing or malformed.
    #[error("failed to parse value from {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// The memory info file does not exist on this system.
    #[error("{path} not found; set an explicit heap size instead")]
    NotAvailable { path: String },
}
