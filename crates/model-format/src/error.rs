// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model container parsing and building.

/// Errors that can occur when reading or writing a model blob.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The blob is shorter than its prefix or header claims.
    #[error("model blob too small: need {needed} bytes, have {actual}")]
    TooSmall { needed: usize, actual: usize },

    /// The blob does not start with the expected magic bytes.
    #[error("invalid magic bytes (expected \"AMDL\")")]
    BadMagic,

    /// The container version is not supported.
    #[error("unsupported model format version: {0}")]
    UnsupportedVersion(u32),

    /// The JSON header could not be parsed.
    #[error("invalid model header: {0}")]
    InvalidHeader(String),

    /// The graph references tensors, operator codes or data that do not exist.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),

    /// A metadata block with the requested tag is not present.
    #[error("metadata block '{0}' not found")]
    MetadataNotFound(String),

    /// The parameter block exists but could not be decoded.
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),

    /// The model file could not be read or mapped.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),
}
