// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Zero-copy parsing of model blobs.

use crate::graph::{ModelHeader, Subgraph};
use crate::FormatError;

/// Magic bytes identifying a model blob.
pub const MAGIC: &[u8; 4] = b"AMDL";

/// Current container version.
pub const VERSION: u32 = 1;

/// Alignment of the data section relative to the start of the blob.
pub const DATA_ALIGNMENT: usize = 16;

const PREFIX_LEN: usize = 12;

/// A parsed model that borrows its blob.
///
/// The header is decoded once; constant tensors and metadata blocks are
/// returned as slices into the original bytes, so the blob must outlive the
/// `FlatModel` and everything built on it.
#[derive(Debug, Clone)]
pub struct FlatModel<'a> {
    blob: &'a [u8],
    header: ModelHeader,
    data: &'a [u8],
}

impl<'a> FlatModel<'a> {
    /// Parses and validates a model blob.
    pub fn parse(blob: &'a [u8]) -> Result<Self, FormatError> {
        if blob.len() < PREFIX_LEN {
            return Err(FormatError::TooSmall {
                needed: PREFIX_LEN,
                actual: blob.len(),
            });
        }
        if &blob[0..4] != MAGIC {
            return Err(FormatError::BadMagic);
        }

        let version = read_u32(blob, 4);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let header_len = read_u32(blob, 8) as usize;
        let header_end = PREFIX_LEN + header_len;
        let data_start = align_up(header_end, DATA_ALIGNMENT);
        if blob.len() < data_start {
            return Err(FormatError::TooSmall {
                needed: data_start,
                actual: blob.len(),
            });
        }

        let header: ModelHeader = serde_json::from_slice(&blob[PREFIX_LEN..header_end])
            .map_err(|e| FormatError::InvalidHeader(e.to_string()))?;
        let data = &blob[data_start..];
        header.validate(data.len())?;

        tracing::debug!(
            tensors = header.subgraph.tensors.len(),
            operators = header.subgraph.operators.len(),
            data_bytes = data.len(),
            "parsed model blob"
        );

        Ok(Self { blob, header, data })
    }

    /// Returns the full blob this model was parsed from.
    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    pub fn subgraph(&self) -> &Subgraph {
        &self.header.subgraph
    }

    pub fn description(&self) -> &str {
        &self.header.description
    }

    /// Looks up a metadata block by tag. No side effects.
    pub fn find_metadata(&self, tag: &str) -> Option<&'a [u8]> {
        let data = self.data;
        self.header
            .metadata
            .iter()
            .find(|m| m.name == tag)
            .map(|m| &data[m.offset..m.offset + m.len])
    }

    /// Returns the names of all metadata blocks.
    pub fn metadata_tags(&self) -> impl Iterator<Item = &str> {
        self.header.metadata.iter().map(|m| m.name.as_str())
    }

    /// Returns the bytes of a constant tensor, or `None` for activations.
    pub fn constant_data(&self, tensor_index: usize) -> Option<&'a [u8]> {
        let data = self.data;
        let buf = self.header.subgraph.tensors.get(tensor_index)?.buffer?;
        Some(&data[buf.offset..buf.offset + buf.len])
    }
}

/// Parses just the magic and version, for cheap format sniffing.
pub fn is_model_blob(bytes: &[u8]) -> bool {
    bytes.len() >= PREFIX_LEN && &bytes[0..4] == MAGIC
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Round `n` up to the next multiple of `align` (a power of two).
pub(crate) fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}
