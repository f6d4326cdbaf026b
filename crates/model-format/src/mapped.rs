// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory-mapped model files.

use crate::container::is_model_blob;
use crate::FormatError;
use memmap2::Mmap;
use std::path::{Path, PathBuf};

/// A model file mapped read-only into memory.
///
/// The mapping plays the role of a model placed in flash: the runtime
/// borrows its bytes for as long as a model is loaded from it.
#[derive(Debug)]
pub struct MappedModel {
    path: PathBuf,
    map: Mmap,
}

impl MappedModel {
    /// Maps `path` and checks that it starts like a model blob.
    pub fn open(path: &Path) -> Result<Self, FormatError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only; the file must not be truncated
        // while mapped, which is the same contract as loading from flash.
        let map = unsafe { Mmap::map(&file)? };
        if !is_model_blob(&map) {
            return Err(FormatError::BadMagic);
        }
        tracing::debug!(path = %path.display(), bytes = map.len(), "mapped model file");
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mapped blob.
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }
}

impl std::ops::Deref for MappedModel {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map
    }
}
