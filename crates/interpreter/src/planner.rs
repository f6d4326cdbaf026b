// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Greedy first-fit placement of non-persistent buffers.
//!
//! Every activation tensor and scratch buffer is live over a range of
//! operator indices. Buffers whose ranges do not overlap may share bytes.
//! Buffers are placed largest first, each at the lowest aligned offset that
//! does not collide with an already-placed buffer live at the same time.
//!
//! Offsets are relative to the start of the arena, so the plan (and hence
//! the arena requirement) does not depend on where the arena lives or how
//! large it is.

/// Alignment of every planned offset.
pub const BUFFER_ALIGNMENT: usize = 16;

/// A buffer to place, live from `first_use` to `last_use` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRequirement {
    pub size: usize,
    pub first_use: usize,
    pub last_use: usize,
}

impl BufferRequirement {
    fn overlaps(&self, other: &BufferRequirement) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// Result of planning: one offset per requirement plus the high-water mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPlan {
    pub offsets: Vec<usize>,
    /// Bytes from the arena start to the end of the highest buffer.
    pub head_bytes: usize,
}

/// Places `requirements` and returns their offsets.
pub fn plan(requirements: &[BufferRequirement]) -> MemoryPlan {
    let mut order: Vec<usize> = (0..requirements.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&requirements[a], &requirements[b]);
        rb.size
            .cmp(&ra.size)
            .then(ra.first_use.cmp(&rb.first_use))
            .then(a.cmp(&b))
    });

    let mut offsets = vec![0usize; requirements.len()];
    let mut placed: Vec<usize> = Vec::with_capacity(requirements.len());
    let mut head_bytes = 0;

    for idx in order {
        let req = &requirements[idx];
        let mut conflicts: Vec<(usize, usize)> = placed
            .iter()
            .filter(|&&p| requirements[p].overlaps(req))
            .map(|&p| (offsets[p], requirements[p].size))
            .collect();
        conflicts.sort_unstable();

        let mut candidate = 0;
        for (offset, size) in conflicts {
            if candidate + req.size <= offset {
                break;
            }
            candidate = candidate.max(align_up(offset + size));
        }

        offsets[idx] = candidate;
        head_bytes = head_bytes.max(candidate + req.size);
        placed.push(idx);
    }

    MemoryPlan {
        offsets,
        head_bytes: align_up(head_bytes),
    }
}

pub(crate) fn align_up(n: usize) -> usize {
    (n + BUFFER_ALIGNMENT - 1) & !(BUFFER_ALIGNMENT - 1)
}
