// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Chunk size value object.
//!
//! Unlike a fixed-bounds size type, a chunk size here is only ever valid
//! *relative to* a [`ValidationConfig`](crate::entities::ValidationConfig)'s
//! `min_chunk_size`/`max_chunk_size` — the bounds are operator
//! configuration, not compile-time constants. `ChunkSize::new` therefore
//! takes the bounds as arguments and clamps into them, matching
//! `ValidationConfig`'s own invariant `0 < min ≤ default ≤ max`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Clamps `bytes` into `[min, max]`, then further caps it at
    /// `file_size` (a chunk can never be larger than the file it covers).
    /// `min`/`max` are assumed already validated by `ValidationConfig`.
    pub fn new(bytes: usize, min: usize, max: usize, file_size: u64) -> Self {
        let clamped = bytes.clamp(min.max(1), max.max(min.max(1)));
        let capped = (clamped as u64).min(file_size.max(1)) as usize;
        ChunkSize(capped)
    }

    /// Wraps an already-validated byte count without reclamping. Used when
    /// a value is known to already satisfy the bounds (e.g. read back from
    /// a persisted `ChunkInfo`).
    pub fn from_raw(bytes: usize) -> Self {
        ChunkSize(bytes.max(1))
    }

    pub fn bytes(&self) -> usize {
        self.0
    }

    /// Number of chunks of this size needed to cover `file_size`,
    /// rounding up so the last chunk may be shorter.
    pub fn chunks_needed_for_file(&self, file_size: u64) -> u64 {
        if file_size == 0 {
            return 1;
        }
        file_size.div_ceil(self.0 as u64)
    }
}

impl std::fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_below_min() {
        let cs = ChunkSize::new(10, 1024, 1_048_576, 10_485_760);
        assert_eq!(cs.bytes(), 1024);
    }

    #[test]
    fn clamps_above_max() {
        let cs = ChunkSize::new(10_000_000, 1024, 1_048_576, 10_485_760);
        assert_eq!(cs.bytes(), 1_048_576);
    }

    #[test]
    fn never_exceeds_file_size() {
        let cs = ChunkSize::new(1_048_576, 1024, 1_048_576, 512);
        assert_eq!(cs.bytes(), 512);
    }

    #[test]
    fn chunks_needed_rounds_up() {
        let cs = ChunkSize::from_raw(1_048_576);
        assert_eq!(cs.chunks_needed_for_file(3_145_728), 3);
        assert_eq!(cs.chunks_needed_for_file(3_145_729), 4);
    }
}
