// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ChunkInfo` — per-chunk validation state, owned by the
//! [`ChunkManager`](crate::services::ChunkManager) for the life of a
//! file's validation.

use crate::value_objects::ChunkStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub index: u64,
    pub offset: u64,
    pub size: u64,
    pub remote_digest: Option<String>,
    pub local_digest: Option<String>,
    pub status: ChunkStatus,
    pub retry_count: u32,
}

impl ChunkInfo {
    pub fn new(index: u64, offset: u64, size: u64) -> Self {
        ChunkInfo {
            index,
            offset,
            size,
            remote_digest: None,
            local_digest: None,
            status: ChunkStatus::Pending,
            retry_count: 0,
        }
    }

    pub fn end_offset(&self) -> u64 {
        self.offset + self.size
    }
}

/// Lays out `⌈file_size / chunk_size⌉` contiguous chunks covering
/// `[0, file_size)`; the last chunk may be shorter than the rest.
/// `chunk_size` must be `≥ 1`; `file_size` may be `0` (a single
/// zero-size chunk — validation of an empty file still has one chunk to
/// compare empty digests against).
pub fn layout_chunks(file_size: u64, chunk_size: u64) -> Vec<ChunkInfo> {
    let chunk_size = chunk_size.max(1);
    if file_size == 0 {
        return vec![ChunkInfo::new(0, 0, 0)];
    }
    let mut chunks = Vec::new();
    let mut offset = 0u64;
    let mut index = 0u64;
    while offset < file_size {
        let size = chunk_size.min(file_size - offset);
        chunks.push(ChunkInfo::new(index, offset, size));
        offset += size;
        index += 1;
    }
    chunks
}

/// Testable Property 3: chunk coverage — `Σ size == file_size`,
/// `chunks[0].offset == 0`, and each chunk's offset equals the
/// previous chunk's end_offset.
pub fn is_contiguous_cover(chunks: &[ChunkInfo], file_size: u64) -> bool {
    if chunks.is_empty() {
        return false;
    }
    if chunks[0].offset != 0 {
        return false;
    }
    for pair in chunks.windows(2) {
        if pair[1].offset != pair[0].end_offset() || pair[1].index != pair[0].index + 1 {
            return false;
        }
    }
    chunks.iter().map(|c| c.size).sum::<u64>() == file_size
}
