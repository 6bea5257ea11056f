// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `FileValidationInfo` — the Chunk Manager's per-file bookkeeping for
//! one validation run.

use super::chunk_info::ChunkInfo;
use crate::value_objects::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `is_valid` is unknown until `is_complete`; modeled as `Option<bool>`
/// rather than a bare `bool` so "not yet known" and "known invalid"
/// can't be confused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidationInfo {
    pub file_path: PathBuf,
    pub file_size: u64,
    pub algorithm: ChecksumAlgorithm,
    pub chunks: Vec<ChunkInfo>,
    pub full_file_remote: Option<String>,
    pub full_file_local: Option<String>,
    pub is_complete: bool,
    pub is_valid: Option<bool>,
}

impl FileValidationInfo {
    pub fn new(file_path: PathBuf, file_size: u64, algorithm: ChecksumAlgorithm, chunks: Vec<ChunkInfo>) -> Self {
        FileValidationInfo {
            file_path,
            file_size,
            algorithm,
            chunks,
            full_file_remote: None,
            full_file_local: None,
            is_complete: false,
            is_valid: None,
        }
    }

    pub fn chunk_mut(&mut self, index: u64) -> Option<&mut ChunkInfo> {
        self.chunks.iter_mut().find(|c| c.index == index)
    }

    pub fn chunk(&self, index: u64) -> Option<&ChunkInfo> {
        self.chunks.iter().find(|c| c.index == index)
    }

    pub fn corrupt_chunk_indices(&self) -> Vec<u64> {
        self.chunks
            .iter()
            .filter(|c| c.status == crate::value_objects::ChunkStatus::Corrupt)
            .map(|c| c.index)
            .collect()
    }

    /// Progress in `[0, 1]`: fraction of chunks that have reached a
    /// terminal status.
    pub fn progress(&self) -> f32 {
        if self.chunks.is_empty() {
            return 1.0;
        }
        let done = self.chunks.iter().filter(|c| c.status.is_terminal()).count();
        done as f32 / self.chunks.len() as f32
    }
}
