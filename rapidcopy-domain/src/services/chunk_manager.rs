// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Chunk Manager: pure in-memory state over one
//! [`FileValidationInfo`] per file under active validation. No I/O —
//! the Validation Dispatch is what feeds it digests obtained from the
//! checksum providers and reads its results back out.

use crate::entities::{layout_chunks, ChunkInfo, FileValidationInfo, ValidationConfig};
use crate::value_objects::{ChecksumAlgorithm, ChunkStatus};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallStats {
    pub total_files: usize,
    pub completed: usize,
    pub valid: usize,
    pub corrupt: usize,
    pub in_progress: usize,
}

pub struct ChunkManager {
    config: ValidationConfig,
    files: HashMap<PathBuf, FileValidationInfo>,
}

impl ChunkManager {
    pub fn new(config: ValidationConfig) -> Self {
        ChunkManager {
            config,
            files: HashMap::new(),
        }
    }

    /// Lays out chunks for `file_path` and starts tracking it.
    /// `chunk_size` is clamped to `[min, max]` (and capped at
    /// `file_size`) before layout, per `spec.md` §4.6.
    pub fn create_chunks(&mut self, file_path: PathBuf, file_size: u64, chunk_size: Option<u64>) -> &FileValidationInfo {
        let requested = chunk_size.unwrap_or(self.config.default_chunk_size as u64);
        let bounded = requested.clamp(self.config.min_chunk_size as u64, self.config.max_chunk_size.max(self.config.min_chunk_size) as u64);
        let bounded = bounded.min(file_size.max(1));

        let chunks = layout_chunks(file_size, bounded);
        let info = FileValidationInfo::new(file_path.clone(), file_size, self.config.algorithm, chunks);
        self.files.insert(file_path.clone(), info);
        self.files.get(&file_path).expect("just inserted")
    }

    pub fn get(&self, file_path: &Path) -> Option<&FileValidationInfo> {
        self.files.get(file_path)
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.config.algorithm
    }

    pub fn pending_chunks(&self, file_path: &Path) -> Vec<ChunkInfo> {
        self.files
            .get(file_path)
            .map(|info| info.chunks.iter().filter(|c| c.status == ChunkStatus::Pending).cloned().collect())
            .unwrap_or_default()
    }

    pub fn corrupt_chunks(&self, file_path: &Path) -> Vec<ChunkInfo> {
        self.files
            .get(file_path)
            .map(|info| info.chunks.iter().filter(|c| c.status == ChunkStatus::Corrupt).cloned().collect())
            .unwrap_or_default()
    }

    pub fn update_chunk_checksum(
        &mut self,
        file_path: &Path,
        chunk_index: u64,
        local: Option<String>,
        remote: Option<String>,
    ) -> Option<&ChunkInfo> {
        let info = self.files.get_mut(file_path)?;
        let chunk = info.chunk_mut(chunk_index)?;
        if let Some(local) = local {
            chunk.local_digest = Some(local);
        }
        if let Some(remote) = remote {
            chunk.remote_digest = Some(remote);
        }
        info.chunk(chunk_index)
    }

    /// `Some(true)`/`Some(false)` once both digests are present;
    /// `None` if either is still missing. Idempotent — revalidating an
    /// already-terminal chunk with the same digests recomputes the same
    /// verdict.
    pub fn validate_chunk(&mut self, file_path: &Path, chunk_index: u64) -> Option<bool> {
        let info = self.files.get_mut(file_path)?;
        let chunk = info.chunk_mut(chunk_index)?;

        let (local, remote) = (chunk.local_digest.clone()?, chunk.remote_digest.clone()?);
        chunk.status = ChunkStatus::Validating;

        if local == remote {
            chunk.status = ChunkStatus::Valid;
            Some(true)
        } else {
            chunk.status = ChunkStatus::Corrupt;
            Some(false)
        }
    }

    pub fn mark_file_complete(&mut self, file_path: &Path, is_valid: bool) -> Option<&FileValidationInfo> {
        let info = self.files.get_mut(file_path)?;
        info.is_complete = true;
        info.is_valid = Some(is_valid);
        self.files.get(file_path)
    }

    pub fn set_full_file_checksums(&mut self, file_path: &Path, local: Option<String>, remote: Option<String>) -> Option<&FileValidationInfo> {
        let info = self.files.get_mut(file_path)?;
        if let Some(local) = local {
            info.full_file_local = Some(local);
        }
        if let Some(remote) = remote {
            info.full_file_remote = Some(remote);
        }
        self.files.get(file_path)
    }

    pub fn validate_full_file(&mut self, file_path: &Path) -> Option<bool> {
        let info = self.files.get(file_path)?;
        let (local, remote) = (info.full_file_local.clone()?, info.full_file_remote.clone()?);
        let is_valid = local == remote;
        self.mark_file_complete(file_path, is_valid);
        Some(is_valid)
    }

    pub fn can_retry_chunk(&self, file_path: &Path, chunk_index: u64) -> bool {
        self.files
            .get(file_path)
            .and_then(|info| info.chunk(chunk_index))
            .map(|chunk| chunk.retry_count < self.config.max_retries)
            .unwrap_or(false)
    }

    /// Increments `retry_count` (monotonic, per `spec.md` §4.6's
    /// invariant) and marks the chunk `DOWNLOADING`.
    pub fn mark_chunk_downloading(&mut self, file_path: &Path, chunk_index: u64) -> Option<&ChunkInfo> {
        let info = self.files.get_mut(file_path)?;
        let chunk = info.chunk_mut(chunk_index)?;
        chunk.retry_count += 1;
        chunk.status = ChunkStatus::Downloading;
        info.chunk(chunk_index)
    }

    /// Returns a chunk to `PENDING` with its local digest cleared, after
    /// a redownload has landed — `reset_chunk ∘ mark_chunk_downloading`
    /// leaves `retry_count` incremented by one, status `PENDING`,
    /// `local_digest == None` (Testable Properties §8 round-trip).
    pub fn reset_chunk(&mut self, file_path: &Path, chunk_index: u64) -> Option<&ChunkInfo> {
        let info = self.files.get_mut(file_path)?;
        let chunk = info.chunk_mut(chunk_index)?;
        chunk.status = ChunkStatus::Pending;
        chunk.local_digest = None;
        info.chunk(chunk_index)
    }

    pub fn remove_file(&mut self, file_path: &Path) -> bool {
        self.files.remove(file_path).is_some()
    }

    pub fn validation_progress(&self, file_path: &Path) -> f32 {
        self.files.get(file_path).map(|info| info.progress()).unwrap_or(0.0)
    }

    pub fn overall_stats(&self) -> OverallStats {
        let total_files = self.files.len();
        let completed = self.files.values().filter(|i| i.is_complete).count();
        let valid = self.files.values().filter(|i| i.is_valid == Some(true)).count();
        let corrupt = self.files.values().filter(|i| i.is_valid == Some(false)).count();
        OverallStats {
            total_files,
            completed,
            valid,
            corrupt,
            in_progress: total_files - completed,
        }
    }
}
