// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Validation Dispatch: a single-file-at-a-time state machine driving
//! one file's chunk-by-chunk integrity check per tick. Built on top of
//! the domain's [`ChunkManager`], [`recommend_chunk_size`], and the two
//! checksum provider ports — this module supplies the control flow the
//! domain layer deliberately leaves out (it has no notion of "one tick").

use rapidcopy_domain::entities::{NetworkStats, ValidationConfig};
use rapidcopy_domain::services::{batches, recommend_chunk_size, ChunkManager, LocalChecksumProvider, RemoteChecksumProvider};
use rapidcopy_domain::value_objects::PairId;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum ValidationCommand {
    Validate {
        pair_id: PairId,
        name: String,
        local_path: PathBuf,
        remote_path: String,
        size: u64,
        inline: bool,
    },
    UpdateLocalSize {
        local_path: PathBuf,
        bytes: u64,
    },
    ResumeChunk {
        local_path: PathBuf,
        index: u64,
    },
}

#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub pair_id: PairId,
    pub name: String,
    pub file_path: PathBuf,
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCompletion {
    pub pair_id: PairId,
    pub name: String,
    pub file_path: PathBuf,
    pub is_valid: bool,
    pub corrupt_chunks: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedownloadRequest {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub chunk_index: u64,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct TickOutput {
    pub status: Option<StatusSnapshot>,
    pub completion: Option<ValidationCompletion>,
    pub redownloads: Vec<RedownloadRequest>,
}

#[derive(Clone)]
struct ActiveFile {
    pair_id: PairId,
    name: String,
    file_path: PathBuf,
    remote_path: String,
    size: u64,
    inline: bool,
    local_size_known: u64,
    settle_deadline: Option<Instant>,
    layout_done: bool,
    digests_ready: bool,
}

pub struct ValidationDispatch {
    chunk_manager: ChunkManager,
    config: ValidationConfig,
    local: Arc<dyn LocalChecksumProvider>,
    remote: Arc<dyn RemoteChecksumProvider>,
    network_stats: NetworkStats,
    settle_delay: Duration,
    pending: VecDeque<ValidationCommand>,
    active: Option<ActiveFile>,
}

impl ValidationDispatch {
    pub fn new(config: ValidationConfig, local: Arc<dyn LocalChecksumProvider>, remote: Arc<dyn RemoteChecksumProvider>) -> Self {
        let settle_delay = Duration::from_secs(config.settle_delay_secs);
        ValidationDispatch {
            chunk_manager: ChunkManager::new(config.clone()),
            config,
            local,
            remote,
            network_stats: NetworkStats::default(),
            settle_delay,
            pending: VecDeque::new(),
            active: None,
        }
    }

    pub fn enqueue(&mut self, command: ValidationCommand) {
        self.pending.push_back(command);
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Advances the active file by one step, per `spec.md` §4.9.
    pub fn tick(&mut self) -> TickOutput {
        self.drain_administrative_commands();

        let Some(active) = self.active.take() else {
            return TickOutput::default();
        };

        let (remaining, output) = self.step(active);
        self.active = remaining;
        output
    }

    fn drain_administrative_commands(&mut self) {
        loop {
            let Some(command) = self.pending.pop_front() else { break };
            match command {
                ValidationCommand::Validate { .. } if self.active.is_some() => {
                    self.pending.push_front(command);
                    break;
                }
                ValidationCommand::Validate {
                    pair_id,
                    name,
                    local_path,
                    remote_path,
                    size,
                    inline,
                } => {
                    let settle_deadline = if inline { None } else { Some(Instant::now() + self.settle_delay) };
                    self.active = Some(ActiveFile {
                        pair_id,
                        name,
                        file_path: local_path,
                        remote_path,
                        size,
                        inline,
                        local_size_known: 0,
                        settle_deadline,
                        layout_done: false,
                        digests_ready: false,
                    });
                }
                ValidationCommand::UpdateLocalSize { local_path, bytes } => {
                    if let Some(active) = &mut self.active {
                        if active.file_path == local_path {
                            active.local_size_known = bytes;
                        }
                    }
                }
                ValidationCommand::ResumeChunk { local_path, index } => {
                    self.chunk_manager.reset_chunk(&local_path, index);
                }
            }
        }
    }

    fn step(&mut self, mut active: ActiveFile) -> (Option<ActiveFile>, TickOutput) {
        if let Some(deadline) = active.settle_deadline {
            if Instant::now() < deadline {
                return (Some(active), TickOutput::default());
            }
            active.settle_deadline = None;
        }

        if !active.layout_done {
            let chunk_size = recommend_chunk_size(active.size, &self.network_stats, &self.config);
            self.chunk_manager.create_chunks(active.file_path.clone(), active.size, Some(chunk_size.bytes() as u64));
            active.layout_done = true;
        }

        if !active.digests_ready {
            if let Some(output) = self.fetch_remote_digests(&active) {
                return (None, output);
            }
            active.digests_ready = true;
        }

        let ready = self.ready_chunks(&active);
        if let Some(chunk) = ready.first() {
            let local_digest = self.local.chunk_checksum(&active.file_path, self.chunk_manager.algorithm(), chunk.offset, chunk.size);
            let is_valid = match local_digest {
                Ok(digest) => {
                    self.chunk_manager.update_chunk_checksum(&active.file_path, chunk.index, Some(digest), None);
                    self.chunk_manager.validate_chunk(&active.file_path, chunk.index).unwrap_or(false)
                }
                Err(_) => {
                    self.chunk_manager.update_chunk_checksum(&active.file_path, chunk.index, Some(String::new()), None);
                    false
                }
            };
            self.network_stats.record_chunk_result(is_valid);
            let progress = self.chunk_manager.validation_progress(&active.file_path);
            return (
                Some(active),
                TickOutput {
                    status: Some(StatusSnapshot {
                        pair_id: active.pair_id.clone(),
                        name: active.name.clone(),
                        file_path: self.chunk_manager_path(&active),
                        progress,
                    }),
                    ..Default::default()
                },
            );
        }

        let still_pending = !self.chunk_manager.pending_chunks(&active.file_path).is_empty();
        if active.inline && still_pending {
            return (Some(active), TickOutput::default());
        }

        self.finish_chunk_round(active)
    }

    fn chunk_manager_path(&self, active: &ActiveFile) -> PathBuf {
        active.file_path.clone()
    }

    fn ready_chunks(&self, active: &ActiveFile) -> Vec<rapidcopy_domain::entities::ChunkInfo> {
        let pending = self.chunk_manager.pending_chunks(&active.file_path);
        if active.inline {
            pending.into_iter().filter(|c| c.end_offset() <= active.local_size_known).collect()
        } else {
            pending
        }
    }

    fn fetch_remote_digests(&mut self, active: &ActiveFile) -> Option<TickOutput> {
        let pending = self.chunk_manager.pending_chunks(&active.file_path);
        let algorithm = self.chunk_manager.algorithm();
        let mut batch_failed = false;
        for batch in batches(&pending) {
            match self.remote.chunk_checksums(&active.remote_path, algorithm, batch) {
                Ok(digests) => {
                    for (chunk, digest) in batch.iter().zip(digests) {
                        self.chunk_manager.update_chunk_checksum(&active.file_path, chunk.index, None, Some(digest));
                    }
                }
                Err(_) => {
                    batch_failed = true;
                    break;
                }
            }
        }
        if !batch_failed {
            return None;
        }

        match self.remote.file_checksum(&active.remote_path, algorithm) {
            Ok(remote_digest) => match self.local.file_checksum(&active.file_path, algorithm) {
                Ok(local_digest) => {
                    self.chunk_manager.set_full_file_checksums(&active.file_path, Some(local_digest), Some(remote_digest));
                    let is_valid = self.chunk_manager.validate_full_file(&active.file_path).unwrap_or(false);
                    Some(self.complete(active, is_valid, Vec::new()))
                }
                Err(_) => Some(self.complete(active, false, Vec::new())),
            },
            Err(_) => Some(self.complete(active, false, Vec::new())),
        }
    }

    fn finish_chunk_round(&mut self, active: ActiveFile) -> (Option<ActiveFile>, TickOutput) {
        let corrupt = self.chunk_manager.corrupt_chunks(&active.file_path);
        if corrupt.is_empty() {
            self.chunk_manager.mark_file_complete(&active.file_path, true);
            return (None, self.complete(&active, true, Vec::new()));
        }

        let retryable: Vec<_> = corrupt.iter().filter(|c| self.chunk_manager.can_retry_chunk(&active.file_path, c.index)).collect();
        if retryable.is_empty() {
            let indices = corrupt.iter().map(|c| c.index).collect();
            self.chunk_manager.mark_file_complete(&active.file_path, false);
            return (None, self.complete(&active, false, indices));
        }

        let mut redownloads = Vec::new();
        for chunk in &retryable {
            self.chunk_manager.mark_chunk_downloading(&active.file_path, chunk.index);
            redownloads.push(RedownloadRequest {
                local_path: active.file_path.clone(),
                remote_path: active.remote_path.clone(),
                chunk_index: chunk.index,
                offset: chunk.offset,
                size: chunk.size,
            });
        }
        (
            Some(active),
            TickOutput {
                redownloads,
                ..Default::default()
            },
        )
    }

    fn complete(&self, active: &ActiveFile, is_valid: bool, corrupt_chunks: Vec<u64>) -> TickOutput {
        TickOutput {
            completion: Some(ValidationCompletion {
                pair_id: active.pair_id.clone(),
                name: active.name.clone(),
                file_path: active.file_path.clone(),
                is_valid,
                corrupt_chunks,
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapidcopy_domain::error::RapidCopyError;
    use rapidcopy_domain::value_objects::ChecksumAlgorithm;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedLocal(HashMap<(PathBuf, u64, u64), String>, HashMap<PathBuf, String>);
    impl LocalChecksumProvider for FixedLocal {
        fn file_checksum(&self, path: &std::path::Path, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
            self.1.get(path).cloned().ok_or_else(|| RapidCopyError::NotFound("no fixture".into()))
        }
        fn chunk_checksum(&self, path: &std::path::Path, _algorithm: ChecksumAlgorithm, offset: u64, size: u64) -> Result<String, RapidCopyError> {
            self.0
                .get(&(path.to_path_buf(), offset, size))
                .cloned()
                .ok_or_else(|| RapidCopyError::NotFound("no fixture".into()))
        }
    }

    struct FixedRemote(Mutex<HashMap<String, Vec<String>>>);
    impl RemoteChecksumProvider for FixedRemote {
        fn file_checksum(&self, _path: &str, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
            Err(RapidCopyError::ScanTransient("no whole-file fixture".into()))
        }
        fn chunk_checksums(&self, path: &str, _algorithm: ChecksumAlgorithm, chunks: &[rapidcopy_domain::entities::ChunkInfo]) -> Result<Vec<String>, RapidCopyError> {
            let map = self.0.lock().unwrap();
            let all = map.get(path).ok_or_else(|| RapidCopyError::ScanTransient("no remote fixture".into()))?;
            Ok(chunks.iter().map(|c| all[c.index as usize].clone()).collect())
        }
        fn command_available(&self, _algorithm: ChecksumAlgorithm) -> Result<bool, RapidCopyError> {
            Ok(true)
        }
    }

    fn config() -> ValidationConfig {
        ValidationConfig {
            default_chunk_size: 10,
            min_chunk_size: 10,
            max_chunk_size: 10,
            enable_adaptive_sizing: false,
            settle_delay_secs: 0,
            ..ValidationConfig::default()
        }
    }

    #[test]
    fn matching_chunks_complete_as_valid() {
        let path = PathBuf::from("/local/a.bin");
        let mut local_chunks = HashMap::new();
        local_chunks.insert((path.clone(), 0, 10), "deadbeef".to_string());
        let local = Arc::new(FixedLocal(local_chunks, HashMap::new()));
        let mut remote_map = HashMap::new();
        remote_map.insert("/remote/a.bin".to_string(), vec!["deadbeef".to_string()]);
        let remote = Arc::new(FixedRemote(Mutex::new(remote_map)));

        let mut dispatch = ValidationDispatch::new(config(), local, remote);
        dispatch.enqueue(ValidationCommand::Validate {
            pair_id: PairId::new("p1"),
            name: "a.bin".to_string(),
            local_path: path.clone(),
            remote_path: "/remote/a.bin".to_string(),
            size: 10,
            inline: false,
        });

        // settle delay (0s, already elapsed) -> layout -> digests -> hash chunk -> complete
        let mut completion = None;
        for _ in 0..5 {
            let out = dispatch.tick();
            if out.completion.is_some() {
                completion = out.completion;
                break;
            }
        }
        let completion = completion.expect("file should complete within a few ticks");
        assert!(completion.is_valid);
        assert!(completion.corrupt_chunks.is_empty());
    }

    #[test]
    fn mismatched_chunk_requests_redownload_then_completes_invalid_after_retries_exhausted() {
        let path = PathBuf::from("/local/b.bin");
        let mut local_chunks = HashMap::new();
        local_chunks.insert((path.clone(), 0, 10), "local-digest".to_string());
        let local = Arc::new(FixedLocal(local_chunks, HashMap::new()));
        let mut remote_map = HashMap::new();
        remote_map.insert("/remote/b.bin".to_string(), vec!["remote-digest".to_string()]);
        let remote = Arc::new(FixedRemote(Mutex::new(remote_map)));

        let mut cfg = config();
        cfg.max_retries = 1;
        let mut dispatch = ValidationDispatch::new(cfg, local, remote);
        dispatch.enqueue(ValidationCommand::Validate {
            pair_id: PairId::new("p1"),
            name: "b.bin".to_string(),
            local_path: path.clone(),
            remote_path: "/remote/b.bin".to_string(),
            size: 10,
            inline: false,
        });

        let mut saw_redownload = false;
        let mut completion = None;
        for _ in 0..10 {
            let out = dispatch.tick();
            if !out.redownloads.is_empty() {
                saw_redownload = true;
                dispatch.enqueue(ValidationCommand::ResumeChunk {
                    local_path: path.clone(),
                    index: out.redownloads[0].chunk_index,
                });
            }
            if out.completion.is_some() {
                completion = out.completion;
                break;
            }
        }
        assert!(saw_redownload);
        let completion = completion.expect("should eventually complete");
        assert!(!completion.is_valid);
        assert_eq!(completion.corrupt_chunks, vec![0]);
    }
}
