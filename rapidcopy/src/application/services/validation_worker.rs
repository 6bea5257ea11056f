// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Validation Worker: the supervised task wrapping [`ValidationDispatch`].
//! Commands arrive FIFO over an `mpsc` channel; completions and
//! redownload requests leave the same way (every one must be observed,
//! unlike scan results). Status snapshots use the same "keep only the
//! latest" `watch` channel as the [`ScannerSupervisor`](super::scanner_supervisor::ScannerSupervisor),
//! since a stale in-progress percentage is harmless to drop.

use super::validation_dispatch::{RedownloadRequest, StatusSnapshot, ValidationCommand, ValidationCompletion, ValidationDispatch};
use rapidcopy_domain::entities::ValidationConfig;
use rapidcopy_domain::services::{LocalChecksumProvider, RemoteChecksumProvider};
use rapidcopy_domain::RapidCopyError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum ValidationEvent {
    Completion(ValidationCompletion),
    Redownload(RedownloadRequest),
}

pub struct ValidationWorker {
    command_tx: mpsc::UnboundedSender<ValidationCommand>,
    status_rx: watch::Receiver<Option<StatusSnapshot>>,
    event_rx: mpsc::UnboundedReceiver<ValidationEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ValidationWorker {
    pub fn start(
        config: ValidationConfig,
        local: Arc<dyn LocalChecksumProvider>,
        remote: Arc<dyn RemoteChecksumProvider>,
        tick_interval: Duration,
    ) -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<ValidationCommand>();
        let (status_tx, status_rx) = watch::channel(None);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ValidationEvent>();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut dispatch = ValidationDispatch::new(config, local, remote);
            let mut ticker = tokio::time::interval(tick_interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                    maybe_cmd = command_rx.recv() => {
                        match maybe_cmd {
                            Some(cmd) => dispatch.enqueue(cmd),
                            None => break,
                        }
                        continue;
                    }
                }

                let output = dispatch.tick();
                if let Some(status) = output.status {
                    let _ = status_tx.send(Some(status));
                }
                if let Some(completion) = output.completion {
                    let _ = event_tx.send(ValidationEvent::Completion(completion));
                }
                for redownload in output.redownloads {
                    let _ = event_tx.send(ValidationEvent::Redownload(redownload));
                }
            }
        });

        ValidationWorker {
            command_tx,
            status_rx,
            event_rx,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn validate(&self, command: ValidationCommand) -> Result<(), RapidCopyError> {
        self.command_tx
            .send(command)
            .map_err(|_| RapidCopyError::ValidatorFatal("validation worker channel closed".into()))
    }

    pub fn latest_status(&mut self) -> Option<StatusSnapshot> {
        if self.status_rx.has_changed().unwrap_or(false) {
            self.status_rx.borrow_and_update().clone()
        } else {
            None
        }
    }

    /// Drains every completion and redownload request emitted since the
    /// last call; unlike status, none of these may be silently dropped.
    pub fn drain_events(&mut self) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn terminate(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapidcopy_domain::value_objects::{ChecksumAlgorithm, PairId};
    use std::path::{Path, PathBuf};

    struct AlwaysMatching;
    impl LocalChecksumProvider for AlwaysMatching {
        fn file_checksum(&self, _path: &Path, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
            Ok("x".into())
        }
        fn chunk_checksum(&self, _path: &Path, _algorithm: ChecksumAlgorithm, _offset: u64, _size: u64) -> Result<String, RapidCopyError> {
            Ok("match".into())
        }
    }
    struct AlwaysMatchingRemote;
    impl RemoteChecksumProvider for AlwaysMatchingRemote {
        fn file_checksum(&self, _path: &str, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
            Ok("x".into())
        }
        fn chunk_checksums(&self, _path: &str, _algorithm: ChecksumAlgorithm, chunks: &[rapidcopy_domain::entities::ChunkInfo]) -> Result<Vec<String>, RapidCopyError> {
            Ok(chunks.iter().map(|_| "match".to_string()).collect())
        }
        fn command_available(&self, _algorithm: ChecksumAlgorithm) -> Result<bool, RapidCopyError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn validate_reaches_completion_event() {
        let mut cfg = ValidationConfig::default();
        cfg.settle_delay_secs = 0;
        cfg.default_chunk_size = 10;
        cfg.min_chunk_size = 10;
        let mut worker = ValidationWorker::start(cfg, Arc::new(AlwaysMatching), Arc::new(AlwaysMatchingRemote), Duration::from_millis(5));
        worker
            .validate(ValidationCommand::Validate {
                pair_id: PairId::new("p1"),
                name: "a.bin".into(),
                local_path: PathBuf::from("/local/a.bin"),
                remote_path: "/remote/a.bin".into(),
                size: 10,
                inline: false,
            })
            .unwrap();

        let mut completion = None;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            for event in worker.drain_events() {
                if let ValidationEvent::Completion(c) = event {
                    completion = Some(c);
                }
            }
            if completion.is_some() {
                break;
            }
        }
        assert!(completion.unwrap().is_valid);
        worker.terminate();
        worker.join().await;
    }
}
