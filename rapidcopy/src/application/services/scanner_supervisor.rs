// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Scanner Supervisor: runs one [`Scanner`] (local or remote) in its own
//! task on an interval, keeping only the most recent result. A
//! `tokio::sync::watch` channel gives "discard everything but the
//! latest" for free; a `Notify` gives `force_scan`'s coalescing for
//! free — both are the natural tokio primitive for the job rather than
//! a hand-rolled bounded queue.

use rapidcopy_domain::entities::SystemFile;
use rapidcopy_domain::RapidCopyError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinHandle;

pub type ScanOutcome = Result<Vec<SystemFile>, RapidCopyError>;

/// One scan invocation. Implemented by the local filesystem scanner and
/// the remote scan-program adapter; this trait is the only thing the
/// supervisor depends on, so either can be driven by the same loop.
pub trait Scanner: Send + Sync {
    fn scan(&self) -> ScanOutcome;
}

pub struct ScannerSupervisor {
    result_rx: watch::Receiver<Option<ScanOutcome>>,
    notify: Arc<Notify>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScannerSupervisor {
    /// Spawns the supervised task. `interval_ms` is a lower bound: a scan
    /// already in flight delays the next tick, since `spawn_blocking` is
    /// awaited before the loop ticks again.
    pub fn start(scanner: Arc<dyn Scanner>, interval_ms: u64) -> Self {
        let (result_tx, result_rx) = watch::channel(None);
        let notify = Arc::new(Notify::new());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let notify_task = notify.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                    _ = notify_task.notified() => {}
                }

                let scanner = scanner.clone();
                let outcome = tokio::task::spawn_blocking(move || scanner.scan())
                    .await
                    .unwrap_or_else(|join_err| Err(RapidCopyError::ScanNonRecoverable(join_err.to_string())));
                if result_tx.send(Some(outcome)).is_err() {
                    break;
                }
            }
        });

        ScannerSupervisor {
            result_rx,
            notify,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// The most recent scan output since the previous call, or `None` if
    /// nothing new has landed. Older results are simply overwritten by
    /// the channel, never queued.
    pub fn pop_latest_result(&mut self) -> Option<ScanOutcome> {
        if self.result_rx.has_changed().unwrap_or(false) {
            self.result_rx.borrow_and_update().clone()
        } else {
            None
        }
    }

    /// Requests an immediate scan. Calling this repeatedly before the
    /// task wakes up coalesces into a single extra scan, since `Notify`
    /// holds at most one outstanding permit.
    pub fn force_scan(&self) {
        self.notify.notify_one();
    }

    /// Re-raises the worker's error only if it is non-recoverable;
    /// transient errors are left for the caller to read via
    /// `pop_latest_result` and record in status.
    pub fn propagate_exception(&self) -> Result<(), RapidCopyError> {
        if let Some(Err(error)) = self.result_rx.borrow().clone() {
            if matches!(error, RapidCopyError::ScanNonRecoverable(_)) {
                return Err(error);
            }
        }
        Ok(())
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
