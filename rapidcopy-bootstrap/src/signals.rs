// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # System Signal Handling
//!
//! ## Supported Signals
//!
//! - **SIGTERM** (15) - Graceful shutdown request
//! - **SIGINT** (2) - User interrupt (Ctrl+C)
//! - **SIGHUP** (1) - Hangup (terminal closed)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rapidcopy_bootstrap::signals::{SystemSignals, UnixSignalHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let signal_handler = UnixSignalHandler::new();
//!     let callback = Box::new(|| println!("shutting down"));
//!     signal_handler.wait_for_signal(callback).await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

/// Callback invoked once a shutdown signal is received.
pub type ShutdownCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstracts signal handling so the shutdown path can be driven by real
/// signals in production and by [`NoOpSignalHandler`] in tests.
pub trait SystemSignals: Send + Sync {
    /// Waits for a shutdown signal (SIGTERM, SIGINT, or SIGHUP) and then
    /// invokes `on_shutdown`.
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Handles SIGTERM, SIGINT, and SIGHUP using `tokio::signal::unix`.
pub struct UnixSignalHandler;

impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSignals for UnixSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
            let mut sighup = signal(SignalKind::hangup()).expect("failed to register SIGHUP handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT (Ctrl+C), initiating graceful shutdown");
                }
                _ = sighup.recv() => {
                    tracing::info!("received SIGHUP, initiating graceful shutdown");
                }
            }

            on_shutdown();
        })
    }
}

/// Never receives a signal — lets tests drive shutdown explicitly
/// through a [`crate::shutdown::ShutdownCoordinator`] instead.
pub struct NoOpSignalHandler;

impl NoOpSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSignals for NoOpSignalHandler {
    fn wait_for_signal(&self, _on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            std::future::pending::<()>().await;
        })
    }
}

/// Returns the process's signal handler. RapidCopy targets Unix hosts
/// only (it shells out to `dd`, `md5sum`/`sha*sum`, and SSH).
pub fn create_signal_handler() -> Box<dyn SystemSignals> {
    Box::new(UnixSignalHandler::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn noop_handler_never_fires() {
        let handler = NoOpSignalHandler::new();
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = Box::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });
        let wait_future = handler.wait_for_signal(callback);

        tokio::select! {
            _ = wait_future => {
                panic!("no-op handler should never complete");
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {}
        }

        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn create_signal_handler_does_not_panic() {
        let _handler = create_signal_handler();
    }

    #[test]
    fn unix_signal_handler_construction() {
        let _handler = UnixSignalHandler::new();
        let _handler = UnixSignalHandler::default();
    }
}
