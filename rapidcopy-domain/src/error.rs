// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain-wide error type.
//!
//! `RapidCopyError` is the single error currency for the domain and
//! application layers. Each variant corresponds to one of the error kinds
//! the controller reconciler distinguishes when deciding whether to stop,
//! record-and-continue, or fail a single command. See the controller's
//! `process()` for how each variant is policed.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RapidCopyError {
    /// A mandatory configuration field is still a placeholder. Fatal at
    /// startup; the service must not start its workers.
    #[error("config is incomplete: {0}")]
    ConfigIncomplete(String),

    /// The remote or local scanner hit a failure that cannot be retried
    /// (bad credentials, bad path, the remote scanner itself reported a
    /// scan error). Stops the controller.
    #[error("scan failed (non-recoverable): {0}")]
    ScanNonRecoverable(String),

    /// A scan failed in a way that is expected to clear up on its own
    /// (dropped connection mid-poll). Recorded in status; the controller
    /// keeps running.
    #[error("scan failed (transient): {0}")]
    ScanTransient(String),

    /// The downloader engine reported an asynchronous error via
    /// `raise_pending_error`. Recorded in status; the controller keeps
    /// running.
    #[error("download engine error: {0}")]
    DownloadEngine(String),

    /// A dispatched command's precondition did not hold against the
    /// current model state (e.g. STOP on a file that isn't downloading).
    /// Reported to the command's own failure callback only.
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// A single chunk's checksum could not be computed (unreadable
    /// locally, for example). The chunk is marked CORRUPT; validation of
    /// the rest of the file continues.
    #[error("validator error: {0}")]
    ValidatorInternal(String),

    /// The validation worker itself died. Propagates out of the tick
    /// that observed it.
    #[error("validator fatal: {0}")]
    ValidatorFatal(String),

    /// A checksum mismatch discovered outside the normal chunk-retry
    /// path (e.g. during a whole-file fallback hash).
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// A chunk layout violates the contiguity/coverage invariant.
    #[error("invalid chunk layout: {0}")]
    InvalidChunkLayout(String),

    /// Lookup of a name, pair, or chunk index that doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Adding an entry (a `Model` name, a path pair id) that already
    /// exists. Not one of the controller-facing kinds in `spec.md` §7 —
    /// an aggregate-level invariant violation rather than a tick-level
    /// policy decision.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encode/decode failure. Carries the formatted underlying error
    /// rather than `#[from] serde_json::Error` so the domain crate itself
    /// stays free of a serialization-format dependency; infrastructure
    /// adapters convert with `.map_err(|e| RapidCopyError::Json(e.to_string()))`.
    #[error("JSON error: {0}")]
    Json(String),

    /// Same rationale as `Json` — a formatted TOML decode failure.
    #[error("TOML error: {0}")]
    Toml(String),
}

impl RapidCopyError {
    /// Whether the controller should stop entirely on this error, as
    /// opposed to recording it and continuing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RapidCopyError::ConfigIncomplete(_)
                | RapidCopyError::ScanNonRecoverable(_)
                | RapidCopyError::ValidatorFatal(_)
        )
    }
}
