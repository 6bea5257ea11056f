// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap. Defines the CLI structure
//! and handles argument parsing only — security validation happens in
//! the `validator` module after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "rapidcopy")]
#[command(about = concat!("RapidCopy v", env!("CARGO_PKG_VERSION"), " — adaptive mirroring with chunked integrity verification"))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// CLI subcommands, mirroring the Command Dispatcher's queued command
/// kinds (`QUEUE`/`STOP`/`EXTRACT`/`DELETE_LOCAL`/`DELETE_REMOTE`/
/// `VALIDATE`) plus service lifecycle and path-pair administration.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the service: scan, download, and validate continuously until
    /// a shutdown signal is received.
    Run,

    /// Print the current Model snapshot (files, states, progress) for
    /// the persisted path pairs, without starting the service.
    Status,

    /// List configured path pairs.
    PairsList,

    /// Add a path pair.
    PairsAdd {
        /// Unique name for this pair.
        #[arg(long)]
        name: String,

        /// Remote path (as seen through the remote transport).
        #[arg(long)]
        remote: String,

        /// Local destination path.
        #[arg(long)]
        local: PathBuf,

        /// Automatically queue newly discovered files for download.
        #[arg(long)]
        auto_queue: bool,
    },

    /// Remove a path pair by name.
    PairsRemove {
        /// Name of the path pair to remove.
        name: String,
    },

    /// Enable a previously disabled path pair.
    PairsEnable {
        /// Name of the path pair to enable.
        name: String,
    },

    /// Disable a path pair (stops scanning/downloading, keeps config).
    PairsDisable {
        /// Name of the path pair to disable.
        name: String,
    },

    /// Queue a file for download.
    Queue {
        /// Name of the file (as tracked in the Model) to queue.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,
    },

    /// Stop an in-progress download.
    Stop {
        /// Name of the file to stop downloading.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,
    },

    /// Force revalidation of a local file against the remote.
    Validate {
        /// Name of the file to validate.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,

        /// Revalidate the whole file instead of only pending chunks.
        #[arg(long)]
        full: bool,
    },

    /// Request extraction of a downloaded archive (forwarded to the
    /// external extractor collaborator; RapidCopy only tracks its
    /// reported status).
    Extract {
        /// Name of the file to extract.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,
    },

    /// Delete the local copy of a file.
    DeleteLocal {
        /// Name of the file to delete locally.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,
    },

    /// Delete the remote copy of a file.
    DeleteRemote {
        /// Name of the file to delete on the remote.
        name: String,

        /// Path pair the file belongs to, when more than one is configured.
        #[arg(long)]
        pair: Option<String>,
    },
}

/// Parse CLI arguments.
///
/// # Panics
///
/// Clap exits the process with a usage message if parsing fails, or on
/// `--help`/`--version`.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
