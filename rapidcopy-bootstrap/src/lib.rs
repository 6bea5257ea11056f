// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application
//! layers (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - process lifecycle
//! - **Signal handling** - graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Argument parsing** - secure CLI argument validation
//! - **Logging** - `tracing` subscriber initialization
//! - **Exit codes** - Unix exit code mapping
//! - **Async coordination** - shutdown coordination and cancellation
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Entry Point                              │
//! │  - Signal Handling                          │
//! │  - Secure Arg Parsing                       │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER                   │
//! │  - Use Cases / Application Services         │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER                      │
//! │  - Entities, Value Objects, Domain Services │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │       INFRASTRUCTURE LAYER                  │
//! │  - Adapters, Repositories, External Services │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from enterprise layers** - bootstrap can access all
//!    layers; enterprise layers cannot access bootstrap.
//! 2. **Graceful shutdown** - signal handlers, cancellation token
//!    propagation, grace period with timeout enforcement.
//! 3. **Security first** - input validation for all CLI arguments, path
//!    traversal and shell-metacharacter rejection.
//! 4. **Testability** - every component is behind a trait with a no-op
//!    or capturing implementation for tests.
//!
//! ## Module Structure
//!
//! - `cli` - secure argument parsing
//! - `signals` - signal handling (SIGTERM, SIGINT, SIGHUP)
//! - `exit_code` - Unix exit code enumeration
//! - `logger` - logging initialization and bootstrap-phase logger
//! - `shutdown` - shutdown coordination

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Bootstrap and parse CLI arguments.
///
/// The main entry point for the bootstrap layer: parses with clap,
/// security-validates every argument, and returns a [`ValidatedCli`].
/// The caller runs the application and maps its result to an exit code
/// with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns [`cli::ParseError`] if CLI parsing or validation fails.
/// Clap handles `--help`/`--version` itself and exits the process.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
