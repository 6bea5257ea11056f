// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rapidcopy_bootstrap::exit_code::result_to_exit_code;
//!
//! fn run_application() -> Result<(), String> {
//!     Ok(())
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     result_to_exit_code(run_application())
//! }
//! ```

use std::fmt;

/// Exit codes following Unix conventions (BSD `sysexits.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65) — malformed configuration, bad TOML/JSON
    DataError = 65,

    /// Cannot open input (66) — path pair source not found, permission denied
    NoInput = 66,

    /// Host name unknown (68) — remote host unresolvable
    NoHost = 68,

    /// Service unavailable (69) — remote transport down, lftp/ssh unreachable
    Unavailable = 69,

    /// Internal software error (70) — an aggregate invariant was violated
    Software = 70,

    /// System error (71) — OS call failed
    OsError = 71,

    /// Cannot create output file (73) — local destination unwritable
    CantCreate = 73,

    /// I/O error (74)
    IoError = 74,

    /// Temporary failure, retry (75) — transient scan/download error
    TempFail = 75,

    /// Remote error in protocol (76) — malformed remote scan/checksum output
    Protocol = 76,

    /// Permission denied (77)
    NoPerm = 77,

    /// Configuration error (78) — `ConfigIncomplete`
    Config = 78,

    /// Interrupted by signal (SIGINT) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a generic error's `Display` text to an exit code by
    /// substring match. Used for errors outside `RapidCopyError` (CLI
    /// parsing, config loading before the domain error type applies).
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let error_string = error.to_string().to_lowercase();

        if error_string.contains("permission") || error_string.contains("access denied") {
            ExitCode::NoPerm
        } else if error_string.contains("not found") || error_string.contains("no such") {
            ExitCode::NoInput
        } else if error_string.contains("invalid") || error_string.contains("argument") {
            ExitCode::UsageError
        } else if error_string.contains("parse") || error_string.contains("format") {
            ExitCode::DataError
        } else if error_string.contains("io") || error_string.contains("read") || error_string.contains("write") {
            ExitCode::IoError
        } else if error_string.contains("config") {
            ExitCode::Config
        } else if error_string.contains("unavailable") || error_string.contains("not available") {
            ExitCode::Unavailable
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::NoHost => "Host name unknown",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::CantCreate => "Cannot create output file",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::Protocol => "Remote error in protocol",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Maps any error implementing `std::error::Error` to an [`ExitCode`] via
/// [`ExitCode::from_error`]. Kept as a free function (rather than a
/// method on `ExitCode`) so `main` can pass it directly to
/// `Result::map_err`/`result_to_exit_code` without needing the
/// `RapidCopyError` type in scope.
pub fn map_error_to_exit_code(error: &dyn std::error::Error) -> ExitCode {
    ExitCode::from_error(error)
}

/// Converts a top-level `main` result into a process exit code: success
/// maps to 0, failure is logged and mapped via [`map_error_to_exit_code`].
pub fn result_to_exit_code<T, E: std::error::Error>(result: Result<T, E>) -> std::process::ExitCode {
    match result {
        Ok(_) => ExitCode::Success.into(),
        Err(e) => {
            let code = map_error_to_exit_code(&e);
            tracing::error!("{}", e);
            code.into()
        }
    }
}
