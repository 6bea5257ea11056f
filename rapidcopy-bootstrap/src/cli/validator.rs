// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Parsing
//!
//! Security-first argument validation, run after `clap` has already
//! parsed the raw command line.
//!
//! ## Dangerous Patterns Detected
//!
//! - `..` - Path traversal
//! - `~` - Home directory expansion
//! - `$` - Variable expansion
//! - Backticks - Command substitution
//! - `;` `&` `|` - Command chaining
//! - `>` `<` - Redirection
//! - Null bytes, newlines, carriage returns
//!
//! Every `name`, `pair` name, and remote path that eventually reaches a
//! shelled-out `dd`/`*sum` command on the remote host (see
//! `rapidcopy_domain::services::checksum_service`) passes through
//! [`SecureArgParser::validate_argument`] first, in addition to that
//! module's own single-quote escaping — defense in depth against an
//! operator-supplied name containing shell metacharacters.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum single argument length.
const MAX_ARG_LENGTH: usize = 1000;

/// Maximum path length.
const MAX_PATH_LENGTH: usize = 4096;

/// Dangerous patterns that indicate potential attacks.
const DANGEROUS_PATTERNS: &[&str] = &[
    "..", // Path traversal
    "~",  // Home directory
    "$",  // Variable expansion
    "`",  // Command substitution
    ";",  // Command chaining
    "&",  // Background/AND
    "|",  // Pipe
    ">",  // Redirect output
    "<",  // Redirect input
    "\n", // Newline
    "\r", // Carriage return
    "\0", // Null byte
];

/// Protected system directories a local destination must not resolve into.
const PROTECTED_DIRS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev"];

/// Secure argument parsing errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Argument exceeds maximum length.
    #[error("Argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    /// Dangerous pattern detected.
    #[error("Dangerous pattern detected in argument: {pattern} in {arg}")]
    DangerousPattern { pattern: String, arg: String },

    /// Path too long.
    #[error("Path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,

    /// Attempted access to protected system directory.
    #[error("Access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    /// Path does not exist.
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument value.
    #[error("Invalid argument value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Validates CLI-supplied strings and paths before they reach application
/// or domain code.
pub struct SecureArgParser;

impl SecureArgParser {
    /// Validates a single argument (a file/pair name, for instance) for
    /// security issues.
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(arg.chars().take(50).collect::<String>() + "..."));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ParseError::DangerousPattern {
                    pattern: pattern.to_string(),
                    arg: arg.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validates and canonicalizes a local path that must already exist
    /// (a source to operate on, not a destination to create).
    pub fn validate_path(path: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(path).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidPath(format!("path too long: {path}")),
            ParseError::DangerousPattern { pattern, .. } => {
                ParseError::InvalidPath(format!("path contains dangerous pattern '{pattern}': {path}"))
            }
            other => other,
        })?;

        let path_obj = Path::new(path);
        let canonical = path_obj.canonicalize().map_err(|e| {
            if !path_obj.exists() {
                ParseError::PathNotFound(path.to_string())
            } else {
                ParseError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ParseError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ParseError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Validates a local destination path that may not exist yet (a
    /// `--local` path pair target): checks for dangerous patterns and
    /// the protected-directory list, but does not require the path to
    /// exist or canonicalize it.
    pub fn validate_destination(path: &str) -> Result<(), ParseError> {
        Self::validate_argument(path)?;

        let path_obj = Path::new(path);
        if path_obj.is_absolute() {
            for protected in PROTECTED_DIRS {
                if path_obj.starts_with(protected) {
                    return Err(ParseError::ProtectedDirectory(path.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Validates a numeric argument with an optional inclusive range.
    pub fn validate_number<T>(arg_name: &str, value: &str, min: Option<T>, max: Option<T>) -> Result<T, ParseError>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
    {
        Self::validate_argument(value)?;

        let num = value.parse::<T>().map_err(|_| ParseError::InvalidValue {
            arg: arg_name.to_string(),
            reason: format!("not a valid number: {value}"),
        })?;

        if let Some(min_val) = min {
            if num < min_val {
                return Err(ParseError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("value {value} is less than minimum {min_val}"),
                });
            }
        }

        if let Some(max_val) = max {
            if num > max_val {
                return Err(ParseError::InvalidValue {
                    arg: arg_name.to_string(),
                    reason: format!("value {value} is greater than maximum {max_val}"),
                });
            }
        }

        Ok(num)
    }
}
