// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()              │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                   │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                     │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration: every path canonicalized (where it must
/// already exist) or pattern-checked (where it may not yet), every name
/// checked against the dangerous-pattern list.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

/// Validated command variants, one per [`Commands`] arm.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run,
    Status,
    PairsList,
    PairsAdd {
        name: String,
        remote: String,
        local: PathBuf,
        auto_queue: bool,
    },
    PairsRemove {
        name: String,
    },
    PairsEnable {
        name: String,
    },
    PairsDisable {
        name: String,
    },
    Queue {
        name: String,
        pair: Option<String>,
    },
    Stop {
        name: String,
        pair: Option<String>,
    },
    Validate {
        name: String,
        pair: Option<String>,
        full: bool,
    },
    Extract {
        name: String,
        pair: Option<String>,
    },
    DeleteLocal {
        name: String,
        pair: Option<String>,
    },
    DeleteRemote {
        name: String,
        pair: Option<String>,
    },
}

/// Parses and validates CLI arguments: parse with clap, then
/// security-validate every string and path.
///
/// # Errors
///
/// Returns [`ParseError`] if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parser::parse_cli();
    validate_cli(cli)
}

fn validate_name(name: String) -> Result<String, ParseError> {
    SecureArgParser::validate_argument(&name)?;
    Ok(name)
}

fn validate_pair(pair: Option<String>) -> Result<Option<String>, ParseError> {
    match pair {
        Some(p) => Ok(Some(validate_name(p)?)),
        None => Ok(None),
    }
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    let command = match cli.command {
        Commands::Run => ValidatedCommand::Run,
        Commands::Status => ValidatedCommand::Status,
        Commands::PairsList => ValidatedCommand::PairsList,
        Commands::PairsAdd {
            name,
            remote,
            local,
            auto_queue,
        } => {
            let name = validate_name(name)?;
            SecureArgParser::validate_argument(&remote)?;
            SecureArgParser::validate_destination(&local.to_string_lossy())?;

            ValidatedCommand::PairsAdd {
                name,
                remote,
                local,
                auto_queue,
            }
        }
        Commands::PairsRemove { name } => ValidatedCommand::PairsRemove { name: validate_name(name)? },
        Commands::PairsEnable { name } => ValidatedCommand::PairsEnable { name: validate_name(name)? },
        Commands::PairsDisable { name } => ValidatedCommand::PairsDisable { name: validate_name(name)? },
        Commands::Queue { name, pair } => ValidatedCommand::Queue {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
        },
        Commands::Stop { name, pair } => ValidatedCommand::Stop {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
        },
        Commands::Validate { name, pair, full } => ValidatedCommand::Validate {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
            full,
        },
        Commands::Extract { name, pair } => ValidatedCommand::Extract {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
        },
        Commands::DeleteLocal { name, pair } => ValidatedCommand::DeleteLocal {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
        },
        Commands::DeleteRemote { name, pair } => ValidatedCommand::DeleteRemote {
            name: validate_name(name)?,
            pair: validate_pair(pair)?,
        },
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_cli_accepts_run() {
        let cli = Cli {
            command: Commands::Run,
            verbose: false,
            config: None,
        };
        let validated = validate_cli(cli).unwrap();
        assert!(matches!(validated.command, ValidatedCommand::Run));
    }

    #[test]
    fn validate_cli_rejects_dangerous_name() {
        let cli = Cli {
            command: Commands::PairsRemove {
                name: "../etc/passwd".to_string(),
            },
            verbose: false,
            config: None,
        };
        assert!(matches!(validate_cli(cli), Err(ParseError::DangerousPattern { .. })));
    }

    #[test]
    fn validate_cli_accepts_pairs_add_with_new_local_dir() {
        let cli = Cli {
            command: Commands::PairsAdd {
                name: "movies".to_string(),
                remote: "/srv/media/movies".to_string(),
                local: PathBuf::from("/data/downloads/movies"),
                auto_queue: true,
            },
            verbose: false,
            config: None,
        };
        let validated = validate_cli(cli).unwrap();
        assert!(matches!(validated.command, ValidatedCommand::PairsAdd { auto_queue: true, .. }));
    }
}
