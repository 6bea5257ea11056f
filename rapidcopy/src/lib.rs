// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # RapidCopy Core
//!
//! Application services, infrastructure adapters, and the operator CLI
//! handlers that sit on top of the pure [`rapidcopy_domain`] layer.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Presentation                 │  CLI command handlers
//! └─────────────────┬─────────────────--┘
//! ┌─────────────────┴───────────────────┐
//! │         Application                  │  Use cases, supervised services
//! └─────────────────┬───────────────────┘
//! ┌─────────────────┴───────────────────┐
//! │            Domain                    │  rapidcopy_domain
//! └─────────────────┬───────────────────┘
//! ┌─────────────────┴───────────────────┐
//! │        Infrastructure                │  Adapters, repositories, config
//! └─────────────────────────────────────┘
//! ```

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use rapidcopy_domain::RapidCopyError;
