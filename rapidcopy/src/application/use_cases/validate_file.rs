// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `VALIDATE`: requests a checksum pass over `name`. `full` revalidates
/// the whole file instead of only its still-pending chunks.
pub async fn validate_file(dispatcher: &CommandDispatcher, name: String, pair: Option<String>, full: bool) -> Result<(), String> {
    submit(dispatcher, CommandKind::Validate, name, pair, full).await
}
