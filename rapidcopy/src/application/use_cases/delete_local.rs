// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `DELETE_LOCAL`: removes the local copy of `name` without touching
/// the remote side.
pub async fn delete_local(dispatcher: &CommandDispatcher, name: String, pair: Option<String>) -> Result<(), String> {
    submit(dispatcher, CommandKind::DeleteLocal, name, pair, false).await
}
