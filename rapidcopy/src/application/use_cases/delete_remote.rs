// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `DELETE_REMOTE`: removes the remote copy of `name` via the
/// [`RemoteTransport`](crate::application::services::controller::RemoteTransport)
/// the Controller holds.
pub async fn delete_remote(dispatcher: &CommandDispatcher, name: String, pair: Option<String>) -> Result<(), String> {
    submit(dispatcher, CommandKind::DeleteRemote, name, pair, false).await
}
