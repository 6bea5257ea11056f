// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `STOP`: cancels an in-progress download of `name`.
pub async fn stop_download(dispatcher: &CommandDispatcher, name: String, pair: Option<String>) -> Result<(), String> {
    submit(dispatcher, CommandKind::Stop, name, pair, false).await
}
