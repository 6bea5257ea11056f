// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `QUEUE`: asks the Controller to start downloading `name`.
pub async fn queue_download(dispatcher: &CommandDispatcher, name: String, pair: Option<String>) -> Result<(), String> {
    submit(dispatcher, CommandKind::Queue, name, pair, false).await
}
