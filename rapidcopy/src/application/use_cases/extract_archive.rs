// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::submit;
use crate::application::commands::CommandKind;
use crate::application::services::command_dispatcher::CommandDispatcher;

/// `EXTRACT`: asks the Controller to hand `name` to the archive
/// extractor. A pass-through precondition check only — the extractor
/// itself is an external collaborator this crate does not drive.
pub async fn extract_archive(dispatcher: &CommandDispatcher, name: String, pair: Option<String>) -> Result<(), String> {
    submit(dispatcher, CommandKind::Extract, name, pair, false).await
}
