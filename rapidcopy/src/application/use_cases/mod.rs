// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Use cases: the business operations an operator can ask for, one
//! function per verb, each a thin wrapper that builds a
//! [`Command`](super::commands::Command), enqueues it on the
//! [`CommandDispatcher`](super::services::command_dispatcher::CommandDispatcher),
//! and awaits the Controller's accept/reject decision through a oneshot
//! channel. `presentation::cli::handle` is the only caller; every use
//! case here is independent of how the command line got validated.

mod delete_local;
mod delete_remote;
mod extract_archive;
mod queue_download;
mod stop_download;
mod validate_file;

pub use delete_local::delete_local;
pub use delete_remote::delete_remote;
pub use extract_archive::extract_archive;
pub use queue_download::queue_download;
pub use stop_download::stop_download;
pub use validate_file::validate_file;

use crate::application::commands::{Command, CommandKind};
use crate::application::services::command_dispatcher::CommandDispatcher;
use rapidcopy_domain::value_objects::{ModelKey, PairId};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

fn model_key(name: String, pair: Option<String>) -> ModelKey {
    match pair {
        Some(pair) => ModelKey::new(PairId::new(pair), name),
        None => ModelKey::unpaired(name),
    }
}

/// Enqueues `kind` against `name`/`pair` and waits for the Controller's
/// next `process()` tick to accept or reject it. Shared by every use
/// case in this module; the six commands differ only in `kind` and
/// whether `full_validate` is meaningful.
async fn submit(dispatcher: &CommandDispatcher, kind: CommandKind, name: String, pair: Option<String>, full_validate: bool) -> Result<(), String> {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let callback = Arc::new(move |outcome: Result<(), String>| {
        if let Some(tx) = tx.lock().expect("callback mutex poisoned").take() {
            let _ = tx.send(outcome);
        }
    });
    let command = Command::new(kind, model_key(name, pair)).with_full_validate(full_validate).with_callback(callback);
    dispatcher.queue_command(command);
    rx.await.unwrap_or_else(|_| Err("controller shut down before the command was processed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_without_a_live_controller_reports_shutdown() {
        let dispatcher = CommandDispatcher::new();
        let result = submit(&dispatcher, CommandKind::Queue, "a.mkv".to_string(), None, false).await;
        assert!(result.is_err());
    }
}
