// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Operator CLI command *handlers*: where `rapidcopy_bootstrap::cli`
//! only parses and security-validates the command line into a
//! [`ValidatedCommand`], this module turns one into the application-layer
//! call that actually carries it out — enqueueing onto the
//! [`CommandDispatcher`](crate::application::services::command_dispatcher::CommandDispatcher)
//! for the six per-file commands, or reading the live [`Model`] for
//! `Status`.

use crate::application::services::command_dispatcher::CommandDispatcher;
use crate::application::use_cases;
use crate::infrastructure::repositories::path_pair_repository::{format_pairs, FilePathPairRepository};
use rapidcopy_bootstrap::cli::ValidatedCommand;
use rapidcopy_domain::aggregates::Model;
use rapidcopy_domain::RapidCopyError;
use std::sync::{Arc, Mutex};

/// Dispatches a single validated CLI command. `Run` is handled by the
/// caller's own service loop, not here; every other command either
/// enqueues onto `dispatcher` or reads `model` directly.
pub async fn handle(
    command: ValidatedCommand,
    dispatcher: &CommandDispatcher,
    model: &Arc<Mutex<Model>>,
    path_pairs: &FilePathPairRepository,
) -> Result<String, RapidCopyError> {
    match command {
        ValidatedCommand::Run => Ok("service already running; `run` only makes sense as the top-level command".to_string()),

        ValidatedCommand::Status => {
            let model = model.lock().expect("model mutex poisoned");
            let mut lines = Vec::new();
            for name in model.names() {
                if let Some(file) = model.get(name) {
                    lines.push(format!(
                        "{:<12} {:>12} {}",
                        format!("{:?}", file.state),
                        file.remote_size.unwrap_or(0),
                        file.key.name
                    ));
                }
            }
            Ok(lines.join("\n"))
        }

        ValidatedCommand::PairsList => Ok(format_pairs(&path_pairs.snapshot().pairs)),

        ValidatedCommand::PairsAdd { name, remote, local, auto_queue } => path_pairs
            .add(name, remote, local, auto_queue)
            .map(|_| "path pair added".to_string()),

        ValidatedCommand::PairsRemove { name } => path_pairs.remove(&name).map(|_| "path pair removed".to_string()),

        ValidatedCommand::PairsEnable { name } => path_pairs.enable(&name).map(|_| "path pair enabled".to_string()),

        ValidatedCommand::PairsDisable { name } => path_pairs.disable(&name).map(|_| "path pair disabled".to_string()),

        ValidatedCommand::Queue { name, pair } => use_cases::queue_download(dispatcher, name, pair)
            .await
            .map(|_| "queued".to_string())
            .map_err(RapidCopyError::CommandRejected),

        ValidatedCommand::Stop { name, pair } => use_cases::stop_download(dispatcher, name, pair)
            .await
            .map(|_| "stopped".to_string())
            .map_err(RapidCopyError::CommandRejected),

        ValidatedCommand::Validate { name, pair, full } => use_cases::validate_file(dispatcher, name, pair, full)
            .await
            .map(|_| "validation requested".to_string())
            .map_err(RapidCopyError::CommandRejected),

        ValidatedCommand::Extract { name, pair } => use_cases::extract_archive(dispatcher, name, pair)
            .await
            .map(|_| "extraction requested".to_string())
            .map_err(RapidCopyError::CommandRejected),

        ValidatedCommand::DeleteLocal { name, pair } => use_cases::delete_local(dispatcher, name, pair)
            .await
            .map(|_| "local copy deleted".to_string())
            .map_err(RapidCopyError::CommandRejected),

        ValidatedCommand::DeleteRemote { name, pair } => use_cases::delete_remote(dispatcher, name, pair)
            .await
            .map(|_| "remote copy deleted".to_string())
            .map_err(RapidCopyError::CommandRejected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapidcopy_domain::aggregates::Model;

    fn empty_path_pairs() -> (tempfile::TempDir, FilePathPairRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePathPairRepository::open(dir.path().join("path_pairs.json")).unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn status_lists_model_entries() {
        let model = Arc::new(Mutex::new(Model::new()));
        let dispatcher = CommandDispatcher::new();
        let (_dir, path_pairs) = empty_path_pairs();
        let output = handle(ValidatedCommand::Status, &dispatcher, &model, &path_pairs).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn queue_without_a_live_controller_reports_shutdown() {
        let model = Arc::new(Mutex::new(Model::new()));
        let dispatcher = CommandDispatcher::new();
        let (_dir, path_pairs) = empty_path_pairs();
        let result = handle(
            ValidatedCommand::Queue {
                name: "a.mkv".to_string(),
                pair: None,
            },
            &dispatcher,
            &model,
            &path_pairs,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pairs_add_then_list_round_trips() {
        let model = Arc::new(Mutex::new(Model::new()));
        let dispatcher = CommandDispatcher::new();
        let (_dir, path_pairs) = empty_path_pairs();
        handle(
            ValidatedCommand::PairsAdd {
                name: "movies".to_string(),
                remote: "/srv/movies".to_string(),
                local: std::path::PathBuf::from("/data/movies"),
                auto_queue: true,
            },
            &dispatcher,
            &model,
            &path_pairs,
        )
        .await
        .unwrap();
        let listing = handle(ValidatedCommand::PairsList, &dispatcher, &model, &path_pairs).await.unwrap();
        assert!(listing.contains("movies"));
    }
}
