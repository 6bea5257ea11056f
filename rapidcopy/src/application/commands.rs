// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Operator commands accepted by the [`CommandDispatcher`](super::services::command_dispatcher::CommandDispatcher)'s
//! FIFO queue: `QUEUE`/`STOP`/`EXTRACT`/`DELETE_LOCAL`/`DELETE_REMOTE`/`VALIDATE`,
//! each immutable once built and carrying an optional success/failure
//! callback, invoked once by the Controller after the command's
//! precondition has been checked against the current model state.

use rapidcopy_domain::value_objects::ModelKey;
use std::fmt;
use std::sync::Arc;

/// Invoked exactly once with the human-readable outcome of a dispatched
/// command: `Ok(())` on success, `Err(message)` on a rejected precondition.
pub type CommandCallback = Arc<dyn Fn(Result<(), String>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Queue,
    Stop,
    Extract,
    DeleteLocal,
    DeleteRemote,
    Validate,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::Queue => "QUEUE",
            CommandKind::Stop => "STOP",
            CommandKind::Extract => "EXTRACT",
            CommandKind::DeleteLocal => "DELETE_LOCAL",
            CommandKind::DeleteRemote => "DELETE_REMOTE",
            CommandKind::Validate => "VALIDATE",
        };
        write!(f, "{s}")
    }
}

/// One entry in the Command Dispatcher's FIFO queue.
///
/// Built with [`Command::new`] and the `with_*` builder methods, mirroring
/// the immutable-command-plus-builder shape used throughout this codebase
/// for operations that cross a queue boundary.
#[derive(Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub key: ModelKey,
    /// `VALIDATE` only: revalidate the whole file rather than pending
    /// chunks.
    pub full_validate: bool,
    pub callback: Option<CommandCallback>,
}

impl Command {
    pub fn new(kind: CommandKind, key: ModelKey) -> Self {
        Command {
            kind,
            key,
            full_validate: false,
            callback: None,
        }
    }

    pub fn with_full_validate(mut self, full: bool) -> Self {
        self.full_validate = full;
        self
    }

    pub fn with_callback(mut self, callback: CommandCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Invokes the command's callback, if any, with its outcome.
    pub fn complete(&self, outcome: Result<(), String>) {
        if let Some(callback) = &self.callback {
            callback(outcome);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("full_validate", &self.full_validate)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn callback_receives_outcome() {
        let received = Arc::new(Mutex::new(None));
        let received_clone = received.clone();
        let cmd = Command::new(CommandKind::Queue, ModelKey::unpaired("a.mkv"))
            .with_callback(Arc::new(move |outcome| *received_clone.lock().unwrap() = Some(outcome)));
        cmd.complete(Err("not found".to_string()));
        assert_eq!(received.lock().unwrap().as_ref().unwrap(), &Err("not found".to_string()));
    }

    #[test]
    fn command_without_callback_completes_without_panicking() {
        let cmd = Command::new(CommandKind::Stop, ModelKey::unpaired("a.mkv"));
        cmd.complete(Ok(()));
    }
}
