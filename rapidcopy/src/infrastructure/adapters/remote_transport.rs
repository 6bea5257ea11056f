// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RemoteTransport` implementation: the `DELETE_REMOTE` command's only
//! collaborator, running `rm -rf` over the same [`RemoteExecutor`]
//! session abstraction the checksum provider and scanner use.

use super::checksum::RemoteExecutor;
use super::shell::shell_quote;
use crate::application::services::controller::RemoteTransport;
use rapidcopy_domain::RapidCopyError;

pub struct SshRemoteTransport<E: RemoteExecutor> {
    executor: E,
}

impl<E: RemoteExecutor> SshRemoteTransport<E> {
    pub fn new(executor: E) -> Self {
        SshRemoteTransport { executor }
    }
}

impl<E: RemoteExecutor> RemoteTransport for SshRemoteTransport<E> {
    fn delete_remote(&self, path: &str) -> Result<(), RapidCopyError> {
        let command = format!("rm -rf -- {}", shell_quote(path));
        self.executor.exec(&command).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingExecutor(Mutex<Vec<String>>);
    impl RemoteExecutor for RecordingExecutor {
        fn exec(&self, command: &str) -> Result<String, RapidCopyError> {
            self.0.lock().unwrap().push(command.to_string());
            Ok(String::new())
        }
    }

    #[test]
    fn delete_remote_quotes_the_path() {
        let executor = RecordingExecutor(Mutex::new(Vec::new()));
        let transport = SshRemoteTransport::new(executor);
        transport.delete_remote("/data/a file.bin").unwrap();
        let calls = transport.executor.0.lock().unwrap();
        assert_eq!(calls[0], "rm -rf -- '/data/a file.bin'");
    }
}
