// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `path_pairs.json`: the enumerated path pairs the controller reads
//! once at startup and again whenever this store's `version` counter
//! moves. This repository is also where the `PairsAdd`/`PairsRemove`/
//! `PairsEnable`/`PairsDisable` CLI commands land — each mutation bumps
//! `version` so a running controller notices on its next poll without
//! needing its own file-watcher.

use super::atomic_file::{read_json_or_default, write_json_atomically};
use rapidcopy_domain::entities::PathPair;
use rapidcopy_domain::value_objects::PairId;
use rapidcopy_domain::RapidCopyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PathPairDocument {
    version: u64,
    path_pairs: Vec<PathPair>,
}

/// A snapshot of the store: the pairs plus the version they were read
/// at, so a caller can tell whether it needs to reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathPairSnapshot {
    pub version: u64,
    pub pairs: Vec<PathPair>,
}

pub struct FilePathPairRepository {
    path: PathBuf,
    state: Mutex<PathPairDocument>,
}

impl FilePathPairRepository {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RapidCopyError> {
        let path = path.into();
        let document: PathPairDocument = read_json_or_default(&path)?;
        Ok(FilePathPairRepository {
            path,
            state: Mutex::new(document),
        })
    }

    pub fn snapshot(&self) -> PathPairSnapshot {
        let document = self.state.lock().unwrap();
        PathPairSnapshot {
            version: document.version,
            pairs: document.path_pairs.clone(),
        }
    }

    /// The version the controller last saw; pass it back on the next
    /// poll and reload only if it has moved.
    pub fn version(&self) -> u64 {
        self.state.lock().unwrap().version
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<PathPair>) -> Result<(), RapidCopyError>) -> Result<(), RapidCopyError> {
        let mut document = self.state.lock().unwrap();
        f(&mut document.path_pairs)?;
        document.version += 1;
        write_json_atomically(&self.path, &*document)
    }

    pub fn add(&self, name: String, remote_path: impl Into<PathBuf>, local_path: impl Into<PathBuf>, auto_queue: bool) -> Result<(), RapidCopyError> {
        let remote_path = remote_path.into();
        let local_path = local_path.into();
        self.mutate(move |pairs| {
            if pairs.iter().any(|p| p.name == name) {
                return Err(RapidCopyError::AlreadyExists(format!("path pair {name} already exists")));
            }
            let id = PairId::new(name.clone());
            let mut pair = PathPair::new(id, name, remote_path, local_path);
            pair.auto_queue = auto_queue;
            pairs.push(pair);
            Ok(())
        })
    }

    pub fn remove(&self, name: &str) -> Result<(), RapidCopyError> {
        self.mutate(|pairs| {
            let before = pairs.len();
            pairs.retain(|p| p.name != name);
            if pairs.len() == before {
                return Err(RapidCopyError::NotFound(format!("path pair {name} not found")));
            }
            Ok(())
        })
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), RapidCopyError> {
        self.mutate(|pairs| {
            let pair = pairs
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| RapidCopyError::NotFound(format!("path pair {name} not found")))?;
            pair.enabled = enabled;
            Ok(())
        })
    }

    pub fn enable(&self, name: &str) -> Result<(), RapidCopyError> {
        self.set_enabled(name, true)
    }

    pub fn disable(&self, name: &str) -> Result<(), RapidCopyError> {
        self.set_enabled(name, false)
    }
}

/// Convenience formatter for `PairsList`'s textual output.
pub fn format_pairs(pairs: &[PathPair]) -> String {
    pairs
        .iter()
        .map(|p| {
            format!(
                "{}\t{}\t{}\t{}\tenabled={}\tauto_queue={}",
                p.id.as_str(),
                p.name,
                p.remote_path.display(),
                p.local_path.display(),
                p.enabled,
                p.auto_queue
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
