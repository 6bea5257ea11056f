// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PathPair` — a named `(remote_path, local_path)` root. Files are
//! namespaced by `pair_id`; see [`crate::value_objects::ModelKey`].

use crate::value_objects::PairId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPair {
    pub id: PairId,
    pub name: String,
    pub remote_path: PathBuf,
    pub local_path: PathBuf,
    pub enabled: bool,
    pub auto_queue: bool,
}

impl PathPair {
    pub fn new(
        id: PairId,
        name: impl Into<String>,
        remote_path: impl Into<PathBuf>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        PathPair {
            id,
            name: name.into(),
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            enabled: true,
            auto_queue: false,
        }
    }
}
