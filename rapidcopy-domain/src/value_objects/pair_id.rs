// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PairId` — identity of a `PathPair`. Files are namespaced by
//! `(PairId, name)` rather than by name alone, since two pairs may each
//! have a file with the same name (`spec.md` §3, scenario S5).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(String);

impl PairId {
    pub fn new(id: impl Into<String>) -> Self {
        PairId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PairId {
    fn from(s: String) -> Self {
        PairId(s)
    }
}

impl From<&str> for PairId {
    fn from(s: &str) -> Self {
        PairId(s.to_string())
    }
}

/// Key a `ModelFile` is addressed by: a pair plus the file's name within
/// that pair's namespace. A bare (non-paired) file uses the sentinel
/// `PairId` returned by [`ModelKey::unpaired`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelKey {
    pub pair_id: PairId,
    pub name: String,
}

impl ModelKey {
    pub fn new(pair_id: PairId, name: impl Into<String>) -> Self {
        ModelKey {
            pair_id,
            name: name.into(),
        }
    }

    /// Sentinel pair id used for deployments that don't use multi-pair
    /// mode — every file lives in one implicit, unnamed pair.
    pub fn unpaired(name: impl Into<String>) -> Self {
        ModelKey {
            pair_id: PairId::new("__default__"),
            name: name.into(),
        }
    }
}
