// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// A chunk is never in two terminal states at once; the Chunk Manager
/// enforces the transitions below (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkStatus {
    Pending,
    Validating,
    Valid,
    Corrupt,
    Downloading,
    Skipped,
}

impl ChunkStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkStatus::Valid | ChunkStatus::Corrupt | ChunkStatus::Skipped)
    }
}
