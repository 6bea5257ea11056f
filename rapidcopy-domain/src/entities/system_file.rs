// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `SystemFile` — a scanned filesystem node, as produced by the local or
//! remote scanner. Plain data; the scanners are responsible for the
//! invariants below, this type only lets callers assert them in tests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemFile {
    pub name: String,
    /// Bytes; for a directory this is the sum of its immediate children.
    pub size: u64,
    pub is_dir: bool,
    pub time_created: Option<chrono::DateTime<chrono::Utc>>,
    pub time_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Directories only; always empty for a plain file.
    pub children: Vec<SystemFile>,
    pub pair_id: Option<String>,
    pub pair_name: Option<String>,
}

impl SystemFile {
    pub fn new_file(name: impl Into<String>, size: u64) -> Self {
        SystemFile {
            name: name.into(),
            size,
            is_dir: false,
            time_created: None,
            time_modified: None,
            children: Vec::new(),
            pair_id: None,
            pair_name: None,
        }
    }

    pub fn new_dir(name: impl Into<String>, children: Vec<SystemFile>) -> Self {
        let size = children.iter().map(|c| c.size).sum();
        SystemFile {
            name: name.into(),
            size,
            is_dir: true,
            time_created: None,
            time_modified: None,
            children,
            pair_id: None,
            pair_name: None,
        }
    }

    pub fn with_pair(mut self, pair_id: impl Into<String>, pair_name: impl Into<String>) -> Self {
        self.pair_id = Some(pair_id.into());
        self.pair_name = Some(pair_name.into());
        self
    }

    /// True when the recorded size is consistent with the declared
    /// invariants: non-directories carry no children, and a directory's
    /// size is the sum of its immediate children.
    pub fn is_well_formed(&self) -> bool {
        if !self.is_dir {
            return self.children.is_empty();
        }
        self.children.iter().map(|c| c.size).sum::<u64>() == self.size
    }
}
