// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ModelFile` — a logical entry in the reconciled [`Model`](crate::aggregates::Model).
//!
//! `update_timestamp` is advisory only: it records when the entry was
//! last touched but is excluded from equality, so a rebuild that changes
//! nothing else is byte-equivalent to the model it replaced (Testable
//! Property 7).

use crate::value_objects::{ModelKey, ModelState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub key: ModelKey,
    pub is_dir: bool,
    pub state: ModelState,
    pub remote_size: Option<u64>,
    pub local_size: Option<u64>,
    pub transferred_size: Option<u64>,
    pub downloading_speed: Option<u64>,
    pub eta: Option<u64>,
    pub is_extractable: bool,
    pub local_created_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub local_modified_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub remote_created_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub remote_modified_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub update_timestamp: chrono::DateTime<chrono::Utc>,
    pub children: Vec<ModelFile>,
    /// `[0, 1]`, or `None` when the file isn't currently being validated.
    pub validation_progress: Option<f32>,
    pub validation_error: Option<String>,
    pub corrupt_chunks: Vec<u64>,
}

impl ModelFile {
    pub fn new(key: ModelKey, is_dir: bool) -> Self {
        ModelFile {
            key,
            is_dir,
            state: ModelState::Default,
            remote_size: None,
            local_size: None,
            transferred_size: None,
            downloading_speed: None,
            eta: None,
            is_extractable: false,
            local_created_timestamp: None,
            local_modified_timestamp: None,
            remote_created_timestamp: None,
            remote_modified_timestamp: None,
            update_timestamp: chrono::DateTime::UNIX_EPOCH,
            children: Vec::new(),
            validation_progress: None,
            validation_error: None,
            corrupt_chunks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// `state == CORRUPT ⇒ corrupt_chunks non-empty or validation_error set`
    /// and sizes non-negative are enforced by construction (`u64`); this
    /// checks the one conditional invariant that isn't structural.
    pub fn is_well_formed(&self) -> bool {
        if self.state == ModelState::Corrupt
            && self.corrupt_chunks.is_empty()
            && self.validation_error.is_none()
        {
            return false;
        }
        if let Some(p) = self.validation_progress {
            if !(0.0..=1.0).contains(&p) {
                return false;
            }
        }
        true
    }
}

impl PartialEq for ModelFile {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.is_dir == other.is_dir
            && self.state == other.state
            && self.remote_size == other.remote_size
            && self.local_size == other.local_size
            && self.transferred_size == other.transferred_size
            && self.downloading_speed == other.downloading_speed
            && self.eta == other.eta
            && self.is_extractable == other.is_extractable
            && self.local_created_timestamp == other.local_created_timestamp
            && self.local_modified_timestamp == other.local_modified_timestamp
            && self.remote_created_timestamp == other.remote_created_timestamp
            && self.remote_modified_timestamp == other.remote_modified_timestamp
            && self.validation_progress == other.validation_progress
            && self.validation_error == other.validation_error
            && self.corrupt_chunks == other.corrupt_chunks
            && self.children == other.children
        // update_timestamp deliberately excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_update_timestamp() {
        let key = ModelKey::unpaired("a.mkv");
        let mut a = ModelFile::new(key.clone(), false);
        let mut b = ModelFile::new(key, false);
        a.update_timestamp = chrono::DateTime::from_timestamp(1, 0).unwrap();
        b.update_timestamp = chrono::DateTime::from_timestamp(2, 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn corrupt_without_reason_is_malformed() {
        let mut f = ModelFile::new(ModelKey::unpaired("a"), false);
        f.state = ModelState::Corrupt;
        assert!(!f.is_well_formed());
        f.corrupt_chunks.push(1);
        assert!(f.is_well_formed());
    }
}
