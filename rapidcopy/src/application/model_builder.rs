// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Model Builder: a pure function folding the latest scan and worker
//! outputs into a fresh [`Model`]. No internal state — every input is
//! taken by reference and a brand new `Model` is returned each call; the
//! Controller is the only thing that remembers the previous one (to diff
//! against).
//!
//! State derivation for one name follows `spec.md` §4.11 exactly: downloader
//! RUNNING/QUEUED beats extractor EXTRACTING beats the persisted
//! extracted/downloaded sets beats the bare remote/local presence test.

use crate::application::services::downloader_driver::{DownloadJobState, DownloadStatus};
use rapidcopy_domain::aggregates::Model;
use rapidcopy_domain::entities::{ModelFile, SystemFile};
use rapidcopy_domain::value_objects::{ModelKey, ModelState, PairId};
use std::collections::{HashMap, HashSet};

/// Status of one file the external extractor collaborator is currently
/// working on. RapidCopy only folds this in via the Model Builder; the
/// extractor's own wire protocol is out of scope (`spec.md` §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorStatus {
    pub name: String,
    pub pair_id: Option<PairId>,
}

/// One scanned tree plus the pair it belongs to (unpaired deployments use
/// [`ModelKey::unpaired`]'s sentinel pair id).
pub struct TaggedScan {
    pub pair_id: PairId,
    pub files: Vec<SystemFile>,
}

/// All inputs the Controller collects in one tick before rebuilding the
/// Model: remote and local scans (one per configured pair), live
/// downloader/extractor status, and the two persisted sets.
pub struct ModelBuilderInputs<'a> {
    pub remote_scans: &'a [TaggedScan],
    pub local_scans: &'a [TaggedScan],
    pub downloader_status: &'a [DownloadStatus],
    pub extractor_status: &'a [ExtractorStatus],
    pub downloaded_set: &'a HashSet<ModelKey>,
    pub extracted_set: &'a HashSet<ModelKey>,
}

struct FlatEntry {
    key: ModelKey,
    is_dir: bool,
    size: u64,
    created: Option<chrono::DateTime<chrono::Utc>>,
    modified: Option<chrono::DateTime<chrono::Utc>>,
    children: Vec<SystemFile>,
}

fn flatten(scans: &[TaggedScan]) -> HashMap<ModelKey, FlatEntry> {
    let mut out = HashMap::new();
    for scan in scans {
        for file in &scan.files {
            let key = ModelKey::new(scan.pair_id.clone(), file.name.clone());
            out.insert(
                key.clone(),
                FlatEntry {
                    key,
                    is_dir: file.is_dir,
                    size: file.size,
                    created: file.time_created,
                    modified: file.time_modified,
                    children: file.children.clone(),
                },
            );
        }
    }
    out
}

/// Builds a fresh [`Model`] from the six collected inputs (`spec.md` §4.11).
/// The result's files are the union of remote names, local names, and
/// known-downloaded names; state is derived per-name by the precedence
/// rules below.
pub fn build_model(inputs: &ModelBuilderInputs<'_>) -> Model {
    let remote = flatten(inputs.remote_scans);
    let local = flatten(inputs.local_scans);

    let downloader_by_key: HashMap<ModelKey, &DownloadStatus> = inputs
        .downloader_status
        .iter()
        .map(|s| (s.key.clone(), s))
        .collect();
    let extracting: HashSet<ModelKey> = inputs
        .extractor_status
        .iter()
        .map(|s| ModelKey::new(s.pair_id.clone().unwrap_or_else(|| PairId::new("__default__")), s.name.clone()))
        .collect();

    let mut names: Vec<ModelKey> = Vec::new();
    let mut seen = HashSet::new();
    for key in remote.keys().chain(local.keys()).chain(inputs.downloaded_set.iter()) {
        if seen.insert(key.clone()) {
            names.push(key.clone());
        }
    }

    let mut model = Model::new();
    for key in names {
        let remote_entry = remote.get(&key);
        let local_entry = local.get(&key);
        let is_dir = remote_entry.map(|e| e.is_dir).or(local_entry.map(|e| e.is_dir)).unwrap_or(false);

        let mut file = ModelFile::new(key.clone(), is_dir);
        file.remote_size = remote_entry.map(|e| e.size);
        file.local_size = local_entry.map(|e| e.size);
        file.remote_created_timestamp = remote_entry.and_then(|e| e.created);
        file.remote_modified_timestamp = remote_entry.and_then(|e| e.modified);
        file.local_created_timestamp = local_entry.and_then(|e| e.created);
        file.local_modified_timestamp = local_entry.and_then(|e| e.modified);
        file.children = remote_entry
            .or(local_entry)
            .map(|e| e.children.iter().map(|c| ModelFile::new(ModelKey::new(key.pair_id.clone(), c.name.clone()), c.is_dir)).collect())
            .unwrap_or_default();

        file.state = if let Some(status) = downloader_by_key.get(&key) {
            match status.state {
                DownloadJobState::Running => {
                    file.transferred_size = Some(status.downloaded_size);
                    file.downloading_speed = Some(status.speed_bps);
                    file.eta = status.eta_seconds;
                    ModelState::Downloading
                }
                DownloadJobState::Queued => ModelState::Queued,
                // A job the engine still reports as `Finished` is authoritative on
                // its own the first time sizes line up; `downloaded_set` only takes
                // over once the engine stops reporting the job at all (e.g. after a
                // restart), which is what `derive_rest_state` alone covers.
                DownloadJobState::Finished if matches!((remote_entry, local_entry), (Some(r), Some(l)) if r.size == l.size) => {
                    ModelState::Downloaded
                }
                DownloadJobState::Stopped | DownloadJobState::Finished => derive_rest_state(&key, local_entry, remote_entry, &extracting, inputs),
            }
        } else {
            derive_rest_state(&key, local_entry, remote_entry, &extracting, inputs)
        };

        model.add(file).expect("names deduplicated above");
    }

    model
}

fn derive_rest_state(
    key: &ModelKey,
    local_entry: Option<&FlatEntry>,
    remote_entry: Option<&FlatEntry>,
    extracting: &HashSet<ModelKey>,
    inputs: &ModelBuilderInputs<'_>,
) -> ModelState {
    if extracting.contains(key) {
        return ModelState::Extracting;
    }
    if inputs.extracted_set.contains(key) && local_entry.is_some() {
        return ModelState::Extracted;
    }
    let sizes_match = matches!((remote_entry, local_entry), (Some(r), Some(l)) if r.size == l.size);
    if sizes_match && inputs.downloaded_set.contains(key) {
        return ModelState::Downloaded;
    }
    if inputs.downloaded_set.contains(key) && local_entry.is_none() {
        return ModelState::Deleted;
    }
    ModelState::Default
}
