// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ControllerPersistence` implementation backed by `controller.persist`,
//! a flat JSON document of `ModelKey`-derived strings. `ModelKey` itself
//! has no canonical string form, so this module owns the one used on
//! disk: `"<pair_id>\u{1f}<name>"`, a pairing unlikely to collide with
//! any path or pair id an operator would type, split back out on load.

use super::atomic_file::{read_json_or_default, write_json_atomically};
use crate::application::services::controller::{ControllerPersistence, PersistedSets};
use rapidcopy_domain::value_objects::{ModelKey, PairId};
use rapidcopy_domain::RapidCopyError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

const KEY_SEPARATOR: char = '\u{1f}';

fn encode_key(key: &ModelKey) -> String {
    format!("{}{}{}", key.pair_id.as_str(), KEY_SEPARATOR, key.name)
}

fn decode_key(encoded: &str) -> ModelKey {
    match encoded.split_once(KEY_SEPARATOR) {
        Some((pair_id, name)) => ModelKey::new(PairId::new(pair_id), name),
        None => ModelKey::unpaired(encoded),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedDocument {
    #[serde(default)]
    downloaded: Vec<String>,
    #[serde(default)]
    extracted: Vec<String>,
    #[serde(default)]
    validated: Vec<String>,
    #[serde(default)]
    validation_retry_counts: HashMap<String, u32>,
}

pub struct FileControllerStateRepository {
    path: PathBuf,
}

impl FileControllerStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileControllerStateRepository { path: path.into() }
    }
}

impl ControllerPersistence for FileControllerStateRepository {
    fn load(&self) -> Result<PersistedSets, RapidCopyError> {
        let document: PersistedDocument = read_json_or_default(&self.path)?;
        Ok(PersistedSets {
            downloaded: document.downloaded.iter().map(|s| decode_key(s)).collect::<HashSet<_>>(),
            extracted: document.extracted.iter().map(|s| decode_key(s)).collect::<HashSet<_>>(),
            validated: document.validated.iter().map(|s| decode_key(s)).collect::<HashSet<_>>(),
            validation_retry_counts: document
                .validation_retry_counts
                .into_iter()
                .map(|(k, v)| (decode_key(&k), v))
                .collect(),
        })
    }

    fn save(&self, sets: &PersistedSets) -> Result<(), RapidCopyError> {
        let document = PersistedDocument {
            downloaded: sets.downloaded.iter().map(encode_key).collect(),
            extracted: sets.extracted.iter().map(encode_key).collect(),
            validated: sets.validated.iter().map(encode_key).collect(),
            validation_retry_counts: sets
                .validation_retry_counts
                .iter()
                .map(|(k, v)| (encode_key(k), *v))
                .collect(),
        };
        write_json_atomically(&self.path, &document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_key_with_no_pair() {
        let key = ModelKey::unpaired("movie.mkv");
        assert_eq!(decode_key(&encode_key(&key)), key);
    }

    #[test]
    fn round_trips_a_key_with_a_pair() {
        let key = ModelKey::new(PairId::new("movies"), "movie.mkv");
        assert_eq!(decode_key(&encode_key(&key)), key);
    }

    #[test]
    fn saving_then_loading_preserves_every_set() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileControllerStateRepository::new(dir.path().join("controller.persist"));

        let mut sets = PersistedSets::default();
        sets.downloaded.insert(ModelKey::unpaired("a.bin"));
        sets.extracted.insert(ModelKey::unpaired("a.bin"));
        sets.validated.insert(ModelKey::unpaired("b.bin"));
        sets.validation_retry_counts.insert(ModelKey::unpaired("b.bin"), 2);

        repo.save(&sets).unwrap();
        let loaded = repo.load().unwrap();
        assert_eq!(loaded, sets);
    }

    #[test]
    fn a_missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileControllerStateRepository::new(dir.path().join("controller.persist"));
        assert_eq!(repo.load().unwrap(), PersistedSets::default());
    }
}
