// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Model` aggregate: an ordered mapping from
//! [`ModelKey`](crate::value_objects::ModelKey) to `ModelFile`, with
//! listeners notified synchronously on every mutation.
//!
//! Unlike the teacher's event-sourced `PipelineAggregate`, the Model has
//! no event log — the controller rebuilds it wholesale every tick and
//! diffs old against new, so there's nothing to replay. What it keeps
//! from that shape is the "mutations raise notifications synchronously,
//! in order" discipline.

use crate::entities::ModelFile;
use crate::error::RapidCopyError;
use crate::value_objects::ModelKey;
use std::collections::HashMap;
use std::sync::Arc;

/// One entry in a [`diff`] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Removed,
    Updated,
}

#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub change: Change,
    pub key: ModelKey,
}

/// Receives synchronous notifications as the Model is mutated. Invoked
/// in registration order, within the same call that triggered them —
/// a listener must not block or it stalls every other observer.
pub trait ModelListener: Send + Sync {
    fn file_added(&self, file: &ModelFile) {
        let _ = file;
    }
    fn file_updated(&self, old: &ModelFile, new: &ModelFile) {
        let _ = (old, new);
    }
    fn file_removed(&self, file: &ModelFile) {
        let _ = file;
    }
}

/// Insertion-order-preserving map of `ModelKey → ModelFile`, guarded by
/// the controller's single mutex at the call site (see `spec.md` §5) —
/// the aggregate itself does no internal locking.
#[derive(Default)]
pub struct Model {
    order: Vec<ModelKey>,
    files: HashMap<ModelKey, ModelFile>,
    listeners: Vec<Arc<dyn ModelListener>>,
}

impl Model {
    pub fn new() -> Self {
        Model::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ModelListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn ModelListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn get(&self, key: &ModelKey) -> Option<&ModelFile> {
        self.files.get(key)
    }

    /// Keys ordered by first insertion.
    pub fn names(&self) -> impl Iterator<Item = &ModelKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn add(&mut self, file: ModelFile) -> Result<(), RapidCopyError> {
        let key = file.key.clone();
        if self.files.contains_key(&key) {
            return Err(RapidCopyError::AlreadyExists(format!(
                "model already has an entry named {} in pair {}",
                key.name, key.pair_id
            )));
        }
        self.order.push(key.clone());
        self.files.insert(key, file.clone());
        for listener in &self.listeners {
            listener.file_added(&file);
        }
        Ok(())
    }

    pub fn update(&mut self, file: ModelFile) -> Result<(), RapidCopyError> {
        let key = file.key.clone();
        let old = self
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| RapidCopyError::NotFound(format!("no model entry named {} in pair {}", key.name, key.pair_id)))?;
        self.files.insert(key, file.clone());
        for listener in &self.listeners {
            listener.file_updated(&old, &file);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &ModelKey) -> Result<ModelFile, RapidCopyError> {
        let removed = self
            .files
            .remove(key)
            .ok_or_else(|| RapidCopyError::NotFound(format!("no model entry named {} in pair {}", key.name, key.pair_id)))?;
        self.order.retain(|k| k != key);
        for listener in &self.listeners {
            listener.file_removed(&removed);
        }
        Ok(removed)
    }

    /// Deep copy of every file currently in the model, in insertion order.
    pub fn snapshot(&self) -> Vec<ModelFile> {
        self.order.iter().filter_map(|k| self.files.get(k).cloned()).collect()
    }
}

/// Compares two models and returns their differences in `new`'s
/// insertion order. `Change::Updated` is emitted only when some
/// non-timestamp field differs (`ModelFile`'s `PartialEq` already
/// excludes `update_timestamp`).
pub fn diff(old: &Model, new: &Model) -> Vec<DiffEntry> {
    let mut entries = Vec::new();

    for key in new.names() {
        match old.get(key) {
            None => entries.push(DiffEntry {
                change: Change::Added,
                key: key.clone(),
            }),
            Some(old_file) => {
                let new_file = new.get(key).expect("key came from new.names()");
                if old_file != new_file {
                    entries.push(DiffEntry {
                        change: Change::Updated,
                        key: key.clone(),
                    });
                }
            }
        }
    }

    for key in old.names() {
        if new.get(key).is_none() {
            entries.push(DiffEntry {
                change: Change::Removed,
                key: key.clone(),
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::ModelKey;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl ModelListener for RecordingListener {
        fn file_added(&self, file: &ModelFile) {
            self.events.lock().unwrap().push(format!("added:{}", file.name()));
        }
        fn file_updated(&self, old: &ModelFile, new: &ModelFile) {
            self.events
                .lock()
                .unwrap()
                .push(format!("updated:{}->{:?}", old.name(), new.state));
        }
        fn file_removed(&self, file: &ModelFile) {
            self.events.lock().unwrap().push(format!("removed:{}", file.name()));
        }
    }

    #[test]
    fn add_duplicate_fails() {
        let mut model = Model::new();
        model.add(ModelFile::new(ModelKey::unpaired("a"), false)).unwrap();
        let err = model.add(ModelFile::new(ModelKey::unpaired("a"), false));
        assert!(matches!(err, Err(RapidCopyError::AlreadyExists(_))));
    }

    #[test]
    fn update_unknown_fails() {
        let mut model = Model::new();
        let err = model.update(ModelFile::new(ModelKey::unpaired("missing"), false));
        assert!(matches!(err, Err(RapidCopyError::NotFound(_))));
    }

    #[test]
    fn listeners_receive_synchronous_notifications() {
        let listener = Arc::new(RecordingListener::default());
        let mut model = Model::new();
        model.add_listener(listener.clone());

        model.add(ModelFile::new(ModelKey::unpaired("a"), false)).unwrap();
        let mut updated = ModelFile::new(ModelKey::unpaired("a"), false);
        updated.state = crate::value_objects::ModelState::Queued;
        model.update(updated).unwrap();
        model.remove(&ModelKey::unpaired("a")).unwrap();

        let events = listener.events.lock().unwrap();
        assert_eq!(events.as_slice(), ["added:a", "updated:a->Queued", "removed:a"]);
    }

    #[test]
    fn diff_detects_added_removed_updated() {
        let mut old = Model::new();
        old.add(ModelFile::new(ModelKey::unpaired("stays_same"), false)).unwrap();
        old.add(ModelFile::new(ModelKey::unpaired("gone"), false)).unwrap();

        let mut new = Model::new();
        new.add(ModelFile::new(ModelKey::unpaired("stays_same"), false)).unwrap();
        let mut changed = ModelFile::new(ModelKey::unpaired("new_one"), false);
        changed.state = crate::value_objects::ModelState::Queued;
        new.add(changed).unwrap();

        let entries = diff(&old, &new);
        let added: Vec<_> = entries.iter().filter(|e| e.change == Change::Added).collect();
        let removed: Vec<_> = entries.iter().filter(|e| e.change == Change::Removed).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].key.name, "new_one");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].key.name, "gone");
    }

    #[test]
    fn rebuilding_unchanged_model_is_byte_equivalent() {
        let mut old = Model::new();
        old.add(ModelFile::new(ModelKey::unpaired("a"), false)).unwrap();
        let new = Model::new();
        let mut new = new;
        let mut f = ModelFile::new(ModelKey::unpaired("a"), false);
        f.update_timestamp = chrono::DateTime::from_timestamp(999, 0).unwrap();
        new.add(f).unwrap();

        assert!(diff(&old, &new).is_empty());
    }
}
