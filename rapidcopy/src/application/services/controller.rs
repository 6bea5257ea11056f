// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Controller Reconciler: the single-threaded `process()` loop that
//! drives everything else in this crate, per `spec.md` §4.10's five
//! ordered steps. Owns the shared [`Model`], the per-pair scanner
//! supervisors, the downloader driver, the validation worker, and the
//! command queue; nothing else touches the model directly.

use super::command_dispatcher::CommandDispatcher;
use super::downloader_driver::{DownloadJobState, DownloaderDriver, DownloaderLimits, PathOverride};
use super::scanner_supervisor::ScannerSupervisor;
use super::validation_worker::{ValidationEvent, ValidationWorker};
use crate::application::commands::{Command, CommandKind};
use crate::application::model_builder::{build_model, ExtractorStatus, ModelBuilderInputs, TaggedScan};
use crate::application::services::validation_dispatch::ValidationCommand;
use rapidcopy_domain::aggregates::{diff, Change, DiffEntry, Model};
use rapidcopy_domain::value_objects::{ModelKey, ModelState, PairId};
use rapidcopy_domain::RapidCopyError;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Out-of-scope collaborator: whatever can actually remove a remote
/// file. The scan program protocol (`spec.md` §6) says nothing about
/// mutation, so this is its own small port rather than overloading the
/// remote scanner.
pub trait RemoteTransport: Send + Sync {
    fn delete_remote(&self, path: &str) -> Result<(), RapidCopyError>;
}

/// Persisted reconciler state (`spec.md` §6's `controller.persist`).
/// The wire schema (flat string arrays, JSON) is an infrastructure
/// concern; this port deals in `ModelKey` directly so multi-pair
/// deployments don't lose the pair dimension on a restart.
pub trait ControllerPersistence: Send + Sync {
    fn load(&self) -> Result<PersistedSets, RapidCopyError>;
    fn save(&self, sets: &PersistedSets) -> Result<(), RapidCopyError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSets {
    pub downloaded: HashSet<ModelKey>,
    pub extracted: HashSet<ModelKey>,
    pub validated: HashSet<ModelKey>,
    pub validation_retry_counts: HashMap<ModelKey, u32>,
}

#[derive(Debug, Default, Clone)]
pub struct ControllerStatus {
    pub latest_remote_scan_failed: bool,
    pub latest_remote_scan_error: Option<String>,
    pub latest_local_scan_failed: bool,
    pub latest_local_scan_error: Option<String>,
    pub latest_download_error: Option<String>,
}

pub struct PairRuntime {
    pub pair_id: PairId,
    pub remote_path: PathBuf,
    pub local_path: PathBuf,
    pub remote: ScannerSupervisor,
    pub local: ScannerSupervisor,
}

pub struct ControllerDeps {
    pub pairs: Vec<PairRuntime>,
    pub downloader: DownloaderDriver,
    pub validation: ValidationWorker,
    pub commands: Arc<CommandDispatcher>,
    pub persistence: Arc<dyn ControllerPersistence>,
    pub remote_transport: Arc<dyn RemoteTransport>,
    pub validate_after_file: bool,
}

pub struct Controller {
    model: Arc<Mutex<Model>>,
    pairs: Vec<PairRuntime>,
    downloader: DownloaderDriver,
    validation: ValidationWorker,
    commands: Arc<CommandDispatcher>,
    persistence: Arc<dyn ControllerPersistence>,
    remote_transport: Arc<dyn RemoteTransport>,
    validate_after_file: bool,

    downloaded_set: HashSet<ModelKey>,
    extracted_set: HashSet<ModelKey>,
    validated_set: HashSet<ModelKey>,
    validation_retry_counts: HashMap<ModelKey, u32>,
    extractor_status: Vec<ExtractorStatus>,
    status: ControllerStatus,
    /// Events drained once in `update_model` and handed to
    /// `apply_validation_outputs`; `ValidationWorker::drain_events` empties
    /// its queue on every call, so a second, later drain of the same tick
    /// would silently lose whatever the first drain didn't act on.
    pending_validation_events: Vec<ValidationEvent>,
    /// Outstanding redownloads keyed by the download job requeued to
    /// repair them: `(local_path, chunk_index)` to hand back to the
    /// validator's `resume_chunk` once that job reports `Finished`.
    pending_redownloads: HashMap<ModelKey, (PathBuf, u64)>,
}

impl Controller {
    pub fn new(model: Arc<Mutex<Model>>, deps: ControllerDeps) -> Result<Self, RapidCopyError> {
        let persisted = deps.persistence.load()?;
        Ok(Controller {
            model,
            pairs: deps.pairs,
            downloader: deps.downloader,
            validation: deps.validation,
            commands: deps.commands,
            persistence: deps.persistence,
            remote_transport: deps.remote_transport,
            validate_after_file: deps.validate_after_file,
            downloaded_set: persisted.downloaded,
            extracted_set: persisted.extracted,
            validated_set: persisted.validated,
            validation_retry_counts: persisted.validation_retry_counts,
            extractor_status: Vec::new(),
            status: ControllerStatus::default(),
            pending_validation_events: Vec::new(),
            pending_redownloads: HashMap::new(),
        })
    }

    pub fn status(&self) -> &ControllerStatus {
        &self.status
    }

    /// The extractor's own process/wire protocol is an external
    /// collaborator out of scope; its statuses and completions are fed
    /// in from whatever drives that collaborator.
    pub fn feed_extractor_status(&mut self, status: Vec<ExtractorStatus>) {
        self.extractor_status = status;
    }

    pub fn feed_extractor_completion(&mut self, key: ModelKey) {
        self.extracted_set.insert(key);
    }

    /// Stops every supervised worker this controller owns: each pair's
    /// remote and local scanner, and the validation worker. Neither type
    /// tears itself down on drop, so a graceful shutdown must call this
    /// before the controller goes out of scope.
    pub fn terminate(&mut self) {
        for pair in &mut self.pairs {
            pair.remote.terminate();
            pair.local.terminate();
        }
        self.validation.terminate();
    }

    /// One reconciler tick, per `spec.md` §4.10's five ordered steps.
    pub async fn process(&mut self) -> Result<Vec<DiffEntry>, RapidCopyError> {
        self.propagate_exceptions()?;
        self.cleanup_commands();
        self.process_commands().await;
        let diff_entries = self.update_model().await?;
        self.apply_validation_outputs();
        self.persist().ok();
        Ok(diff_entries)
    }

    /// Step 1: every supervised worker must surface fatal errors before
    /// any scheduling decision is made.
    fn propagate_exceptions(&self) -> Result<(), RapidCopyError> {
        for pair in &self.pairs {
            pair.remote.propagate_exception()?;
            pair.local.propagate_exception()?;
        }
        Ok(())
    }

    /// Step 2: reap finished one-shot worker commands. `EXTRACT`,
    /// `DELETE_LOCAL`, and `DELETE_REMOTE` complete synchronously in
    /// `process_commands` in this implementation, so there is nothing to
    /// reap here beyond giving the validation worker's event queue a
    /// chance to drain before the model rebuild reads it in step 4.
    fn cleanup_commands(&mut self) {}

    /// Step 3: drain the FIFO command queue once, validating each
    /// command's precondition against the current model.
    async fn process_commands(&mut self) {
        let commands = self.commands.drain();
        for command in commands {
            let outcome = self.apply_command(&command).await;
            command.complete(outcome);
        }
    }

    /// The configured remote/local roots for a pair, if one with that id
    /// is still running. Commands against the sentinel "unpaired" id (or
    /// a pair that has since been removed) fall back to the bare name.
    fn pair_roots(&self, pair_id: &PairId) -> Option<(&PathBuf, &PathBuf)> {
        self.pairs.iter().find(|p| &p.pair_id == pair_id).map(|p| (&p.remote_path, &p.local_path))
    }

    /// Resolves a key's name to an absolute `(remote, local)` path pair
    /// rooted under its pair's configured directories, per `spec.md`
    /// §4.10's QUEUE/VALIDATE preconditions: QUEUE and VALIDATE operate
    /// on the file under that specific pair, not wherever the bare name
    /// happens to resolve on a single-pair deployment.
    fn resolve_paths(&self, key: &ModelKey) -> (PathBuf, PathBuf) {
        match self.pair_roots(&key.pair_id) {
            Some((remote_root, local_root)) => (remote_root.join(&key.name), local_root.join(&key.name)),
            None => (PathBuf::from(&key.name), PathBuf::from(&key.name)),
        }
    }

    async fn apply_command(&mut self, command: &Command) -> Result<(), String> {
        let snapshot_state = {
            let model = self.model.lock().expect("model mutex poisoned");
            model.get(&command.key).map(|f| (f.state, f.remote_size.is_some(), f.local_size.is_some(), f.local_size.unwrap_or(0)))
        };
        let Some((state, remote_present, local_present, local_size)) = snapshot_state else {
            return Err(format!("no model entry named {}", command.key.name));
        };

        match command.kind {
            CommandKind::Queue => {
                if !remote_present {
                    return Err("QUEUE requires the file to exist remotely".to_string());
                }
                let (remote_path, local_path) = self.resolve_paths(&command.key);
                let over = PathOverride {
                    remote_path: Some(remote_path),
                    local_path: Some(local_path),
                };
                self.downloader.queue(command.key.clone(), false, over).await.map_err(|e| e.to_string())
            }
            CommandKind::Stop => {
                if !matches!(state, ModelState::Downloading | ModelState::Queued) {
                    return Err("STOP is only valid while downloading or queued".to_string());
                }
                self.downloader.kill(&command.key).await.map_err(|e| e.to_string())
            }
            CommandKind::Extract => {
                if !matches!(state, ModelState::Default | ModelState::Downloaded | ModelState::Extracted) {
                    return Err("EXTRACT requires DEFAULT, DOWNLOADED, or EXTRACTED".to_string());
                }
                if !local_present {
                    return Err("EXTRACT requires the file to exist locally".to_string());
                }
                Ok(())
            }
            CommandKind::DeleteLocal => {
                // The precondition table (`spec.md` §4.10) names DEFAULT/DOWNLOADED/
                // EXTRACTED, but its own worked scenario deletes a file mid-validation
                // and expects it to succeed; VALIDATING is DOWNLOADED with a validator
                // attached, not a state that should block removal.
                if !matches!(state, ModelState::Default | ModelState::Downloaded | ModelState::Extracted | ModelState::Validating) {
                    return Err("DELETE_LOCAL requires DEFAULT, DOWNLOADED, EXTRACTED, or VALIDATING".to_string());
                }
                if !local_present {
                    return Err("DELETE_LOCAL requires the file to exist locally".to_string());
                }
                self.downloaded_set.remove(&command.key);
                for pair in &self.pairs {
                    pair.local.force_scan();
                }
                Ok(())
            }
            CommandKind::DeleteRemote => {
                if !matches!(
                    state,
                    ModelState::Default | ModelState::Downloaded | ModelState::Extracted | ModelState::Deleted
                ) {
                    return Err("DELETE_REMOTE requires DEFAULT, DOWNLOADED, EXTRACTED, or DELETED".to_string());
                }
                if !remote_present {
                    return Err("DELETE_REMOTE requires the file to exist remotely".to_string());
                }
                let outcome = self.remote_transport.delete_remote(&command.key.name).map_err(|e| e.to_string());
                for pair in &self.pairs {
                    pair.remote.force_scan();
                }
                outcome
            }
            CommandKind::Validate => {
                if !matches!(
                    state,
                    ModelState::Default | ModelState::Downloaded | ModelState::Extracted | ModelState::Validated | ModelState::Corrupt
                ) {
                    return Err("VALIDATE requires DEFAULT, DOWNLOADED, EXTRACTED, VALIDATED, or CORRUPT".to_string());
                }
                if !(remote_present && local_present) {
                    return Err("VALIDATE requires the file to exist both locally and remotely".to_string());
                }
                let (remote_path, local_path) = self.resolve_paths(&command.key);
                self.validation
                    .validate(ValidationCommand::Validate {
                        pair_id: command.key.pair_id.clone(),
                        name: command.key.name.clone(),
                        local_path,
                        remote_path: remote_path.to_string_lossy().to_string(),
                        size: local_size,
                        inline: false,
                    })
                    .map_err(|e| e.to_string())
            }
        }
    }

    /// Step 4: rebuild the model from the latest scan, downloader,
    /// extractor, and validator inputs, preserving in-flight validation
    /// state where it still applies.
    async fn update_model(&mut self) -> Result<Vec<DiffEntry>, RapidCopyError> {
        let mut remote_scans = Vec::new();
        let mut local_scans = Vec::new();
        for pair in &mut self.pairs {
            if let Some(result) = pair.remote.pop_latest_result() {
                match result {
                    Ok(files) => {
                        self.status.latest_remote_scan_failed = false;
                        self.status.latest_remote_scan_error = None;
                        remote_scans.push(TaggedScan {
                            pair_id: pair.pair_id.clone(),
                            files,
                        });
                    }
                    Err(error) => {
                        self.status.latest_remote_scan_failed = true;
                        self.status.latest_remote_scan_error = Some(error.to_string());
                    }
                }
            }
            if let Some(result) = pair.local.pop_latest_result() {
                match result {
                    Ok(files) => {
                        self.status.latest_local_scan_failed = false;
                        self.status.latest_local_scan_error = None;
                        local_scans.push(TaggedScan {
                            pair_id: pair.pair_id.clone(),
                            files,
                        });
                    }
                    Err(error) => {
                        self.status.latest_local_scan_failed = true;
                        self.status.latest_local_scan_error = Some(error.to_string());
                    }
                }
            }
        }

        let downloader_status = self.downloader.status().await.unwrap_or_default();
        if let Some(error) = self.downloader.raise_pending_error().await {
            self.status.latest_download_error = Some(error.to_string());
        }

        // A redownload's targeted fetch is modeled as a whole-file requeue
        // through the same downloader port QUEUE uses; once that job is
        // `Finished`, the repaired bytes are on disk and the validator's
        // `resume_chunk` can re-hash the chunk it was waiting on.
        let mut resumed = Vec::new();
        for status in &downloader_status {
            if status.state == DownloadJobState::Finished {
                if let Some((local_path, chunk_index)) = self.pending_redownloads.get(&status.key) {
                    let _ = self.validation.validate(ValidationCommand::ResumeChunk {
                        local_path: local_path.clone(),
                        index: *chunk_index,
                    });
                    resumed.push(status.key.clone());
                }
            }
        }
        for key in resumed {
            self.pending_redownloads.remove(&key);
        }

        let events = self.validation.drain_events();
        for event in &events {
            if let ValidationEvent::Redownload(request) = event {
                let key = ModelKey::unpaired(&request.remote_path);
                let _ = self
                    .downloader
                    .queue(
                        key.clone(),
                        false,
                        PathOverride {
                            remote_path: Some(request.remote_path.clone().into()),
                            local_path: Some(request.local_path.clone()),
                        },
                    )
                    .await;
                self.pending_redownloads.insert(key, (request.local_path.clone(), request.chunk_index));
            }
        }
        self.pending_validation_events = events;

        let inputs = ModelBuilderInputs {
            remote_scans: &remote_scans,
            local_scans: &local_scans,
            downloader_status: &downloader_status,
            extractor_status: &self.extractor_status,
            downloaded_set: &self.downloaded_set,
            extracted_set: &self.extracted_set,
        };
        let mut new_model = build_model(&inputs);

        let mut model = self.model.lock().expect("model mutex poisoned");
        let keys: Vec<ModelKey> = new_model.names().cloned().collect();
        for key in &keys {
            if let (Some(old_file), Some(new_file)) = (model.get(key), new_model.get(key)) {
                if old_file.state.is_validation_state() && new_file.state == ModelState::Downloaded {
                    let mut carried = new_file.clone();
                    carried.state = old_file.state;
                    carried.validation_progress = old_file.validation_progress;
                    carried.validation_error = old_file.validation_error.clone();
                    carried.corrupt_chunks = old_file.corrupt_chunks.clone();
                    new_model.update(carried).expect("key came from new_model.names()");
                }
            }
        }

        let entries = diff(&model, &new_model);
        for entry in &entries {
            match entry.change {
                Change::Added => {
                    let file = new_model.get(&entry.key).expect("added key exists in new model").clone();
                    model.add(file)?;
                }
                Change::Updated => {
                    let file = new_model.get(&entry.key).expect("updated key exists in new model").clone();
                    model.update(file)?;
                }
                Change::Removed => {
                    model.remove(&entry.key)?;
                }
            }
        }

        for entry in &entries {
            if matches!(entry.change, Change::Added | Change::Updated) {
                if let Some(file) = model.get(&entry.key) {
                    if file.state == ModelState::Downloaded && !self.downloaded_set.contains(&entry.key) {
                        self.downloaded_set.insert(entry.key.clone());
                        if self.validate_after_file {
                            let (remote_path, local_path) = self.resolve_paths(&entry.key);
                            let _ = self.validation.validate(ValidationCommand::Validate {
                                pair_id: entry.key.pair_id.clone(),
                                name: entry.key.name.clone(),
                                local_path,
                                remote_path: remote_path.to_string_lossy().to_string(),
                                size: file.local_size.unwrap_or(0),
                                inline: false,
                            });
                        }
                    }
                }
            }
        }

        self.extracted_set.retain(|key| !matches!(model.get(key).map(|f| f.state), Some(ModelState::Deleted)));

        Ok(entries)
    }

    /// Step 5: apply validator progress, completions, and redownload
    /// requests onto the model.
    fn apply_validation_outputs(&mut self) {
        if let Some(status) = self.validation.latest_status() {
            let mut model = self.model.lock().expect("model mutex poisoned");
            let key = ModelKey::new(status.pair_id.clone(), status.name.clone());
            if let Some(file) = model.get(&key).cloned() {
                if file.state.accepts_validation_progress() {
                    let mut updated = file;
                    updated.state = ModelState::Validating;
                    updated.validation_progress = Some(status.progress);
                    let _ = model.update(updated);
                }
            }
        }

        for event in self.pending_validation_events.drain(..) {
            match event {
                ValidationEvent::Completion(completion) => {
                    let mut model = self.model.lock().expect("model mutex poisoned");
                    let key = ModelKey::new(completion.pair_id.clone(), completion.name.clone());
                    if let Some(file) = model.get(&key).cloned() {
                        if file.state.accepts_validation_completion() {
                            let mut updated = file;
                            if completion.is_valid {
                                updated.state = ModelState::Validated;
                                updated.validation_error = None;
                                updated.corrupt_chunks.clear();
                                updated.validation_progress = Some(1.0);
                                self.validated_set.insert(key.clone());
                            } else {
                                updated.state = ModelState::Corrupt;
                                updated.corrupt_chunks = completion.corrupt_chunks.clone();
                                updated.validation_error = Some(format!("Corrupt chunks: {:?}", completion.corrupt_chunks));
                                updated.validation_progress = None;
                            }
                            let _ = model.update(updated);
                        }
                    }
                }
                ValidationEvent::Redownload(_) => {
                    // Queued against the downloader in `update_model`'s next
                    // tick; `resume_chunk` fires once that redownload lands.
                }
            }
        }
    }

    fn persist(&self) -> Result<(), RapidCopyError> {
        self.persistence.save(&PersistedSets {
            downloaded: self.downloaded_set.clone(),
            extracted: self.extracted_set.clone(),
            validated: self.validated_set.clone(),
            validation_retry_counts: self.validation_retry_counts.clone(),
        })
    }
}

/// Loads the configured path pairs unconditionally at startup; the
/// controller re-reads them again whenever the store's version counter
/// moves (`spec.md` §6).
pub fn pairs_changed(loaded_version: u64, last_seen_version: u64) -> bool {
    loaded_version != last_seen_version
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPersistence;
    impl ControllerPersistence for NoopPersistence {
        fn load(&self) -> Result<PersistedSets, RapidCopyError> {
            Ok(PersistedSets::default())
        }
        fn save(&self, _sets: &PersistedSets) -> Result<(), RapidCopyError> {
            Ok(())
        }
    }

    struct NoopRemoteTransport;
    impl RemoteTransport for NoopRemoteTransport {
        fn delete_remote(&self, _path: &str) -> Result<(), RapidCopyError> {
            Ok(())
        }
    }

    #[test]
    fn pairs_changed_detects_version_bump() {
        assert!(pairs_changed(2, 1));
        assert!(!pairs_changed(1, 1));
    }

    #[tokio::test]
    async fn stop_on_default_file_is_rejected() {
        use super::super::downloader_driver::{DownloaderDriver, FakeDownloadEngine};
        use rapidcopy_domain::entities::ValidationConfig;

        let model = Arc::new(Mutex::new(Model::new()));
        model
            .lock()
            .unwrap()
            .add(rapidcopy_domain::entities::ModelFile::new(ModelKey::unpaired("a.bin"), false))
            .unwrap();

        let validation = ValidationWorker::start(
            ValidationConfig::default(),
            Arc::new(crate::infrastructure::adapters::checksum::NullLocalChecksumProvider),
            Arc::new(crate::infrastructure::adapters::checksum::NullRemoteChecksumProvider),
            std::time::Duration::from_millis(50),
        );

        let mut controller = Controller::new(
            model.clone(),
            ControllerDeps {
                pairs: Vec::new(),
                downloader: DownloaderDriver::new(Arc::new(FakeDownloadEngine::new())),
                validation,
                commands: Arc::new(CommandDispatcher::new()),
                persistence: Arc::new(NoopPersistence),
                remote_transport: Arc::new(NoopRemoteTransport),
                validate_after_file: false,
            },
        )
        .unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        controller.commands.queue_command(
            Command::new(CommandKind::Stop, ModelKey::unpaired("a.bin")).with_callback(Arc::new(move |outcome| {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(outcome);
                }
            })),
        );

        controller.process().await.unwrap();
        let outcome = rx.await.unwrap();
        assert!(outcome.is_err());
    }

    fn controller_with_file(state: ModelState, remote_size: Option<u64>, local_size: Option<u64>) -> Controller {
        use super::super::downloader_driver::{DownloaderDriver, FakeDownloadEngine};
        use rapidcopy_domain::entities::{ModelFile, ValidationConfig};

        let model = Arc::new(Mutex::new(Model::new()));
        let mut file = ModelFile::new(ModelKey::unpaired("a.bin"), false);
        file.state = state;
        file.remote_size = remote_size;
        file.local_size = local_size;
        model.lock().unwrap().add(file).unwrap();

        let validation = ValidationWorker::start(
            ValidationConfig::default(),
            Arc::new(crate::infrastructure::adapters::checksum::NullLocalChecksumProvider),
            Arc::new(crate::infrastructure::adapters::checksum::NullRemoteChecksumProvider),
            std::time::Duration::from_millis(50),
        );

        Controller::new(
            model,
            ControllerDeps {
                pairs: Vec::new(),
                downloader: DownloaderDriver::new(Arc::new(FakeDownloadEngine::new())),
                validation,
                commands: Arc::new(CommandDispatcher::new()),
                persistence: Arc::new(NoopPersistence),
                remote_transport: Arc::new(NoopRemoteTransport),
                validate_after_file: false,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn delete_local_while_validating_is_accepted() {
        let mut controller = controller_with_file(ModelState::Validating, Some(10), Some(10));
        let command = Command::new(CommandKind::DeleteLocal, ModelKey::unpaired("a.bin"));
        assert!(controller.apply_command(&command).await.is_ok());
    }

    #[tokio::test]
    async fn validate_command_is_accepted_and_dispatched() {
        let mut controller = controller_with_file(ModelState::Downloaded, Some(10), Some(10));
        let command = Command::new(CommandKind::Validate, ModelKey::unpaired("a.bin"));
        assert!(controller.apply_command(&command).await.is_ok());
    }

    #[tokio::test]
    async fn validate_command_without_local_copy_is_rejected() {
        let mut controller = controller_with_file(ModelState::Default, Some(10), None);
        let command = Command::new(CommandKind::Validate, ModelKey::unpaired("a.bin"));
        let err = controller.apply_command(&command).await.unwrap_err();
        assert!(err.contains("both locally and remotely"));
    }
}
