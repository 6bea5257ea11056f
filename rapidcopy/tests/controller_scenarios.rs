// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Controller-level integration tests for the six worked scenarios: one
//! full tick-by-tick run of `Controller::process()` per scenario, driven
//! against fixture scanners and fake downloader/checksum ports rather
//! than real filesystems or an SSH host.

use rapidcopy::application::commands::{Command, CommandKind};
use rapidcopy::application::services::command_dispatcher::CommandDispatcher;
use rapidcopy::application::services::controller::{Controller, ControllerDeps, ControllerPersistence, PairRuntime, PersistedSets, RemoteTransport};
use rapidcopy::application::services::downloader_driver::{DownloaderDriver, FakeDownloadEngine};
use rapidcopy::application::services::scanner_supervisor::{Scanner, ScanOutcome, ScannerSupervisor};
use rapidcopy::application::services::validation_worker::ValidationWorker;
use rapidcopy_domain::aggregates::Model;
use rapidcopy_domain::entities::{ChunkInfo, SystemFile, ValidationConfig};
use rapidcopy_domain::services::{LocalChecksumProvider, RemoteChecksumProvider};
use rapidcopy_domain::value_objects::{ChecksumAlgorithm, ModelKey, ModelState, PairId};
use rapidcopy_domain::RapidCopyError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scanner whose result is whatever the test currently has stashed in the
/// shared fixture; content-controllable from the test body, unlike
/// `scanner_supervisor`'s own `CountingScanner`.
struct FixtureScanner(Arc<Mutex<Vec<SystemFile>>>);

impl Scanner for FixtureScanner {
    fn scan(&self) -> ScanOutcome {
        Ok(self.0.lock().unwrap().clone())
    }
}

fn fixture() -> Arc<Mutex<Vec<SystemFile>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// The sentinel single-pair id resolves to empty roots, so a joined path
/// stays the bare name the rest of these scenario tests' checksum fixtures
/// are keyed by; only the multi-pair scenario below needs real roots.
fn pair_runtime(pair_id: &str) -> (PairRuntime, Arc<Mutex<Vec<SystemFile>>>, Arc<Mutex<Vec<SystemFile>>>) {
    let remote_fixture = fixture();
    let local_fixture = fixture();
    let (remote_path, local_path) = if pair_id == "__default__" {
        (PathBuf::new(), PathBuf::new())
    } else {
        (PathBuf::from(format!("/remote/{pair_id}")), PathBuf::from(format!("/local/{pair_id}")))
    };
    let runtime = PairRuntime {
        pair_id: PairId::new(pair_id),
        remote_path,
        local_path,
        remote: ScannerSupervisor::start(Arc::new(FixtureScanner(remote_fixture.clone())), 10),
        local: ScannerSupervisor::start(Arc::new(FixtureScanner(local_fixture.clone())), 10),
    };
    (runtime, remote_fixture, local_fixture)
}

struct NoopPersistence;
impl ControllerPersistence for NoopPersistence {
    fn load(&self) -> Result<PersistedSets, RapidCopyError> {
        Ok(PersistedSets::default())
    }
    fn save(&self, _sets: &PersistedSets) -> Result<(), RapidCopyError> {
        Ok(())
    }
}

struct NoopTransport;
impl RemoteTransport for NoopTransport {
    fn delete_remote(&self, _path: &str) -> Result<(), RapidCopyError> {
        Ok(())
    }
}

/// Always reports a match, whatever is asked — enough for scenarios that
/// only need validation to complete quickly and cleanly.
struct AlwaysMatchingLocal;
impl LocalChecksumProvider for AlwaysMatchingLocal {
    fn file_checksum(&self, _path: &Path, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
        Ok("match".into())
    }
    fn chunk_checksum(&self, _path: &Path, _algorithm: ChecksumAlgorithm, _offset: u64, _size: u64) -> Result<String, RapidCopyError> {
        Ok("match".into())
    }
}
struct AlwaysMatchingRemote;
impl RemoteChecksumProvider for AlwaysMatchingRemote {
    fn file_checksum(&self, _path: &str, _algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
        Ok("match".into())
    }
    fn chunk_checksums(&self, _path: &str, _algorithm: ChecksumAlgorithm, chunks: &[ChunkInfo]) -> Result<Vec<String>, RapidCopyError> {
        Ok(chunks.iter().map(|_| "match".to_string()).collect())
    }
    fn command_available(&self, _algorithm: ChecksumAlgorithm) -> Result<bool, RapidCopyError> {
        Ok(true)
    }
}

/// Byte-buffer-backed fakes for S2/S3: local and remote content are real
/// bytes hashed through `ChecksumAlgorithm::hash_hex`, so a test can make
/// a chunk genuinely mismatch (or repair it between retries) by mutating
/// the buffer directly instead of pre-baking a digest table.
struct MemoryLocal(Mutex<HashMap<String, Vec<u8>>>);
impl LocalChecksumProvider for MemoryLocal {
    fn file_checksum(&self, path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
        let map = self.0.lock().unwrap();
        let data = map
            .get(&path.to_string_lossy().to_string())
            .ok_or_else(|| RapidCopyError::NotFound("no local fixture".into()))?;
        Ok(algorithm.hash_hex(data))
    }
    fn chunk_checksum(&self, path: &Path, algorithm: ChecksumAlgorithm, offset: u64, size: u64) -> Result<String, RapidCopyError> {
        let map = self.0.lock().unwrap();
        let data = map
            .get(&path.to_string_lossy().to_string())
            .ok_or_else(|| RapidCopyError::NotFound("no local fixture".into()))?;
        let start = offset as usize;
        let end = (start + size as usize).min(data.len());
        Ok(algorithm.hash_hex(&data[start..end]))
    }
}

struct MemoryRemote(Mutex<HashMap<String, Vec<u8>>>);
impl RemoteChecksumProvider for MemoryRemote {
    fn file_checksum(&self, path: &str, algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError> {
        let map = self.0.lock().unwrap();
        let data = map.get(path).ok_or_else(|| RapidCopyError::NotFound("no remote fixture".into()))?;
        Ok(algorithm.hash_hex(data))
    }
    fn chunk_checksums(&self, path: &str, algorithm: ChecksumAlgorithm, chunks: &[ChunkInfo]) -> Result<Vec<String>, RapidCopyError> {
        let map = self.0.lock().unwrap();
        let data = map.get(path).ok_or_else(|| RapidCopyError::NotFound("no remote fixture".into()))?;
        Ok(chunks
            .iter()
            .map(|c| {
                let start = c.offset as usize;
                let end = (start + c.size as usize).min(data.len());
                algorithm.hash_hex(&data[start..end])
            })
            .collect())
    }
    fn command_available(&self, _algorithm: ChecksumAlgorithm) -> Result<bool, RapidCopyError> {
        Ok(true)
    }
}

fn validation_config() -> ValidationConfig {
    ValidationConfig {
        default_chunk_size: 10,
        min_chunk_size: 10,
        max_chunk_size: 10,
        enable_adaptive_sizing: false,
        settle_delay_secs: 0,
        ..ValidationConfig::default()
    }
}

/// Drives `controller.process()` on a short poll loop until `done`
/// reports true or the attempt budget runs out; mirrors
/// `validation_worker`'s and `scanner_supervisor`'s own
/// poll-with-sleep test pattern.
async fn drive_until(controller: &mut Controller, mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        controller.process().await.unwrap();
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn state_of(model: &Arc<Mutex<Model>>, key: &ModelKey) -> Option<ModelState> {
    model.lock().unwrap().get(key).map(|f| f.state)
}

#[tokio::test]
async fn s1_happy_path_reaches_validated() {
    let (pair, remote_fixture, local_fixture) = pair_runtime("__default__");
    let key = ModelKey::unpaired("a.bin");
    let model = Arc::new(Mutex::new(Model::new()));

    remote_fixture.lock().unwrap().push(SystemFile::new_file("a.bin", 10));

    let engine = Arc::new(FakeDownloadEngine::new());
    let validation = ValidationWorker::start(
        validation_config(),
        Arc::new(AlwaysMatchingLocal),
        Arc::new(AlwaysMatchingRemote),
        Duration::from_millis(10),
    );
    let commands = Arc::new(CommandDispatcher::new());
    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair],
            downloader: DownloaderDriver::new(engine.clone()),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: true,
        },
    )
    .unwrap();

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);

    commands.queue_command(Command::new(CommandKind::Queue, key.clone()));
    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Queued)).await);

    engine.set_total_size(&key, 10);
    engine.advance(&key, 10, 1_000);
    local_fixture.lock().unwrap().push(SystemFile::new_file("a.bin", 10));

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Validated)).await);
    let file = model.lock().unwrap().get(&key).cloned().unwrap();
    assert_eq!(file.validation_progress, Some(1.0));
    assert!(file.validation_error.is_none());

    controller.terminate();
}

#[tokio::test]
async fn s2_corrupt_chunk_is_repaired_via_redownload() {
    let (pair, remote_fixture, local_fixture) = pair_runtime("__default__");
    let key = ModelKey::unpaired("b.bin");
    let path = "b.bin".to_string();
    let model = Arc::new(Mutex::new(Model::new()));

    remote_fixture.lock().unwrap().push(SystemFile::new_file("b.bin", 20));
    local_fixture.lock().unwrap().push(SystemFile::new_file("b.bin", 20));

    let mut remote_bytes = HashMap::new();
    remote_bytes.insert(path.clone(), vec![0xAAu8; 20]);
    let remote = Arc::new(MemoryRemote(Mutex::new(remote_bytes)));

    let mut local_bytes = HashMap::new();
    let mut corrupt = vec![0xAAu8; 20];
    corrupt[12] = 0x00; // second chunk (offset 10..20) mismatches the remote
    local_bytes.insert(path.clone(), corrupt);
    let local = Arc::new(MemoryLocal(Mutex::new(local_bytes)));

    let engine = Arc::new(FakeDownloadEngine::new());
    let mut cfg = validation_config();
    cfg.max_retries = 2;
    let validation = ValidationWorker::start(cfg, local.clone(), remote, Duration::from_millis(10));
    let commands = Arc::new(CommandDispatcher::new());

    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair],
            downloader: DownloaderDriver::new(engine.clone()),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: false,
        },
    )
    .unwrap();

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);
    commands.queue_command(Command::new(CommandKind::Validate, key.clone()));

    // Wait for the redownload's requeue to reach the fake engine, repair
    // the corrupt chunk, then let the job finish so the controller calls
    // `resume_chunk` and the validator re-hashes it clean.
    let probe = DownloaderDriver::new(engine.clone());
    let mut repaired = false;
    for _ in 0..300 {
        controller.process().await.unwrap();
        let statuses = probe.status().await.unwrap();
        if !repaired && statuses.iter().any(|s| s.key == key) {
            local.0.lock().unwrap().get_mut(&path).unwrap()[12] = 0xAA;
            engine.advance(&key, 0, 0);
            repaired = true;
        }
        if state_of(&model, &key) == Some(ModelState::Validated) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let file = model.lock().unwrap().get(&key).cloned().unwrap();
    assert_eq!(file.state, ModelState::Validated);
    assert!(file.corrupt_chunks.is_empty());

    controller.terminate();
}

#[tokio::test]
async fn s3_permanently_corrupt_file_reports_corrupt_chunks() {
    let (pair, remote_fixture, local_fixture) = pair_runtime("__default__");
    let key = ModelKey::unpaired("c.bin");
    let path = "c.bin".to_string();
    let model = Arc::new(Mutex::new(Model::new()));

    remote_fixture.lock().unwrap().push(SystemFile::new_file("c.bin", 10));
    local_fixture.lock().unwrap().push(SystemFile::new_file("c.bin", 10));

    let mut remote_bytes = HashMap::new();
    remote_bytes.insert(path.clone(), vec![0x11u8; 10]);
    let remote = Arc::new(MemoryRemote(Mutex::new(remote_bytes)));

    let mut local_bytes = HashMap::new();
    local_bytes.insert(path.clone(), vec![0x22u8; 10]); // never matches
    let local = Arc::new(MemoryLocal(Mutex::new(local_bytes)));

    let engine = Arc::new(FakeDownloadEngine::new());
    let mut cfg = validation_config();
    cfg.max_retries = 0; // no retries left: the first mismatch is terminal
    let validation = ValidationWorker::start(cfg, local, remote, Duration::from_millis(10));
    let commands = Arc::new(CommandDispatcher::new());

    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair],
            downloader: DownloaderDriver::new(engine),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: false,
        },
    )
    .unwrap();

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);
    commands.queue_command(Command::new(CommandKind::Validate, key.clone()));

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Corrupt)).await);
    let file = model.lock().unwrap().get(&key).cloned().unwrap();
    assert_eq!(file.corrupt_chunks, vec![0]);
    assert_eq!(file.validation_error.as_deref(), Some("Corrupt chunks: [0]"));

    controller.terminate();
}

#[tokio::test]
async fn s4_delete_mid_validation_is_accepted() {
    let (pair, remote_fixture, local_fixture) = pair_runtime("__default__");
    let key = ModelKey::unpaired("d.bin");
    let model = Arc::new(Mutex::new(Model::new()));

    // Five chunks rather than one: gives the validator several worker
    // ticks to sit in VALIDATING before it completes, wide enough for the
    // controller-side poll below to reliably observe that window.
    remote_fixture.lock().unwrap().push(SystemFile::new_file("d.bin", 50));

    let engine = Arc::new(FakeDownloadEngine::new());
    let validation = ValidationWorker::start(
        validation_config(),
        Arc::new(AlwaysMatchingLocal),
        Arc::new(AlwaysMatchingRemote),
        Duration::from_millis(10),
    );
    let commands = Arc::new(CommandDispatcher::new());

    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair],
            downloader: DownloaderDriver::new(engine.clone()),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: true,
        },
    )
    .unwrap();

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);

    commands.queue_command(Command::new(CommandKind::Queue, key.clone()));
    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Queued)).await);

    engine.set_total_size(&key, 50);
    engine.advance(&key, 50, 1_000);
    local_fixture.lock().unwrap().push(SystemFile::new_file("d.bin", 50));

    // Downloaded triggers validate_after_file automatically; wait for the
    // carried-over VALIDATING state the first chunk's progress produces.
    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Validating)).await);

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    commands.queue_command(Command::new(CommandKind::DeleteLocal, key.clone()).with_callback(Arc::new(move |outcome| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(outcome);
        }
    })));
    controller.process().await.unwrap();
    let outcome = rx.await.unwrap();
    assert!(outcome.is_ok(), "DELETE_LOCAL should succeed against a VALIDATING file: {outcome:?}");

    // DELETE_LOCAL drops the name from the downloaded set; the next scan
    // (forced by the command itself) finds it gone locally and, with the
    // remote copy still present, the model returns it to DEFAULT rather
    // than DELETED (DELETED means "was tracked downloaded, vanished on
    // its own" — this removal was requested, not discovered).
    local_fixture.lock().unwrap().clear();
    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);

    controller.terminate();
}

#[tokio::test]
async fn s5_same_name_in_two_pairs_stays_distinct() {
    let (pair_a, remote_a, _local_a) = pair_runtime("p1");
    let (pair_b, remote_b, _local_b) = pair_runtime("p2");
    let model = Arc::new(Mutex::new(Model::new()));

    remote_a.lock().unwrap().push(SystemFile::new_file("show.mkv", 1_000));
    remote_b.lock().unwrap().push(SystemFile::new_file("show.mkv", 2_000));

    let engine = Arc::new(FakeDownloadEngine::new());
    let validation = ValidationWorker::start(
        validation_config(),
        Arc::new(AlwaysMatchingLocal),
        Arc::new(AlwaysMatchingRemote),
        Duration::from_millis(10),
    );
    let commands = Arc::new(CommandDispatcher::new());
    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair_a, pair_b],
            downloader: DownloaderDriver::new(engine.clone()),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: false,
        },
    )
    .unwrap();

    let key_a = ModelKey::new(PairId::new("p1"), "show.mkv");
    let key_b = ModelKey::new(PairId::new("p2"), "show.mkv");
    assert!(
        drive_until(&mut controller, || {
            state_of(&model, &key_a) == Some(ModelState::Default) && state_of(&model, &key_b) == Some(ModelState::Default)
        })
        .await
    );

    let locked = model.lock().unwrap();
    assert_eq!(locked.get(&key_a).unwrap().remote_size, Some(1_000));
    assert_eq!(locked.get(&key_b).unwrap().remote_size, Some(2_000));
    drop(locked);

    // QUEUE on each pair's entry must resolve to that pair's own
    // remote/local roots, not a shared default — the file appears only
    // under its own pair, even though both entries share a bare name.
    commands.queue_command(Command::new(CommandKind::Queue, key_a.clone()));
    commands.queue_command(Command::new(CommandKind::Queue, key_b.clone()));
    assert!(
        drive_until(&mut controller, || {
            state_of(&model, &key_a) == Some(ModelState::Queued) && state_of(&model, &key_b) == Some(ModelState::Queued)
        })
        .await
    );

    let over_a = engine.last_override(&key_a).expect("QUEUE should have recorded an override for p1");
    let over_b = engine.last_override(&key_b).expect("QUEUE should have recorded an override for p2");
    assert_eq!(over_a.remote_path, Some(PathBuf::from("/remote/p1/show.mkv")));
    assert_eq!(over_a.local_path, Some(PathBuf::from("/local/p1/show.mkv")));
    assert_eq!(over_b.remote_path, Some(PathBuf::from("/remote/p2/show.mkv")));
    assert_eq!(over_b.local_path, Some(PathBuf::from("/local/p2/show.mkv")));
    assert_ne!(over_a.remote_path, over_b.remote_path);

    controller.terminate();
}

#[tokio::test]
async fn s6_stop_rejected_outside_downloading_or_queued() {
    let (pair, remote_fixture, _local_fixture) = pair_runtime("__default__");
    let key = ModelKey::unpaired("e.bin");
    let model = Arc::new(Mutex::new(Model::new()));
    remote_fixture.lock().unwrap().push(SystemFile::new_file("e.bin", 10));

    let engine = Arc::new(FakeDownloadEngine::new());
    let validation = ValidationWorker::start(
        validation_config(),
        Arc::new(AlwaysMatchingLocal),
        Arc::new(AlwaysMatchingRemote),
        Duration::from_millis(10),
    );
    let commands = Arc::new(CommandDispatcher::new());
    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs: vec![pair],
            downloader: DownloaderDriver::new(engine),
            validation,
            commands: commands.clone(),
            persistence: Arc::new(NoopPersistence),
            remote_transport: Arc::new(NoopTransport),
            validate_after_file: false,
        },
    )
    .unwrap();

    assert!(drive_until(&mut controller, || state_of(&model, &key) == Some(ModelState::Default)).await);

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    commands.queue_command(Command::new(CommandKind::Stop, key).with_callback(Arc::new(move |outcome| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(outcome);
        }
    })));
    controller.process().await.unwrap();
    let outcome = rx.await.unwrap();
    assert!(outcome.is_err());

    controller.terminate();
}
