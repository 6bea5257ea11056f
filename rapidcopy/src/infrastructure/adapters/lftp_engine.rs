// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `DownloadEngine` production adapter: shells out to a configurable
//! executable (default `lftp`-style), queues batch commands over the
//! child's stdin, and polls a mirrored status directory for progress.
//! The engine's own wire protocol is out of scope by design (the
//! Downloader Driver only depends on the `DownloadEngine` trait), so
//! this module owns one concrete line protocol rather than trying to
//! speak a real tool's actual syntax.

use crate::application::services::downloader_driver::{DownloadEngine, DownloadJobState, DownloadStatus, DownloaderLimits, PathOverride};
use async_trait::async_trait;
use rapidcopy_domain::value_objects::{ModelKey, PairId};
use rapidcopy_domain::RapidCopyError;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

fn spawn_err(err: std::io::Error) -> RapidCopyError {
    RapidCopyError::DownloadEngine(format!("failed to start download engine: {err}"))
}

fn io_err(context: &str, err: std::io::Error) -> RapidCopyError {
    RapidCopyError::DownloadEngine(format!("{context}: {err}"))
}

fn encode_key(key: &ModelKey) -> String {
    format!("{}\u{1f}{}", key.pair_id.as_str(), key.name)
}

fn decode_key(encoded: &str) -> ModelKey {
    match encoded.split_once('\u{1f}') {
        Some((pair_id, name)) => ModelKey::new(PairId::new(pair_id), name),
        None => ModelKey::unpaired(encoded),
    }
}

/// One line of `<status_dir>/<encoded key>.status`:
/// `state\ttotal_size\tlocal_size\tdownloaded_size\tspeed_bps\teta_seconds`.
fn parse_status_line(key: ModelKey, is_dir: bool, line: &str) -> Option<DownloadStatus> {
    let mut fields = line.trim().split('\t');
    let state = match fields.next()? {
        "QUEUED" => DownloadJobState::Queued,
        "RUNNING" => DownloadJobState::Running,
        "STOPPED" => DownloadJobState::Stopped,
        "FINISHED" => DownloadJobState::Finished,
        _ => return None,
    };
    let total_size = fields.next()?.parse().ok()?;
    let local_size = fields.next()?.parse().ok()?;
    let downloaded_size = fields.next()?.parse().ok()?;
    let speed_bps = fields.next()?.parse().ok()?;
    let eta_seconds = fields.next().and_then(|s| if s.is_empty() { None } else { s.parse().ok() });
    Some(DownloadStatus {
        key,
        is_dir,
        state,
        total_size,
        local_size,
        downloaded_size,
        speed_bps,
        eta_seconds,
    })
}

struct Session {
    child: Child,
}

pub struct LftpDownloadEngine {
    executable: String,
    status_dir: PathBuf,
    session: Mutex<Option<Session>>,
}

impl LftpDownloadEngine {
    pub fn new(executable: impl Into<String>, status_dir: impl Into<PathBuf>) -> Self {
        LftpDownloadEngine {
            executable: executable.into(),
            status_dir: status_dir.into(),
            session: Mutex::new(None),
        }
    }

    async fn send_line(&self, line: &str) -> Result<(), RapidCopyError> {
        let mut guard = self.session.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| RapidCopyError::DownloadEngine("download engine has not been started".to_string()))?;
        let stdin = session
            .child
            .stdin
            .as_mut()
            .ok_or_else(|| RapidCopyError::DownloadEngine("download engine stdin is closed".to_string()))?;
        stdin.write_all(line.as_bytes()).await.map_err(|e| io_err("writing to engine stdin", e))?;
        stdin.write_all(b"\n").await.map_err(|e| io_err("writing to engine stdin", e))
    }
}

#[async_trait]
impl DownloadEngine for LftpDownloadEngine {
    async fn start(&self, limits: DownloaderLimits) -> Result<(), RapidCopyError> {
        tokio::fs::create_dir_all(&self.status_dir).await.map_err(|e| io_err("creating status directory", e))?;

        let child = Command::new(&self.executable)
            .arg("--status-dir")
            .arg(&self.status_dir)
            .arg("--max-parallel-jobs")
            .arg(limits.max_parallel_jobs.to_string())
            .arg("--max-parallel-files-per-job")
            .arg(limits.max_parallel_files_per_job.to_string())
            .arg("--max-connections-per-file")
            .arg(limits.max_connections_per_file.to_string())
            .arg("--max-connections-per-dir")
            .arg(limits.max_connections_per_dir.to_string())
            .arg("--max-total-connections")
            .arg(limits.max_total_connections.to_string())
            .arg("--temp-file-suffix")
            .arg(&limits.temp_file_suffix)
            .args(limits.rate_limit_bytes_per_sec.map(|rate| vec!["--rate-limit".to_string(), rate.to_string()]).unwrap_or_default())
            .args(if limits.verbose { vec!["--verbose"] } else { vec![] })
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        *self.session.lock().await = Some(Session { child });
        Ok(())
    }

    async fn queue(&self, key: ModelKey, is_dir: bool, over: PathOverride) -> Result<(), RapidCopyError> {
        let remote = over.remote_path.map(|p| p.display().to_string()).unwrap_or_default();
        let local = over.local_path.map(|p| p.display().to_string()).unwrap_or_default();
        self.send_line(&format!("QUEUE\t{}\t{}\t{}\t{}", encode_key(&key), is_dir, remote, local)).await
    }

    async fn kill(&self, key: &ModelKey) -> Result<(), RapidCopyError> {
        self.send_line(&format!("KILL\t{}", encode_key(key))).await
    }

    async fn status(&self) -> Result<Vec<DownloadStatus>, RapidCopyError> {
        let mut entries = match tokio::fs::read_dir(&self.status_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err("reading status directory", e)),
        };

        let mut statuses = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_err("reading status directory entry", e))? {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let Some(extension) = path.extension().and_then(|s| s.to_str()) else { continue };
            if extension != "status" {
                continue;
            }
            let contents = tokio::fs::read_to_string(&path).await.map_err(|e| io_err("reading status file", e))?;
            let (key_part, is_dir) = match stem.strip_suffix(".dir") {
                Some(key_part) => (key_part, true),
                None => (stem, false),
            };
            if let Some(status) = parse_status_line(decode_key(key_part), is_dir, &contents) {
                statuses.push(status);
            }
        }
        Ok(statuses)
    }

    async fn raise_pending_error(&self) -> Option<RapidCopyError> {
        let error_path = self.status_dir.join("engine.error");
        match tokio::fs::read_to_string(&error_path).await {
            Ok(message) if !message.trim().is_empty() => {
                let _ = tokio::fs::remove_file(&error_path).await;
                Some(RapidCopyError::DownloadEngine(message.trim().to_string()))
            }
            _ => None,
        }
    }
}
