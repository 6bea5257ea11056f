// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process entry point: parses and validates the command line, loads
//! configuration, and either runs the Controller reconciler until a
//! shutdown signal arrives (`run`) or carries out one offline
//! administrative command against persisted state (everything else).

use rapidcopy::application::services::command_dispatcher::CommandDispatcher;
use rapidcopy::application::services::controller::{Controller, ControllerDeps, PairRuntime};
use rapidcopy::application::services::downloader_driver::{DownloaderDriver, DownloaderLimits};
use rapidcopy::application::services::scanner_supervisor::ScannerSupervisor;
use rapidcopy::application::services::validation_worker::ValidationWorker;
use rapidcopy::infrastructure::adapters::checksum::{SshExecutor, SshRemoteChecksumProvider, StreamingLocalChecksumProvider};
use rapidcopy::infrastructure::adapters::lftp_engine::LftpDownloadEngine;
use rapidcopy::infrastructure::adapters::local_scanner::LocalScanner;
use rapidcopy::infrastructure::adapters::remote_scanner::RemoteScanner;
use rapidcopy::infrastructure::adapters::remote_transport::SshRemoteTransport;
use rapidcopy::infrastructure::config::{self, AppConfig, LftpConfig};
use rapidcopy::infrastructure::repositories::controller_state_repository::FileControllerStateRepository;
use rapidcopy::infrastructure::repositories::path_pair_repository::FilePathPairRepository;
use rapidcopy::presentation::cli;
use rapidcopy_bootstrap::cli::{parse_and_validate, ValidatedCommand};
use rapidcopy_bootstrap::exit_code::{map_error_to_exit_code, result_to_exit_code};
use rapidcopy_bootstrap::logger::init_logging;
use rapidcopy_bootstrap::shutdown::ShutdownCoordinator;
use rapidcopy_bootstrap::signals::create_signal_handler;
use rapidcopy_domain::aggregates::Model;
use rapidcopy_domain::entities::PathPair;
use rapidcopy_domain::value_objects::PairId;
use rapidcopy_domain::RapidCopyError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn downloader_limits(lftp: &LftpConfig) -> DownloaderLimits {
    DownloaderLimits {
        max_parallel_jobs: lftp.max_parallel_jobs,
        max_parallel_files_per_job: lftp.max_parallel_files_per_job,
        max_connections_per_file: lftp.max_connections_per_file,
        max_connections_per_dir: lftp.max_connections_per_dir,
        max_total_connections: lftp.max_total_connections,
        temp_file_suffix: lftp.temp_file_suffix.clone(),
        rate_limit_bytes_per_sec: lftp.rate_limit_bytes_per_sec,
        verbose: lftp.verbose,
    }
}

fn ssh_executor(config: &AppConfig) -> SshExecutor {
    SshExecutor::new(config.general.remote_address.clone(), config.general.ssh_port, config.general.remote_user.clone())
}

/// Builds one [`PairRuntime`] per enabled path pair, wiring its remote
/// and local scanners to the configured poll intervals.
fn spawn_pair_runtimes(config: &AppConfig, pairs: &[PathPair]) -> Vec<PairRuntime> {
    pairs
        .iter()
        .filter(|pair| pair.enabled)
        .map(|pair| {
            let remote_scanner = RemoteScanner::new(ssh_executor(config), pair.remote_path.display().to_string())
                .with_pair(pair.id.as_str(), pair.name.clone())
                .with_excludes(config.scanner.exclude_prefixes.clone(), config.scanner.exclude_suffixes.clone())
                .with_temp_file_suffix(config.lftp.temp_file_suffix.clone());
            let local_scanner = LocalScanner::new(pair.local_path.clone())
                .with_pair(pair.id.as_str(), pair.name.clone())
                .with_excludes(config.scanner.exclude_prefixes.clone(), config.scanner.exclude_suffixes.clone())
                .with_temp_file_suffix(config.lftp.temp_file_suffix.clone());

            PairRuntime {
                pair_id: pair.id.clone(),
                remote_path: pair.remote_path.clone(),
                local_path: pair.local_path.clone(),
                remote: ScannerSupervisor::start(Arc::new(remote_scanner), config.controller.remote_scan_interval_ms),
                local: ScannerSupervisor::start(Arc::new(local_scanner), config.controller.local_scan_interval_ms),
            }
        })
        .collect()
}

/// `run`: builds every supervised worker, drives `Controller::process()`
/// on a tick until a shutdown signal arrives, then lets the grace period
/// drain before exiting.
async fn run_service(config: AppConfig, path_pairs: Arc<FilePathPairRepository>, state_dir: PathBuf) -> Result<(), RapidCopyError> {
    let snapshot = path_pairs.snapshot();
    if snapshot.pairs.is_empty() {
        tracing::warn!("no path pairs configured; the service will idle until one is added");
    }

    let pairs = spawn_pair_runtimes(&config, &snapshot.pairs);

    let downloader = DownloaderDriver::new(Arc::new(LftpDownloadEngine::new(
        config.lftp.executable.clone(),
        state_dir.join("lftp-status"),
    )));
    downloader.start(downloader_limits(&config.lftp)).await?;

    let validation = ValidationWorker::start(
        config.validation.clone(),
        Arc::new(StreamingLocalChecksumProvider::new()),
        Arc::new(SshRemoteChecksumProvider::new(ssh_executor(&config))),
        Duration::from_millis(config.controller.tick_interval_ms),
    );

    let persistence = Arc::new(FileControllerStateRepository::new(state_dir.join("controller.persist")));
    let remote_transport = Arc::new(SshRemoteTransport::new(ssh_executor(&config)));
    let commands = Arc::new(CommandDispatcher::new());

    let model = Arc::new(Mutex::new(Model::new()));
    let mut controller = Controller::new(
        model.clone(),
        ControllerDeps {
            pairs,
            downloader,
            validation,
            commands: commands.clone(),
            persistence,
            remote_transport,
            validate_after_file: config.validation.validate_after_file,
        },
    )?;

    let shutdown = ShutdownCoordinator::new(Duration::from_secs(config.controller.command_timeout_secs));
    let token = shutdown.token();
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        create_signal_handler()
            .wait_for_signal(Box::new(move || shutdown_for_signal.initiate_shutdown()))
            .await;
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(config.controller.tick_interval_ms.max(1)));
    let result = loop {
        tokio::select! {
            _ = token.cancelled() => break Ok(()),
            _ = ticker.tick() => {
                if let Err(e) = controller.process().await {
                    if e.is_fatal() {
                        break Err(e);
                    }
                    tracing::error!("controller tick failed: {e}");
                }
            }
        }
    };

    controller.terminate();
    shutdown.complete_shutdown();
    result
}

/// Every non-`Run` command: administers persisted state directly,
/// without a live Controller. `Status` rebuilds a read-only snapshot
/// from a local-only scan plus the persisted downloaded/extracted sets;
/// the per-file commands enqueue onto a dispatcher nothing is draining,
/// so they report rejection rather than hang — see `DESIGN.md`.
async fn run_offline_command(command: ValidatedCommand, path_pairs: Arc<FilePathPairRepository>) -> Result<(), RapidCopyError> {
    let model = Arc::new(Mutex::new(Model::new()));
    let dispatcher = CommandDispatcher::new();

    let output = cli::handle(command, &dispatcher, &model, &path_pairs).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

async fn run(cli_config_path: Option<PathBuf>, command: ValidatedCommand) -> Result<(), RapidCopyError> {
    let config = config::load(cli_config_path.as_deref())?;
    let state_dir = PathBuf::from(&config.general.state_dir);
    std::fs::create_dir_all(&state_dir)?;

    let path_pairs = Arc::new(FilePathPairRepository::open(state_dir.join("path_pairs.json"))?);

    match command {
        ValidatedCommand::Run => run_service(config, path_pairs, state_dir).await,
        other => run_offline_command(other, path_pairs).await,
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> std::process::ExitCode {
    let validated = match parse_and_validate() {
        Ok(validated) => validated,
        Err(e) => {
            eprintln!("{e}");
            return map_error_to_exit_code(&e).into();
        }
    };

    init_logging(validated.verbose);
    result_to_exit_code(run(validated.config, validated.command).await)
}
