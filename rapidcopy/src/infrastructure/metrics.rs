// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics: network stats, chunk validation outcomes, and
//! controller tick latency. Grounded on the teacher's own
//! `MetricsService` (a `Registry` plus one field per metric, constructed
//! once and cloned into the handle returned from `new`), trimmed down to
//! the handful of series this service actually has to report.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use rapidcopy_domain::RapidCopyError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ControllerMetrics {
    registry: Arc<Registry>,

    files_queued_total: IntCounter,
    files_completed_total: IntCounter,
    bytes_downloaded_total: IntCounter,
    active_downloads: IntGauge,

    chunks_validated_total: IntCounter,
    chunks_corrupt_total: IntCounter,
    chunks_redownloaded_total: IntCounter,

    scan_errors_total: IntCounter,
    tick_duration_seconds: Histogram,
}

impl ControllerMetrics {
    pub fn new() -> Result<Self, RapidCopyError> {
        let registry = Registry::new();

        let files_queued_total = IntCounter::with_opts(Opts::new("rapidcopy_files_queued_total", "Files queued for download"))
            .map_err(prometheus_err)?;
        let files_completed_total = IntCounter::with_opts(Opts::new("rapidcopy_files_completed_total", "Files that finished downloading"))
            .map_err(prometheus_err)?;
        let bytes_downloaded_total = IntCounter::with_opts(Opts::new("rapidcopy_bytes_downloaded_total", "Total bytes downloaded"))
            .map_err(prometheus_err)?;
        let active_downloads = IntGauge::with_opts(Opts::new("rapidcopy_active_downloads", "Files currently downloading")).map_err(prometheus_err)?;

        let chunks_validated_total = IntCounter::with_opts(Opts::new("rapidcopy_chunks_validated_total", "Chunks checksummed during validation"))
            .map_err(prometheus_err)?;
        let chunks_corrupt_total = IntCounter::with_opts(Opts::new("rapidcopy_chunks_corrupt_total", "Chunks whose checksum mismatched"))
            .map_err(prometheus_err)?;
        let chunks_redownloaded_total = IntCounter::with_opts(Opts::new(
            "rapidcopy_chunks_redownloaded_total",
            "Redownload requests emitted for corrupt chunks",
        ))
        .map_err(prometheus_err)?;

        let scan_errors_total = IntCounter::with_opts(Opts::new("rapidcopy_scan_errors_total", "Local or remote scan failures")).map_err(prometheus_err)?;
        let tick_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "rapidcopy_tick_duration_seconds",
            "Wall-clock time spent in one controller process() call",
        ))
        .map_err(prometheus_err)?;

        registry.register(Box::new(files_queued_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(files_completed_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(bytes_downloaded_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(active_downloads.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(chunks_validated_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(chunks_corrupt_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(chunks_redownloaded_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(scan_errors_total.clone())).map_err(prometheus_err)?;
        registry.register(Box::new(tick_duration_seconds.clone())).map_err(prometheus_err)?;

        Ok(ControllerMetrics {
            registry: Arc::new(registry),
            files_queued_total,
            files_completed_total,
            bytes_downloaded_total,
            active_downloads,
            chunks_validated_total,
            chunks_corrupt_total,
            chunks_redownloaded_total,
            scan_errors_total,
            tick_duration_seconds,
        })
    }

    pub fn file_queued(&self) {
        self.files_queued_total.inc();
        self.active_downloads.inc();
    }

    pub fn file_completed(&self, bytes: u64) {
        self.files_completed_total.inc();
        self.bytes_downloaded_total.inc_by(bytes);
        self.active_downloads.dec();
    }

    pub fn chunk_validated(&self) {
        self.chunks_validated_total.inc();
    }

    pub fn chunk_corrupt(&self) {
        self.chunks_corrupt_total.inc();
    }

    pub fn chunk_redownloaded(&self) {
        self.chunks_redownloaded_total.inc();
    }

    pub fn scan_error(&self) {
        self.scan_errors_total.inc();
    }

    pub fn observe_tick(&self, elapsed: Duration) {
        self.tick_duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Renders the registry in Prometheus text exposition format, for a
    /// `/metrics` scrape endpoint to serve verbatim.
    pub fn render(&self) -> Result<String, RapidCopyError> {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families).map_err(prometheus_err)
    }

    /// The underlying registry, for advanced uses (e.g. a hyper-served
    /// `/metrics` route) this module doesn't itself need to cover.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }
}

fn prometheus_err(err: prometheus::Error) -> RapidCopyError {
    RapidCopyError::ValidatorFatal(format!("metrics registration failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_counters_show_up_in_the_rendered_output() {
        let metrics = ControllerMetrics::new().unwrap();
        metrics.file_queued();
        metrics.file_completed(1024);
        metrics.chunk_corrupt();
        metrics.scan_error();
        metrics.observe_tick(Duration::from_millis(5));

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("rapidcopy_files_queued_total 1"));
        assert!(rendered.contains("rapidcopy_bytes_downloaded_total 1024"));
        assert!(rendered.contains("rapidcopy_chunks_corrupt_total 1"));
        assert!(rendered.contains("rapidcopy_scan_errors_total 1"));
    }

    #[test]
    fn active_downloads_gauge_tracks_in_flight_count() {
        let metrics = ControllerMetrics::new().unwrap();
        metrics.file_queued();
        metrics.file_queued();
        metrics.file_completed(0);
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("rapidcopy_active_downloads 1"));
    }
}
