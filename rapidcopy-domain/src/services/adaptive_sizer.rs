// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Adaptive chunk sizing: a pure function from `(file size, rolling
//! network stats, validation config)` to a chunk size and inline-vs-
//! post-download validation strategy. No state, no I/O — this is the
//! same "pure domain service" shape the teacher's `ChunkSize` and
//! `WorkerCount` value objects use for their own `optimal_for_file_size`
//! heuristics, generalized here to also weigh network conditions.

use crate::entities::{NetworkStats, ValidationConfig};
use crate::value_objects::ChunkSize;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

const SMALL_FILE_THRESHOLD: u64 = 10 * MIB;
const MEDIUM_FILE_THRESHOLD: u64 = 100 * MIB;
const LARGE_FILE_THRESHOLD: u64 = GIB;

const SLOW_NETWORK_THRESHOLD: f64 = MIB as f64;
const FAST_NETWORK_THRESHOLD: f64 = 10.0 * MIB as f64;

const LOW_FAILURE_THRESHOLD: f64 = 0.01;
const HIGH_FAILURE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationStrategy {
    pub chunk_size: ChunkSize,
    pub validate_after_chunk: bool,
    pub validate_after_file: bool,
    pub estimated_chunks: u64,
}

/// Chunk size in `[min_chunk_size, max_chunk_size]`, never exceeding
/// `file_size`. Applies the factor table in `spec.md` §4.7 in order;
/// each factor is multiplicative against the running chunk size.
pub fn recommend_chunk_size(file_size: u64, stats: &NetworkStats, config: &ValidationConfig) -> ChunkSize {
    if !config.enable_adaptive_sizing {
        return ChunkSize::new(
            config.default_chunk_size,
            config.min_chunk_size,
            config.max_chunk_size,
            file_size,
        );
    }

    let mut size = config.default_chunk_size as f64;

    size *= if file_size < SMALL_FILE_THRESHOLD {
        0.25
    } else if file_size < MEDIUM_FILE_THRESHOLD {
        1.0
    } else if file_size < LARGE_FILE_THRESHOLD {
        1.5
    } else {
        2.0
    };

    let speed = stats.avg_speed_bytes_per_sec;
    if speed > 0.0 && speed < SLOW_NETWORK_THRESHOLD {
        size *= 0.5;
    } else if speed > FAST_NETWORK_THRESHOLD {
        size *= 1.5;
    }

    let failure_rate = stats.recent_failure_rate;
    if failure_rate < LOW_FAILURE_THRESHOLD {
        size *= 1.25;
    } else if failure_rate > HIGH_FAILURE_THRESHOLD {
        size *= (1.0 - failure_rate).min(0.5);
    }

    ChunkSize::new(
        size.round() as usize,
        config.min_chunk_size,
        config.max_chunk_size,
        file_size,
    )
}

/// Chunk size plus the inline-vs-post-download validation decision.
/// `validate_after_file` is always `true` — a final whole-file
/// confirmation is mandatory regardless of inline validation.
pub fn recommend_strategy(file_size: u64, stats: &NetworkStats, config: &ValidationConfig) -> ValidationStrategy {
    let chunk_size = recommend_chunk_size(file_size, stats, config);
    let estimated_chunks = chunk_size.chunks_needed_for_file(file_size);

    let high_failure_rate = stats.recent_failure_rate > HIGH_FAILURE_THRESHOLD;
    let slow_network = stats.avg_speed_bytes_per_sec < SLOW_NETWORK_THRESHOLD;
    let large_file = file_size >= LARGE_FILE_THRESHOLD;

    let validate_after_chunk =
        high_failure_rate || large_file || (slow_network && stats.recent_failure_rate > LOW_FAILURE_THRESHOLD);

    ValidationStrategy {
        chunk_size,
        validate_after_chunk,
        validate_after_file: true,
        estimated_chunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ValidationConfig {
        ValidationConfig {
            default_chunk_size: 1024 * 1024,
            min_chunk_size: 1024,
            max_chunk_size: 64 * 1024 * 1024,
            ..ValidationConfig::default()
        }
    }

    #[test]
    fn small_file_uses_quarter_chunk() {
        let stats = NetworkStats::default();
        let size = recommend_chunk_size(5 * MIB, &stats, &config());
        assert_eq!(size.bytes(), (256 * 1024) as usize);
    }

    #[test]
    fn chunk_size_never_exceeds_file_size() {
        let stats = NetworkStats::default();
        let size = recommend_chunk_size(500, &stats, &config());
        assert!(size.bytes() as u64 <= 500);
    }

    #[test]
    fn bounds_invariant_holds_across_inputs() {
        let cfg = config();
        for file_size in [0u64, 1, 1024, MIB, 50 * MIB, 200 * MIB, 2 * GIB] {
            for speed in [0.0, 500_000.0, 20.0 * MIB as f64] {
                for failure_rate in [0.0, 0.02, 0.2] {
                    let mut stats = NetworkStats::default();
                    stats.avg_speed_bytes_per_sec = speed;
                    stats.recent_failure_rate = failure_rate;
                    let size = recommend_chunk_size(file_size.max(1), &stats, &cfg);
                    assert!(size.bytes() >= cfg.min_chunk_size.min(file_size.max(1) as usize));
                    assert!(size.bytes() <= cfg.max_chunk_size);
                    assert!(size.bytes() as u64 <= file_size.max(1));
                }
            }
        }
    }

    #[test]
    fn high_failure_rate_forces_inline_validation() {
        let mut stats = NetworkStats::default();
        stats.recent_failure_rate = 0.2;
        let strategy = recommend_strategy(10 * MIB, &stats, &config());
        assert!(strategy.validate_after_chunk);
        assert!(strategy.validate_after_file);
    }

    #[test]
    fn large_file_forces_inline_validation() {
        let stats = NetworkStats::default();
        let strategy = recommend_strategy(2 * GIB, &stats, &config());
        assert!(strategy.validate_after_chunk);
    }
}
