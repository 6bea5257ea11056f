// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Checksum provider ports, plus the pure pieces of the remote protocol
//! (command construction, output parsing) that don't need a live SSH
//! session to exercise. The teacher isolates a CPU-bound domain trait
//! behind an async infrastructure adapter (`AsyncChecksumAdapter`
//! wrapping `ChecksumService` with `spawn_blocking`); the remote
//! provider here follows the same split but for network I/O instead of
//! CPU work — `rapidcopy::infrastructure::adapters::checksum` supplies
//! the session, this module supplies the protocol.

use crate::entities::ChunkInfo;
use crate::error::RapidCopyError;
use crate::value_objects::ChecksumAlgorithm;
use std::path::Path;

/// Stay under the remote shell's argument-list limit (`ARG_MAX`) by
/// keeping each batched `dd | hash` session to at most this many chunks.
pub const MAX_CHUNKS_PER_BATCH: usize = 100;

/// Reads and hashes local files. Implemented by
/// `rapidcopy::infrastructure::adapters::checksum::StreamingLocalChecksumProvider`,
/// which streams in fixed-size buffers (8 KiB default) and, for a chunk,
/// seeks to `offset` before reading exactly `size` bytes.
pub trait LocalChecksumProvider: Send + Sync {
    fn file_checksum(&self, path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError>;
    fn chunk_checksum(&self, path: &Path, algorithm: ChecksumAlgorithm, offset: u64, size: u64) -> Result<String, RapidCopyError>;
}

/// Runs checksum commands on the remote host over a single session.
/// Implemented by
/// `rapidcopy::infrastructure::adapters::checksum::SshRemoteChecksumProvider`.
pub trait RemoteChecksumProvider: Send + Sync {
    fn file_checksum(&self, path: &str, algorithm: ChecksumAlgorithm) -> Result<String, RapidCopyError>;
    /// `chunks.len()` must be `≤ MAX_CHUNKS_PER_BATCH`; callers batch
    /// larger chunk sets themselves (see [`batches`]).
    fn chunk_checksums(&self, path: &str, algorithm: ChecksumAlgorithm, chunks: &[ChunkInfo]) -> Result<Vec<String>, RapidCopyError>;
    fn command_available(&self, algorithm: ChecksumAlgorithm) -> Result<bool, RapidCopyError>;
}

/// Splits `chunks` into groups of at most [`MAX_CHUNKS_PER_BATCH`].
pub fn batches(chunks: &[ChunkInfo]) -> impl Iterator<Item = &[ChunkInfo]> {
    chunks.chunks(MAX_CHUNKS_PER_BATCH)
}

fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

/// The command for one chunk: 4 KiB `dd` blocks when both `offset` and
/// `size` are page-aligned, byte-precise `bs=1` otherwise.
pub fn chunk_command(path: &str, algorithm: ChecksumAlgorithm, offset: u64, size: u64) -> String {
    let cmd = algorithm.remote_command().expect("caller must not request a remote command for an algorithm without one");
    let quoted = shell_quote(path);
    if offset % 4096 == 0 && size % 4096 == 0 {
        let block = 4096u64;
        format!(
            "dd if={quoted} bs={block} skip={} count={} 2>/dev/null | {cmd}",
            offset / block,
            size / block
        )
    } else {
        format!("dd if={quoted} bs=1 skip={offset} count={size} 2>/dev/null | {cmd}")
    }
}

/// The whole-file command: `<hash-cmd> '<path>'`.
pub fn file_command(path: &str, algorithm: ChecksumAlgorithm) -> String {
    let cmd = algorithm.remote_command().expect("caller must not request a remote command for an algorithm without one");
    format!("{cmd} {}", shell_quote(path))
}

/// Joins one batch's chunk commands with `"; "` so they run
/// sequentially in a single remote session.
pub fn batch_command(path: &str, algorithm: ChecksumAlgorithm, chunks: &[ChunkInfo]) -> String {
    chunks
        .iter()
        .map(|c| chunk_command(path, algorithm, c.offset, c.size))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extracts the digest from one line of `*sum`-style output
/// (`"<hex>  <name>"` or `"<hex> -"`).
pub fn parse_checksum_line(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Parses a batch response, one line per chunk in order. A mismatch
/// between lines received and chunks requested is a fatal parse error
/// (`spec.md` §4.8) — it means the remote session or the shell script
/// itself broke, not that any individual chunk is corrupt.
pub fn parse_batch_output(output: &str, expected_count: usize) -> Result<Vec<String>, RapidCopyError> {
    let digests: Vec<String> = output
        .lines()
        .filter_map(parse_checksum_line)
        .map(|s| s.to_string())
        .collect();
    if digests.len() != expected_count {
        return Err(RapidCopyError::ValidatorFatal(format!(
            "expected {expected_count} checksums, got {}",
            digests.len()
        )));
    }
    Ok(digests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ChunkInfo;

    #[test]
    fn page_aligned_chunk_uses_4k_blocks() {
        let cmd = chunk_command("/data/f.bin", ChecksumAlgorithm::Sha256, 4096, 8192);
        assert_eq!(cmd, "dd if='/data/f.bin' bs=4096 skip=1 count=2 2>/dev/null | sha256sum");
    }

    #[test]
    fn unaligned_chunk_falls_back_to_byte_precise() {
        let cmd = chunk_command("/data/f.bin", ChecksumAlgorithm::Md5, 10, 7);
        assert_eq!(cmd, "dd if='/data/f.bin' bs=1 skip=10 count=7 2>/dev/null | md5sum");
    }

    #[test]
    fn path_with_quote_is_escaped() {
        let cmd = file_command("/data/it's.bin", ChecksumAlgorithm::Sha1);
        assert_eq!(cmd, "sha1sum '/data/it'\\''s.bin'");
    }

    #[test]
    fn batches_respects_max_chunks_per_batch() {
        let chunks: Vec<ChunkInfo> = (0..250).map(|i| ChunkInfo::new(i, i * 10, 10)).collect();
        let batch_sizes: Vec<usize> = batches(&chunks).map(|b| b.len()).collect();
        assert_eq!(batch_sizes, vec![100, 100, 50]);
    }

    #[test]
    fn batch_output_mismatch_is_fatal() {
        let result = parse_batch_output("abc  -\ndef  -\n", 3);
        assert!(matches!(result, Err(RapidCopyError::ValidatorFatal(_))));
    }

    #[test]
    fn batch_output_parses_one_digest_per_line() {
        let result = parse_batch_output("abc123  -\ndef456  -\n", 2).unwrap();
        assert_eq!(result, vec!["abc123", "def456"]);
    }
}
