// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Checksum algorithm selection.
//!
//! Both the local and remote checksum providers support the same four
//! algorithms; the only contract is that whichever one a `PathPair`
//! configures, both sides of the comparison use it. Hashing itself is a
//! pure function of bytes, so it lives here in the domain; only the *I/O*
//! around it (reading a file, running a remote command) is infrastructure.

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use twox_hash::xxh3::hash128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Xxh128,
}

impl ChecksumAlgorithm {
    /// Hashes `data` and returns the lowercase hex digest, matching the
    /// output format of the POSIX `*sum` commands the remote provider
    /// shells out to.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Md5 => {
                let digest = md5::Md5::digest(data);
                hex::encode(digest)
            }
            ChecksumAlgorithm::Sha1 => {
                let digest = Sha1::digest(data);
                hex::encode(digest)
            }
            ChecksumAlgorithm::Sha256 => {
                let digest = Sha256::digest(data);
                hex::encode(digest)
            }
            ChecksumAlgorithm::Xxh128 => {
                let hash = hash128(data);
                hex::encode(hash.to_be_bytes())
            }
        }
    }

    /// The POSIX command that computes this algorithm's digest on a
    /// remote host, or `None` if there is no standard one (xxh128 has no
    /// universally-installed `*sum` binary and is rejected for
    /// remote-backed pairs at config-validation time).
    pub fn remote_command(&self) -> Option<&'static str> {
        match self {
            ChecksumAlgorithm::Md5 => Some("md5sum"),
            ChecksumAlgorithm::Sha1 => Some("sha1sum"),
            ChecksumAlgorithm::Sha256 => Some("sha256sum"),
            ChecksumAlgorithm::Xxh128 => None,
        }
    }

    pub fn supports_remote(&self) -> bool {
        self.remote_command().is_some()
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Xxh128 => "xxh128",
        };
        write!(f, "{name}")
    }
}
