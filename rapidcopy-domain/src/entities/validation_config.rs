// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ValidationConfig` — the operator-supplied policy the Adaptive Sizer
//! and Chunk Manager consult. Loaded and range-checked by
//! `rapidcopy::infrastructure::config`; this type only carries the
//! values and the one cross-field invariant that belongs to the domain.

use crate::error::RapidCopyError;
use crate::value_objects::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub algorithm: ChecksumAlgorithm,
    pub default_chunk_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub validate_after_chunk: bool,
    pub validate_after_file: bool,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub enable_adaptive_sizing: bool,
    pub parallel_validation: bool,
    pub settle_delay_secs: u64,
}

impl ValidationConfig {
    /// `0 < min ≤ default ≤ max` and `max_retries ≥ 0` (`u32` makes the
    /// latter structural). XXH128 additionally requires every validated
    /// pair to be local-only, since it has no remote command — that check
    /// happens where pairs and algorithm are both known
    /// (`rapidcopy::infrastructure::config`), not here.
    pub fn validate(&self) -> Result<(), RapidCopyError> {
        if self.min_chunk_size == 0 {
            return Err(RapidCopyError::ConfigIncomplete(
                "validation.min_chunk_size must be greater than zero".into(),
            ));
        }
        if self.min_chunk_size > self.default_chunk_size {
            return Err(RapidCopyError::ConfigIncomplete(
                "validation.min_chunk_size must not exceed default_chunk_size".into(),
            ));
        }
        if self.default_chunk_size > self.max_chunk_size {
            return Err(RapidCopyError::ConfigIncomplete(
                "validation.default_chunk_size must not exceed max_chunk_size".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            enabled: true,
            algorithm: ChecksumAlgorithm::Sha256,
            default_chunk_size: 1024 * 1024,
            min_chunk_size: 64 * 1024,
            max_chunk_size: 64 * 1024 * 1024,
            validate_after_chunk: false,
            validate_after_file: true,
            max_retries: 3,
            retry_delay_ms: 2_000,
            enable_adaptive_sizing: true,
            parallel_validation: false,
            settle_delay_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_min_greater_than_default() {
        let mut cfg = ValidationConfig::default();
        cfg.min_chunk_size = cfg.default_chunk_size + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ValidationConfig::default().validate().is_ok());
    }
}
