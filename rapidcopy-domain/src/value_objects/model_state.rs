// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ModelFile` lifecycle state. Derivation rules live in the Model Builder
//! (`rapidcopy::application::model_builder`); this is just the vocabulary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelState {
    Default,
    Queued,
    Downloading,
    Downloaded,
    Deleted,
    Extracting,
    Extracted,
    Validating,
    Validated,
    Corrupt,
}

impl ModelState {
    /// States from which a validation completion or progress update is
    /// still meaningful to apply — see `spec.md` §4.10 step 5.
    pub fn accepts_validation_progress(&self) -> bool {
        matches!(self, ModelState::Downloaded | ModelState::Validating)
    }

    pub fn accepts_validation_completion(&self) -> bool {
        matches!(
            self,
            ModelState::Validating | ModelState::Downloaded | ModelState::Corrupt
        )
    }

    /// Whether a validation-carried-over state (`VALIDATING`, `VALIDATED`,
    /// `CORRUPT`) may be preserved across a model rebuild when the freshly
    /// derived state for the same name is `DOWNLOADED`.
    pub fn is_validation_state(&self) -> bool {
        matches!(
            self,
            ModelState::Validating | ModelState::Validated | ModelState::Corrupt
        )
    }
}

impl Default for ModelState {
    fn default() -> Self {
        ModelState::Default
    }
}
