// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities and records: data that crosses component boundaries but has
//! no behavior of its own beyond validating its own invariants.

mod chunk_info;
mod file_validation_info;
mod model_file;
mod network_stats;
mod path_pair;
mod system_file;
mod validation_config;

pub use chunk_info::{is_contiguous_cover, layout_chunks, ChunkInfo};
pub use file_validation_info::FileValidationInfo;
pub use model_file::ModelFile;
pub use network_stats::NetworkStats;
pub use path_pair::PathPair;
pub use system_file::SystemFile;
pub use validation_config::ValidationConfig;
