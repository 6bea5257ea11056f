// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain services: stateless or self-contained operations that don't
//! belong to one entity, plus the port traits infrastructure adapters
//! implement.

mod adaptive_sizer;
mod chunk_manager;
mod checksum_service;

pub use adaptive_sizer::{recommend_chunk_size, recommend_strategy, ValidationStrategy};
pub use chunk_manager::{ChunkManager, OverallStats};
pub use checksum_service::{
    batch_command, batches, chunk_command, file_command, parse_batch_output, parse_checksum_line, LocalChecksumProvider,
    RemoteChecksumProvider, MAX_CHUNKS_PER_BATCH,
};
