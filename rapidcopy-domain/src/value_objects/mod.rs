// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: immutable, validated types with no identity of their
//! own — compared by value, not by reference.

mod checksum_algorithm;
mod chunk_size;
mod chunk_status;
mod model_state;
mod pair_id;

pub use checksum_algorithm::ChecksumAlgorithm;
pub use chunk_size::ChunkSize;
pub use chunk_status::ChunkStatus;
pub use model_state::ModelState;
pub use pair_id::{ModelKey, PairId};
