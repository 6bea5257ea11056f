// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pure domain layer for RapidCopy's control plane: entities, value
//! objects, the `Model` aggregate, and the domain services (Chunk
//! Manager, Adaptive Sizer, checksum ports) that drive chunked
//! validation. No I/O, no async runtime — every type here is usable
//! and fully testable without a filesystem, a network, or a clock.
//!
//! Infrastructure adapters in the `rapidcopy` crate implement the port
//! traits declared here ([`services::LocalChecksumProvider`],
//! [`services::RemoteChecksumProvider`]) and wrap the synchronous
//! services in async boundaries where needed, the same separation the
//! teacher draws between `adaptive_pipeline_domain` and
//! `adaptive_pipeline`'s infrastructure adapters.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use error::RapidCopyError;
