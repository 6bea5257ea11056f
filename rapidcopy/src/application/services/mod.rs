// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

pub mod command_dispatcher;
pub mod controller;
pub mod downloader_driver;
pub mod scanner_supervisor;
pub mod validation_dispatch;
pub mod validation_worker;
