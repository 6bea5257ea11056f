// /////////////////////////////////////////////////////////////////////////////
// RapidCopy
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `NetworkStats` — rolling counters consulted by the Adaptive Sizer.
//! Process-wide inside the validator; updated on every chunk result.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub avg_speed_bytes_per_sec: f64,
    pub recent_failures: u64,
    pub recent_successes: u64,
    pub recent_failure_rate: f64,
}

impl NetworkStats {
    pub fn record_chunk_result(&mut self, success: bool) {
        if success {
            self.recent_successes += 1;
        } else {
            self.recent_failures += 1;
        }
        let total = self.recent_failures + self.recent_successes;
        if total > 0 {
            self.recent_failure_rate = self.recent_failures as f64 / total as f64;
        }
    }

    pub fn update_speed(&mut self, avg_speed_bytes_per_sec: f64) {
        self.avg_speed_bytes_per_sec = avg_speed_bytes_per_sec;
    }

    pub fn reset_window(&mut self) {
        self.recent_failures = 0;
        self.recent_successes = 0;
        self.recent_failure_rate = 0.0;
    }
}

impl Default for NetworkStats {
    fn default() -> Self {
        NetworkStats {
            avg_speed_bytes_per_sec: 0.0,
            recent_failures: 0,
            recent_successes: 0,
            recent_failure_rate: 0.0,
        }
    }
}
