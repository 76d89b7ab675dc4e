// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sampler daemon timing configuration

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Timing of the sampling daemon that is not user-editable.
///
/// The sampling interval itself is part of the plugin settings record and is
/// re-read every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Lower bound of the randomized startup delay in seconds
    #[serde(default = "default_startup_delay_min")]
    pub startup_delay_min_s: u64,

    /// Upper bound of the randomized startup delay in seconds
    #[serde(default = "default_startup_delay_max")]
    pub startup_delay_max_s: u64,

    /// Fixed delay before retrying after a failed cycle, in seconds
    #[serde(default = "default_error_backoff")]
    pub error_backoff_s: u64,
}

impl SamplerConfig {
    /// Range the startup delay is drawn from
    pub fn startup_delay_range(&self) -> RangeInclusive<u64> {
        self.startup_delay_min_s..=self.startup_delay_max_s
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_s)
    }
}

fn default_startup_delay_min() -> u64 {
    3
}

fn default_startup_delay_max() -> u64 {
    10
}

fn default_error_backoff() -> u64 {
    5
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            startup_delay_min_s: default_startup_delay_min(),
            startup_delay_max_s: default_startup_delay_max(),
            error_backoff_s: default_error_backoff(),
        }
    }
}
