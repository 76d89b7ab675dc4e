// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared state between the sampler and request handlers
//!
//! The sampler is the only writer. Request handlers take a read lock and clone
//! a [`SamplerState`] snapshot, so they never observe a half-updated cycle.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::measurement::UNAVAILABLE_VOLTAGE;

/// State handle shared by the sampler task and its readers
pub type SharedSamplerState = Arc<RwLock<SamplerState>>;

/// Where the sampler currently is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerPhase {
    /// Randomized startup delay before the first cycle
    Starting,
    /// Loading settings, reading channels, writing the log
    Running,
    /// Interruptible wait for the configured interval
    Waiting,
    /// Fixed recovery delay after a failed cycle
    ErrorBackoff,
}

/// Newline-joined status messages shown by the host application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReporter {
    text: String,
}

impl StatusReporter {
    /// Append a message on its own line
    pub fn add(&mut self, message: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(message);
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Replace every message with a single one
    pub fn replace(&mut self, message: &str) {
        self.clear();
        self.add(message);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

impl Serialize for StatusReporter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Everything the sampler publishes about itself
#[derive(Debug, Clone, Serialize)]
pub struct SamplerState {
    pub phase: SamplerPhase,
    pub status: StatusReporter,
    /// Voltages of AIN0..AIN3 from the last cycle that sampled
    pub last_readings: [f64; 4],
    pub last_sample_at: Option<DateTime<Local>>,
    /// Cycles that ran to completion, sampling or not
    pub cycles_completed: u64,
    /// Cycles aborted by an error
    pub cycles_failed: u64,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            phase: SamplerPhase::Starting,
            status: StatusReporter::default(),
            last_readings: [UNAVAILABLE_VOLTAGE; 4],
            last_sample_at: None,
            cycles_completed: 0,
            cycles_failed: 0,
        }
    }
}

impl SamplerState {
    pub fn new_shared() -> SharedSamplerState {
        Arc::new(RwLock::new(Self::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_newline_joined() {
        let mut status = StatusReporter::default();
        assert!(status.is_empty());

        status.add("first");
        status.add("second");
        assert_eq!(status.text(), "first\nsecond");
        assert_eq!(status.messages().count(), 2);

        status.replace("only");
        assert_eq!(status.text(), "only");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let mut status = StatusReporter::default();
        status.add("a");
        status.add("b");
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""a\nb""#);
    }
}
