// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! PCF8591 sampling daemon
//!
//! A single long-lived task that, once per interval:
//! 1. loads the plugin settings,
//! 2. reads AIN0..AIN3 when sampling is enabled (a failed channel reads 0.0 V
//!    and adds a status message),
//! 3. appends the readings to the sample log when logging is enabled,
//! 4. waits for the configured interval or until [`SamplerHandle::trigger`].
//!
//! Any error escaping a cycle replaces the status with a single
//! "encountered error" message and delays the next attempt by a fixed backoff.
//! The loop never exits on its own.

use anyhow::Result;
use chrono::Local;
use log::{debug, error, info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::SamplerConfig;
use crate::daemon::shared_state::{SamplerPhase, SamplerState, SharedSamplerState};
use crate::measurement::{Channel, Pcf8591, UNAVAILABLE_VOLTAGE};
use crate::store::{ConfigStore, LogStore, SampleRecord};

/// Background sampler, consumed by [`Sampler::spawn`]
pub struct Sampler {
    adc: Pcf8591,
    settings: Arc<ConfigStore>,
    log: Arc<LogStore>,
    timing: SamplerConfig,
    state: SharedSamplerState,
    wake: Arc<Notify>,
}

/// Handle to a running sampler
///
/// Dropping the handle does not stop the task; the sampler lives until the
/// runtime shuts down.
pub struct SamplerHandle {
    state: SharedSamplerState,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Sampler {
    pub fn new(
        adc: Pcf8591,
        settings: Arc<ConfigStore>,
        log: Arc<LogStore>,
        timing: SamplerConfig,
    ) -> Self {
        Self {
            adc,
            settings,
            log,
            timing,
            state: SamplerState::new_shared(),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Start the sampling loop on the current tokio runtime
    pub fn spawn(self) -> SamplerHandle {
        let state = self.state.clone();
        let wake = self.wake.clone();
        let task = tokio::spawn(self.run());
        SamplerHandle { state, wake, task }
    }

    async fn run(mut self) {
        let startup_delay = self.startup_delay();
        debug!("Sampler starting in {} s", startup_delay.as_secs());
        time::sleep(startup_delay).await;
        if self.adc.is_present().await {
            info!(
                "PCF8591 sampler is active (device 0x{:02X})",
                self.adc.address()
            );
        } else {
            warn!(
                "PCF8591 sampler is active but no device answers at 0x{:02X}",
                self.adc.address()
            );
        }

        let mut prior_cycle_clean = true;
        loop {
            self.set_phase(SamplerPhase::Running).await;
            match self.cycle(prior_cycle_clean).await {
                Ok(interval) => {
                    prior_cycle_clean = true;
                    self.wait(interval).await;
                }
                Err(e) => {
                    prior_cycle_clean = false;
                    self.fail_cycle(&e).await;
                    time::sleep(self.timing.error_backoff()).await;
                }
            }
        }
    }

    fn startup_delay(&self) -> Duration {
        let secs = rand::rng().random_range(self.timing.startup_delay_range());
        Duration::from_secs(secs)
    }

    /// One sampling cycle; returns how long to wait before the next one
    async fn cycle(&mut self, clear_status: bool) -> Result<Duration> {
        if clear_status {
            self.state.write().await.status.clear();
        }

        let settings = self.settings.load();
        let interval = settings.sampling_interval();
        if !settings.enabled {
            debug!("Sampling disabled, skipping cycle");
            self.state.write().await.cycles_completed += 1;
            return Ok(interval);
        }

        let mut readings = [UNAVAILABLE_VOLTAGE; 4];
        for channel in Channel::ALL {
            readings[channel.index()] = match self.adc.read(channel).await {
                Ok(voltage) => voltage,
                Err(e) => {
                    self.report(&format!("{}: {}", channel, e)).await;
                    UNAVAILABLE_VOLTAGE
                }
            };
        }
        let sampled_at = Local::now();
        debug!("Sampled {:?} at {}", readings, sampled_at.format("%H:%M:%S"));

        {
            let mut state = self.state.write().await;
            state.last_readings = readings;
            state.last_sample_at = Some(sampled_at);
        }

        if settings.log_enabled {
            let record = SampleRecord::new(sampled_at.naive_local(), readings);
            self.log.append(&record, settings.max_log_records)?;
        }

        self.state.write().await.cycles_completed += 1;
        Ok(interval)
    }

    /// Add a status message for the host and the service log
    async fn report(&self, message: &str) {
        warn!("{}", message);
        self.state.write().await.status.add(message);
    }

    async fn fail_cycle(&self, e: &anyhow::Error) {
        let message = format!("PCF plugin encountered error: {:#}", e);
        error!("{}", message);
        let mut state = self.state.write().await;
        state.status.replace(&message);
        state.cycles_failed += 1;
        state.phase = SamplerPhase::ErrorBackoff;
    }

    /// Sleep for `interval` unless woken up by a trigger
    async fn wait(&self, interval: Duration) {
        self.set_phase(SamplerPhase::Waiting).await;
        tokio::select! {
            _ = time::sleep(interval) => {}
            _ = self.wake.notified() => {
                debug!("Sampler wait interrupted by update request");
            }
        }
    }

    async fn set_phase(&self, phase: SamplerPhase) {
        self.state.write().await.phase = phase;
    }
}

impl SamplerHandle {
    /// End the current wait so the next cycle starts now.
    ///
    /// A trigger received while a cycle is running ends the following wait
    /// immediately. It never interrupts a bus read or a log write.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    /// Consistent copy of the sampler state
    pub async fn snapshot(&self) -> SamplerState {
        self.state.read().await.clone()
    }

    /// Current status text
    pub async fn status(&self) -> String {
        self.state.read().await.status.text().to_string()
    }

    /// Shared state, for readers living outside the handle's owner
    pub fn shared_state(&self) -> SharedSamplerState {
        self.state.clone()
    }

    /// Whether the sampler task has ended (only on runtime shutdown or panic)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
