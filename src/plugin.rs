// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Host-facing service object
//!
//! The host application creates one [`PcfPlugin`] at startup and routes its
//! pages to it:
//!
//! | host route | operation                          |
//! |------------|------------------------------------|
//! | `/pcf`     | [`PcfPlugin::settings_view`]       |
//! | `/pcfj`    | [`PcfPlugin::settings_json`]       |
//! | `/pcfa`    | [`PcfPlugin::update_from_query`]   |
//! | `/pcfl`    | [`PcfPlugin::log_csv`]             |
//!
//! Routing, authentication and templating stay in the host. Request handlers
//! never touch the I2C bus: channel values come from the sampler's last cycle.

use anyhow::{Context, Result};
use log::info;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::bus::{create_bus_driver, BoxedBusDriver};
use crate::config::Config;
use crate::daemon::sampler::{Sampler, SamplerHandle};
use crate::daemon::shared_state::SamplerState;
use crate::measurement::Pcf8591;
use crate::store::{ConfigStore, LogStore, PcfSettings};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CSV: &str = "text/csv";

/// Body plus the headers the host must send with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResponse {
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

/// Settings merged with the values derived by the sampler
#[derive(Debug, Clone)]
pub struct SettingsView {
    pub settings: PcfSettings,
    /// Last measured voltages of AIN0..AIN3
    pub values: [f64; 4],
    pub status: String,
}

impl SettingsView {
    fn new(settings: PcfSettings, state: &SamplerState) -> Self {
        Self {
            settings,
            values: state.last_readings,
            status: state.status.text().to_string(),
        }
    }

    /// Flat JSON object: the persisted keys, `ad0val`..`ad3val` and `status`
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = self.settings.to_record();
        for (i, value) in self.values.iter().enumerate() {
            map.insert(format!("ad{}val", i), Value::from(*value));
        }
        map.insert("status".to_string(), Value::String(self.status.clone()));
        map
    }
}

impl Serialize for SettingsView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// The sampling plugin: stores plus the running sampler
pub struct PcfPlugin {
    settings: Arc<ConfigStore>,
    log: Arc<LogStore>,
    sampler: SamplerHandle,
}

impl PcfPlugin {
    /// Open the configured bus and start sampling
    pub fn start(config: &Config) -> Result<Self> {
        Self::start_with_driver(create_bus_driver(&config.bus), config)
    }

    /// Start sampling on an already constructed bus driver
    pub fn start_with_driver(bus: BoxedBusDriver, config: &Config) -> Result<Self> {
        let settings = Arc::new(
            ConfigStore::new(config.storage.settings_path())
                .context("Failed to create settings store")?,
        );
        let log = Arc::new(LogStore::new(config.storage.log_path()));
        info!(
            "Plugin files: settings {:?}, log {:?}",
            settings.path(),
            log.path()
        );

        let adc = Pcf8591::new(bus, config.bus.address);
        let sampler = Sampler::new(
            adc,
            settings.clone(),
            log.clone(),
            config.sampler.clone(),
        )
        .spawn();

        Ok(Self {
            settings,
            log,
            sampler,
        })
    }

    /// Current settings with last measured values and status
    pub async fn settings_view(&self) -> SettingsView {
        let settings = self.settings.load();
        let state = self.sampler.snapshot().await;
        SettingsView::new(settings, &state)
    }

    /// Settings view for programmatic polling
    pub async fn settings_json(&self) -> Result<HostResponse> {
        let view = self.settings_view().await;
        let body = serde_json::to_string(&view).context("Failed to serialize settings view")?;
        Ok(HostResponse {
            content_type: CONTENT_TYPE_JSON,
            headers: vec![("Access-Control-Allow-Origin", "*")],
            body,
        })
    }

    /// Save submitted settings and start a cycle right away
    pub async fn update(&self, form: &HashMap<String, String>) -> Result<PcfSettings> {
        let settings = self.settings.save(form)?;
        info!(
            "Settings updated: sampling {}, logging {}, interval {} s",
            if settings.enabled { "on" } else { "off" },
            if settings.log_enabled { "on" } else { "off" },
            settings.interval_s
        );
        self.sampler.trigger();
        Ok(settings)
    }

    /// [`PcfPlugin::update`] from a URL-encoded form (`use_pcf=on&time=10...`)
    pub async fn update_from_query(&self, query: &str) -> Result<PcfSettings> {
        let form: HashMap<String, String> =
            serde_urlencoded::from_str(query).context("Malformed settings form")?;
        self.update(&form).await
    }

    /// Sample log as CSV with a fixed header row
    pub fn log_csv(&self) -> HostResponse {
        HostResponse {
            content_type: CONTENT_TYPE_CSV,
            headers: Vec::new(),
            body: self.log.export_csv(),
        }
    }

    /// Re-sample now instead of waiting out the interval
    pub fn trigger(&self) {
        self.sampler.trigger();
    }

    pub async fn status(&self) -> String {
        self.sampler.status().await
    }

    pub fn sampler(&self) -> &SamplerHandle {
        &self.sampler
    }
}
