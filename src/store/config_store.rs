// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Plugin settings record
//!
//! The record is persisted as a flat JSON object of strings, the format the
//! host application's settings form produces:
//!
//! | key                 | meaning                          | default              |
//! |---------------------|----------------------------------|----------------------|
//! | `use_pcf`           | sampling enabled (`on`/`off`)    | `off`                |
//! | `use_log`           | sample logging enabled           | `off`                |
//! | `time`              | sampling interval, seconds       | `0`                  |
//! | `records`           | log record cap, `0` = unbounded  | `0`                  |
//! | `ad0` .. `ad3`      | channel shown (`on`/`off`)       | `off`                |
//! | `ad0text`..`ad3text`| channel label                    | `probe_1`..`probe_4` |
//!
//! Loading never fails: a missing, unreadable or non-object file yields the
//! defaults, and unknown keys are ignored. A recognized key whose value cannot
//! be used keeps its own default without affecting the other keys.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::write_replace;

/// Embedded JSON schema of the persisted settings record
const SETTINGS_SCHEMA: &str = include_str!("../../resources/pcf_adj.schema.json");

/// Form fields that are checkboxes; an absent checkbox means "off"
pub const FLAG_KEYS: [&str; 6] = ["use_pcf", "use_log", "ad0", "ad1", "ad2", "ad3"];

const FLAG_ON: &str = "on";
const FLAG_OFF: &str = "off";

/// Display settings of one analog input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSettings {
    /// Whether the host shows this channel
    pub enabled: bool,
    /// Probe label
    pub label: String,
}

/// Complete plugin settings; every field always has a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcfSettings {
    /// Sample the ADC at all (`use_pcf`)
    pub enabled: bool,
    /// Append each cycle's readings to the log (`use_log`)
    pub log_enabled: bool,
    /// Seconds between cycles (`time`)
    pub interval_s: u64,
    /// Log record cap, 0 for unbounded (`records`)
    pub max_log_records: usize,
    /// AIN0..AIN3 display settings
    pub channels: [ChannelSettings; 4],
}

impl Default for PcfSettings {
    fn default() -> Self {
        let channel = |n: usize| ChannelSettings {
            enabled: false,
            label: format!("probe_{}", n),
        };
        Self {
            enabled: false,
            log_enabled: false,
            interval_s: 0,
            max_log_records: 0,
            channels: [channel(1), channel(2), channel(3), channel(4)],
        }
    }
}

fn flag_text(on: bool) -> &'static str {
    if on {
        FLAG_ON
    } else {
        FLAG_OFF
    }
}

/// Textual form of a stored value; numbers written by other tools are accepted
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(flag_text(*b).to_string()),
        _ => None,
    }
}

impl PcfSettings {
    /// Delay between two sampling cycles.
    ///
    /// A zero interval still waits one tick so a disabled or idle sampler
    /// never spins.
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(self.interval_s.max(1))
    }

    /// Overlay one recognized key; returns false for unknown keys
    fn apply(&mut self, key: &str, text: &str) -> bool {
        match key {
            "use_pcf" => self.enabled = text != FLAG_OFF,
            "use_log" => self.log_enabled = text != FLAG_OFF,
            "time" => match text.trim().parse() {
                Ok(v) => self.interval_s = v,
                Err(_) => warn!("Ignoring invalid sampling interval {:?}", text),
            },
            "records" => match text.trim().parse() {
                Ok(v) => self.max_log_records = v,
                Err(_) => warn!("Ignoring invalid log record cap {:?}", text),
            },
            _ => {
                let Some(rest) = key.strip_prefix("ad") else {
                    return false;
                };
                let (index, is_label) = match rest.strip_suffix("text") {
                    Some(index) => (index, true),
                    None => (rest, false),
                };
                let Some(channel) = index
                    .parse::<usize>()
                    .ok()
                    .filter(|_| index.len() == 1)
                    .and_then(|i| self.channels.get_mut(i))
                else {
                    return false;
                };
                if is_label {
                    channel.label = text.to_string();
                } else {
                    channel.enabled = text != FLAG_OFF;
                }
            }
        }
        true
    }

    /// Build settings from stored key/value pairs, merged over the defaults
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut settings = Self::default();
        for (key, value) in record {
            match value_text(value) {
                Some(text) => {
                    if !settings.apply(key, &text) {
                        debug!("Ignoring unknown settings key {:?}", key);
                    }
                }
                None => debug!("Ignoring non-scalar settings value for {:?}", key),
            }
        }
        settings
    }

    /// Build settings from a submitted form.
    ///
    /// Checkbox fields absent from `form` are normalized to "off" before the
    /// form is merged over the defaults; unknown fields are dropped.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let mut normalized = form.clone();
        for key in FLAG_KEYS {
            normalized
                .entry(key.to_string())
                .or_insert_with(|| FLAG_OFF.to_string());
        }

        let mut settings = Self::default();
        for (key, text) in &normalized {
            if !settings.apply(key, text) {
                debug!("Dropping unknown form field {:?}", key);
            }
        }
        settings
    }

    /// Persisted representation: every recognized key, as text
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        let mut put = |key: String, value: String| {
            record.insert(key, Value::String(value));
        };
        put("use_pcf".into(), flag_text(self.enabled).into());
        put("use_log".into(), flag_text(self.log_enabled).into());
        put("time".into(), self.interval_s.to_string());
        put("records".into(), self.max_log_records.to_string());
        for (i, channel) in self.channels.iter().enumerate() {
            put(format!("ad{}", i), flag_text(channel.enabled).into());
            put(format!("ad{}text", i), channel.label.clone());
        }
        record
    }
}

/// Loads and saves the plugin settings record
pub struct ConfigStore {
    path: PathBuf,
    validator: jsonschema::Validator,
}

impl ConfigStore {
    /// Create a store for the settings file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let schema: Value =
            serde_json::from_str(SETTINGS_SCHEMA).context("Failed to parse settings schema")?;
        let validator = jsonschema::draft202012::options()
            .build(&schema)
            .map_err(|e| anyhow::anyhow!("Invalid settings schema: {}", e))?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            validator,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<Map<String, Value>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file {:?}", self.path))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {:?}", self.path))?;
        if let Err(error) = self.validator.validate(&value) {
            anyhow::bail!("Settings file {:?} failed validation: {}", self.path, error);
        }
        match value {
            Value::Object(record) => Ok(record),
            _ => anyhow::bail!("Settings file {:?} is not a JSON object", self.path),
        }
    }

    /// Load the settings; any read, parse or validation failure yields the defaults
    pub fn load(&self) -> PcfSettings {
        match self.read_record() {
            Ok(record) => PcfSettings::from_record(&record),
            Err(e) => {
                if self.path.exists() {
                    warn!("Using default settings: {:#}", e);
                } else {
                    debug!("No settings file at {:?}, using defaults", self.path);
                }
                PcfSettings::default()
            }
        }
    }

    /// Persist a submitted form as the complete settings record
    pub fn save(&self, update: &HashMap<String, String>) -> Result<PcfSettings> {
        let settings = PcfSettings::from_form(update);
        self.store(&settings)?;
        Ok(settings)
    }

    /// Persist typed settings, replacing the file atomically
    pub fn store(&self, settings: &PcfSettings) -> Result<()> {
        let record = Value::Object(settings.to_record());
        if let Err(error) = self.validator.validate(&record) {
            anyhow::bail!("Refusing to save invalid settings: {}", error);
        }
        let json =
            serde_json::to_string(&record).context("Failed to serialize settings record")?;
        write_replace(&self.path, json.as_bytes())?;
        debug!("Settings saved to {:?}", self.path);
        Ok(())
    }
}
