// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Service configuration for the PCF8591 sampler
//!
//! This module loads, validates and saves the configuration of the sampling
//! service itself: which I2C bus to open, where the plugin files live and how
//! the sampler recovers from failures. The configuration is backed by a YAML
//! file and validated against an embedded JSON schema.
//!
//! This is not the plugin settings record edited from the host application
//! (enable flags, channel labels, log cap); that one is owned by
//! [`crate::store::ConfigStore`].
//!
//! ## Configuration Structure
//!
//! - `bus`: I2C bus driver selection and device address
//! - `storage`: data directory and file names of the persisted plugin files
//! - `sampler`: startup delay and error backoff of the sampling daemon
//!
//! ## Usage
//!
//! ```no_run
//! use rust_pcf8591::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     None,                              // Bus type
//!     Some("/dev/i2c-0".to_string()),    // Bus device
//!     Some(0x49),                        // Device address
//!     None,                              // Data directory
//! );
//!
//! println!("Sampling PCF8591 at 0x{:02X}", config.bus.address);
//! ```

pub mod bus;
pub mod sampler;
pub mod storage;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use bus::{I2CBusConfig, I2CBusType};
pub use sampler::SamplerConfig;
pub use storage::StorageConfig;
pub use utils::output_config_schema;

/// Embedded JSON schema of the service configuration file
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure of the sampling service.
///
/// Every section falls back to its defaults when absent from the file, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// I2C bus the PCF8591 is attached to.
    #[serde(default)]
    pub bus: I2CBusConfig,

    /// Location of the persisted plugin settings and sample log.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timing of the sampling daemon outside the user-configured interval.
    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file that
    /// fails schema validation, deserialization or the specific rules is an
    /// error; a `*.sample.yaml` file with defaults is written next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // An empty document deserializes to null, which means "all defaults"
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the values that are explicitly provided override the loaded
    /// configuration.
    ///
    /// # Parameters
    ///
    /// * `bus_type` - Driver used to reach the I2C bus
    /// * `bus_device` - Device node of the I2C bus (e.g. `/dev/i2c-1`)
    /// * `address` - 7-bit address of the PCF8591
    /// * `data_dir` - Directory holding the settings and log files
    pub fn apply_args(
        &mut self,
        bus_type: Option<I2CBusType>,
        bus_device: Option<String>,
        address: Option<u8>,
        data_dir: Option<PathBuf>,
    ) {
        if let Some(bus_type) = bus_type {
            debug!("Overriding bus type from command line: {:?}", bus_type);
            self.bus.bus_type = bus_type;
        }
        if let Some(device) = bus_device {
            debug!("Overriding bus device from command line: {}", device);
            self.bus.device = device;
        }
        if let Some(address) = address {
            debug!("Overriding device address from command line: 0x{:02X}", address);
            self.bus.address = address;
        }
        if let Some(dir) = data_dir {
            debug!("Overriding data directory from command line: {:?}", dir);
            self.storage.data_dir = dir;
        }
    }
}
