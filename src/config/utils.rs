// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, I2CBusType, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_pcf8591 --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check that an address is a usable 7-bit I2C device address
///
/// 0x00-0x02 and 0x78-0x7F are reserved by the I2C bus protocol.
pub fn is_valid_i2c_address(address: u8) -> bool {
    (0x03..=0x77).contains(&address)
}

/// Validates the configuration against rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Device address**: must be a non-reserved 7-bit address
/// - **Native bus**: the device path must not be empty
/// - **Startup delay**: the lower bound must not exceed the upper bound
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if !is_valid_i2c_address(config.bus.address) {
        anyhow::bail!("Invalid I2C address: 0x{:02X}", config.bus.address);
    }

    if config.bus.bus_type == I2CBusType::Native && config.bus.device.trim().is_empty() {
        anyhow::bail!("Native I2C bus selected without a device path");
    }

    if config.sampler.startup_delay_min_s > config.sampler.startup_delay_max_s {
        anyhow::bail!(
            "Startup delay lower bound ({} s) exceeds upper bound ({} s)",
            config.sampler.startup_delay_min_s,
            config.sampler.startup_delay_max_s
        );
    }

    Ok(())
}
