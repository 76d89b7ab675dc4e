// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! I2C bus configuration

use serde::{Deserialize, Serialize};

/// Factory address of the PCF8591 with A0..A2 tied low
pub const DEFAULT_PCF8591_ADDRESS: u8 = 0x48;

/// I2C bus configuration for the PCF8591
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I2CBusConfig {
    /// Bus type: "native" for a Linux i2c-dev node or "mock" for the simulated PCF8591
    #[serde(rename = "type", default)]
    pub bus_type: I2CBusType,

    /// Device path of the native I2C bus (e.g., "/dev/i2c-1")
    #[serde(default = "default_device")]
    pub device: String,

    /// Device path tried when `device` cannot be opened (older boards expose bus 0)
    #[serde(default = "default_fallback_device")]
    pub fallback_device: Option<String>,

    /// 7-bit I2C address of the PCF8591 (0x48-0x4F)
    #[serde(default = "default_address")]
    pub address: u8,

    /// Raw 8-bit counts served by the mock driver for AIN0..AIN3
    #[serde(default = "default_mock_counts")]
    pub mock_counts: [u8; 4],
}

/// I2C bus type enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum I2CBusType {
    /// Linux i2c-dev bus (Raspberry Pi and similar boards)
    #[default]
    Native,
    /// Simulated PCF8591 for development without hardware
    Mock,
}

impl std::str::FromStr for I2CBusType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "mock" => Ok(Self::Mock),
            other => Err(anyhow::anyhow!("Unknown bus type: {}", other)),
        }
    }
}

fn default_device() -> String {
    "/dev/i2c-1".to_string()
}

fn default_fallback_device() -> Option<String> {
    Some("/dev/i2c-0".to_string())
}

fn default_address() -> u8 {
    DEFAULT_PCF8591_ADDRESS
}

fn default_mock_counts() -> [u8; 4] {
    [0, 64, 128, 255]
}

impl Default for I2CBusConfig {
    fn default() -> Self {
        Self {
            bus_type: I2CBusType::default(),
            device: default_device(),
            fallback_device: default_fallback_device(),
            address: default_address(),
            mock_counts: default_mock_counts(),
        }
    }
}
