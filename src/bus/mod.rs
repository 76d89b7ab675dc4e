// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! I2C bus access for the PCF8591
//!
//! This module provides the hardware abstraction the measurement layer talks to:
//! - a native driver for Linux `/dev/i2c-*` device nodes
//! - a mock driver emulating a PCF8591 for development and tests
//!
//! Only the two SMBus transactions the PCF8591 needs are modelled: "write byte
//! data" (control byte + data byte) and "receive byte".

pub mod mock;
pub mod native;

use log::info;
use thiserror::Error;

use crate::config::{I2CBusConfig, I2CBusType};

/// Failure of a single bus transaction
#[derive(Error, Debug)]
pub enum BusError {
    #[error("I2C transfer failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no device acknowledged at address 0x{0:02X}")]
    NotPresent(u8),

    #[error("I2C bus unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, BusError>;

/// I2C bus driver trait for hardware abstraction
#[async_trait::async_trait]
pub trait I2CBusDriver {
    /// Send a command byte followed by one data byte to a device
    async fn write_byte_data(&mut self, address: u8, command: u8, value: u8) -> Result<()>;

    /// Read a single byte from a device, without a command byte
    async fn read_byte(&mut self, address: u8) -> Result<u8>;

    /// Check if device is present on the bus
    async fn device_present(&mut self, address: u8) -> Result<bool>;
}

/// Boxed driver as held by the measurement source
pub type BoxedBusDriver = Box<dyn I2CBusDriver + Send + Sync>;

/// Create the I2C bus driver selected by the configuration
pub fn create_bus_driver(config: &I2CBusConfig) -> BoxedBusDriver {
    match config.bus_type {
        I2CBusType::Native => {
            info!(
                "Using native I2C bus {} (fallback: {})",
                config.device,
                config.fallback_device.as_deref().unwrap_or("none")
            );
            Box::new(native::NativeI2CDriver::new(
                &config.device,
                config.fallback_device.as_deref(),
            ))
        }
        I2CBusType::Mock => {
            info!(
                "Using mock PCF8591 at 0x{:02X} with counts {:?}",
                config.address, config.mock_counts
            );
            Box::new(mock::MockPcf8591Driver::new(
                config.address,
                config.mock_counts,
            ))
        }
    }
}
