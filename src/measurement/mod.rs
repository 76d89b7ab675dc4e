// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! PCF8591 measurement source
//!
//! Turns a channel selector into a calibrated voltage: a channel-select write
//! (control byte `0x40 + channel`) followed by a one-byte read at the same
//! address, scaled linearly from the 8-bit count to the 3.3 V reference.
//!
//! Reads return a [`MeasurementError`] instead of a sentinel. Substituting
//! [`UNAVAILABLE_VOLTAGE`] for a failed read is the caller's decision; the
//! sampler does so explicitly.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::{BoxedBusDriver, BusError};

/// Reference voltage of the ADC
pub const REFERENCE_VOLTAGE: f64 = 3.3;

/// Full-scale count of the 8-bit converter
pub const FULL_SCALE_COUNT: f64 = 255.0;

/// Reading reported when a channel could not be read.
///
/// Indistinguishable from a genuine 0.0 V reading on the persisted formats.
pub const UNAVAILABLE_VOLTAGE: f64 = 0.0;

/// Control byte with the analog output enable flag set
const CONTROL_ANALOG_OUTPUT_ENABLE: u8 = 0x40;

/// Analog input channel of the PCF8591
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Ain0,
    Ain1,
    Ain2,
    Ain3,
}

impl Channel {
    /// All channels in sampling order
    pub const ALL: [Channel; 4] = [Channel::Ain0, Channel::Ain1, Channel::Ain2, Channel::Ain3];

    pub fn index(self) -> usize {
        match self {
            Channel::Ain0 => 0,
            Channel::Ain1 => 1,
            Channel::Ain2 => 2,
            Channel::Ain3 => 3,
        }
    }

    /// Control byte selecting this channel in single-ended mode
    pub fn control_byte(self) -> u8 {
        CONTROL_ANALOG_OUTPUT_ENABLE + self.index() as u8
    }
}

impl TryFrom<u8> for Channel {
    type Error = MeasurementError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Channel::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(MeasurementError::InvalidChannel(value))
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AD{}", self.index())
    }
}

/// Why a measurement could not be taken
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("No detected PCF8591 on I2C at 0x{address:02X}")]
    NoDevice {
        address: u8,
        #[source]
        source: BusError,
    },

    #[error("Invalid PCF8591 channel {0} (expected 0-3)")]
    InvalidChannel(u8),
}

/// Convert a raw 8-bit count to volts, rounded to one decimal place
pub fn count_to_voltage(count: u8) -> f64 {
    let volts = f64::from(count) * REFERENCE_VOLTAGE / FULL_SCALE_COUNT;
    (volts * 10.0).round() / 10.0
}

/// Stateless accessor of one PCF8591 on an I2C bus.
///
/// The source owns the bus handle; it is not shared and performs no locking,
/// so exactly one task may drive it.
pub struct Pcf8591 {
    bus: BoxedBusDriver,
    address: u8,
}

impl Pcf8591 {
    pub fn new(bus: BoxedBusDriver, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Whether the chip acknowledges its address; a bus failure counts as absent
    pub async fn is_present(&mut self) -> bool {
        match self.bus.device_present(self.address).await {
            Ok(present) => present,
            Err(e) => {
                debug!("Presence check at 0x{:02X} failed: {}", self.address, e);
                false
            }
        }
    }

    /// Read one analog input and return its voltage
    pub async fn read(&mut self, channel: Channel) -> Result<f64, MeasurementError> {
        let count = self.read_count(channel).await?;
        let voltage = count_to_voltage(count);
        debug!("{}: count {} -> {:.1} V", channel, count, voltage);
        Ok(voltage)
    }

    /// Read the raw 8-bit count of one analog input
    pub async fn read_count(&mut self, channel: Channel) -> Result<u8, MeasurementError> {
        let index = channel.index() as u8;
        self.bus
            .write_byte_data(self.address, channel.control_byte(), index)
            .await
            .map_err(|source| self.no_device(source))?;
        self.bus
            .read_byte(self.address)
            .await
            .map_err(|source| self.no_device(source))
    }

    /// Drive the analog output with an 8-bit value (0-255)
    pub async fn write_output(&mut self, value: u8) -> Result<(), MeasurementError> {
        debug!("Writing {} to analog output", value);
        self.bus
            .write_byte_data(self.address, CONTROL_ANALOG_OUTPUT_ENABLE, value)
            .await
            .map_err(|source| self.no_device(source))
    }

    fn no_device(&self, source: BusError) -> MeasurementError {
        MeasurementError::NoDevice {
            address: self.address,
            source,
        }
    }
}
