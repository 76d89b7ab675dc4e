// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mock I2C driver emulating a PCF8591
//!
//! The emulated chip follows the PCF8591 protocol closely enough for the
//! sampler: a "write byte data" selects the input channel from the low two
//! bits of the control byte and latches the data byte into the DAC register;
//! a "receive byte" returns the count of the selected channel.
//!
//! The emulated state lives behind an `Arc<Mutex<_>>` shared with
//! [`MockBusHandle`], so tests keep a handle to change counts, inject failures
//! and inspect the transactions after the driver has been moved into the
//! sampler.

use super::{BusError, I2CBusDriver, Result};
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// One transaction seen by the mock bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTransaction {
    WriteByteData { address: u8, command: u8, value: u8 },
    ReadByte { address: u8 },
}

#[derive(Debug)]
struct MockPcf8591State {
    address: u8,
    present: bool,
    counts: [u8; 4],
    selected_channel: usize,
    dac_value: u8,
    failing_channels: HashSet<usize>,
    transactions: Vec<MockTransaction>,
}

/// Mock driver for a single PCF8591 on an otherwise empty bus
pub struct MockPcf8591Driver {
    state: Arc<Mutex<MockPcf8591State>>,
}

/// Test-side handle onto the emulated chip
#[derive(Clone)]
pub struct MockBusHandle {
    state: Arc<Mutex<MockPcf8591State>>,
}

fn lock(state: &Mutex<MockPcf8591State>) -> Result<MutexGuard<'_, MockPcf8591State>> {
    state
        .lock()
        .map_err(|_| BusError::Unavailable("mock bus state poisoned".to_string()))
}

impl MockPcf8591Driver {
    /// Create a mock PCF8591 at `address` returning `counts` for AIN0..AIN3
    pub fn new(address: u8, counts: [u8; 4]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockPcf8591State {
                address,
                present: true,
                counts,
                selected_channel: 0,
                dac_value: 0,
                failing_channels: HashSet::new(),
                transactions: Vec::new(),
            })),
        }
    }

    /// Handle sharing this driver's emulated state
    pub fn handle(&self) -> MockBusHandle {
        MockBusHandle {
            state: self.state.clone(),
        }
    }
}

impl MockBusHandle {
    /// Change the count returned for a channel
    pub fn set_count(&self, channel: usize, count: u8) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(slot) = state.counts.get_mut(channel) {
                *slot = count;
            }
        }
    }

    /// Make every read of `channel` fail as if the chip did not acknowledge
    pub fn fail_channel(&self, channel: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.failing_channels.insert(channel);
        }
    }

    /// Remove or re-attach the chip from the bus
    pub fn set_present(&self, present: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.present = present;
        }
    }

    /// Last value latched into the DAC register
    pub fn dac_value(&self) -> u8 {
        self.state.lock().map(|s| s.dac_value).unwrap_or_default()
    }

    /// All transactions seen so far, oldest first
    pub fn transactions(&self) -> Vec<MockTransaction> {
        self.state
            .lock()
            .map(|s| s.transactions.clone())
            .unwrap_or_default()
    }

    /// Number of completed "receive byte" transactions
    pub fn read_count(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| matches!(t, MockTransaction::ReadByte { .. }))
            .count()
    }
}

#[async_trait::async_trait]
impl I2CBusDriver for MockPcf8591Driver {
    async fn write_byte_data(&mut self, address: u8, command: u8, value: u8) -> Result<()> {
        let mut state = lock(&self.state)?;
        state.transactions.push(MockTransaction::WriteByteData {
            address,
            command,
            value,
        });

        if !state.present || address != state.address {
            return Err(BusError::NotPresent(address));
        }

        state.selected_channel = usize::from(command & 0x03);
        state.dac_value = value;
        debug!(
            "Mock PCF8591: control 0x{:02X}, channel {} selected",
            command, state.selected_channel
        );
        Ok(())
    }

    async fn read_byte(&mut self, address: u8) -> Result<u8> {
        let mut state = lock(&self.state)?;
        state.transactions.push(MockTransaction::ReadByte { address });

        if !state.present || address != state.address {
            return Err(BusError::NotPresent(address));
        }
        let channel = state.selected_channel;
        if state.failing_channels.contains(&channel) {
            return Err(BusError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("simulated failure on AIN{}", channel),
            )));
        }
        Ok(state.counts[channel])
    }

    async fn device_present(&mut self, address: u8) -> Result<bool> {
        let state = lock(&self.state)?;
        Ok(state.present && address == state.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_device_presence() {
        let mut driver = MockPcf8591Driver::new(0x48, [0; 4]);

        assert!(driver.device_present(0x48).await.unwrap());
        assert!(!driver.device_present(0x49).await.unwrap());

        driver.handle().set_present(false);
        assert!(!driver.device_present(0x48).await.unwrap());
    }

    #[tokio::test]
    async fn test_control_byte_selects_channel() {
        let mut driver = MockPcf8591Driver::new(0x48, [10, 20, 30, 40]);

        driver.write_byte_data(0x48, 0x42, 2).await.unwrap();
        assert_eq!(driver.read_byte(0x48).await.unwrap(), 30);

        driver.write_byte_data(0x48, 0x40, 0).await.unwrap();
        assert_eq!(driver.read_byte(0x48).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_failing_channel_and_wrong_address() {
        let mut driver = MockPcf8591Driver::new(0x48, [10, 20, 30, 40]);
        let handle = driver.handle();
        handle.fail_channel(1);

        driver.write_byte_data(0x48, 0x41, 1).await.unwrap();
        assert!(driver.read_byte(0x48).await.is_err());
        assert!(driver.read_byte(0x4F).await.is_err());
        assert_eq!(handle.read_count(), 2);
    }
}
