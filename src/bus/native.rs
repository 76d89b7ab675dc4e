// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Native I2C driver for Raspberry Pi hardware
//!
//! This module provides a native I2C driver that communicates directly
//! with the kernel i2c-dev interface through /dev/i2c-* device nodes.
//! With i2c-dev, once the slave address is selected a plain `write` of two
//! bytes is an SMBus "write byte data" and a one-byte `read` is an SMBus
//! "receive byte".

use super::{BusError, I2CBusDriver, Result};
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};

/// Native I2C driver over a Linux i2c-dev node
pub struct NativeI2CDriver {
    device_path: String,
    fallback_path: Option<String>,
    bus: Option<OpenBus>,
}

struct OpenBus {
    file: File,
    path: String,
    address: Option<u8>,
}

impl NativeI2CDriver {
    /// Create a new native I2C driver
    ///
    /// The device node is opened lazily on the first transaction, so a
    /// missing bus surfaces as a failed read instead of a startup error.
    pub fn new(device_path: &str, fallback_path: Option<&str>) -> Self {
        Self {
            device_path: device_path.to_string(),
            fallback_path: fallback_path.map(str::to_string),
            bus: None,
        }
    }

    fn open_bus(&self) -> Result<OpenBus> {
        let candidates = std::iter::once(self.device_path.as_str())
            .chain(self.fallback_path.as_deref());
        let mut last_error = None;

        for path in candidates {
            match OpenOptions::new().read(true).write(true).open(path) {
                Ok(file) => {
                    debug!("Opened I2C bus {}", path);
                    return Ok(OpenBus {
                        file,
                        path: path.to_string(),
                        address: None,
                    });
                }
                Err(e) => {
                    debug!("Cannot open I2C bus {}: {}", path, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(BusError::Io)
            .unwrap_or_else(|| BusError::Unavailable("no I2C device configured".to_string())))
    }

    /// Open the bus if needed and select the slave address
    fn select(&mut self, address: u8) -> Result<&mut File> {
        if self.bus.is_none() {
            self.bus = Some(self.open_bus()?);
        }
        let bus = match self.bus.as_mut() {
            Some(bus) => bus,
            None => return Err(BusError::Unavailable(self.device_path.clone())),
        };

        if bus.address != Some(address) {
            set_slave_address(&bus.file, address)?;
            bus.address = Some(address);
        }
        Ok(&mut bus.file)
    }

    /// Forget the open handle so the next transaction reopens the node
    fn reset_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if let Some(bus) = self.bus.take() {
                warn!("I2C transaction on {} failed: {}", bus.path, e);
            }
        }
        result
    }
}

#[cfg(target_os = "linux")]
fn set_slave_address(file: &File, address: u8) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    /// ioctl request selecting the slave address (linux/i2c-dev.h)
    const I2C_SLAVE: libc::c_ulong = 0x0703;

    // SAFETY: the descriptor is owned by `file` and stays open for the call;
    // I2C_SLAVE takes the address by value and touches no user memory.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(address)) };
    if rc < 0 {
        return Err(BusError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_slave_address(_file: &File, _address: u8) -> Result<()> {
    Err(BusError::Unavailable(
        "i2c-dev is only available on Linux".to_string(),
    ))
}

#[async_trait::async_trait]
impl I2CBusDriver for NativeI2CDriver {
    async fn write_byte_data(&mut self, address: u8, command: u8, value: u8) -> Result<()> {
        let result = self
            .select(address)
            .and_then(|file| file.write_all(&[command, value]).map_err(BusError::from));
        self.reset_on_error(result)
    }

    async fn read_byte(&mut self, address: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        let result = self
            .select(address)
            .and_then(|file| file.read_exact(&mut buf).map_err(BusError::from))
            .map(|_| buf[0]);
        self.reset_on_error(result)
    }

    async fn device_present(&mut self, address: u8) -> Result<bool> {
        match self.read_byte(address).await {
            Ok(_) => Ok(true),
            Err(BusError::Io(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
