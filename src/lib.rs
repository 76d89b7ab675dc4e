//! Rust PCF8591 library
//!
//! This library provides a background sampling service for a PCF8591
//! 4-channel 8-bit ADC on an I2C bus, used to monitor voltage or temperature
//! probes (e.g. LM35D) from an irrigation controller.

pub mod bus;
pub mod config;
pub mod daemon;
pub mod measurement;
pub mod plugin;
pub mod store;

pub use plugin::PcfPlugin;
