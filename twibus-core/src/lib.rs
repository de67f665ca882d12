//! Board-agnostic master logic for a two-wire serial bus
//!
//! This crate contains everything above the register layer:
//!
//! - Status codes reported by the peripheral after each bus event
//! - Bit-rate math and bus configuration
//! - Transaction state machine (start, address, data, stop)
//! - Device discovery across the 7-bit address space
//! - Single-byte and block transfers, `embedded-hal` integration
//!
//! Hardware is reached only through [`twibus_hal::TwiRegisters`], so the
//! whole crate runs on the host against a fake register file.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod address;
pub mod bitrate;
pub mod config;
pub mod error;
pub mod master;
pub mod scan;
pub mod state;
pub mod status;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use address::Direction;
pub use bitrate::{BitRate, Prescaler};
pub use config::{BusConfig, ConfigError, ScanRange};
pub use error::{Error, StatusMismatch};
pub use master::{Master, Transaction};
pub use scan::DeviceSet;
pub use state::{Phase, Step};
pub use status::Status;
