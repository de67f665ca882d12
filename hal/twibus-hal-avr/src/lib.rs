//! AVR-specific HAL for the twibus stack
//!
//! This crate maps the `twibus-hal` register contract onto the TWI
//! peripheral of 8-bit AVR microcontrollers. It supports:
//!
//! - ATmega8 / ATmega16 (TWI registers in the low I/O space)
//! - ATmega328P (TWI registers in the extended I/O space)
//!
//! # Usage
//!
//! Take the peripheral once at startup and hand it to the protocol core:
//!
//! ```ignore
//! let twi = twibus_hal_avr::Twi::take(twibus_hal_avr::Layout::ATMEGA16).unwrap();
//! let master = twibus_core::Master::new(twi, &twibus_core::BusConfig::default())?;
//! ```

#![no_std]

pub mod twi;

pub use twi::{Layout, Twi};
