//! Twibus Hardware Abstraction Layer
//!
//! This crate defines the register-level contract for a two-wire serial
//! bus peripheral (control, data and status registers) so the protocol
//! core can drive real silicon or a test fake through the same interface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  twibus-core (transaction state machine)│
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twibus-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ twibus-hal-   │       │  test fakes   │
//! │     avr       │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`registers::TwiRegisters`] - Register access and the ready-flag wait
//! - [`signal::BusSignals`] - Start, repeated start, stop and ACK arming
//! - [`i2c::I2cBus`] - Byte-level master operations

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod registers;
pub mod signal;

// Re-export key traits at crate root for convenience
pub use i2c::I2cBus;
pub use registers::{PollLimit, Timeout, TwiRegisters};
pub use signal::BusSignals;
