//! Register access layer
//!
//! Maps the TWI control, data, status and bit-rate registers onto a trait
//! so the protocol core never touches memory-mapped I/O directly.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Control register bits
pub mod control {
    /// Interrupt flag: set by hardware when the current bus event completes,
    /// cleared by writing a one.
    pub const TWINT: u8 = 0x80;
    /// Enable acknowledge
    pub const TWEA: u8 = 0x40;
    /// Start condition
    pub const TWSTA: u8 = 0x20;
    /// Stop condition
    pub const TWSTO: u8 = 0x10;
    /// Write collision flag
    pub const TWWC: u8 = 0x08;
    /// Peripheral enable
    pub const TWEN: u8 = 0x04;
    /// Interrupt enable
    pub const TWIE: u8 = 0x01;
}

/// Status register bits holding the status code (high 5 bits)
pub const STATUS_MASK: u8 = 0xF8;

/// Status register bits holding the prescaler (low 2 bits)
pub const PRESCALER_MASK: u8 = 0x03;

/// How long a wait on the hardware may spin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PollLimit {
    /// Spin until the hardware answers, however long that takes
    Unbounded,
    /// Give up after this many register reads; zero still reads once
    Polls(u32),
}

impl Default for PollLimit {
    fn default() -> Self {
        PollLimit::Polls(10_000)
    }
}

/// The hardware never signalled completion within the poll limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// TWI peripheral registers
///
/// Every method touches live hardware state in a real implementation.
/// Reads take `&mut self` because reading a hardware register can have
/// side effects and test fakes advance their script on each read.
pub trait TwiRegisters {
    /// Read the control register
    fn read_control(&mut self) -> u8;

    /// Write the control register
    fn write_control(&mut self, value: u8);

    /// Read the data register
    fn read_data(&mut self) -> u8;

    /// Write the data register
    fn write_data(&mut self, value: u8);

    /// Read the raw status register, prescaler bits included
    fn read_status_raw(&mut self) -> u8;

    /// Write the status register (only the prescaler bits are writable)
    fn write_status_raw(&mut self, value: u8);

    /// Write the bit-rate divisor register
    fn write_bit_rate(&mut self, divisor: u8);

    /// Status code of the last completed bus event, prescaler bits removed
    fn status(&mut self) -> u8 {
        self.read_status_raw() & STATUS_MASK
    }

    /// Program the prescaler bits, leaving the rest of the status register alone
    fn set_prescaler(&mut self, bits: u8) {
        let current = self.read_status_raw() & !PRESCALER_MASK;
        self.write_status_raw(current | (bits & PRESCALER_MASK));
    }

    /// Check whether the hardware has finished the current bus event
    fn is_ready(&mut self) -> bool {
        self.read_control() & control::TWINT != 0
    }

    /// Check whether a requested stop condition is still pending
    fn stop_pending(&mut self) -> bool {
        self.read_control() & control::TWSTO != 0
    }

    /// Block until the interrupt flag is set
    fn wait_ready(&mut self, limit: PollLimit) -> Result<(), Timeout> {
        poll_until(limit, || self.is_ready())
    }

    /// Block until the stop condition has been put on the bus
    ///
    /// The interrupt flag is not raised after a stop, the hardware clears
    /// `TWSTO` instead.
    fn wait_stopped(&mut self, limit: PollLimit) -> Result<(), Timeout> {
        poll_until(limit, || !self.stop_pending())
    }
}

/// Spin on `done` until it returns true or the limit is exhausted
pub fn poll_until(limit: PollLimit, mut done: impl FnMut() -> bool) -> Result<(), Timeout> {
    match limit {
        PollLimit::Unbounded => {
            while !done() {}
            Ok(())
        }
        PollLimit::Polls(max) => {
            for _ in 0..max.max(1) {
                if done() {
                    return Ok(());
                }
            }
            Err(Timeout)
        }
    }
}
