//! Bus signal primitives
//!
//! Each primitive writes one bit pattern to the control register. None of
//! them waits: the caller follows every primitive with a wait on the
//! register layer and then inspects the status code.

use crate::registers::control::{TWEA, TWEN, TWINT, TWSTA, TWSTO};
use crate::registers::TwiRegisters;

/// Control pattern requesting a start condition
pub const START: u8 = TWINT | TWSTA | TWEN;

/// Control pattern requesting a stop condition
pub const STOP: u8 = TWINT | TWSTO | TWEN;

/// Control pattern clocking the next byte without acknowledging it
pub const ALLOW: u8 = TWINT | TWEN;

/// Control pattern clocking the next byte and acknowledging it
pub const ALLOW_ACK: u8 = TWINT | TWEN | TWEA;

/// Physical bus events, available on every register implementation
pub trait BusSignals: TwiRegisters {
    /// Request bus ownership and assert a start condition
    fn start(&mut self) {
        self.write_control(START);
    }

    /// Assert a repeated start while the bus is still held
    ///
    /// The control pattern is the same as [`start`](Self::start); only the
    /// status code reported afterwards differs.
    fn repeated_start(&mut self) {
        self.write_control(START);
    }

    /// Assert a stop condition and release the bus
    fn stop(&mut self) {
        self.write_control(STOP);
    }

    /// Arm the next byte transfer with acknowledge disabled
    fn allow_without_ack(&mut self) {
        self.write_control(ALLOW);
    }

    /// Arm the next byte transfer with hardware acknowledge enabled
    fn allow_with_ack(&mut self) {
        self.write_control(ALLOW_ACK);
    }
}

// Blanket implementation
impl<T: TwiRegisters> BusSignals for T {}
