//! Transaction steps
//!
//! Each step is one bus event: a signal primitive followed by a wait on
//! the hardware ready flag.

use crate::address::Direction;

/// One bus event within a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Fresh start condition
    Start,
    /// Repeated start while the bus is held
    RepeatedStart,
    /// Address byte with the R/W bit
    Address(Direction),
    /// Transmit one data byte
    SendData,
    /// Receive one data byte, acknowledging it if more are expected
    ReceiveData {
        /// Hardware returns ACK after the byte
        ack: bool,
    },
    /// Stop condition
    Stop,
}
