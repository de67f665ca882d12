//! Slave addressing
//!
//! The first byte after a start carries the 7-bit slave address in its
//! upper bits and the transfer direction in bit 0.

use crate::error::Error;
use crate::status::Status;

/// Highest 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Transfer direction, sent as the R/W bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (R/W = 0)
    Write,
    /// Master receives (R/W = 1)
    Read,
}

impl Direction {
    /// Value of the R/W bit
    pub const fn bit(self) -> u8 {
        match self {
            Direction::Write => 0,
            Direction::Read => 1,
        }
    }

    /// Status reported when the slave acknowledges its address
    pub const fn address_ack(self) -> Status {
        match self {
            Direction::Write => Status::WriteAddressAck,
            Direction::Read => Status::ReadAddressAck,
        }
    }
}

/// Build the address byte (SLA+W / SLA+R)
pub fn address_byte(address: u8, direction: Direction) -> Result<u8, Error> {
    if address > MAX_ADDRESS {
        return Err(Error::InvalidAddress(address));
    }
    Ok((address << 1) | direction.bit())
}
