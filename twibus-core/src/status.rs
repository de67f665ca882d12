//! Status codes
//!
//! After every bus event the peripheral reports what happened through the
//! top five bits of the status register. This value is the only source of
//! truth for whether a step succeeded.

use twibus_hal::registers::STATUS_MASK;

/// Master-mode status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// 0x00: illegal start or stop condition
    BusError,
    /// 0x08: start condition transmitted
    StartSent,
    /// 0x10: repeated start condition transmitted
    RepeatedStartSent,
    /// 0x18: address + write transmitted, ACK received
    WriteAddressAck,
    /// 0x20: address + write transmitted, NACK received
    WriteAddressNack,
    /// 0x28: data byte transmitted, ACK received
    DataSentAck,
    /// 0x30: data byte transmitted, NACK received
    DataSentNack,
    /// 0x38: arbitration lost
    ArbitrationLost,
    /// 0x40: address + read transmitted, ACK received
    ReadAddressAck,
    /// 0x48: address + read transmitted, NACK received
    ReadAddressNack,
    /// 0x50: data byte received, ACK returned
    DataReceivedAck,
    /// 0x58: data byte received, NACK returned
    DataReceivedNack,
    /// 0xF8: no relevant state information
    NoInfo,
    /// Any other code (slave-mode codes included)
    Unknown(u8),
}

impl Status {
    /// Decode a status register value; the prescaler bits are ignored
    pub const fn from_code(raw: u8) -> Self {
        match raw & STATUS_MASK {
            0x00 => Status::BusError,
            0x08 => Status::StartSent,
            0x10 => Status::RepeatedStartSent,
            0x18 => Status::WriteAddressAck,
            0x20 => Status::WriteAddressNack,
            0x28 => Status::DataSentAck,
            0x30 => Status::DataSentNack,
            0x38 => Status::ArbitrationLost,
            0x40 => Status::ReadAddressAck,
            0x48 => Status::ReadAddressNack,
            0x50 => Status::DataReceivedAck,
            0x58 => Status::DataReceivedNack,
            0xF8 => Status::NoInfo,
            other => Status::Unknown(other),
        }
    }

    /// Raw 8-bit code as it appears in the status register
    pub const fn code(self) -> u8 {
        match self {
            Status::BusError => 0x00,
            Status::StartSent => 0x08,
            Status::RepeatedStartSent => 0x10,
            Status::WriteAddressAck => 0x18,
            Status::WriteAddressNack => 0x20,
            Status::DataSentAck => 0x28,
            Status::DataSentNack => 0x30,
            Status::ArbitrationLost => 0x38,
            Status::ReadAddressAck => 0x40,
            Status::ReadAddressNack => 0x48,
            Status::DataReceivedAck => 0x50,
            Status::DataReceivedNack => 0x58,
            Status::NoInfo => 0xF8,
            Status::Unknown(code) => code,
        }
    }

    /// The addressed slave did not answer
    pub const fn is_address_nack(self) -> bool {
        matches!(self, Status::WriteAddressNack | Status::ReadAddressNack)
    }
}

impl From<u8> for Status {
    fn from(raw: u8) -> Self {
        Status::from_code(raw)
    }
}
