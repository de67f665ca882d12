//! Error types

use core::fmt;

use crate::state::{Phase, Step};
use crate::status::Status;

/// The hardware reported a different status than the step requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusMismatch {
    /// Step that failed
    pub step: Step,
    /// Status the step requires
    pub expected: Status,
    /// Status the hardware reported
    pub observed: Status,
}

/// Bus master errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Protocol mismatch; carries the raw status observed
    Status(StatusMismatch),
    /// The hardware did not signal completion within the poll limit
    Timeout,
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
    /// Operation not legal in the current transaction phase
    InvalidState(Phase),
}

impl Error {
    /// Raw status code for protocol mismatches
    pub fn status_code(&self) -> Option<u8> {
        match self {
            Error::Status(m) => Some(m.observed.code()),
            _ => None,
        }
    }

    /// Observed status for protocol mismatches
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Status(m) => Some(m.observed),
            _ => None,
        }
    }
}

impl From<twibus_hal::Timeout> for Error {
    fn from(_: twibus_hal::Timeout) -> Self {
        Error::Timeout
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Status(m) => write!(
                f,
                "{:?}: expected status {:#04x}, got {:#04x}",
                m.step,
                m.expected.code(),
                m.observed.code()
            ),
            Error::Timeout => write!(f, "bus did not become ready"),
            Error::InvalidAddress(a) => write!(f, "address {:#04x} is not a 7-bit address", a),
            Error::InvalidState(p) => write!(f, "operation not allowed in phase {:?}", p),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self.status() {
            Some(Status::WriteAddressNack | Status::ReadAddressNack) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Some(Status::DataSentNack) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Some(Status::ArbitrationLost) => ErrorKind::ArbitrationLoss,
            Some(Status::BusError) => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}
