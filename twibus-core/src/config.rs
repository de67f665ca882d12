//! Bus configuration
//!
//! Board-level settings for the bus master. With the `serde` feature the
//! configuration can be loaded from any serde format (the firmware side
//! typically embeds a TOML file).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use twibus_hal::PollLimit;

use crate::address::MAX_ADDRESS;
use crate::bitrate::BitRate;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// System clock or bus frequency is zero
    ZeroFrequency,
    /// Bus frequency above f_system / 16
    FrequencyTooHigh,
    /// Bus frequency below what the largest prescaler can reach
    FrequencyTooLow,
    /// Scan range is empty or leaves the 7-bit space
    InvalidScanRange,
}

/// Inclusive range of addresses probed by a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanRange {
    /// First address probed
    pub first: u8,
    /// Last address probed
    pub last: u8,
}

impl ScanRange {
    /// Every 7-bit address, 0x00..=0x7F
    pub const FULL: Self = Self {
        first: 0x00,
        last: MAX_ADDRESS,
    };

    /// Addresses outside the two reserved blocks, 0x08..=0x77
    pub const NON_RESERVED: Self = Self {
        first: 0x08,
        last: 0x77,
    };

    /// Create a range, rejecting empty or out-of-space bounds
    pub fn new(first: u8, last: u8) -> Result<Self, ConfigError> {
        let range = Self { first, last };
        range.validate()?;
        Ok(range)
    }

    /// Check the bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first > self.last || self.last > MAX_ADDRESS {
            return Err(ConfigError::InvalidScanRange);
        }
        Ok(())
    }

    /// Number of addresses probed
    pub fn len(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            (self.last - self.first) as usize + 1
        }
    }

    /// Check if the range probes nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the probed addresses
    pub fn addresses(&self) -> core::ops::RangeInclusive<u8> {
        self.first..=self.last
    }
}

impl Default for ScanRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Bus master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    /// CPU / peripheral clock in Hz
    pub system_clock_hz: u32,
    /// Desired bus clock in Hz
    pub bus_frequency_hz: u32,
    /// Explicit divisor/prescaler pair, overriding `bus_frequency_hz`
    pub bit_rate: Option<BitRate>,
    /// How long to wait for the hardware after each bus event
    pub wait: PollLimit,
    /// Addresses probed by a scan
    pub scan: ScanRange,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            system_clock_hz: 16_000_000,
            bus_frequency_hz: 100_000,
            bit_rate: None,
            wait: PollLimit::default(),
            scan: ScanRange::FULL,
        }
    }
}

impl BusConfig {
    /// Fast mode (400 kHz) on the default system clock
    pub fn fast() -> Self {
        Self {
            bus_frequency_hz: 400_000,
            ..Self::default()
        }
    }

    /// Divisor/prescaler pair to program at initialization
    pub fn bit_rate(&self) -> Result<BitRate, ConfigError> {
        match self.bit_rate {
            Some(rate) => Ok(rate),
            None => BitRate::for_frequency(self.system_clock_hz, self.bus_frequency_hz),
        }
    }

    /// Check the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system_clock_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        self.bit_rate()?;
        self.scan.validate()
    }
}
