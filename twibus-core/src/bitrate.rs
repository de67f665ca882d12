//! Bit-rate configuration
//!
//! The bus clock is derived from the system clock:
//!
//! ```text
//! f_bus = f_system / (16 + 2 * divisor * 4^prescaler)
//! ```
//!
//! `divisor` goes into the bit-rate register, `prescaler` into the low two
//! bits of the status register.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Clock prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Prescaler {
    /// 4^0
    #[default]
    Div1,
    /// 4^1
    Div4,
    /// 4^2
    Div16,
    /// 4^3
    Div64,
}

impl Prescaler {
    /// All prescalers, smallest first
    pub const ALL: [Prescaler; 4] = [
        Prescaler::Div1,
        Prescaler::Div4,
        Prescaler::Div16,
        Prescaler::Div64,
    ];

    /// Register bits (TWPS1:0)
    pub const fn bits(self) -> u8 {
        match self {
            Prescaler::Div1 => 0,
            Prescaler::Div4 => 1,
            Prescaler::Div16 => 2,
            Prescaler::Div64 => 3,
        }
    }

    /// Division factor, 4^bits
    pub const fn factor(self) -> u32 {
        1 << (2 * self.bits())
    }
}

/// Divisor/prescaler pair written at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BitRate {
    /// Bit-rate register value
    pub divisor: u8,
    /// Prescaler selection
    pub prescaler: Prescaler,
}

impl BitRate {
    /// Create from a raw pair
    pub const fn new(divisor: u8, prescaler: Prescaler) -> Self {
        Self { divisor, prescaler }
    }

    /// Pick the pair for a bus frequency
    ///
    /// Uses the smallest prescaler whose divisor fits in the register. The
    /// divisor is rounded down, so the resulting bus clock is never slower
    /// than requested.
    pub fn for_frequency(system_hz: u32, bus_hz: u32) -> Result<Self, ConfigError> {
        if system_hz == 0 || bus_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }

        let ratio = system_hz / bus_hz;
        if ratio < 16 {
            return Err(ConfigError::FrequencyTooHigh);
        }
        let span = ratio - 16;

        for prescaler in Prescaler::ALL {
            let divisor = span / (2 * prescaler.factor());
            if divisor <= u8::MAX as u32 {
                return Ok(Self::new(divisor as u8, prescaler));
            }
        }

        Err(ConfigError::FrequencyTooLow)
    }

    /// Clock divider between the system clock and the bus clock
    pub const fn clock_divider(&self) -> u32 {
        16 + 2 * (self.divisor as u32) * self.prescaler.factor()
    }

    /// Bus clock produced from `system_hz`
    pub const fn bus_frequency(&self, system_hz: u32) -> u32 {
        system_hz / self.clock_divider()
    }
}

impl Default for BitRate {
    /// 100 kHz from a 16 MHz system clock
    fn default() -> Self {
        Self::new(72, Prescaler::Div1)
    }
}
