//! Memory-mapped TWI registers
//!
//! Addresses are data-space addresses (I/O address + 0x20 for the low
//! I/O range), which is what volatile pointer access needs.

use portable_atomic::{AtomicBool, Ordering};
use twibus_hal::TwiRegisters;

/// Data-space addresses of the TWI register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// TWBR - bit rate register
    pub twbr: usize,
    /// TWSR - status register
    pub twsr: usize,
    /// TWDR - data register
    pub twdr: usize,
    /// TWCR - control register
    pub twcr: usize,
}

impl Layout {
    /// ATmega16 register block
    pub const ATMEGA16: Self = Self {
        twbr: 0x20,
        twsr: 0x21,
        twdr: 0x23,
        twcr: 0x56,
    };

    /// ATmega8 shares the ATmega16 layout
    pub const ATMEGA8: Self = Self::ATMEGA16;

    /// ATmega328P register block
    pub const ATMEGA328P: Self = Self {
        twbr: 0xB8,
        twsr: 0xB9,
        twdr: 0xBB,
        twcr: 0xBC,
    };
}

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Exclusive handle on the TWI peripheral
pub struct Twi {
    layout: Layout,
}

impl Twi {
    /// Take the peripheral
    ///
    /// Returns `None` if it was already taken; there is exactly one TWI
    /// block per chip.
    pub fn take(layout: Layout) -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self { layout })
    }

    /// Create a handle without checking for an existing one
    ///
    /// # Safety
    ///
    /// The caller must guarantee no other `Twi` is alive, and that `layout`
    /// matches the chip the code runs on.
    pub unsafe fn steal(layout: Layout) -> Self {
        TAKEN.store(true, Ordering::Release);
        Self { layout }
    }

    /// Register layout in use
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline(always)]
    fn read(addr: usize) -> u8 {
        // SAFETY: `addr` comes from a `Layout` constant for this chip and the
        // handle is unique, so nothing else aliases the register.
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    #[inline(always)]
    fn write(addr: usize, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }
}

impl TwiRegisters for Twi {
    fn read_control(&mut self) -> u8 {
        Self::read(self.layout.twcr)
    }

    fn write_control(&mut self, value: u8) {
        Self::write(self.layout.twcr, value);
    }

    fn read_data(&mut self) -> u8 {
        Self::read(self.layout.twdr)
    }

    fn write_data(&mut self, value: u8) {
        Self::write(self.layout.twdr, value);
    }

    fn read_status_raw(&mut self) -> u8 {
        Self::read(self.layout.twsr)
    }

    fn write_status_raw(&mut self, value: u8) {
        Self::write(self.layout.twsr, value);
    }

    fn write_bit_rate(&mut self, divisor: u8) {
        Self::write(self.layout.twbr, divisor);
    }
}
