//! Bus master trait
//!
//! Whole-transfer operations for device drivers that only need "send these
//! bytes" or "fill this buffer", without sequencing start, address and stop
//! themselves.

/// Two-wire bus master
///
/// Each call is one complete transfer: the bus is claimed with a start,
/// the slave addressed, and released with a stop before returning, also
/// on failure. Addresses are 7-bit.
pub trait I2cBus {
    /// Failure reported by a transfer
    type Error;

    /// Send `data` to the slave at `address`
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Fill `buf` from the slave at `address`, NACKing the final byte
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Send `write_data`, then fill `read_buf` after a repeated start
    ///
    /// The bus is held between the two phases, which is what register-mapped
    /// devices expect when `write_data` selects the register to read.
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Address the slave without transferring data
    ///
    /// `Ok(false)` means nothing acknowledged; errors are reserved for a bus
    /// that could not be driven at all.
    fn probe(&mut self, address: u8) -> Result<bool, Self::Error>;
}
