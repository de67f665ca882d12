//! Device discovery
//!
//! Probes addresses with the start + address phase of a write transaction
//! and records which ones acknowledge. No data is transferred and the bus
//! is released after every probe, whatever the outcome.

use heapless::Vec;
use twibus_hal::TwiRegisters;

use crate::address::Direction;
use crate::config::ScanRange;
use crate::error::Error;
use crate::master::Master;
use crate::state::Step;

/// Number of 7-bit addresses
pub const ADDRESS_SPACE: usize = 128;

/// Addresses that answered a scan, in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSet {
    addresses: Vec<u8, ADDRESS_SPACE>,
}

impl DeviceSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a responding address; addresses arrive in scan order
    fn insert(&mut self, address: u8) {
        if self.contains(address) {
            return;
        }
        // Only 7-bit addresses get past `probe`, so the set never overflows
        let pushed = self.addresses.push(address);
        debug_assert!(pushed.is_ok(), "device set full at {:#04x}", address);
    }

    /// Check if a device answered at `address`
    pub fn contains(&self, address: u8) -> bool {
        self.addresses.contains(&address)
    }

    /// Number of devices found
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Check if nothing answered
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Lowest responding address
    pub fn first(&self) -> Option<u8> {
        self.addresses.first().copied()
    }

    /// Responding addresses as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.addresses
    }

    /// Iterate over responding addresses
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.addresses.iter().copied()
    }
}

impl<R: TwiRegisters> Master<R> {
    /// Check whether a device acknowledges `address`
    ///
    /// Any address-step failure (NACK, arbitration lost, unexpected code)
    /// reads as "absent". A failed start or a timeout means the bus itself
    /// is unusable and is returned as an error. Probing while a transaction
    /// is open fails with [`Error::InvalidState`] and leaves it open.
    pub fn probe(&mut self, address: u8) -> Result<bool, Error> {
        let mut txn = self.transaction()?;
        let outcome = txn.open(Direction::Write, address);
        txn.finish()?;

        match outcome {
            Ok(()) => Ok(true),
            Err(Error::Status(m)) if matches!(m.step, Step::Address(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Scan the configured address range
    pub fn scan(&mut self) -> Result<DeviceSet, Error> {
        let range = self.scan_range();
        self.scan_range_of(range)
    }

    /// Scan an explicit address range
    ///
    /// Stops early only when the bus is unusable; that error is returned
    /// instead of a partial result.
    pub fn scan_range_of(&mut self, range: ScanRange) -> Result<DeviceSet, Error> {
        let mut found = DeviceSet::new();

        for address in range.addresses() {
            match self.probe(address) {
                Ok(true) => {
                    info!("device found at {=u8:#x}", address);
                    found.insert(address);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("scan aborted at {=u8:#x}: {}", address, e);
                    return Err(e);
                }
            }
        }

        Ok(found)
    }

    /// Lowest responding address in `range`, if any
    pub fn scan_first(&mut self, range: ScanRange) -> Result<Option<u8>, Error> {
        for address in range.addresses() {
            if self.probe(address)? {
                return Ok(Some(address));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::state::Phase;
    use crate::status::Status;
    use crate::testing::FakeTwi;
    use twibus_hal::PollLimit;

    fn master(present: &'static [u8]) -> Master<FakeTwi> {
        Master::new(FakeTwi::new(present), &BusConfig::default()).unwrap()
    }

    #[test]
    fn test_scan_finds_exactly_present_devices() {
        let mut m = master(&[0x50, 0x68]);

        let found = m.scan().unwrap();
        assert_eq!(found.as_slice(), &[0x50, 0x68]);
        assert!(found.contains(0x68));
        assert!(!found.contains(0x51));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_full_scan_issues_one_stop_per_address() {
        let mut m = master(&[0x50, 0x68]);
        m.scan().unwrap();

        // 0x00..=0x7F inclusive
        let regs = m.registers();
        assert_eq!(regs.starts, 128);
        assert_eq!(regs.stops, 128);
        assert_eq!(regs.repeated_starts, 0);
        assert_eq!(regs.written.first(), Some(&0x00));
        assert_eq!(regs.written.last(), Some(&0xFE));
    }

    #[test]
    fn test_non_reserved_range() {
        let mut m = master(&[0x03, 0x50]);
        let found = m.scan_range_of(ScanRange::NON_RESERVED).unwrap();
        assert_eq!(found.as_slice(), &[0x50]);
        assert_eq!(m.registers().stops, 112);
    }

    #[test]
    fn test_empty_bus() {
        let mut m = master(&[]);
        let found = m.scan().unwrap();
        assert!(found.is_empty());
        assert_eq!(found.first(), None);
        assert_eq!(m.registers().stops, 128);
    }

    #[test]
    fn test_arbitration_loss_reads_as_absent_and_still_stops() {
        let mut m = master(&[0x00, 0x01]);
        // First probe loses arbitration on the address byte
        m.registers_mut().script(&[0x08, 0x38]);

        let found = m
            .scan_range_of(ScanRange::new(0x00, 0x01).unwrap())
            .unwrap();
        assert_eq!(found.as_slice(), &[0x01]);
        assert_eq!(m.registers().stops, 2);
    }

    #[test]
    fn test_start_failure_aborts_scan() {
        let mut m = master(&[0x50]);
        m.registers_mut().fail_starts_after = Some(3);

        let err = m.scan().unwrap_err();
        assert_eq!(err.status(), Some(Status::BusError));
        // Three full probes, then the failed start issues no stop
        assert_eq!(m.registers().stops, 3);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_timeout_aborts_scan() {
        let mut m = master(&[0x50]);
        m.set_wait(PollLimit::Polls(50));
        m.registers_mut().stuck = true;

        assert_eq!(m.scan(), Err(Error::Timeout));
    }

    #[test]
    fn test_scan_refused_while_transaction_open() {
        let mut m = master(&[0x50]);
        m.open(Direction::Write, 0x50).unwrap();
        let open = Phase::AddressAcked(Direction::Write);

        assert_eq!(m.scan(), Err(Error::InvalidState(open)));
        assert_eq!(m.probe(0x50), Err(Error::InvalidState(open)));
        assert_eq!(m.scan_first(ScanRange::FULL), Err(Error::InvalidState(open)));
        assert_eq!(m.phase(), open);
        assert_eq!(m.registers().stops, 0);
        assert_eq!(m.registers().starts, 1);

        // The caller's transaction is still usable
        assert_eq!(m.send_byte(0x00), Ok(()));
    }

    #[test]
    fn test_device_set_ignores_duplicates() {
        let mut set = DeviceSet::new();
        set.insert(0x50);
        set.insert(0x50);
        set.insert(0x68);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice(), &[0x50, 0x68]);
        assert_eq!(set.iter().last(), Some(0x68));
    }

    #[test]
    fn test_scan_first() {
        let mut m = master(&[0x3C, 0x68]);
        assert_eq!(m.scan_first(ScanRange::FULL), Ok(Some(0x3C)));
        assert_eq!(m.registers().stops, 0x3D);

        let mut m = master(&[]);
        assert_eq!(m.scan_first(ScanRange::NON_RESERVED), Ok(None));
    }

    #[test]
    fn test_probe() {
        let mut m = master(&[0x50]);
        assert_eq!(m.probe(0x50), Ok(true));
        assert_eq!(m.probe(0x51), Ok(false));
        assert_eq!(m.registers().stops, 2);
        assert_eq!(m.probe(0x80), Err(Error::InvalidAddress(0x80)));
    }
}
