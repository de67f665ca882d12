//! Byte and block transfers
//!
//! Everything here is built from [`Master::send_byte`] and
//! [`Master::receive_byte`], so each byte is checked against its expected
//! status code. Block operations run inside a [`Transaction`] guard and
//! release the bus on every exit path. They are refused while the caller
//! holds a transaction of its own.

use embedded_hal::i2c::{ErrorType, I2c, Operation};
use twibus_hal::{I2cBus, TwiRegisters};

use crate::address::Direction;
use crate::error::Error;
use crate::master::{Master, Transaction};

impl<R: TwiRegisters> Transaction<'_, R> {
    /// Send one byte and require an ACK
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.master().send_byte(byte)
    }

    /// Receive one byte, acknowledging it if `more` follow
    pub fn read_byte(&mut self, more: bool) -> Result<u8, Error> {
        self.master().receive_byte(more)
    }

    /// Send every byte of `bytes`, stopping at the first failure
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fill `buf` from the slave
    ///
    /// Every byte is acknowledged except the last one when `nack_last` is
    /// set, which tells the slave the read is over.
    pub fn read_bytes(&mut self, buf: &mut [u8], nack_last: bool) -> Result<(), Error> {
        let last = buf.len().saturating_sub(1);
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_byte(!(nack_last && i == last))?;
        }
        Ok(())
    }
}

impl<R: TwiRegisters> Master<R> {
    /// Write `bytes` to the device at `address`
    pub fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        let mut txn = self.transaction()?;
        txn.open(Direction::Write, address)?;
        txn.write_bytes(bytes)?;
        txn.finish()
    }

    /// Read `buf.len()` bytes from the device at `address`
    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Error> {
        let mut txn = self.transaction()?;
        txn.open(Direction::Read, address)?;
        txn.read_bytes(buf, true)?;
        txn.finish()
    }

    /// Write `bytes`, then read into `buf` after a repeated start
    pub fn write_read(&mut self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), Error> {
        let mut txn = self.transaction()?;
        txn.open(Direction::Write, address)?;
        txn.write_bytes(bytes)?;
        txn.open_repeated(Direction::Read, address)?;
        txn.read_bytes(buf, true)?;
        txn.finish()
    }

    /// Write one register of a register-addressed device
    pub fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Error> {
        self.write(address, &[register, value])
    }

    /// Read one register of a register-addressed device
    pub fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Error> {
        let mut value = [0u8];
        self.write_read(address, &[register], &mut value)?;
        Ok(value[0])
    }
}

impl<R: TwiRegisters> I2cBus for Master<R> {
    type Error = Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
        Master::write(self, address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Error> {
        Master::read(self, address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Error> {
        Master::write_read(self, address, write_data, read_buf)
    }

    fn probe(&mut self, address: u8) -> Result<bool, Error> {
        Master::probe(self, address)
    }
}

impl<R: TwiRegisters> ErrorType for Master<R> {
    type Error = Error;
}

fn direction_of(operation: &Operation<'_>) -> Direction {
    match operation {
        Operation::Read(_) => Direction::Read,
        Operation::Write(_) => Direction::Write,
    }
}

impl<R: TwiRegisters> I2c for Master<R> {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Error> {
        Master::read(self, address, read)
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Error> {
        Master::write(self, address, write)
    }

    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), Error> {
        Master::write_read(self, address, write, read)
    }

    /// Run `operations` as one bus transaction
    ///
    /// Adjacent operations in the same direction share one address phase.
    /// A direction change issues a repeated start, the final byte of each
    /// read run is NACKed and a single stop ends the transaction.
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let mut txn = Master::transaction(self)?;
        let mut current: Option<Direction> = None;

        for i in 0..operations.len() {
            let direction = direction_of(&operations[i]);
            let run_ends = operations
                .get(i + 1)
                .map_or(true, |next| direction_of(next) != direction);

            match current {
                None => txn.open(direction, address)?,
                Some(open) if open != direction => txn.open_repeated(direction, address)?,
                Some(_) => {}
            }
            current = Some(direction);

            match &mut operations[i] {
                Operation::Write(bytes) => txn.write_bytes(bytes)?,
                Operation::Read(buf) => txn.read_bytes(buf, run_ends)?,
            }
        }

        txn.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::state::Phase;
    use crate::status::Status;
    use crate::testing::FakeTwi;
    use twibus_hal::signal::{ALLOW, ALLOW_ACK, START, STOP};

    const EEPROM: u8 = 0x50;
    const RTC: u8 = 0x68;

    fn master(present: &'static [u8]) -> Master<FakeTwi> {
        Master::new(FakeTwi::new(present), &BusConfig::default()).unwrap()
    }

    #[test]
    fn test_write_block() {
        let mut m = master(&[EEPROM]);
        m.write(EEPROM, &[0x00, 0x10, 0x20]).unwrap();

        let regs = m.registers();
        assert_eq!(regs.written.as_slice(), &[0xA0, 0x00, 0x10, 0x20]);
        assert_eq!(regs.stops, 1);
        assert_eq!(regs.controls.last(), Some(&STOP));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_write_stops_at_data_nack() {
        let mut m = master(&[EEPROM]);
        m.registers_mut().script(&[0x08, 0x18, 0x28, 0x30]);

        let err = m.write(EEPROM, &[1, 2, 3]).unwrap_err();
        assert_eq!(err.status(), Some(Status::DataSentNack));
        let regs = m.registers();
        assert_eq!(regs.written.as_slice(), &[0xA0, 1, 2]);
        assert_eq!(regs.stops, 1);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_write_to_absent_device_stops_once() {
        let mut m = master(&[]);
        let err = m.write(EEPROM, &[1]).unwrap_err();
        assert_eq!(err.status_code(), Some(0x20));
        assert_eq!(m.registers().stops, 1);
    }

    #[test]
    fn test_read_block_nacks_last_byte() {
        let mut m = master(&[EEPROM]);
        m.registers_mut().respond(&[9, 8, 7]);

        let mut buf = [0u8; 3];
        m.read(EEPROM, &mut buf).unwrap();
        assert_eq!(buf, [9, 8, 7]);
        assert_eq!(
            m.registers().controls.as_slice(),
            &[0x04, START, ALLOW, ALLOW_ACK, ALLOW_ACK, ALLOW, STOP]
        );
        assert_eq!(m.registers().written.as_slice(), &[0xA1]);
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let mut m = master(&[RTC]);
        m.registers_mut().respond(&[0x45, 0x12]);

        let mut buf = [0u8; 2];
        m.write_read(RTC, &[0x00], &mut buf).unwrap();
        assert_eq!(buf, [0x45, 0x12]);

        let regs = m.registers();
        assert_eq!(regs.written.as_slice(), &[0xD0, 0x00, 0xD1]);
        assert_eq!(regs.starts, 1);
        assert_eq!(regs.repeated_starts, 1);
        assert_eq!(regs.stops, 1);
    }

    #[test]
    fn test_register_helpers() {
        let mut m = master(&[RTC]);
        m.write_register(RTC, 0x0E, 0x1C).unwrap();
        assert_eq!(m.registers().written.as_slice(), &[0xD0, 0x0E, 0x1C]);

        m.registers_mut().respond(&[0x88]);
        assert_eq!(m.read_register(RTC, 0x0F), Ok(0x88));
        assert_eq!(m.registers().stops, 2);
    }

    #[test]
    fn test_receive_failure_mid_block_closes() {
        let mut m = master(&[EEPROM]);
        m.registers_mut().script(&[0x08, 0x40, 0x38]);

        let mut buf = [0u8; 2];
        let err = m.read(EEPROM, &mut buf).unwrap_err();
        assert_eq!(err.status(), Some(Status::ArbitrationLost));
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.registers().stops, 1);
    }

    #[test]
    fn test_transaction_merges_runs() {
        let mut m = master(&[EEPROM]);
        m.registers_mut().respond(&[1, 2, 3]);

        let mut a = [0u8; 2];
        let mut b = [0u8; 1];
        let mut ops = [
            Operation::Write(&[0x00]),
            Operation::Write(&[0x40]),
            Operation::Read(&mut a),
            Operation::Read(&mut b),
        ];
        I2c::transaction(&mut m, EEPROM, &mut ops).unwrap();

        assert_eq!(a, [1, 2]);
        assert_eq!(b, [3]);
        let regs = m.registers();
        assert_eq!(regs.written.as_slice(), &[0xA0, 0x00, 0x40, 0xA1]);
        assert_eq!(regs.starts, 1);
        assert_eq!(regs.repeated_starts, 1);
        assert_eq!(regs.stops, 1);
        // ACK, ACK across the merged run, NACK on its final byte
        let controls = regs.controls.as_slice();
        assert_eq!(
            &controls[controls.len() - 4..],
            &[ALLOW_ACK, ALLOW_ACK, ALLOW, STOP]
        );
    }

    #[test]
    fn test_transaction_back_to_write() {
        let mut m = master(&[EEPROM]);
        let mut byte = [0u8; 1];
        let mut ops = [
            Operation::Write(&[0x01]),
            Operation::Read(&mut byte),
            Operation::Write(&[0x02]),
        ];
        I2c::transaction(&mut m, EEPROM, &mut ops).unwrap();

        let regs = m.registers();
        assert_eq!(regs.repeated_starts, 2);
        assert_eq!(regs.written.as_slice(), &[0xA0, 0x01, 0xA1, 0xA0, 0x02]);
        assert_eq!(regs.stops, 1);
    }

    #[test]
    fn test_block_transfers_refused_while_transaction_open() {
        let mut m = master(&[EEPROM]);
        m.open(Direction::Write, EEPROM).unwrap();
        let open = Phase::AddressAcked(Direction::Write);
        let mut buf = [0u8; 1];

        assert_eq!(m.write(EEPROM, &[1]), Err(Error::InvalidState(open)));
        assert_eq!(m.read(EEPROM, &mut buf), Err(Error::InvalidState(open)));
        assert_eq!(
            m.write_read(EEPROM, &[0], &mut buf),
            Err(Error::InvalidState(open))
        );
        assert_eq!(
            I2c::transaction(&mut m, EEPROM, &mut [Operation::Write(&[1])]),
            Err(Error::InvalidState(open))
        );

        assert_eq!(m.phase(), open);
        let regs = m.registers();
        assert_eq!(regs.stops, 0);
        assert_eq!(regs.written.as_slice(), &[0xA0]);
    }

    #[test]
    fn test_empty_transaction_touches_nothing() {
        let mut m = master(&[EEPROM]);
        I2c::transaction(&mut m, EEPROM, &mut []).unwrap();
        assert_eq!(m.registers().controls.as_slice(), &[0x04]);
    }

    #[test]
    fn test_embedded_hal_error_kind() {
        use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};

        let mut m = master(&[]);
        let err = I2c::write(&mut m, EEPROM, &[0]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
    }

    #[test]
    fn test_generic_bus_driver() {
        fn present<B: I2cBus>(bus: &mut B, candidates: &[u8]) -> Result<usize, B::Error> {
            let mut n = 0;
            for &address in candidates {
                if bus.probe(address)? {
                    n += 1;
                }
            }
            Ok(n)
        }

        let mut m = master(&[EEPROM, RTC]);
        assert_eq!(present(&mut m, &[0x3C, EEPROM, RTC]), Ok(2));
        assert_eq!(m.registers().stops, 3);
    }
}
