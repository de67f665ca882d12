//! Bus master
//!
//! Sequences signal primitives into start → address → data… → stop
//! transactions. After every step the status register is compared with the
//! code the transition table expects; nothing else decides success.
//!
//! The master owns the register block, so one `Master` is the one handle on
//! the peripheral. Only one transaction can be open on it at a time; on a
//! multi-threaded host the whole open…close sequence needs an external lock.

use twibus_hal::registers::control;
use twibus_hal::{BusSignals, PollLimit, TwiRegisters};

use crate::address::{address_byte, Direction};
use crate::bitrate::BitRate;
use crate::config::{BusConfig, ConfigError, ScanRange};
use crate::error::{Error, StatusMismatch};
use crate::state::{Phase, Step};
use crate::status::Status;

/// Two-wire bus master over a register block
pub struct Master<R> {
    regs: R,
    phase: Phase,
    target: Option<u8>,
    bit_rate: BitRate,
    wait: PollLimit,
    scan: ScanRange,
}

impl<R: TwiRegisters> Master<R> {
    /// Create a master and program the bus clock
    pub fn new(regs: R, config: &BusConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bit_rate = config.bit_rate()?;

        let mut master = Self {
            regs,
            phase: Phase::Idle,
            target: None,
            bit_rate,
            wait: config.wait,
            scan: config.scan,
        };
        master.program(bit_rate);
        Ok(master)
    }

    /// Program divisor and prescaler and enable the peripheral
    ///
    /// Fails with [`Error::InvalidState`] while a transaction is open; the
    /// bus clock never changes mid-transaction.
    pub fn initialize(&mut self, bit_rate: BitRate) -> Result<(), Error> {
        self.ensure_idle()?;
        self.program(bit_rate);
        Ok(())
    }

    fn program(&mut self, bit_rate: BitRate) {
        self.regs.write_bit_rate(bit_rate.divisor);
        self.regs.set_prescaler(bit_rate.prescaler.bits());
        self.regs.write_control(control::TWEN);
        self.bit_rate = bit_rate;
        info!(
            "bus initialized: divisor {=u8}, prescaler {=u8}",
            bit_rate.divisor,
            bit_rate.prescaler.bits()
        );
    }

    /// Current transaction phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Address of the open transaction
    pub fn target(&self) -> Option<u8> {
        self.target
    }

    /// Programmed divisor/prescaler pair
    pub fn bit_rate(&self) -> BitRate {
        self.bit_rate
    }

    /// Configured scan range
    pub fn scan_range(&self) -> ScanRange {
        self.scan
    }

    /// Change how long each step may wait on the hardware
    pub fn set_wait(&mut self, wait: PollLimit) {
        self.wait = wait;
    }

    /// Access the register block
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutable access to the register block
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register block back
    pub fn release(self) -> R {
        self.regs
    }

    /// Open a transaction with a fresh start condition
    ///
    /// Fails with [`Error::InvalidState`] if a transaction is already open;
    /// use [`open_repeated`](Self::open_repeated) to change direction without
    /// releasing the bus.
    pub fn open(&mut self, direction: Direction, address: u8) -> Result<(), Error> {
        self.open_with(Step::Start, direction, address)
    }

    /// Open a transaction with a repeated start, keeping the bus
    pub fn open_repeated(&mut self, direction: Direction, address: u8) -> Result<(), Error> {
        self.open_with(Step::RepeatedStart, direction, address)
    }

    fn open_with(&mut self, start: Step, direction: Direction, address: u8) -> Result<(), Error> {
        let sla = address_byte(address, direction)?;

        self.execute(start, None)?;
        self.target = Some(address);
        self.execute(Step::Address(direction), Some(sla))
    }

    /// Transmit one byte and require the slave to acknowledge it
    pub fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.execute(Step::SendData, Some(byte))
    }

    /// Receive one byte
    ///
    /// `more` acknowledges the byte so the slave keeps sending; pass `false`
    /// for the final byte so the slave releases the data line. The status is
    /// checked against the matching received-with-ACK/NACK code.
    pub fn receive_byte(&mut self, more: bool) -> Result<u8, Error> {
        self.execute(Step::ReceiveData { ack: more }, None)?;
        Ok(self.regs.read_data())
    }

    /// Put a stop condition on the bus and return to `Idle`
    ///
    /// Closing an idle master does nothing and touches no register. The
    /// phase is `Idle` afterwards even if the stop wait times out.
    pub fn close(&mut self) -> Result<(), Error> {
        let Some(edge) = self.phase.edge(Step::Stop) else {
            return Ok(());
        };

        trace!("stop");
        self.signal(Step::Stop);
        self.phase = edge.next;
        let waited = self.regs.wait_stopped(self.wait);

        self.phase = Phase::Idle;
        self.target = None;

        waited.map_err(|_| {
            warn!("stop condition never completed");
            Error::Timeout
        })
    }

    /// Start a scoped transaction that closes the bus when dropped
    ///
    /// Fails with [`Error::InvalidState`] if a transaction is already open,
    /// leaving it untouched.
    pub fn transaction(&mut self) -> Result<Transaction<'_, R>, Error> {
        self.ensure_idle()?;
        Ok(Transaction { master: self })
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        if self.phase.is_open() {
            return Err(Error::InvalidState(self.phase));
        }
        Ok(())
    }

    /// Run one step: signal, wait, compare
    fn execute(&mut self, step: Step, payload: Option<u8>) -> Result<(), Error> {
        let edge = self
            .phase
            .edge(step)
            .ok_or(Error::InvalidState(self.phase))?;

        if let Some(byte) = payload {
            self.regs.write_data(byte);
        }

        self.signal(step);

        if let Err(timeout) = self.regs.wait_ready(self.wait) {
            warn!("timed out waiting for {}", step);
            return Err(timeout.into());
        }

        let observed = Status::from_code(self.regs.status());
        trace!("{} -> {}", step, observed);

        match edge.expect {
            Some(expected) if observed != expected => Err(self.fail(step, expected, observed)),
            _ => {
                self.phase = edge.next;
                Ok(())
            }
        }
    }

    /// Drive the primitive that starts `step` on the bus
    fn signal(&mut self, step: Step) {
        match step {
            Step::Start => self.regs.start(),
            Step::RepeatedStart => self.regs.repeated_start(),
            Step::ReceiveData { ack: true } => self.regs.allow_with_ack(),
            Step::Address(_) | Step::SendData | Step::ReceiveData { ack: false } => {
                self.regs.allow_without_ack()
            }
            Step::Stop => self.regs.stop(),
        }
    }

    /// Build the error for a status mismatch
    ///
    /// An address NACK closes the bus; every other mismatch leaves the
    /// transaction as it was for the caller to close or retry.
    fn fail(&mut self, step: Step, expected: Status, observed: Status) -> Error {
        debug!("{}: expected {}, got {}", step, expected, observed);

        if observed.is_address_nack() {
            debug!("no acknowledge from address, releasing bus");
            // A timed-out stop still leaves the master idle; the NACK is the
            // error that matters to the caller
            let _ = self.close();
        }

        Error::Status(StatusMismatch {
            step,
            expected,
            observed,
        })
    }
}

/// Transaction guard
///
/// Holds the master for the length of one open…close cycle and issues the
/// stop on every exit path, early returns and `?` included.
pub struct Transaction<'a, R: TwiRegisters> {
    master: &'a mut Master<R>,
}

impl<R: TwiRegisters> Transaction<'_, R> {
    /// Open with a fresh start
    pub fn open(&mut self, direction: Direction, address: u8) -> Result<(), Error> {
        self.master.open(direction, address)
    }

    /// Open with a repeated start, keeping the bus
    pub fn open_repeated(&mut self, direction: Direction, address: u8) -> Result<(), Error> {
        self.master.open_repeated(direction, address)
    }

    /// Current phase of the underlying master
    pub fn phase(&self) -> Phase {
        self.master.phase()
    }

    /// Close now and report how the stop went
    pub fn finish(self) -> Result<(), Error> {
        // Drop runs afterwards and finds the master idle
        self.master.close()
    }

    pub(crate) fn master(&mut self) -> &mut Master<R> {
        self.master
    }
}

impl<R: TwiRegisters> Drop for Transaction<'_, R> {
    fn drop(&mut self) {
        let _ = self.master.close();
    }
}
