//! Simulated TWI peripheral for host tests

use heapless::{Deque, Vec};
use twibus_hal::registers::control::{TWEA, TWINT, TWSTA, TWSTO};
use twibus_hal::TwiRegisters;

use crate::address::Direction;

/// Register file that behaves like a master-mode TWI block with a set of
/// slaves attached
pub(crate) struct FakeTwi {
    /// Addresses that acknowledge
    present: &'static [u8],
    /// Status codes forced onto the next completed events, in order
    script: Deque<u8, 64>,
    /// Bytes the addressed slave sends back
    rx: Deque<u8, 64>,
    /// Every control register write
    pub controls: Vec<u8, 1024>,
    /// Every data register write
    pub written: Vec<u8, 1024>,
    pub starts: usize,
    pub repeated_starts: usize,
    pub stops: usize,
    pub bit_rate: Option<u8>,
    pub prescaler: u8,
    /// Never raise the ready flag
    pub stuck: bool,
    /// Starts after this many report a bus error
    pub fail_starts_after: Option<usize>,
    control: u8,
    status: u8,
    data: u8,
    held: bool,
    expect_address: bool,
    direction: Option<Direction>,
}

impl FakeTwi {
    pub fn new(present: &'static [u8]) -> Self {
        Self {
            present,
            script: Deque::new(),
            rx: Deque::new(),
            controls: Vec::new(),
            written: Vec::new(),
            starts: 0,
            repeated_starts: 0,
            stops: 0,
            bit_rate: None,
            prescaler: 0,
            stuck: false,
            fail_starts_after: None,
            control: 0,
            status: 0xF8,
            data: 0,
            held: false,
            expect_address: false,
            direction: None,
        }
    }

    /// Force the status codes of the next bus events
    pub fn script(&mut self, codes: &[u8]) {
        for &code in codes {
            self.script.push_back(code).unwrap();
        }
    }

    /// Queue bytes for the slave to send
    pub fn respond(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.rx.push_back(b).unwrap();
        }
    }

    fn start(&mut self) {
        if self.held {
            self.repeated_starts += 1;
            self.status = 0x10;
        } else {
            self.starts += 1;
            self.status = match self.fail_starts_after {
                Some(n) if self.starts > n => 0x00,
                _ => 0x08,
            };
        }
        self.held = true;
        self.expect_address = true;
        self.direction = None;
    }

    fn clock_byte(&mut self, value: u8) {
        if self.expect_address {
            self.expect_address = false;
            let address = self.data >> 1;
            let direction = if self.data & 1 == 1 {
                Direction::Read
            } else {
                Direction::Write
            };
            let ack = self.present.contains(&address);
            self.status = match (direction, ack) {
                (Direction::Write, true) => 0x18,
                (Direction::Write, false) => 0x20,
                (Direction::Read, true) => 0x40,
                (Direction::Read, false) => 0x48,
            };
            self.direction = if ack { Some(direction) } else { None };
            return;
        }

        match self.direction {
            Some(Direction::Write) => self.status = 0x28,
            Some(Direction::Read) => {
                self.data = self.rx.pop_front().unwrap_or(0xFF);
                self.status = if value & TWEA != 0 { 0x50 } else { 0x58 };
            }
            None => self.status = 0xF8,
        }
    }
}

impl TwiRegisters for FakeTwi {
    fn read_control(&mut self) -> u8 {
        if self.stuck {
            self.control & !TWINT
        } else {
            self.control
        }
    }

    fn write_control(&mut self, value: u8) {
        self.controls.push(value).unwrap();

        if value & TWSTO != 0 {
            self.stops += 1;
            self.held = false;
            self.direction = None;
            self.expect_address = false;
            // Stop completes immediately unless the bus is stuck
            self.control = if self.stuck { value } else { value & !(TWSTO | TWINT) };
            return;
        }

        if value & TWSTA != 0 {
            self.start();
        } else if value & TWINT != 0 {
            self.clock_byte(value);
        } else {
            // Enable or configuration write, no bus event
            self.control = value;
            return;
        }

        if let Some(code) = self.script.pop_front() {
            self.status = code;
        }
        self.control = value | TWINT;
    }

    fn read_data(&mut self) -> u8 {
        self.data
    }

    fn write_data(&mut self, value: u8) {
        self.written.push(value).unwrap();
        self.data = value;
    }

    fn read_status_raw(&mut self) -> u8 {
        self.status | self.prescaler
    }

    fn write_status_raw(&mut self, value: u8) {
        self.prescaler = value & 0x03;
    }

    fn write_bit_rate(&mut self, divisor: u8) {
        self.bit_rate = Some(divisor);
    }
}
