//! Phase transitions
//!
//! `Idle → Started → AddressAcked → {DataAcked}* → Stopped → Idle`

use super::steps::Step;
use crate::address::Direction;
use crate::status::Status;

/// Transaction phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No transaction; the bus is released
    Idle,
    /// Start (or repeated start) on the bus, no address yet
    Started,
    /// Slave acknowledged its address
    AddressAcked(Direction),
    /// At least one data byte exchanged
    DataAcked(Direction),
    /// Stop requested; settles to `Idle` once the hardware is done
    Stopped,
}

/// A legal transition: the status the hardware must report and where the
/// transaction goes when it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    /// Expected status, `None` for steps the hardware reports nothing for
    pub expect: Option<Status>,
    /// Phase after the step succeeds
    pub next: Phase,
}

impl Edge {
    const fn new(expect: Status, next: Phase) -> Self {
        Self {
            expect: Some(expect),
            next,
        }
    }
}

impl Phase {
    /// Check whether a transaction is in flight
    pub fn is_open(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    /// Direction of the transfer once the address has been acknowledged
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Phase::AddressAcked(d) | Phase::DataAcked(d) => Some(*d),
            _ => None,
        }
    }

    /// Look up the transition for `step`
    ///
    /// Returns `None` when the step is not legal in this phase. A repeated
    /// start needs a transaction to continue; from `Idle` the bus is free
    /// and only a fresh start is legal.
    pub fn edge(self, step: Step) -> Option<Edge> {
        use Direction::*;
        use Phase::*;

        match (self, step) {
            (Idle | Stopped, Step::Start) => Some(Edge::new(Status::StartSent, Started)),
            (Idle, Step::RepeatedStart) => None,
            (_, Step::RepeatedStart) => Some(Edge::new(Status::RepeatedStartSent, Started)),

            (Started, Step::Address(d)) => Some(Edge::new(d.address_ack(), AddressAcked(d))),

            (AddressAcked(Write) | DataAcked(Write), Step::SendData) => {
                Some(Edge::new(Status::DataSentAck, DataAcked(Write)))
            }

            (AddressAcked(Read) | DataAcked(Read), Step::ReceiveData { ack: true }) => {
                Some(Edge::new(Status::DataReceivedAck, DataAcked(Read)))
            }
            (AddressAcked(Read) | DataAcked(Read), Step::ReceiveData { ack: false }) => {
                Some(Edge::new(Status::DataReceivedNack, DataAcked(Read)))
            }

            (Idle, Step::Stop) => None,
            (_, Step::Stop) => Some(Edge {
                expect: None,
                next: Stopped,
            }),

            _ => None,
        }
    }
}
