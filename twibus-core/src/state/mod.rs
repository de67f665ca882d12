//! Transaction state machine
//!
//! The phase of the open transaction and the steps that move it forward.
//! The transition table is explicit and finite: a step is either legal in
//! the current phase, with one expected status and one next phase, or it
//! is rejected.

pub mod machine;
pub mod steps;

pub use machine::{Edge, Phase};
pub use steps::Step;
