//! Input-select state machine
//!
//! Decides whether the DM board actually switched video input after a
//! switch request, using the classification byte of the answers to the
//! version queries that follow it.

pub mod events;
pub mod machine;

pub use events::{SelectEvent, SelectOutcome, SelectStep};
pub use machine::{InputSelector, InputSource, SelectState};
