//! Events fed to the input selector and what it asks for in return

use super::machine::InputSource;

/// Events that drive the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectEvent {
    /// A response frame arrived; carries its classification byte
    Response(u8),
    /// A version query got no response in time
    NoResponse,
}

/// What the caller must do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectStep {
    /// Send another version query
    Query,
    /// The confirmation window closed
    Done(SelectOutcome),
    /// Event arrived while no switch was pending
    Ignored,
}

/// Result of a switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectOutcome {
    /// The board reported the change; this is the new source
    Switched(InputSource),
    /// The board kept its input; this is still the current source
    Unchanged(InputSource),
}
