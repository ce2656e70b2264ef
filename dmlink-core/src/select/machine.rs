//! Input selector definition
//!
//! A switch request writes the input adjuster. The board answers that write
//! with a frame of its own, which is discarded (or waited out). Then a fixed
//! number of version queries follow, one at a time. Only the answer to the
//! first query decides: any classification byte other than "unchanged"
//! means the board switched. The remaining queries drain responses the
//! board queued meanwhile.

use serde::{Deserialize, Serialize};

use dmlink_protocol::messages::is_unchanged;
use dmlink_protocol::Command;

use super::events::{SelectEvent, SelectOutcome, SelectStep};
use crate::config::InputSelectConfig;

/// Video inputs of the DM board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputSource {
    Hdmi,
    DisplayPort,
}

impl InputSource {
    /// The source a toggle switches to
    pub fn other(self) -> Self {
        match self {
            InputSource::Hdmi => InputSource::DisplayPort,
            InputSource::DisplayPort => InputSource::Hdmi,
        }
    }
}

/// Selector states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectState {
    /// No switch pending
    Idle,
    /// Adjuster written, waiting for the board to answer the write
    AwaitingAck { target: InputSource },
    /// Collecting answers to the version queries
    Confirming {
        target: InputSource,
        answered: u8,
        switched: bool,
    },
}

/// Tracks the selected input and confirms switch requests
#[derive(Debug, Clone)]
pub struct InputSelector {
    config: InputSelectConfig,
    current: InputSource,
    state: SelectState,
}

impl InputSelector {
    pub fn new(config: InputSelectConfig) -> Self {
        Self {
            current: config.initial,
            config,
            state: SelectState::Idle,
        }
    }

    /// Source the board is believed to be on
    pub fn current(&self) -> InputSource {
        self.current
    }

    pub fn state(&self) -> SelectState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.state, SelectState::Idle)
    }

    /// Start switching to the other source
    ///
    /// Returns the adjuster write to send. The first version query is
    /// requested through [`SelectStep::Query`] once the write has been
    /// answered or has timed out. Returns `None` while a switch is still
    /// in progress.
    pub fn request_toggle(&mut self) -> Option<Command> {
        if self.is_busy() {
            return None;
        }

        let target = self.current.other();
        self.state = SelectState::AwaitingAck { target };

        Some(Command::SetAdjuster {
            adjuster: self.config.adjuster,
            value: self.config.code_for(target),
        })
    }

    /// Feed the answer (or lack of one) to the last command sent
    pub fn handle(&mut self, event: SelectEvent) -> SelectStep {
        match self.state {
            SelectState::Idle => SelectStep::Ignored,
            SelectState::AwaitingAck { target } => {
                // The write's own answer says nothing about the switch
                self.state = SelectState::Confirming {
                    target,
                    answered: 0,
                    switched: false,
                };
                SelectStep::Query
            }
            SelectState::Confirming {
                target,
                answered,
                switched,
            } => self.confirm(target, answered, switched, event),
        }
    }

    fn confirm(
        &mut self,
        target: InputSource,
        answered: u8,
        switched: bool,
        event: SelectEvent,
    ) -> SelectStep {
        let reports_change = match event {
            SelectEvent::Response(kind) => !is_unchanged(kind),
            SelectEvent::NoResponse => false,
        };

        let answered = answered.saturating_add(1);
        let switched = if answered == 1 { reports_change } else { switched };

        if answered < self.config.confirm_attempts.max(1) {
            self.state = SelectState::Confirming {
                target,
                answered,
                switched,
            };
            return SelectStep::Query;
        }

        self.state = SelectState::Idle;
        if switched {
            self.current = target;
            SelectStep::Done(SelectOutcome::Switched(target))
        } else {
            SelectStep::Done(SelectOutcome::Unchanged(self.current))
        }
    }
}
