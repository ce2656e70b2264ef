//! Command set understood by the DM board
//!
//! Every command is answered with a 15-byte response frame whose marker
//! byte echoes [`CMD_GET_VERSION`]. The classification byte of the answer
//! to a version query carries the state of the last adjustment.

use crate::packet::{FrameBuilder, OutboundPacket, PacketError};

// Command codes: controller → DM board
pub const CMD_GET_VERSION: u8 = 0x12;
pub const CMD_SET_ADJUSTER: u8 = 0x13;

/// Classification byte reported when the last adjustment was not applied
pub const RESPONSE_UNCHANGED: u8 = 0x80;

/// Commands sent to the DM board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Query firmware version / status
    GetVersion,
    /// Write an adjuster (a board setting such as the input select)
    SetAdjuster { adjuster: u8, value: u8 },
}

impl Command {
    /// Command code on the wire
    pub fn code(&self) -> u8 {
        match self {
            Command::GetVersion => CMD_GET_VERSION,
            Command::SetAdjuster { .. } => CMD_SET_ADJUSTER,
        }
    }

    /// Encode this command into a packet for `node`
    pub fn to_packet(&self, builder: &FrameBuilder, node: u8) -> Result<OutboundPacket, PacketError> {
        match self {
            Command::GetVersion => builder.build(node, CMD_GET_VERSION, &[]),
            Command::SetAdjuster { adjuster, value } => {
                builder.build(node, CMD_SET_ADJUSTER, &[*adjuster, *value])
            }
        }
    }
}

/// Whether a classification byte reports that nothing changed
pub fn is_unchanged(kind: u8) -> bool {
    kind == RESPONSE_UNCHANGED
}
