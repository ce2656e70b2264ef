//! Fixed-length response frames sent by the DM board.
//!
//! Frame format (15 bytes):
//! - HEADER (offset 0): 0xBB start marker
//! - NODE (offset 1): responding node id
//! - MARKER (offset 2): 0x12 frame-type marker
//! - PAYLOAD (offsets 3-12): opaque response data
//! - TYPE (offset 13): classification byte
//! - CHECKSUM (offset 14): reserved, checked only when enabled in the parser

use crate::checksum::Checksum;

/// Frame length in bytes
pub const FRAME_LEN: usize = 15;

/// Start-of-frame byte
pub const FRAME_HEADER: u8 = 0xBB;

/// Frame-type marker byte
pub const FRAME_MARKER: u8 = 0x12;

/// Offset of the marker byte
pub const MARKER_OFFSET: usize = 2;

/// Offset of the classification byte
pub const TYPE_OFFSET: usize = 13;

/// Offset of the checksum byte
pub const CHECKSUM_OFFSET: usize = 14;

/// Number of opaque payload bytes
pub const PAYLOAD_LEN: usize = TYPE_OFFSET - PAYLOAD_START;

const NODE_OFFSET: usize = 1;
const PAYLOAD_START: usize = 3;

/// A received frame, copied out of the receive ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Wrap raw frame bytes
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self { bytes }
    }

    /// Assemble a frame with a valid header and checksum (for testing or simulation)
    pub fn compose(node: u8, payload: &[u8; PAYLOAD_LEN], kind: u8, checksum: Checksum) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = FRAME_HEADER;
        bytes[NODE_OFFSET] = node;
        bytes[MARKER_OFFSET] = FRAME_MARKER;
        bytes[PAYLOAD_START..TYPE_OFFSET].copy_from_slice(payload);
        bytes[TYPE_OFFSET] = kind;
        bytes[CHECKSUM_OFFSET] = checksum.compute(&bytes[NODE_OFFSET..CHECKSUM_OFFSET]);
        Self { bytes }
    }

    /// Check the header and marker bytes
    pub fn is_valid(&self) -> bool {
        is_frame_start(&self.bytes)
    }

    pub fn node(&self) -> u8 {
        self.bytes[NODE_OFFSET]
    }

    /// Classification byte
    pub fn kind(&self) -> u8 {
        self.bytes[TYPE_OFFSET]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[PAYLOAD_START..TYPE_OFFSET]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[CHECKSUM_OFFSET]
    }

    /// Verify the checksum byte against offsets 1..=13
    pub fn checksum_matches(&self, checksum: Checksum) -> bool {
        checksum.compute(&self.bytes[NODE_OFFSET..CHECKSUM_OFFSET]) == self.checksum()
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }
}

/// Check whether `bytes` begins with the header/marker pattern
pub fn is_frame_start(bytes: &[u8]) -> bool {
    bytes.len() > MARKER_OFFSET
        && bytes[0] == FRAME_HEADER
        && bytes[MARKER_OFFSET] == FRAME_MARKER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_layout() {
        let frame = Frame::compose(0x01, &[0xA0; PAYLOAD_LEN], 0x1B, Checksum::Xor8);
        let bytes = frame.as_bytes();

        assert_eq!(bytes[0], FRAME_HEADER);
        assert_eq!(bytes[1], 0x01);
        assert_eq!(bytes[2], FRAME_MARKER);
        assert_eq!(frame.payload(), &[0xA0; PAYLOAD_LEN]);
        assert_eq!(frame.kind(), 0x1B);
        assert!(frame.is_valid());
        assert!(frame.checksum_matches(Checksum::Xor8));
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut bytes = *Frame::compose(0x01, &[0; PAYLOAD_LEN], 0x80, Checksum::Sum8).as_bytes();
        bytes[5] ^= 0x01;
        let frame = Frame::from_bytes(bytes);

        assert!(frame.is_valid());
        assert!(!frame.checksum_matches(Checksum::Sum8));
    }

    #[test]
    fn test_is_frame_start() {
        assert!(is_frame_start(&[0xBB, 0x00, 0x12]));
        assert!(!is_frame_start(&[0xBB, 0x12]));
        assert!(!is_frame_start(&[0xBB, 0x12, 0x00]));
        assert!(!is_frame_start(&[]));
    }
}
