//! Outbound command packets.
//!
//! Packet format:
//! - HEADER (1 byte): 0xBB
//! - NODE (1 byte): addressed node
//! - COMMAND (1 byte): command code
//! - LENGTH (1 byte): payload length (0-32)
//! - CHECKSUM (1 byte): configured checksum of NODE, COMMAND, LENGTH, PAYLOAD
//! - PAYLOAD (LENGTH bytes)

use heapless::Vec;

use crate::checksum::Checksum;

/// Packet start byte
pub const PACKET_HEADER: u8 = 0xBB;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Bytes in front of the payload
pub const PACKET_OVERHEAD: usize = 5;

/// Maximum complete packet size
pub const MAX_PACKET_SIZE: usize = PACKET_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Errors that can occur while building or encoding a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A command packet ready for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutboundPacket {
    node: u8,
    command: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    checksum: u8,
}

impl OutboundPacket {
    pub fn node(&self) -> u8 {
        self.node
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        PACKET_OVERHEAD + self.payload.len()
    }

    /// Encode this packet into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        let packet_len = self.encoded_len();
        if buffer.len() < packet_len {
            return Err(PacketError::BufferTooSmall);
        }

        buffer[0] = PACKET_HEADER;
        buffer[1] = self.node;
        buffer[2] = self.command;
        buffer[3] = self.payload.len() as u8;
        buffer[4] = self.checksum;
        buffer[PACKET_OVERHEAD..packet_len].copy_from_slice(&self.payload);

        Ok(packet_len)
    }

    /// Encode this packet into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_PACKET_SIZE>, PacketError> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| PacketError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Builds command packets with the configured checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameBuilder {
    checksum: Checksum,
}

impl FrameBuilder {
    pub const fn new(checksum: Checksum) -> Self {
        Self { checksum }
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Build a packet for `node`
    pub fn build(&self, node: u8, command: u8, payload: &[u8]) -> Result<OutboundPacket, PacketError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(PacketError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| PacketError::PayloadTooLarge)?;

        let length = payload.len() as u8;
        let checksum = self
            .checksum
            .compute_iter([node, command, length].into_iter().chain(payload.iter().copied()));

        Ok(OutboundPacket {
            node,
            command,
            payload: payload_vec,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::is_frame_start;

    #[test]
    fn test_build_empty_payload() {
        let builder = FrameBuilder::new(Checksum::Xor8);
        let packet = builder.build(0x01, 0x12, &[]).unwrap();
        let mut buffer = [0u8; 10];
        let len = packet.encode(&mut buffer).unwrap();

        assert_eq!(len, 5);
        assert_eq!(buffer[0], PACKET_HEADER);
        assert_eq!(buffer[1], 0x01); // node
        assert_eq!(buffer[2], 0x12); // command
        assert_eq!(buffer[3], 0); // length
        assert_eq!(buffer[4], 0x13); // checksum (0x01 ^ 0x12 ^ 0)
    }

    #[test]
    fn test_build_with_payload() {
        let builder = FrameBuilder::new(Checksum::Sum8);
        let packet = builder.build(0x02, 0x13, &[0x0A, 0x1E]).unwrap();
        let encoded = packet.encode_to_vec().unwrap();

        assert_eq!(encoded.len(), 7);
        assert_eq!(encoded[3], 2);
        assert_eq!(encoded[4], 0x02u8 + 0x13 + 2 + 0x0A + 0x1E);
        assert_eq!(&encoded[5..], &[0x0A, 0x1E]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = FrameBuilder::new(Checksum::Crc8);
        let a = builder.build(0x01, 0x13, &[1, 2, 3]).unwrap();
        let b = builder.build(0x01, 0x13, &[1, 2, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_version_query_looks_like_frame_start() {
        let packet = FrameBuilder::default().build(1, 0x12, &[]).unwrap();
        let encoded = packet.encode_to_vec().unwrap();
        assert!(is_frame_start(&encoded));
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = FrameBuilder::default().build(0x01, 0x13, &large_payload);
        assert_eq!(result, Err(PacketError::PayloadTooLarge));
    }

    #[test]
    fn test_buffer_too_small() {
        let packet = FrameBuilder::default().build(0x01, 0x13, &[1, 2]).unwrap();
        let mut buffer = [0u8; 6];
        assert_eq!(packet.encode(&mut buffer), Err(PacketError::BufferTooSmall));
    }
}
