//! Single-byte checksum strategies
//!
//! The DM board firmware decides which algorithm it accepts, so the
//! algorithm is chosen by configuration rather than fixed in the encoder.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Checksum algorithm applied to a byte range, truncated to one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Checksum {
    /// Wrapping sum of all bytes
    Sum8,
    /// XOR of all bytes
    #[default]
    Xor8,
    /// CRC-8, polynomial 0x07, initial value 0
    Crc8,
}

impl Checksum {
    /// Compute the checksum of a contiguous byte slice
    pub fn compute(self, data: &[u8]) -> u8 {
        self.compute_iter(data.iter().copied())
    }

    /// Compute the checksum of a byte sequence
    ///
    /// Used when the covered bytes are not contiguous in memory, e.g. the
    /// packet header fields followed by the payload.
    pub fn compute_iter<I>(self, bytes: I) -> u8
    where
        I: IntoIterator<Item = u8>,
    {
        let bytes = bytes.into_iter();
        match self {
            Checksum::Sum8 => bytes.fold(0u8, |acc, b| acc.wrapping_add(b)),
            Checksum::Xor8 => bytes.fold(0u8, |acc, b| acc ^ b),
            Checksum::Crc8 => bytes.fold(0u8, crc8_update),
        }
    }

    /// Parse a configuration name (`"sum8"`, `"xor8"`, `"crc8"`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum8" | "sum" => Some(Checksum::Sum8),
            "xor8" | "xor" => Some(Checksum::Xor8),
            "crc8" | "crc" => Some(Checksum::Crc8),
            _ => None,
        }
    }
}

/// Feed one byte through a CRC-8 (poly 0x07), MSB first
fn crc8_update(crc: u8, byte: u8) -> u8 {
    let mut crc = crc;
    let mut current = byte;
    for _ in 0..8 {
        if ((crc >> 7) ^ (current >> 7)) != 0 {
            crc = (crc << 1) ^ 0x07;
        } else {
            crc <<= 1;
        }
        current <<= 1;
    }
    crc
}
