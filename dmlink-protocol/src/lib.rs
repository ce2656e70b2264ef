//! dmlink Serial Protocol
//!
//! This crate implements the receive and transmit halves of the RS-232 link
//! between a controller and a display-module (DM) board.
//!
//! # Receive path
//!
//! The UART receive path pushes bytes into a fixed-capacity ring
//! ([`RingBuffer`] for single-context use, [`SharedRing`] when the producer
//! runs in another task or interrupt). The [`FrameParser`] is polled by the
//! application; it locates a response frame, waits until all of it has
//! arrived, then copies it out and consumes it:
//!
//! ```text
//! offset  0      1      2       3 ........ 12   13     14
//!       ┌──────┬──────┬──────┬─────────────────┬──────┬──────────┐
//!       │ 0xBB │ node │ 0x12 │ payload (10B)   │ type │ checksum │
//!       └──────┴──────┴──────┴─────────────────┴──────┴──────────┘
//! ```
//!
//! # Transmit path
//!
//! Commands are encoded by the [`FrameBuilder`] as
//!
//! ```text
//! ┌────────┬──────┬─────────┬────────┬──────────┬──────────────────┐
//! │ HEADER │ NODE │ COMMAND │ LENGTH │ CHECKSUM │ PAYLOAD (LENGTH) │
//! │ 0xBB   │ 1B   │ 1B      │ 1B     │ 1B       │ 0–32B            │
//! └────────┴──────┴─────────┴────────┴──────────┴──────────────────┘
//! ```
//!
//! with the checksum computed over NODE, COMMAND, LENGTH and PAYLOAD by the
//! configured [`Checksum`] strategy.

#![no_std]
#![deny(unsafe_code)]

pub mod checksum;
pub mod frame;
pub mod messages;
pub mod packet;
pub mod parser;
pub mod ring;
pub mod spsc;

pub use checksum::Checksum;
pub use frame::{Frame, FRAME_HEADER, FRAME_LEN, FRAME_MARKER};
pub use messages::Command;
pub use packet::{
    FrameBuilder, OutboundPacket, PacketError, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE, PACKET_HEADER,
};
pub use parser::{FrameParser, ParseOutcome, ParserConfig, ParserStats};
pub use ring::{RingBuffer, RingError, RxWindow};
pub use spsc::{RxConsumer, RxProducer, SharedRing};
