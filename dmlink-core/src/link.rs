//! Link facade
//!
//! Ties the consumer half of the receive ring, the frame parser, the packet
//! builder and a UART transmitter together. The receive side is filled
//! independently through [`pump`] (or by calling [`RxProducer::write`] from
//! the UART interrupt).

use dmlink_hal::{UartRx, UartTx};
use dmlink_protocol::{
    Command, Frame, FrameBuilder, FrameParser, OutboundPacket, PacketError, ParseOutcome,
    ParserStats, RingError, RxConsumer, RxProducer, RxWindow, MAX_PACKET_SIZE,
};

use crate::config::LinkConfig;

/// Errors from link operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The transmitter failed
    Transport(E),
    /// The packet could not be built or encoded
    Packet(PacketError),
    /// The receive ring refused a consume
    Ring(RingError),
}

impl<E> From<PacketError> for LinkError<E> {
    fn from(e: PacketError) -> Self {
        LinkError::Packet(e)
    }
}

impl<E> From<RingError> for LinkError<E> {
    fn from(e: RingError) -> Self {
        LinkError::Ring(e)
    }
}

/// Receive-side counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Parser counters
    pub parser: ParserStats,
    /// Bytes dropped because the ring was full
    pub overflows: u32,
}

/// Serial link to one DM board
pub struct Link<'a, T: UartTx, const N: usize> {
    rx: RxConsumer<'a, N>,
    tx: T,
    parser: FrameParser,
    builder: FrameBuilder,
    node: u8,
    resync_on_full: bool,
}

impl<'a, T: UartTx, const N: usize> Link<'a, T, N> {
    pub fn new(rx: RxConsumer<'a, N>, tx: T, config: &LinkConfig) -> Self {
        Self {
            rx,
            tx,
            parser: FrameParser::with_config(config.parser_config()),
            builder: config.builder(),
            node: config.node_address,
            resync_on_full: config.resync_on_full,
        }
    }

    /// Poll for the next complete frame
    ///
    /// If nothing can be parsed while the ring is saturated, the bytes in
    /// front of the first possible frame start are discarded and the parse
    /// is retried once. Without this a full ring holding no complete frame
    /// would stay full forever.
    pub fn poll(&mut self) -> Result<ParseOutcome<Frame>, RingError> {
        let outcome = self.parser.try_take_frame(&mut self.rx)?;

        match outcome {
            ParseOutcome::NotReady | ParseOutcome::NotFound
                if self.resync_on_full && self.rx.is_full() =>
            {
                if self.parser.resync(&mut self.rx)? == 0 {
                    return Ok(outcome);
                }
                self.parser.try_take_frame(&mut self.rx)
            }
            _ => Ok(outcome),
        }
    }

    /// Poll for the next frame's classification byte
    ///
    /// Never discards anything beyond what the parser itself consumes.
    pub fn try_parse_frame(&mut self) -> Result<ParseOutcome<u8>, RingError> {
        self.parser.try_parse_frame(&mut self.rx)
    }

    /// Build and transmit a command for this link's node
    pub fn send(&mut self, command: &Command) -> Result<(), LinkError<T::Error>> {
        let packet = command.to_packet(&self.builder, self.node)?;
        self.transmit(&packet)
    }

    /// Put an already built packet on the wire
    pub fn transmit(&mut self, packet: &OutboundPacket) -> Result<(), LinkError<T::Error>> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let len = packet.encode(&mut buffer)?;

        self.tx
            .write_blocking(&buffer[..len])
            .map_err(LinkError::Transport)?;
        self.tx.flush().map_err(LinkError::Transport)
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            parser: self.parser.stats(),
            overflows: self.rx.overflow_count(),
        }
    }

    pub fn builder(&self) -> &FrameBuilder {
        &self.builder
    }

    pub fn node(&self) -> u8 {
        self.node
    }

    /// Unread bytes in the receive ring
    pub fn pending(&self) -> usize {
        self.rx.available()
    }

    pub fn transmitter(&mut self) -> &mut T {
        &mut self.tx
    }
}

/// Result of one [`pump`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PumpReport {
    /// Bytes stored in the ring
    pub accepted: usize,
    /// Bytes dropped because the ring was full
    pub dropped: usize,
}

impl PumpReport {
    pub fn total(&self) -> usize {
        self.accepted + self.dropped
    }
}

/// Scratch size for one [`pump`] read
const PUMP_CHUNK: usize = 16;

/// Move every byte the receiver already holds into the ring
///
/// Each byte goes through [`RxProducer::write`], so overflow handling and
/// counting stay in one place. Returns once the receiver reports nothing
/// pending.
pub fn pump<R: UartRx, const N: usize>(
    rx: &mut R,
    producer: &mut RxProducer<'_, N>,
) -> Result<PumpReport, R::Error> {
    let mut report = PumpReport::default();
    let mut chunk = [0u8; PUMP_CHUNK];

    loop {
        let n = rx.read_available(&mut chunk)?;
        if n == 0 {
            return Ok(report);
        }

        for &byte in &chunk[..n] {
            match producer.write(byte) {
                Ok(()) => report.accepted += 1,
                Err(_) => report.dropped += 1,
            }
        }
    }
}
