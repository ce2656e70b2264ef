//! Frame extraction from a receive ring
//!
//! The parser is polled; it never waits for data. Each call either commits
//! one consume (a whole frame plus the garbage in front of it) or leaves the
//! ring untouched.

use crate::checksum::Checksum;
use crate::frame::{Frame, FRAME_HEADER, FRAME_LEN, FRAME_MARKER, MARKER_OFFSET};
use crate::ring::{RingError, RxWindow};

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseOutcome<T> {
    /// A complete frame was extracted and consumed
    Found(T),
    /// A frame start is buffered but the rest has not arrived yet
    NotReady,
    /// No frame start in the unread bytes
    NotFound,
    /// A candidate failed checksum validation; its header byte and any
    /// garbage before it were discarded
    Rejected,
}

impl<T> ParseOutcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Found(value) => ParseOutcome::Found(f(value)),
            ParseOutcome::NotReady => ParseOutcome::NotReady,
            ParseOutcome::NotFound => ParseOutcome::NotFound,
            ParseOutcome::Rejected => ParseOutcome::Rejected,
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            ParseOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ParseOutcome::Found(_))
    }
}

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserConfig {
    /// Verify offset 14 against offsets 1..=13 before accepting a frame
    pub validate_checksum: Option<Checksum>,
}

/// Running counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserStats {
    /// Frames extracted
    pub frames: u32,
    /// Bytes discarded in front of extracted or rejected frames
    pub garbage_bytes: u32,
    /// Candidates that failed checksum validation
    pub rejected: u32,
    /// Bytes discarded by [`FrameParser::resync`]
    pub resynced_bytes: u32,
}

/// Where the first frame start sits relative to the tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Header and marker both present at this offset
    Candidate(usize),
    /// Header present at this offset, marker byte not received yet
    Pending(usize),
    /// No possible frame start
    Nothing,
}

/// Locate the earliest frame start among the first `available` bytes
fn scan<W: RxWindow + ?Sized>(window: &W, available: usize) -> Scan {
    let limit = available.min(window.capacity());

    for offset in 0..limit {
        if window.peek_at(offset) != FRAME_HEADER {
            continue;
        }
        if offset + MARKER_OFFSET >= available {
            return Scan::Pending(offset);
        }
        if window.peek_at(offset + MARKER_OFFSET) == FRAME_MARKER {
            return Scan::Candidate(offset);
        }
    }

    Scan::Nothing
}

/// Polled frame parser
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    config: ParserConfig,
    stats: ParserStats,
}

impl FrameParser {
    /// Create a parser that accepts frames without checksum validation
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            stats: ParserStats::default(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Poll for the next frame and report its classification byte
    pub fn try_parse_frame<W: RxWindow + ?Sized>(
        &mut self,
        window: &mut W,
    ) -> Result<ParseOutcome<u8>, RingError> {
        Ok(self.try_take_frame(window)?.map(|frame| frame.kind()))
    }

    /// Poll for the next frame
    ///
    /// The earliest frame start wins. Completeness is judged by the number
    /// of unread bytes, never by comparing raw cursor positions, so a frame
    /// stored across the end of the ring is handled like any other.
    ///
    /// `Err` is only returned if the ring refuses a consume the parser has
    /// already proven to be in range, i.e. the ring is broken.
    pub fn try_take_frame<W: RxWindow + ?Sized>(
        &mut self,
        window: &mut W,
    ) -> Result<ParseOutcome<Frame>, RingError> {
        let available = window.available();

        let offset = match scan(window, available) {
            Scan::Candidate(offset) => offset,
            Scan::Pending(_) => return Ok(ParseOutcome::NotReady),
            Scan::Nothing => return Ok(ParseOutcome::NotFound),
        };

        let needed = offset + FRAME_LEN;
        if available < needed {
            return Ok(ParseOutcome::NotReady);
        }

        let mut bytes = [0u8; FRAME_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = window.peek_at(offset + i);
        }
        let frame = Frame::from_bytes(bytes);

        if let Some(checksum) = self.config.validate_checksum {
            if !frame.checksum_matches(checksum) {
                window.consume(offset + 1)?;
                self.stats.rejected = self.stats.rejected.saturating_add(1);
                self.stats.garbage_bytes = self.stats.garbage_bytes.saturating_add(offset as u32);
                return Ok(ParseOutcome::Rejected);
            }
        }

        window.consume(needed)?;
        self.stats.frames = self.stats.frames.saturating_add(1);
        self.stats.garbage_bytes = self.stats.garbage_bytes.saturating_add(offset as u32);
        Ok(ParseOutcome::Found(frame))
    }

    /// Discard bytes that cannot be part of a frame
    ///
    /// Drops everything in front of the earliest possible frame start, or
    /// all unread bytes when there is none. A saturated ring whose only
    /// candidate cannot complete makes no progress through polling alone;
    /// this is the way out. Returns the number of bytes discarded.
    pub fn resync<W: RxWindow + ?Sized>(&mut self, window: &mut W) -> Result<usize, RingError> {
        let available = window.available();
        let discard = match scan(window, available) {
            Scan::Candidate(offset) | Scan::Pending(offset) => offset,
            Scan::Nothing => available,
        };

        window.consume(discard)?;
        self.stats.resynced_bytes = self.stats.resynced_bytes.saturating_add(discard as u32);
        Ok(discard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PAYLOAD_LEN;
    use crate::ring::RingBuffer;

    fn frame_bytes(kind: u8) -> [u8; FRAME_LEN] {
        *Frame::compose(0x01, &[0x55; PAYLOAD_LEN], kind, Checksum::Xor8).as_bytes()
    }

    #[test]
    fn test_empty_ring_not_found() {
        let mut ring = RingBuffer::<32>::new();
        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotFound));
    }

    #[test]
    fn test_single_frame_found() {
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&frame_bytes(0x1B));

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1B)));
        assert!(ring.is_empty());
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_garbage_before_frame_consumed() {
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&[0x00, 0x12, 0xBB, 0x00, 0x00]);
        ring.write_slice(&frame_bytes(0x1E));

        let mut parser = FrameParser::new();
        let frame = parser.try_take_frame(&mut ring).unwrap().found().unwrap();

        assert_eq!(frame.kind(), 0x1E);
        assert_eq!(frame.as_bytes(), &frame_bytes(0x1E));
        assert!(ring.is_empty());
        assert_eq!(parser.stats().garbage_bytes, 5);
    }

    #[test]
    fn test_earliest_match_wins() {
        // [0x00, 0xBB, 0xFF, 0x12, 12 more, 0xBB, 0xAA, 0x12, 12 more]
        let mut ring = RingBuffer::<64>::new();
        ring.write(0x00).unwrap();
        ring.write_slice(&[0xBB, 0xFF, 0x12]);
        let mut first_rest = [0u8; 12];
        first_rest[10] = 0x42; // offset 13 of the first frame
        ring.write_slice(&first_rest);
        ring.write_slice(&[0xBB, 0xAA, 0x12]);
        let mut second_rest = [0u8; 12];
        second_rest[10] = 0x43;
        ring.write_slice(&second_rest);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x42)));

        // Second candidate left intact
        assert_eq!(ring.available(), FRAME_LEN);
        assert_eq!(ring.peek_at(0), 0xBB);
        assert_eq!(ring.peek_at(1), 0xAA);
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x43)));
    }

    #[test]
    fn test_partial_frame_waits() {
        let bytes = frame_bytes(0x1B);
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&bytes[..10]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotReady));
        assert_eq!(ring.available(), 10);

        ring.write_slice(&bytes[10..]);
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1B)));
    }

    #[test]
    fn test_header_without_marker_yet_is_not_ready() {
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&[0x00, 0xBB, 0x01]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotReady));
        assert_eq!(ring.available(), 3);
    }

    #[test]
    fn test_not_ready_is_idempotent() {
        let bytes = frame_bytes(0x1B);
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&[0x07, 0x07]);
        ring.write_slice(&bytes[..12]);

        let mut parser = FrameParser::new();
        let before = (ring.head(), ring.tail(), ring.is_full());
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotReady));
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotReady));
        assert_eq!((ring.head(), ring.tail(), ring.is_full()), before);
    }

    #[test]
    fn test_garbage_only_not_found_without_consuming() {
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&[0xBB, 0x00, 0x00, 0x11, 0x12, 0x13]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotFound));
        assert_eq!(ring.available(), 6);
    }

    #[test]
    fn test_stale_slots_never_match() {
        let mut ring = RingBuffer::<20>::new();
        // Leave a complete frame image in storage, then consume it
        ring.write_slice(&frame_bytes(0x1B));
        ring.consume(FRAME_LEN).unwrap();
        ring.write_slice(&[0x00, 0x00]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotFound));
    }

    #[test]
    fn test_wraparound_extraction() {
        let bytes = frame_bytes(0x1E);
        let mut ring = RingBuffer::<20>::new();
        ring.write_slice(&[0xEE; 18]);
        ring.consume(10).unwrap();
        ring.consume(8).unwrap();

        // Frame occupies slots 18, 19, 0..=12
        assert_eq!(ring.write_slice(&bytes), FRAME_LEN);
        assert!(ring.head() < ring.tail());

        let mut parser = FrameParser::new();
        let frame = parser.try_take_frame(&mut ring).unwrap().found().unwrap();
        assert_eq!(frame.as_bytes(), &bytes);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_wraparound_with_leading_garbage() {
        let bytes = frame_bytes(0x1B);
        let mut ring = RingBuffer::<20>::new();
        ring.write_slice(&[0xEE; 18]);
        ring.consume(10).unwrap();
        ring.consume(5).unwrap();
        ring.write_slice(&bytes);
        assert_eq!(ring.available(), 18);

        let mut parser = FrameParser::new();
        let frame = parser.try_take_frame(&mut ring).unwrap().found().unwrap();
        assert_eq!(frame.as_bytes(), &bytes);
        assert_eq!(parser.stats().garbage_bytes, 3);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_frame_found() {
        let mut ring = RingBuffer::<15>::new();
        ring.write_slice(&frame_bytes(0x1B));
        assert!(ring.is_full());

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1B)));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_checksum_validation_rejects() {
        let mut bad = frame_bytes(0x1B);
        bad[14] ^= 0xFF;
        let good = frame_bytes(0x1E);

        let mut ring = RingBuffer::<64>::new();
        ring.write(0x00).unwrap();
        ring.write_slice(&bad);
        ring.write_slice(&good);

        let mut parser = FrameParser::with_config(ParserConfig {
            validate_checksum: Some(Checksum::Xor8),
        });

        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Rejected));
        // Garbage and the false header byte are gone, the rest stays
        assert_eq!(ring.available(), 2 * FRAME_LEN - 1);
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1E)));
        assert_eq!(parser.stats().rejected, 1);
    }

    #[test]
    fn test_checksum_not_checked_by_default() {
        let mut bad = frame_bytes(0x1B);
        bad[14] ^= 0xFF;
        let mut ring = RingBuffer::<32>::new();
        ring.write_slice(&bad);

        let mut parser = FrameParser::new();
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1B)));
    }

    #[test]
    fn test_resync_drops_garbage_only() {
        let mut ring = RingBuffer::<20>::new();
        ring.write_slice(&[0x01; 8]);
        ring.write_slice(&frame_bytes(0x1B)[..12]);
        assert!(ring.is_full());

        let mut parser = FrameParser::new();
        // Candidate at offset 8 can never complete in a full ring
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::NotReady));

        assert_eq!(parser.resync(&mut ring), Ok(8));
        assert_eq!(ring.peek_at(0), FRAME_HEADER);
        ring.write_slice(&frame_bytes(0x1B)[12..]);
        assert_eq!(parser.try_parse_frame(&mut ring), Ok(ParseOutcome::Found(0x1B)));
        assert_eq!(parser.stats().resynced_bytes, 8);
    }

    #[test]
    fn test_resync_without_candidate_clears() {
        let mut ring = RingBuffer::<16>::new();
        ring.write_slice(&[0x01; 16]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.resync(&mut ring), Ok(16));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_parse_outcome_map() {
        let outcome: ParseOutcome<u8> = ParseOutcome::Found(3);
        assert_eq!(outcome.map(|v| v * 2), ParseOutcome::Found(6));
        assert_eq!(ParseOutcome::<u8>::NotReady.map(|v| v * 2), ParseOutcome::NotReady);
        assert!(!ParseOutcome::<u8>::NotFound.is_found());
    }
}
