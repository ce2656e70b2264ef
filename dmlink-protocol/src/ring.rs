//! Fixed-capacity receive ring
//!
//! [`RingBuffer`] is the single-context form: producer and consumer run on
//! the same thread of execution (host tools, tests, or a poll loop that
//! drains the UART itself). For a producer running in another task or
//! interrupt use [`crate::SharedRing`].

use crate::frame::FRAME_LEN;

/// Ring buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// Write attempted while the ring was full; the byte was dropped
    Overflow,
    /// Consume requested more bytes than are available
    Underflow,
}

/// Read side of a receive ring, as seen by the frame parser
///
/// Offsets are relative to the current tail (oldest unread byte).
pub trait RxWindow {
    /// Total number of byte slots
    fn capacity(&self) -> usize;

    /// Number of unread bytes
    fn available(&self) -> usize;

    /// Read the byte at `(tail + offset) mod capacity` without consuming it
    ///
    /// Only offsets below a previously observed [`RxWindow::available`]
    /// refer to received data.
    fn peek_at(&self, offset: usize) -> u8;

    /// Advance the tail by `n` bytes
    fn consume(&mut self, n: usize) -> Result<(), RingError>;
}

/// Circular byte store with head (write) and tail (read) cursors
///
/// `full` disambiguates `head == tail`. A write to a full ring is rejected
/// before anything is stored, so buffered bytes are never overwritten.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    storage: [u8; N],
    head: usize,
    tail: usize,
    full: bool,
    overflows: u32,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    const CAPACITY_CHECK: () = assert!(N >= FRAME_LEN, "receive ring must hold a whole frame");

    /// Create an empty ring
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;
        Self {
            storage: [0; N],
            head: 0,
            tail: 0,
            full: false,
            overflows: 0,
        }
    }

    /// Append one byte at `head`
    pub fn write(&mut self, byte: u8) -> Result<(), RingError> {
        if self.full {
            self.overflows = self.overflows.saturating_add(1);
            return Err(RingError::Overflow);
        }

        self.storage[self.head] = byte;
        self.head = (self.head + 1) % N;
        self.full = self.head == self.tail;
        Ok(())
    }

    /// Append as many bytes as fit
    ///
    /// Returns the number of bytes stored. Every dropped byte is counted as
    /// an overflow.
    pub fn write_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.write(b).is_ok()).count()
    }

    /// Drop all unread bytes
    pub fn clear(&mut self) {
        self.tail = self.head;
        self.full = false;
    }

    /// Index of the next write slot
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index of the oldest unread slot
    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    /// Number of writes rejected because the ring was full
    pub fn overflow_count(&self) -> u32 {
        self.overflows
    }
}

impl<const N: usize> RxWindow for RingBuffer<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn available(&self) -> usize {
        if self.full {
            N
        } else {
            (self.head + N - self.tail) % N
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.storage[(self.tail + offset) % N]
    }

    fn consume(&mut self, n: usize) -> Result<(), RingError> {
        if n > self.available() {
            return Err(RingError::Underflow);
        }
        if n == 0 {
            return Ok(());
        }

        self.tail = (self.tail + n) % N;
        self.full = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_is_empty() {
        let ring = RingBuffer::<16>::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.available(), 0);
        assert_eq!(ring.capacity(), 16);
    }

    #[test]
    fn test_write_and_peek() {
        let mut ring = RingBuffer::<16>::new();
        ring.write(0x10).unwrap();
        ring.write(0x20).unwrap();

        assert_eq!(ring.available(), 2);
        assert_eq!(ring.peek_at(0), 0x10);
        assert_eq!(ring.peek_at(1), 0x20);
        // Peeking does not consume
        assert_eq!(ring.available(), 2);
    }

    #[test]
    fn test_fill_sets_full() {
        let mut ring = RingBuffer::<16>::new();
        for i in 0..16 {
            ring.write(i).unwrap();
        }
        assert!(ring.is_full());
        assert_eq!(ring.available(), 16);
        assert_eq!(ring.head(), ring.tail());
    }

    #[test]
    fn test_overflow_preserves_contents() {
        let mut ring = RingBuffer::<16>::new();
        for i in 0..16 {
            ring.write(i).unwrap();
        }

        assert_eq!(ring.write(0xEE), Err(RingError::Overflow));
        assert_eq!(ring.write(0xEF), Err(RingError::Overflow));
        assert_eq!(ring.overflow_count(), 2);

        for i in 0..16 {
            assert_eq!(ring.peek_at(i), i as u8);
        }
        assert_eq!(ring.available(), 16);
    }

    #[test]
    fn test_consume_clears_full() {
        let mut ring = RingBuffer::<16>::new();
        for i in 0..16 {
            ring.write(i).unwrap();
        }
        ring.consume(4).unwrap();

        assert!(!ring.is_full());
        assert_eq!(ring.available(), 12);
        assert_eq!(ring.peek_at(0), 4);
    }

    #[test]
    fn test_consume_zero_on_full_ring_keeps_full() {
        let mut ring = RingBuffer::<16>::new();
        for i in 0..16 {
            ring.write(i).unwrap();
        }
        ring.consume(0).unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.available(), 16);
    }

    #[test]
    fn test_underflow_leaves_state() {
        let mut ring = RingBuffer::<16>::new();
        ring.write_slice(&[1, 2, 3]);

        assert_eq!(ring.consume(4), Err(RingError::Underflow));
        assert_eq!(ring.available(), 3);
        assert_eq!(ring.tail(), 0);
    }

    #[test]
    fn test_available_across_wrap() {
        let mut ring = RingBuffer::<16>::new();
        ring.write_slice(&[0; 12]);
        ring.consume(10).unwrap();
        ring.write_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        // head wrapped to 4, tail at 10
        assert_eq!(ring.head(), 4);
        assert_eq!(ring.tail(), 10);
        assert_eq!(ring.available(), 10);
        assert_eq!(ring.peek_at(2), 1);
        assert_eq!(ring.peek_at(9), 8);
    }

    #[test]
    fn test_write_slice_counts_dropped() {
        let mut ring = RingBuffer::<16>::new();
        let stored = ring.write_slice(&[0xAB; 20]);
        assert_eq!(stored, 16);
        assert_eq!(ring.overflow_count(), 4);
    }

    #[test]
    fn test_clear() {
        let mut ring = RingBuffer::<16>::new();
        ring.write_slice(&[0xAB; 16]);
        ring.clear();
        assert!(ring.is_empty());
        ring.write(1).unwrap();
        assert_eq!(ring.available(), 1);
    }
}
