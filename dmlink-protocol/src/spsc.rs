//! Single-producer / single-consumer receive ring
//!
//! The UART receive path (interrupt or its own task) owns the
//! [`RxProducer`]; the code polling the [`crate::FrameParser`] owns the
//! [`RxConsumer`]. Neither side ever blocks.
//!
//! Cursors are free-running counters kept modulo `2 * N`, so a full ring
//! (`head - tail == N`) and an empty ring (`head == tail`) are told apart
//! without a flag shared by both sides. The producer stores the byte before
//! publishing `head` with release ordering, and the consumer acquires `head`
//! before reading slots, so a published index always refers to a stored
//! byte. The consumer publishes `tail` with release ordering only after it
//! has finished reading the slots it gives back.

use portable_atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::frame::FRAME_LEN;
use crate::ring::{RingError, RxWindow};

/// Receive ring shared between one producer and one consumer
///
/// Create it in a `static` (or `StaticCell`) and [`split`](Self::split) it
/// once at startup.
pub struct SharedRing<const N: usize> {
    slots: [AtomicU8; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    overflows: AtomicU32,
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SharedRing<N> {
    const CAPACITY_CHECK: () = assert!(N >= FRAME_LEN, "receive ring must hold a whole frame");

    /// Create an empty ring
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;
        Self {
            slots: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflows: AtomicU32::new(0),
        }
    }

    /// Split into the producer and consumer handles
    ///
    /// The exclusive borrow guarantees there is exactly one of each.
    pub fn split(&mut self) -> (RxProducer<'_, N>, RxConsumer<'_, N>) {
        let ring: &Self = self;
        (RxProducer { ring }, RxConsumer { ring })
    }

    /// Advance a cursor counter by `n` (n <= N)
    fn advance(counter: usize, n: usize) -> usize {
        (counter + n) % (2 * N)
    }

    /// Storage slot addressed by a cursor counter
    fn slot(counter: usize) -> usize {
        if counter >= N {
            counter - N
        } else {
            counter
        }
    }

    /// Number of bytes between two cursor counters
    fn distance(head: usize, tail: usize) -> usize {
        if head >= tail {
            head - tail
        } else {
            head + 2 * N - tail
        }
    }

    fn snapshot_len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail)
    }
}

/// Write half of a [`SharedRing`]
///
/// This is the `byte_received` entry point for the UART driver.
pub struct RxProducer<'a, const N: usize> {
    ring: &'a SharedRing<N>,
}

impl<'a, const N: usize> RxProducer<'a, N> {
    /// Store one received byte
    ///
    /// Fails with [`RingError::Overflow`] if the ring is full; the byte is
    /// dropped and the overflow counter is incremented.
    pub fn write(&mut self, byte: u8) -> Result<(), RingError> {
        let ring = self.ring;
        // Only this handle moves head
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);

        if SharedRing::<N>::distance(head, tail) == N {
            ring.overflows.fetch_add(1, Ordering::Relaxed);
            return Err(RingError::Overflow);
        }

        ring.slots[SharedRing::<N>::slot(head)].store(byte, Ordering::Relaxed);
        ring.head
            .store(SharedRing::<N>::advance(head, 1), Ordering::Release);
        Ok(())
    }

    /// Store as many bytes as fit, returning how many were stored
    pub fn write_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.write(b).is_ok()).count()
    }

    pub fn is_full(&self) -> bool {
        self.ring.snapshot_len() == N
    }

    /// Number of writes rejected because the ring was full
    pub fn overflow_count(&self) -> u32 {
        self.ring.overflows.load(Ordering::Relaxed)
    }
}

/// Read half of a [`SharedRing`]
pub struct RxConsumer<'a, const N: usize> {
    ring: &'a SharedRing<N>,
}

impl<'a, const N: usize> RxConsumer<'a, N> {
    /// Slot index of the next write
    pub fn head(&self) -> usize {
        SharedRing::<N>::slot(self.ring.head.load(Ordering::Acquire))
    }

    /// Slot index of the oldest unread byte
    pub fn tail(&self) -> usize {
        SharedRing::<N>::slot(self.ring.tail.load(Ordering::Relaxed))
    }

    pub fn is_full(&self) -> bool {
        self.available() == N
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Number of writes rejected because the ring was full
    pub fn overflow_count(&self) -> u32 {
        self.ring.overflows.load(Ordering::Relaxed)
    }
}

impl<'a, const N: usize> RxWindow for RxConsumer<'a, N> {
    fn capacity(&self) -> usize {
        N
    }

    fn available(&self) -> usize {
        // Only this handle moves tail
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        SharedRing::<N>::distance(head, tail)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        let tail = SharedRing::<N>::slot(self.ring.tail.load(Ordering::Relaxed));
        self.ring.slots[(tail + offset) % N].load(Ordering::Relaxed)
    }

    fn consume(&mut self, n: usize) -> Result<(), RingError> {
        if n > self.available() {
            return Err(RingError::Underflow);
        }

        let tail = self.ring.tail.load(Ordering::Relaxed);
        self.ring
            .tail
            .store(SharedRing::<N>::advance(tail, n), Ordering::Release);
        Ok(())
    }
}
