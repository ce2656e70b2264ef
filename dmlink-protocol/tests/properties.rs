//! Property tests for the receive ring and frame parser

use dmlink_protocol::frame::PAYLOAD_LEN;
use dmlink_protocol::{
    Checksum, Frame, FrameParser, ParseOutcome, RingBuffer, RxWindow, SharedRing, FRAME_LEN,
};
use proptest::prelude::*;

const CAPACITY: usize = 40;

#[derive(Debug, Clone)]
enum Step {
    /// Push raw bytes (may contain header-like patterns)
    Noise(Vec<u8>),
    /// Push a well-formed frame with the given type byte
    Frame(u8),
    /// Poll the parser once
    Poll,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        prop::collection::vec(prop_oneof![Just(0xBBu8), Just(0x12u8), any::<u8>()], 1..12)
            .prop_map(Step::Noise),
        any::<u8>().prop_map(Step::Frame),
        Just(Step::Poll),
    ]
}

fn frame_bytes(kind: u8) -> [u8; FRAME_LEN] {
    *Frame::compose(0x01, &[0x00; PAYLOAD_LEN], kind, Checksum::Xor8).as_bytes()
}

proptest! {
    /// Bytes leaving the ring never exceed bytes that entered it
    #[test]
    fn no_double_consumption(steps in prop::collection::vec(step(), 1..80)) {
        let mut ring = RingBuffer::<CAPACITY>::new();
        let mut parser = FrameParser::new();
        let mut written = 0usize;
        let mut consumed = 0usize;

        for step in steps {
            match step {
                Step::Noise(bytes) => written += ring.write_slice(&bytes),
                Step::Frame(kind) => written += ring.write_slice(&frame_bytes(kind)),
                Step::Poll => {
                    let before = ring.available();
                    let outcome = parser.try_take_frame(&mut ring).unwrap();
                    let after = ring.available();
                    match outcome {
                        ParseOutcome::Found(frame) => {
                            prop_assert!(frame.is_valid());
                            prop_assert!(before - after >= FRAME_LEN);
                        }
                        _ => prop_assert_eq!(before, after),
                    }
                    consumed += before - after;
                }
            }
            prop_assert!(ring.available() <= CAPACITY);
            prop_assert_eq!(written - consumed, ring.available());
        }
    }

    /// A NotReady poll leaves the cursors bit-identical, and so does a retry
    #[test]
    fn not_ready_is_idempotent(garbage in prop::collection::vec(0u8..0xBB, 0..10), cut in 1usize..FRAME_LEN) {
        let mut ring = RingBuffer::<CAPACITY>::new();
        ring.write_slice(&garbage);
        ring.write_slice(&frame_bytes(0x1B)[..cut]);

        let mut parser = FrameParser::new();
        let before = (ring.head(), ring.tail(), ring.is_full());
        prop_assert_eq!(parser.try_parse_frame(&mut ring).unwrap(), ParseOutcome::NotReady);
        prop_assert_eq!(parser.try_parse_frame(&mut ring).unwrap(), ParseOutcome::NotReady);
        prop_assert_eq!((ring.head(), ring.tail(), ring.is_full()), before);

        ring.write_slice(&frame_bytes(0x1B)[cut..]);
        prop_assert_eq!(parser.try_parse_frame(&mut ring).unwrap(), ParseOutcome::Found(0x1B));
    }

    /// Frames are delivered in order whatever the ring position
    #[test]
    fn frames_in_order_across_wrap(start in 0usize..CAPACITY, kinds in prop::collection::vec(any::<u8>(), 1..6)) {
        let mut ring = SharedRing::<20>::new();
        let (mut tx, mut rx) = ring.split();
        let mut parser = FrameParser::new();

        // Move the cursors to an arbitrary position
        for _ in 0..start {
            tx.write(0x00).unwrap();
            rx.consume(1).unwrap();
        }

        for kind in kinds {
            prop_assert_eq!(tx.write_slice(&frame_bytes(kind)), FRAME_LEN);
            prop_assert_eq!(parser.try_parse_frame(&mut rx).unwrap(), ParseOutcome::Found(kind));
            prop_assert_eq!(rx.available(), 0);
        }
    }
}
