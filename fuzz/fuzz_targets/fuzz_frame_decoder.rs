//! Fuzz target: `FrameDecoder::decode`
//!
//! Drives arbitrary byte sequences into the streaming unit decoder and
//! asserts that it never panics, never yields an oversized payload, and
//! decodes the same input identically after a reset.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensestack::frame::{FrameDecoder, FrameEvent};
use sensestack::protocol::MAX_FIELD_LENGTH;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    let first: Vec<FrameEvent> = decoder.decode(data).collect();
    for event in &first {
        if let FrameEvent::ChunkBoundary { payload, .. } = event {
            assert!(payload.len() <= MAX_FIELD_LENGTH, "payload exceeds MAX_FIELD_LENGTH");
        }
    }

    // After a reset the decoder must behave exactly as a fresh one.
    decoder.reset();
    let second: Vec<FrameEvent> = decoder.decode(data).collect();
    assert_eq!(first, second);
});
