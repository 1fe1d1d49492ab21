//! Fuzz target: SSE bytes → `LineBuffer` → `SseParser` → `decode`
//!
//! Drives arbitrary byte sequences through the whole RTDB event pipeline
//! and asserts that it never panics, never yields a line above the cap,
//! and accepts bytes cleanly again after a reset.
//!
//! cargo fuzz run fuzz_sse_stream

#![no_main]

use cathome::adapters::rtdb::sse::{self, Line, LineBuffer, MAX_LINE_LEN, SseParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut lines = LineBuffer::new();
    let mut parser = SseParser::new();

    // Split at an input-chosen point so partial lines across reads are hit.
    let cut = data.first().map_or(0, |b| *b as usize).min(data.len());
    for chunk in [&data[..cut], &data[cut..]] {
        lines.push(chunk, |line| {
            let Line::Text(text) = line else { return };
            assert!(text.chars().count() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            if let Some(frame) = parser.push_line(&text) {
                assert!(frame.data.len() <= MAX_LINE_LEN, "payload exceeds cap");
                let _ = sse::decode(&frame);
            }
        });
    }

    lines.reset();
    parser.reset();
    lines.push(data, |_| {});
});
