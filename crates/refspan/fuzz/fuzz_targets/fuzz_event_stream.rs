#![no_main]

//! Fuzz target for NDJSON event decoding
//!
//! Arbitrary bytes must never make the reader panic, and every record it
//! yields must encode back to a line it accepts.

use libfuzzer_sys::fuzz_target;

use refspan::events::{StreamEvent, parse_event, read_events};

fuzz_target!(|data: &[u8]| {
    let events: Vec<StreamEvent> = read_events(data).collect();

    for event in &events {
        let line = serde_json::to_string(event).expect("decoded events encode");
        let again = parse_event(&line).expect("encoded events decode");
        assert_eq!(&again, event);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_event(s);
    }
});
