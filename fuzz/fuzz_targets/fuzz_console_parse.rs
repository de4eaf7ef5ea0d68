//! Fuzz target: console line editing and command parsing.
//!
//! Bytes are fed through `LineReader` exactly as the UART loop does; every
//! completed line goes to `parse_command`. Neither may panic and no line may
//! exceed `MAX_LINE`.
//!
//! cargo fuzz run fuzz_console_parse

#![no_main]

use libfuzzer_sys::fuzz_target;

use kcbridge::console::{CharCase, LineReader, MAX_LINE, parse_command};

fuzz_target!(|data: &[u8]| {
    let mut reader = LineReader::new(CharCase::Lower, true);
    let mut echo = String::new();
    for &byte in data {
        if let Some(line) = reader.feed(byte, &mut echo) {
            assert!(line.len() <= MAX_LINE);
            let _ = parse_command(&line);
        }
        assert!(reader.pending().len() <= MAX_LINE);
    }

    // parse the raw bytes directly as well when they are valid UTF-8
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_command(text);
    }
});
