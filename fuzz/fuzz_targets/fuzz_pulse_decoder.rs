//! Fuzz target: `PulseDecoder::on_edge`
//!
//! Each 2-byte chunk is one edge duration (scaled so separation gaps show up
//! often). The decoder must never panic, and anything it reports has a known
//! protocol, a sane bit length and raw timings within capacity.
//!
//! cargo fuzz run fuzz_pulse_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;

use kcbridge::app::ports::RadioReceiver;
use kcbridge::radio::RAW_CAPACITY;
use kcbridge::radio::decoder::{PROTOCOLS, PulseDecoder};

fuzz_target!(|data: &[u8]| {
    let mut decoder = PulseDecoder::new();
    for chunk in data.chunks_exact(2) {
        let duration = u32::from(u16::from_le_bytes([chunk[0], chunk[1]])) / 4;
        decoder.on_edge(duration);

        if decoder.available() {
            let got = decoder.received();
            assert!((1..=PROTOCOLS.len() as u8).contains(&got.protocol));
            assert!(usize::from(got.bit_length) * 2 < RAW_CAPACITY);
            assert!(got.raw.len() <= RAW_CAPACITY);
            decoder.reset_available();
        }
    }
});
