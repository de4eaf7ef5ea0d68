//! Edge-timing decoder for common fixed-code remotes.
//!
//! Fed with the duration of every level change (microseconds). A gap longer
//! than [`SEPARATION_LIMIT_US`] marks the boundary between two repeats of a
//! transmission; the timings between two similar gaps are decoded against
//! the protocol table on the second repeat.
//!
//! | # | Pulse µs | Sync     | Zero    | One    | Inverted |
//! |---|----------|----------|---------|--------|----------|
//! | 1 | 350      | 1 / 31   | 1 / 3   | 3 / 1  |          |
//! | 2 | 650      | 1 / 10   | 1 / 2   | 2 / 1  |          |
//! | 3 | 100      | 30 / 71  | 4 / 11  | 9 / 6  |          |
//! | 4 | 380      | 1 / 6    | 1 / 3   | 3 / 1  |          |
//! | 5 | 500      | 6 / 14   | 1 / 2   | 2 / 1  |          |
//! | 6 | 450      | 23 / 1   | 1 / 2   | 2 / 1  | yes      |
//! | 7 | 150      | 2 / 62   | 1 / 6   | 6 / 1  |          |

use log::debug;

use crate::app::ports::RadioReceiver;

use super::{RAW_CAPACITY, RadioDecode, RawTimings};

/// Shortest gap treated as the separation between two repeats.
pub const SEPARATION_LIMIT_US: u32 = 4300;

/// Timing tolerance, percent of the measured base pulse.
const RECEIVE_TOLERANCE_PCT: u32 = 60;

/// Two gaps this close belong to the same transmission.
const GAP_MATCH_US: u32 = 200;

/// Transmissions with this many edges or fewer are noise.
const MIN_CHANGES: usize = 7;

/// Pulse counts of one high/low pair, in units of the base pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighLow {
    pub high: u8,
    pub low: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    pub pulse_length_us: u16,
    pub sync: HighLow,
    pub zero: HighLow,
    pub one: HighLow,
    /// Levels are swapped: pairs start low.
    pub inverted: bool,
}

const fn hl(high: u8, low: u8) -> HighLow {
    HighLow { high, low }
}

/// Supported protocols; protocol number `n` is `PROTOCOLS[n - 1]`.
pub const PROTOCOLS: [Protocol; 7] = [
    Protocol { pulse_length_us: 350, sync: hl(1, 31), zero: hl(1, 3), one: hl(3, 1), inverted: false },
    Protocol { pulse_length_us: 650, sync: hl(1, 10), zero: hl(1, 2), one: hl(2, 1), inverted: false },
    Protocol { pulse_length_us: 100, sync: hl(30, 71), zero: hl(4, 11), one: hl(9, 6), inverted: false },
    Protocol { pulse_length_us: 380, sync: hl(1, 6), zero: hl(1, 3), one: hl(3, 1), inverted: false },
    Protocol { pulse_length_us: 500, sync: hl(6, 14), zero: hl(1, 2), one: hl(2, 1), inverted: false },
    Protocol { pulse_length_us: 450, sync: hl(23, 1), zero: hl(1, 2), one: hl(2, 1), inverted: true },
    Protocol { pulse_length_us: 150, sync: hl(2, 62), zero: hl(1, 6), one: hl(6, 1), inverted: false },
];

/// Look up a protocol by its 1-based number.
pub fn protocol(number: u8) -> Option<&'static Protocol> {
    usize::from(number).checked_sub(1).and_then(|i| PROTOCOLS.get(i))
}

pub struct PulseDecoder {
    timings: [u32; RAW_CAPACITY],
    change_count: usize,
    repeat_count: u32,
    decoded: RadioDecode,
    available: bool,
}

impl Default for PulseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseDecoder {
    pub const fn new() -> Self {
        Self {
            timings: [0; RAW_CAPACITY],
            change_count: 0,
            repeat_count: 0,
            decoded: RadioDecode {
                value: 0,
                bit_length: 0,
                delay_us: 0,
                protocol: 0,
                raw: RawTimings::new(),
            },
            available: false,
        }
    }

    /// Record one level change that lasted `duration_us`.
    pub fn on_edge(&mut self, duration_us: u32) {
        if duration_us > SEPARATION_LIMIT_US {
            if self.repeat_count == 0 || self.timings[0].abs_diff(duration_us) < GAP_MATCH_US {
                self.repeat_count += 1;
                if self.repeat_count == 2 {
                    if let Some(decode) = self.decode() {
                        debug!(
                            "radio: decoded {} bits, protocol {}",
                            decode.bit_length, decode.protocol
                        );
                        self.decoded = decode;
                        self.available = true;
                    }
                    self.repeat_count = 0;
                }
            }
            self.change_count = 0;
        }

        if self.change_count >= RAW_CAPACITY {
            self.change_count = 0;
            self.repeat_count = 0;
        }
        self.timings[self.change_count] = duration_us;
        self.change_count += 1;
    }

    fn decode(&self) -> Option<RadioDecode> {
        (1..=PROTOCOLS.len() as u8).find_map(|n| self.decode_protocol(n))
    }

    fn decode_protocol(&self, number: u8) -> Option<RadioDecode> {
        let p = protocol(number)?;
        let changes = self.change_count;
        if changes <= MIN_CHANGES {
            return None;
        }

        let sync_pulses = u32::from(p.sync.high.max(p.sync.low));
        let delay = self.timings[0] / sync_pulses;
        let tolerance = delay.saturating_mul(RECEIVE_TOLERANCE_PCT) / 100;
        let matches =
            |t: u32, pulses: u8| t.abs_diff(delay.saturating_mul(u32::from(pulses))) < tolerance;

        let first = if p.inverted { 2 } else { 1 };
        let mut code: u32 = 0;
        let mut i = first;
        while i + 1 < changes {
            code <<= 1;
            let (high, low) = (self.timings[i], self.timings[i + 1]);
            if matches(high, p.zero.high) && matches(low, p.zero.low) {
                // zero bit
            } else if matches(high, p.one.high) && matches(low, p.one.low) {
                code |= 1;
            } else {
                return None;
            }
            i += 2;
        }

        Some(RadioDecode {
            value: code,
            bit_length: ((changes - 1) / 2) as u8,
            delay_us: delay,
            protocol: number,
            raw: RawTimings::from_slice(&self.timings[..changes]).unwrap_or_default(),
        })
    }
}

impl RadioReceiver for PulseDecoder {
    fn available(&self) -> bool {
        self.available
    }

    fn received(&self) -> RadioDecode {
        self.decoded.clone()
    }

    fn reset_available(&mut self) {
        self.available = false;
    }
}
