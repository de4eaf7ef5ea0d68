//! Pulse-train encoder for the transmit path.
//!
//! One repetition is the code's bits MSB first, each as a high/low pair,
//! followed by the protocol's sync pair. Inverted protocols start each
//! pair low.

use heapless::Vec;

use crate::config::RadioTxParams;

use super::decoder::{HighLow, protocol};

/// Two pulses per data bit plus the sync pair.
pub const MAX_FRAME_PULSES: usize = 2 * 32 + 2;

/// One level held for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub level: bool,
    pub duration_us: u32,
}

pub type PulseFrame = Vec<Pulse, MAX_FRAME_PULSES>;

/// Build one repetition of `code`.
///
/// Returns `None` for an unknown protocol or a bit size outside 1..=32.
pub fn encode_frame(code: u32, params: &RadioTxParams) -> Option<PulseFrame> {
    let p = protocol(params.protocol)?;
    if !(1..=32).contains(&params.bit_size) {
        return None;
    }
    let pulse = u32::from(params.pulse_length_us);
    let first_level = !p.inverted;

    let mut frame = PulseFrame::new();
    let mut push_pair = |pair: HighLow| {
        let _ = frame.push(Pulse {
            level: first_level,
            duration_us: pulse * u32::from(pair.high),
        });
        let _ = frame.push(Pulse {
            level: !first_level,
            duration_us: pulse * u32::from(pair.low),
        });
    };

    for bit in (0..params.bit_size).rev() {
        if code & (1 << bit) != 0 {
            push_pair(p.one);
        } else {
            push_pair(p.zero);
        }
    }
    push_pair(p.sync);
    Some(frame)
}
