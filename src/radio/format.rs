//! Human-readable reports for received and transmitted codes.
//!
//! ```text
//! Data received <- Dec=11259375, Hex=00ABCDEF, Bin=101010111100110111101111
//! Packet info:     Bit-size=24, Pulse-length=350, Protocol=1
//! Raw data: 10850,1050,350,...
//! ```

use core::fmt::Write as _;

use heapless::String;

use crate::config::RadioTxParams;

use super::RadioDecode;

/// Longest binary rendering (`len` beyond 32 pads with leading zeros).
pub const MAX_BINARY_DIGITS: usize = 64;

pub type Report = std::string::String;

/// `value` as `len` binary digits, MSB first. `len == 0` means all 32 bits;
/// digits above bit 31 render as `0`.
pub fn to_binary(value: u32, len: usize) -> String<MAX_BINARY_DIGITS> {
    let n = if len == 0 { 32 } else { len.min(MAX_BINARY_DIGITS) };
    let mut s = String::new();
    for i in (1..=n).rev() {
        let one = i <= 32 && value & (1 << (i - 1)) != 0;
        let _ = s.push(if one { '1' } else { '0' });
    }
    s
}

/// Report for a press. The raw buffer is included when `raw` is set.
pub fn received_report(decode: &RadioDecode, raw: bool) -> Report {
    let mut out = Report::new();
    let _ = writeln!(
        out,
        "Data received <- Dec={}, Hex={:08X}, Bin={}",
        decode.value,
        decode.value,
        to_binary(decode.value, usize::from(decode.bit_length))
    );
    let _ = write!(
        out,
        "Packet info:     Bit-size={}, Pulse-length={}, Protocol={}",
        decode.bit_length, decode.delay_us, decode.protocol
    );
    if raw {
        let _ = write!(out, "\nRaw data: ");
        let shown = (usize::from(decode.bit_length) * 2 + 1).min(decode.raw.len());
        for (i, t) in decode.raw[..shown].iter().enumerate() {
            if i != 0 {
                out.push(',');
            }
            let _ = write!(out, "{t}");
        }
    }
    out
}

/// Report printed before a transmission.
pub fn transmit_report(code: u32, params: &RadioTxParams) -> Report {
    let mut out = Report::new();
    let _ = writeln!(
        out,
        "Data transmit -> Dec={}, Hex={:08X}, Bin={}",
        code,
        code,
        to_binary(code, usize::from(params.bit_size))
    );
    let _ = write!(
        out,
        "Packet info:     Bit-size={}, Pulse-length={}, Protocol={}, Repeat={}",
        params.bit_size, params.pulse_length_us, params.protocol, params.repeat
    );
    out
}
