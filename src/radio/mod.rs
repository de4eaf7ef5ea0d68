//! 433 MHz fixed-code remote support.
//!
//! ```text
//!  RF edges ──▶ PulseDecoder ──▶ RadioReceiver ──▶ RadioDebouncer ──▶ press / release
//!  AppCommand::Transmit ──▶ encoder ──▶ RadioTransmitter ──▶ RF pin
//! ```

pub mod debounce;
pub mod decoder;
pub mod encoder;
pub mod format;

use heapless::Vec;

/// Maximum number of edge timings kept per transmission.
pub const RAW_CAPACITY: usize = 67;

/// Raw edge durations of one transmission, sync gap first (microseconds).
pub type RawTimings = Vec<u32, RAW_CAPACITY>;

/// Everything the receiver knows about one decoded transmission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RadioDecode {
    pub value: u32,
    pub bit_length: u8,
    /// Measured base pulse length (microseconds).
    pub delay_us: u32,
    /// 1-based protocol number; 0 means the decode is malformed.
    pub protocol: u8,
    pub raw: RawTimings,
}

/// Identity of a transmission for debouncing. Two packets are the same
/// press when value and protocol match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioPacket {
    pub value: u32,
    pub protocol: u8,
}

impl RadioDecode {
    /// The debounce identity, or `None` for a malformed decode.
    pub fn packet(&self) -> Option<RadioPacket> {
        (self.protocol != 0).then_some(RadioPacket {
            value: self.value,
            protocol: self.protocol,
        })
    }
}
