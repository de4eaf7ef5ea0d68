//! Outbound application events.
//!
//! The [`BridgeService`](super::service::BridgeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to serial, forward to a host, etc.

use crate::config::RadioTxParams;
use crate::io::expander::LevelString;
use crate::radio::{RadioDecode, RadioPacket};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The I/O bank came up; `failures` counts failed transfers during begin.
    Started {
        input_bits: usize,
        output_bits: usize,
        failures: u32,
    },

    /// Periodic H/L snapshot of every input bit, bit 0 first.
    InputLevels(LevelString),

    /// The inputs changed and were copied onto the outputs.
    OutputsMirrored { failures: u32 },

    /// A new remote button press.
    RadioPressed { decode: RadioDecode, show_raw: bool },

    /// The tracked press ended.
    RadioReleased(RadioPacket),

    /// A code was sent.
    Transmitted { code: u32, params: RadioTxParams },

    /// The live configuration was changed (not yet persisted).
    ConfigChanged,

    /// The configuration was written to NVS.
    ConfigSaved,

    /// Free-form console output (config dump, help text, errors).
    ConsoleReply(std::string::String),
}
