//! Modbus protocol bridge.
//!
//! Maps the four Modbus object spaces onto the shared I/O stores:
//! coils → expander outputs, discrete inputs → expander inputs,
//! holding registers → virtual registers, input registers → analog cache.
//! Transport framing and CRC belong to the front ends, not to this module.

pub mod bridge;
pub mod channels;
pub mod pdu;
pub mod server;
