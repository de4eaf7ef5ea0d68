//! Unified error types for the KC868 bridge firmware.
//!
//! A single `Error` enum for the failures that reach the operator: startup
//! and configuration. Expander transfer faults have their own [`BusError`],
//! which the I/O bank counts and never escalates. Protocol rejections stay
//! inside the reply as an exception code.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Expander bus errors
// ---------------------------------------------------------------------------

/// Transient failure of one byte transfer on the expander bus.
///
/// These are counted by the I/O bank, never escalated: the cached value
/// stays at the last-known-good state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The addressed device did not acknowledge.
    Nack,
    /// Another master won arbitration.
    ArbitrationLoss,
    /// Bus-level fault (stuck line, timeout).
    Bus,
    /// Any other driver error.
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Bus => write!(f, "bus fault"),
            Self::Other => write!(f, "transfer failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
