//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService / ExpanderBank (domain)
//! ```
//!
//! Driven adapters (expander bus, ADC, radio, event sinks, storage) implement
//! these traits. The domain core consumes them via generics, so the I/O
//! stores, the protocol bridge and the debouncer never touch hardware
//! directly.

use crate::config::{BridgeConfig, RadioTxParams};
use crate::error::BusError;
use crate::radio::RadioDecode;

// ───────────────────────────────────────────────────────────────
// Expander bus (driven adapter: domain ↔ I2C)
// ───────────────────────────────────────────────────────────────

/// Byte transport to the 8-bit I/O expanders.
///
/// Both operations are single bounded transfers. A failure is transient:
/// the caller counts it and keeps its cached value.
pub trait ExpanderBus {
    /// Write one byte to the device at `address`.
    fn write(&mut self, address: u8, byte: u8) -> Result<(), BusError>;

    /// Read one byte from the device at `address`.
    fn read(&mut self, address: u8) -> Result<u8, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Analog sampler (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Infallible analog sampling at this boundary.
pub trait AnalogSampler {
    fn sample(&mut self, channel: usize) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Radio (driven adapters: receiver → domain, domain → transmitter)
// ───────────────────────────────────────────────────────────────

/// A receiver that decodes fixed-code remotes.
///
/// The debouncer checks [`available`](Self::available), takes the decode,
/// then calls [`reset_available`](Self::reset_available) after every
/// consumption.
pub trait RadioReceiver {
    fn available(&self) -> bool;

    /// The most recent decode. Only meaningful while `available()` is true.
    fn received(&self) -> RadioDecode;

    fn reset_available(&mut self);
}

/// Sends one code with the given parameters (blocking, bounded by `repeat`).
pub trait RadioTransmitter {
    fn transmit(&mut self, code: u32, params: &RadioTxParams);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the bridge configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`BridgeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<BridgeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("storage I/O error"),
        }
    }
}
