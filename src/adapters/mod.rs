//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                    |
//! |----------------|--------------------|--------------------------------|
//! | `i2c_expander` | ExpanderBus        | PCF8574 over embedded-hal I2C  |
//! | `hardware`     | AnalogSampler      | ESP32 ADC1 oneshot             |
//! |                |                    | radio receiver edge ISR        |
//! | `radio`        | RadioReceiver      | ISR edge queue + pulse decoder |
//! |                | RadioTransmitter   | GPIO + busy-wait delay         |
//! | `log_sink`     | EventSink          | Serial log output              |
//! | `nvs`          | ConfigPort         | NVS / in-memory store          |
//! | `time`         |                    | ESP32 system timer             |
//!
//! Off target, `hardware`, `nvs` and `time` fall back to host simulations.

pub mod hardware;
pub mod i2c_expander;
pub mod log_sink;
pub mod nvs;
pub mod radio;
pub mod time;
