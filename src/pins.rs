//! GPIO / peripheral pin assignments for the KC868 controller board.
//!
//! Every adapter references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// I2C bus to the PCF8574 expanders
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 4;
pub const I2C_SCL_GPIO: i32 = 5;
/// Standard-mode clock; the expanders are specified to 100 kHz.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Analog terminals (ADC1)
// ---------------------------------------------------------------------------

/// ADC1 channel per analog terminal, A1 first (GPIO 36, 39, 34, 35).
pub const ANALOG_ADC1_CHANNELS: [u32; 4] = [0, 3, 6, 7];

// ---------------------------------------------------------------------------
// 433 MHz radio modules
// ---------------------------------------------------------------------------

/// Receiver data output.
pub const RF_RX_GPIO: i32 = 2;
/// Transmitter data input.
pub const RF_TX_GPIO: i32 = 15;
