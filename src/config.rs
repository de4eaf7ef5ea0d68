//! Bridge configuration parameters
//!
//! All tunable parameters for the KC868 bridge.
//! Values can be overridden via NVS (non-volatile storage) or the serial console.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::radio::decoder::PROTOCOLS;

/// Maximum number of 8-bit expander blocks per direction.
pub const MAX_BLOCKS: usize = 8;
/// Maximum number of analog channels sampled into the cache: one per
/// wired ADC1 terminal.
pub const MAX_ANALOG_CHANNELS: usize = crate::pins::ANALOG_ADC1_CHANNELS.len();
/// Maximum number of virtual holding registers.
pub const MAX_HOLDING_REGISTERS: usize = 256;

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub expander: ExpanderConfig,
    pub analog: AnalogConfig,
    pub registers: RegisterConfig,
    pub modbus: ModbusConfig,
    pub network: NetworkConfig,
    pub radio: RadioConfig,
}

/// PCF8574 expander layout. Block order defines the linear bit index space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpanderConfig {
    /// 7-bit I2C addresses of the input blocks, in bit-index order
    pub input_addresses: Vec<u8, MAX_BLOCKS>,
    /// 7-bit I2C addresses of the output blocks, in bit-index order
    pub output_addresses: Vec<u8, MAX_BLOCKS>,
    /// Minimum interval between two input refreshes (milliseconds)
    pub refresh_interval_ms: u32,
    /// Copy every completed input refresh onto the outputs
    pub mirror_inputs: bool,
    /// Interval of the H/L input level report (milliseconds, 0 = off)
    pub status_report_interval_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogConfig {
    /// Number of physical analog channels
    pub channels: u8,
    /// Sampling interval (milliseconds)
    pub refresh_interval_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Number of virtual holding registers
    pub holding_count: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Modbus unit (slave) identifier answered by both front ends
    pub unit_id: u8,
    /// Listening port of the socket front end
    pub tcp_port: u16,
    /// Line speed of the serial front end
    pub rtu_baud: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub hostname: heapless::String<32>,
    pub ip: [u8; 4],
    pub gateway: [u8; 4],
    pub netmask: [u8; 4],
    pub dns: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Silence after the last sighting before a release is reported (milliseconds)
    pub release_timeout_ms: u32,
    /// Parameters used by the transmit path
    pub tx: RadioTxParams,
    /// Include the raw timing buffer in receive reports
    pub print_raw: bool,
}

/// Transmit parameters for one radio code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioTxParams {
    /// Number of code bits sent, MSB first
    pub bit_size: u8,
    /// Base pulse length in microseconds
    pub pulse_length_us: u16,
    /// Protocol number (1-based index into the protocol table)
    pub protocol: u8,
    /// How many times the code is repeated
    pub repeat: u8,
}

impl Default for RadioTxParams {
    fn default() -> Self {
        Self {
            bit_size: 24,
            pulse_length_us: 300,
            protocol: 1,
            repeat: 10,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut hostname = heapless::String::new();
        let _ = hostname.push_str("esp32-ethernet");

        Self {
            expander: ExpanderConfig {
                input_addresses: Vec::from_slice(&[0x22, 0x21]).unwrap_or_default(),
                output_addresses: Vec::from_slice(&[0x24, 0x25]).unwrap_or_default(),
                refresh_interval_ms: 50,
                mirror_inputs: false,
                status_report_interval_ms: 1000,
            },
            analog: AnalogConfig {
                channels: 4,
                refresh_interval_ms: 100,
            },
            registers: RegisterConfig { holding_count: 64 },
            modbus: ModbusConfig {
                unit_id: 1,
                tcp_port: 502,
                rtu_baud: 9600,
            },
            network: NetworkConfig {
                hostname,
                ip: [192, 168, 1, 110],
                gateway: [192, 168, 1, 1],
                netmask: [255, 255, 255, 0],
                dns: [8, 8, 8, 8],
            },
            radio: RadioConfig {
                release_timeout_ms: 200,
                tx: RadioTxParams::default(),
                print_raw: false,
            },
        }
    }
}

impl RadioTxParams {
    /// Range-check every field. Used by the config validator and the console.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=32).contains(&self.bit_size) {
            return Err("radio bit_size must be 1–32");
        }
        if self.pulse_length_us == 0 {
            return Err("radio pulse_length_us must be non-zero");
        }
        if self.protocol == 0 || usize::from(self.protocol) > PROTOCOLS.len() {
            return Err("radio protocol is not in the protocol table");
        }
        if !(1..=100).contains(&self.repeat) {
            return Err("radio repeat must be 1–100");
        }
        Ok(())
    }
}

impl BridgeConfig {
    /// Validate every field. Invalid ranges are rejected, never clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        let exp = &self.expander;
        if exp.input_addresses.is_empty() || exp.output_addresses.is_empty() {
            return Err("expander needs at least one input and one output block");
        }
        let all = exp.input_addresses.iter().chain(exp.output_addresses.iter());
        for (i, addr) in all.clone().enumerate() {
            if *addr > 0x7F {
                return Err("expander address must be a 7-bit I2C address");
            }
            if all.clone().skip(i + 1).any(|other| other == addr) {
                return Err("expander addresses must be unique");
            }
        }
        if exp.refresh_interval_ms == 0 {
            return Err("expander refresh_interval_ms must be non-zero");
        }
        if exp.mirror_inputs && exp.input_addresses.len() != exp.output_addresses.len() {
            return Err("mirror_inputs requires as many input blocks as output blocks");
        }

        if usize::from(self.analog.channels) > MAX_ANALOG_CHANNELS {
            return Err("analog channels exceed the wired ADC inputs");
        }
        if self.analog.refresh_interval_ms == 0 {
            return Err("analog refresh_interval_ms must be non-zero");
        }

        if self.registers.holding_count == 0
            || usize::from(self.registers.holding_count) > MAX_HOLDING_REGISTERS
        {
            return Err("holding_count must be 1–256");
        }

        if !(1..=247).contains(&self.modbus.unit_id) {
            return Err("modbus unit_id must be 1–247");
        }

        if self.radio.release_timeout_ms == 0 {
            return Err("radio release_timeout_ms must be non-zero");
        }
        self.radio.tx.validate()
    }
}
