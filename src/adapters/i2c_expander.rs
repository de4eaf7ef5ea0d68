//! PCF8574 expander bus over any `embedded-hal` 1.0 I2C master.
//!
//! The PCF8574 has no registers: a one-byte write sets the quasi-bidirectional
//! port, a one-byte read samples it. Bits written high act as inputs.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::debug;

use crate::app::ports::ExpanderBus;
use crate::error::BusError;

pub struct I2cExpanderBus<I> {
    i2c: I,
}

impl<I: I2c> I2cExpanderBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

fn classify(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss,
        ErrorKind::Bus => BusError::Bus,
        _ => BusError::Other,
    }
}

impl<I: I2c> ExpanderBus for I2cExpanderBus<I> {
    fn write(&mut self, address: u8, byte: u8) -> Result<(), BusError> {
        self.i2c.write(address, &[byte]).map_err(|e| {
            debug!("i2c write 0x{:02X} failed: {:?}", address, e.kind());
            classify(e.kind())
        })
    }

    fn read(&mut self, address: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.i2c.read(address, &mut buf).map_err(|e| {
            debug!("i2c read 0x{:02X} failed: {:?}", address, e.kind());
            classify(e.kind())
        })?;
        Ok(buf[0])
    }
}
