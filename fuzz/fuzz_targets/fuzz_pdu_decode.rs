//! Fuzz target: request PDUs through the full bridge.
//!
//! Arbitrary bytes go through `ModbusServer::handle_pdu` against an in-memory
//! bank. The server must never panic, every reply must fit a PDU, and an
//! exception reply echoes the function code with the high bit set.
//!
//! cargo fuzz run fuzz_pdu_decode

#![no_main]

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use libfuzzer_sys::fuzz_target;

use kcbridge::app::ports::{AnalogSampler, ExpanderBus};
use kcbridge::config::BridgeConfig;
use kcbridge::error::BusError;
use kcbridge::io::SharedIo;
use kcbridge::io::analog::AnalogCache;
use kcbridge::io::expander::ExpanderBank;
use kcbridge::io::registers::VirtualRegisters;
use kcbridge::modbus::pdu::{MAX_PDU_LEN, Request};
use kcbridge::modbus::server::{FrontEnd, ModbusServer};

struct Loopback([u8; 256]);

impl ExpanderBus for Loopback {
    fn write(&mut self, address: u8, byte: u8) -> Result<(), BusError> {
        self.0[usize::from(address)] = byte;
        Ok(())
    }

    fn read(&mut self, address: u8) -> Result<u8, BusError> {
        Ok(self.0[usize::from(address)])
    }
}

struct Ramp;

impl AnalogSampler for Ramp {
    fn sample(&mut self, channel: usize) -> u16 {
        (channel as u16) * 1000
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&unit, pdu)) = data.split_first() else {
        return;
    };
    if pdu.is_empty() {
        return;
    }
    let config = BridgeConfig::default();
    let io: SharedIo<NoopRawMutex, _, _> = SharedIo::new(
        ExpanderBank::new(Loopback([0xFF; 256]), &config.expander),
        AnalogCache::new(Ramp, &config.analog),
        VirtualRegisters::new(usize::from(config.registers.holding_count)),
    );
    let server = ModbusServer::new(&io, 1);

    let decoded = Request::decode(pdu);
    if let Some(reply) = server.handle_pdu(FrontEnd::Rtu, unit, pdu) {
        assert!(unit == 1, "only the configured unit gets a reply");
        assert!(reply.len() <= MAX_PDU_LEN);
                if reply.len() == 2 {
            assert_eq!(reply[0], pdu[0] | 0x80);
        } else {
            assert!(decoded.is_ok(), "normal reply to an undecodable request");
            assert_eq!(reply[0], pdu[0]);
        }
    }
});
