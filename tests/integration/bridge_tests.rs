//! Front-end view of the protocol bridge: raw PDUs in, raw PDUs out,
//! with the expander mock standing in for the I2C bus.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use kcbridge::config::BridgeConfig;
use kcbridge::io::SharedIo;
use kcbridge::io::analog::AnalogCache;
use kcbridge::io::expander::ExpanderBank;
use kcbridge::io::registers::VirtualRegisters;
use kcbridge::modbus::server::{FrontEnd, ModbusServer};

use crate::mock_hw::{MockExpanderBus, MockSampler};

pub type TestIo = SharedIo<CriticalSectionRawMutex, MockExpanderBus, MockSampler>;

/// Default board: inputs 0x22/0x21, outputs 0x24/0x25, 4 analog, 64 registers.
pub fn board() -> (TestIo, MockExpanderBus, MockSampler) {
    let config = BridgeConfig::default();
    let bus = MockExpanderBus::new();
    let sampler = MockSampler::default();
    let io = SharedIo::new(
        ExpanderBank::new(bus.clone(), &config.expander),
        AnalogCache::new(sampler.clone(), &config.analog),
        VirtualRegisters::new(usize::from(config.registers.holding_count)),
    );
    (io, bus, sampler)
}

fn ask(server: &ModbusServer<'_, CriticalSectionRawMutex, MockExpanderBus, MockSampler>, pdu: &[u8]) -> Vec<u8> {
    server
        .handle_pdu(FrontEnd::Tcp, 1, pdu)
        .expect("unit 1 always gets a reply")
        .to_vec()
}

#[test]
fn single_coil_write_reaches_hardware_immediately() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);

    // coil 9 = output block 1 (0x25), bit 1
    let reply = ask(&server, &[0x05, 0x00, 0x09, 0xFF, 0x00]);
    assert_eq!(reply, [0x05, 0x00, 0x09, 0xFF, 0x00]);
    assert_eq!(bus.port(0x25), Some(0xFF));

    ask(&server, &[0x05, 0x00, 0x09, 0x00, 0x00]);
    assert_eq!(bus.port(0x25), Some(0b1111_1101));
    assert_eq!(bus.port(0x24), Some(0xFF));

    // read back coils 8..16
    let reply = ask(&server, &[0x01, 0x00, 0x08, 0x00, 0x08]);
    assert_eq!(reply, [0x01, 0x01, 0b1111_1101]);
}

#[test]
fn discrete_inputs_follow_last_refresh() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);

    bus.set_port(0x22, 0b1010_0101);
    bus.set_port(0x21, 0x0F);
    io.with_expander(|bank| bank.refresh_inputs(0));

    let reply = ask(&server, &[0x02, 0x00, 0x00, 0x00, 0x10]);
    assert_eq!(reply, [0x02, 0x02, 0b1010_0101, 0x0F]);

    // hardware changes are invisible until the next refresh
    bus.set_port(0x22, 0x00);
    let reply = ask(&server, &[0x02, 0x00, 0x00, 0x00, 0x08]);
    assert_eq!(reply, [0x02, 0x01, 0b1010_0101]);
}

#[test]
fn multi_coil_write_spans_blocks() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);
    bus.clear_ops();

    // 10 coils from 4: bits 4..14 cleared
    let reply = ask(&server, &[0x0F, 0x00, 0x04, 0x00, 0x0A, 0x02, 0x00, 0x00]);
    assert_eq!(reply, [0x0F, 0x00, 0x04, 0x00, 0x0A]);
    assert_eq!(bus.port(0x24), Some(0x0F));
    assert_eq!(bus.port(0x25), Some(0b1100_0000));
    assert_eq!(bus.writes_to(0x24).len(), 1);
    assert_eq!(bus.writes_to(0x25).len(), 1);
}

#[test]
fn exceptions_leave_stores_untouched() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);
    bus.clear_ops();

    // coil 16 is past the 16 output bits
    assert_eq!(ask(&server, &[0x05, 0x00, 0x10, 0xFF, 0x00]), [0x85, 0x02]);
    // bad coil value
    assert_eq!(ask(&server, &[0x05, 0x00, 0x00, 0x12, 0x34]), [0x85, 0x03]);
    // 9 coils but only one payload byte
    assert_eq!(ask(&server, &[0x0F, 0x00, 0x00, 0x00, 0x09, 0x01, 0x00]), [0x8F, 0x03]);
    assert!(bus.ops().is_empty());

    // registers 60..70 overrun the 64-register space
    let mut pdu = vec![0x10, 0x00, 60, 0x00, 10, 20];
    pdu.extend_from_slice(&[0xAB; 20]);
    assert_eq!(ask(&server, &pdu), [0x90, 0x02]);
    assert_eq!(ask(&server, &[0x03, 0x00, 60, 0x00, 4]), [0x03, 8, 0, 0, 0, 0, 0, 0, 0, 0]);

    // unknown function
    assert_eq!(ask(&server, &[0x2B, 0x0E, 0x01]), [0xAB, 0x01]);
}

#[test]
fn holding_registers_round_trip_big_endian() {
    let (io, _, _) = board();
    let server = ModbusServer::new(&io, 1);

    let reply = ask(&server, &[0x10, 0x00, 0x02, 0x00, 0x02, 0x04, 0x12, 0x34, 0xAB, 0xCD]);
    assert_eq!(reply, [0x10, 0x00, 0x02, 0x00, 0x02]);
    assert_eq!(ask(&server, &[0x06, 0x00, 0x05, 0x00, 0x07]), [0x06, 0x00, 0x05, 0x00, 0x07]);

    let reply = ask(&server, &[0x03, 0x00, 0x02, 0x00, 0x04]);
    assert_eq!(reply, [0x03, 0x08, 0x12, 0x34, 0xAB, 0xCD, 0x00, 0x00, 0x00, 0x07]);
}

#[test]
fn input_registers_serve_cached_samples() {
    let (io, _, sampler) = board();
    let server = ModbusServer::new(&io, 1);

    sampler.set(0, 4095);
    sampler.set(3, 0x0102);
    // cache is empty until the driver refreshes it
    assert_eq!(ask(&server, &[0x04, 0x00, 0x00, 0x00, 0x01]), [0x04, 0x02, 0x00, 0x00]);

    io.with_analog(|cache| cache.refresh(0));
    let reply = ask(&server, &[0x04, 0x00, 0x00, 0x00, 0x04]);
    assert_eq!(reply, [0x04, 0x08, 0x0F, 0xFF, 0, 0, 0, 0, 0x01, 0x02]);
    assert_eq!(ask(&server, &[0x04, 0x00, 0x03, 0x00, 0x02]), [0x84, 0x02]);
}

#[test]
fn unit_filtering_and_broadcast() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);

    assert!(server.handle_pdu(FrontEnd::Rtu, 7, &[0x05, 0x00, 0x00, 0x00, 0x00]).is_none());
    assert_eq!(bus.port(0x24), None);

    // broadcast write executes silently
    assert!(server.handle_pdu(FrontEnd::Rtu, 0, &[0x05, 0x00, 0x00, 0x00, 0x00]).is_none());
    assert_eq!(bus.port(0x24), Some(0xFE));

    // broadcast read is dropped
    assert!(server.handle_pdu(FrontEnd::Rtu, 0, &[0x01, 0x00, 0x00, 0x00, 0x01]).is_none());
}

#[test]
fn offline_output_block_keeps_cache() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);
    bus.set_offline(0x25, true);

    // the write succeeds at protocol level; the failure is only counted
    assert_eq!(ask(&server, &[0x05, 0x00, 0x08, 0x00, 0x00]), [0x05, 0x00, 0x08, 0x00, 0x00]);
    assert_eq!(ask(&server, &[0x01, 0x00, 0x08, 0x00, 0x01]), [0x01, 0x01, 0x00]);

    bus.set_offline(0x25, false);
    io.with_expander(|bank| bank.flush_outputs());
    assert_eq!(bus.port(0x25), Some(0xFE));
}
