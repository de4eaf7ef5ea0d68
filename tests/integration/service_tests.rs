//! BridgeService driving the mocks through begin, ticks and console lines.

use kcbridge::app::events::AppEvent;
use kcbridge::app::service::BridgeService;
use kcbridge::config::BridgeConfig;
use kcbridge::io::SharedIo;
use kcbridge::io::analog::AnalogCache;
use kcbridge::io::expander::ExpanderBank;
use kcbridge::io::registers::VirtualRegisters;

use crate::bridge_tests::{TestIo, board};
use crate::mock_hw::{
    MockConfigStore, MockExpanderBus, MockReceiver, MockSampler, MockTransmitter, RecordingSink,
};

fn mirroring_board() -> (TestIo, MockExpanderBus, BridgeConfig) {
    let mut config = BridgeConfig::default();
    config.expander.mirror_inputs = true;
    let bus = MockExpanderBus::new();
    let io = SharedIo::new(
        ExpanderBank::new(bus.clone(), &config.expander),
        AnalogCache::new(MockSampler::default(), &config.analog),
        VirtualRegisters::new(usize::from(config.registers.holding_count)),
    );
    (io, bus, config)
}

#[test]
fn begin_reports_bank_and_failures() {
    let (io, bus, _) = board();
    bus.set_offline(0x21, true);
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();

    let failures = svc.begin(0, &io, &mut sink);
    // input-mode write and initial read both fail on 0x21
    assert_eq!(failures, 2);
    assert_eq!(
        sink.events,
        vec![AppEvent::Started {
            input_bits: 16,
            output_bits: 16,
            failures: 2
        }]
    );
    assert_eq!(bus.writes_to(0x22), vec![0xFF]);
    assert_eq!(bus.writes_to(0x24), vec![0xFF]);
}

#[test]
fn mirror_copies_changed_inputs_only() {
    let (io, bus, config) = mirroring_board();
    let mut svc = BridgeService::new(config);
    let mut sink = RecordingSink::default();
    let mut rx = MockReceiver::default();
    svc.begin(0, &io, &mut sink);
    sink.take();
    bus.clear_ops();

    // no change since begin: nothing to mirror
    svc.tick(50, &io, &mut rx, &mut sink);
    assert!(bus.writes_to(0x24).is_empty());
    assert!(sink.events.is_empty());

    bus.set_port(0x22, 0x3C);
    svc.tick(100, &io, &mut rx, &mut sink);
    assert_eq!(bus.port(0x24), Some(0x3C));
    assert_eq!(bus.port(0x25), Some(0xFF));
    assert_eq!(sink.take(), vec![AppEvent::OutputsMirrored { failures: 0 }]);

    // within the refresh interval nothing is read
    bus.set_port(0x22, 0x00);
    svc.tick(120, &io, &mut rx, &mut sink);
    assert_eq!(bus.port(0x24), Some(0x3C));
}

#[test]
fn input_levels_reported_on_interval() {
    let (io, bus, _) = board();
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    let mut rx = MockReceiver::default();
    svc.begin(0, &io, &mut sink);
    sink.take();

    bus.set_port(0x22, 0b0000_0101);
    bus.set_port(0x21, 0xFF);
    for t in (50..=1000).step_by(50) {
        svc.tick(t, &io, &mut rx, &mut sink);
    }
    let reports: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::InputLevels(levels) => Some(levels.as_str().to_owned()),
            _ => None,
        })
        .collect();
    assert_eq!(reports, vec!["HLHLLLLLHHHHHHHH".to_owned()]);
}

#[test]
fn radio_press_and_release_reach_the_sink() {
    let (io, _, _) = board();
    let mut config = BridgeConfig::default();
    config.radio.print_raw = true;
    let mut svc = BridgeService::new(config);
    let mut sink = RecordingSink::default();
    let mut rx = MockReceiver::default();
    svc.begin(0, &io, &mut sink);
    sink.take();

    rx.push(0xABCDEF, 1);
    svc.tick(10, &io, &mut rx, &mut sink);
    svc.tick(300, &io, &mut rx, &mut sink);

    let radio: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::RadioPressed { .. } | AppEvent::RadioReleased(_)))
        .collect();
    assert_eq!(radio.len(), 2);
    assert!(matches!(
        radio[0],
        AppEvent::RadioPressed { decode, show_raw: true } if decode.value == 0xABCDEF
    ));
    assert!(matches!(radio[1], AppEvent::RadioReleased(p) if p.value == 0xABCDEF));
}

#[test]
fn console_send_uses_configured_params_with_overrides() {
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    let mut tx = MockTransmitter::default();
    let store = MockConfigStore::default();

    svc.handle_line("send 0x1234 repeat=3", &mut tx, &store, &mut sink).unwrap();
    svc.handle_line("SEND 99", &mut tx, &store, &mut sink).unwrap();

    assert_eq!(tx.sent.len(), 2);
    assert_eq!(tx.sent[0].0, 0x1234);
    assert_eq!(tx.sent[0].1.repeat, 3);
    assert_eq!(tx.sent[1].1.repeat, 10);
    assert_eq!(tx.sent[1].1.bit_size, 24);
}

#[test]
fn console_send_with_bad_protocol_transmits_nothing() {
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    let mut tx = MockTransmitter::default();
    let store = MockConfigStore::default();

    svc.handle_line("send 1 protocol=9", &mut tx, &store, &mut sink).unwrap();
    assert!(tx.sent.is_empty());
    assert!(matches!(sink.events.last(), Some(AppEvent::ConsoleReply(_))));
}

#[test]
fn set_then_save_persists_radio_params() {
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    let mut tx = MockTransmitter::default();
    let store = MockConfigStore::default();

    svc.handle_line("set protocol=2; pulse=650, raw=1", &mut tx, &store, &mut sink).unwrap();
    assert!(svc.is_config_dirty());
    assert!(store.saved.borrow().is_none());

    svc.handle_line("save", &mut tx, &store, &mut sink).unwrap();
    assert!(!svc.is_config_dirty());
    let saved = store.saved.borrow().clone().unwrap();
    assert_eq!(saved.radio.tx.protocol, 2);
    assert_eq!(saved.radio.tx.pulse_length_us, 650);
    assert!(saved.radio.print_raw);
    assert_eq!(sink.events.last(), Some(&AppEvent::ConfigSaved));

    svc.handle_line("defaults", &mut tx, &store, &mut sink).unwrap();
    assert_eq!(svc.config().radio, BridgeConfig::default().radio);
    assert!(svc.is_config_dirty());
}

#[test]
fn show_renders_json() {
    let mut svc = BridgeService::new(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    let mut tx = MockTransmitter::default();
    let store = MockConfigStore::default();

    svc.handle_line("show", &mut tx, &store, &mut sink).unwrap();
    let Some(AppEvent::ConsoleReply(json)) = sink.events.last() else {
        panic!("expected a console reply");
    };
    let parsed: BridgeConfig = serde_json::from_str(json).unwrap();
    assert_eq!(&parsed, svc.config());
}
