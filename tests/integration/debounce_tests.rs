//! Radio press/release timeline, from queued decodes and from raw edges.

use kcbridge::adapters::radio::edge_channel;
use kcbridge::config::RadioTxParams;
use kcbridge::radio::RadioPacket;
use kcbridge::radio::debounce::{RadioDebouncer, RadioEvent};
use kcbridge::radio::encoder::encode_frame;

use crate::mock_hw::MockReceiver;

const TIMEOUT: u32 = 200;

fn packet(value: u32, protocol: u8) -> RadioPacket {
    RadioPacket { value, protocol }
}

#[test]
fn held_button_is_one_press_and_one_release() {
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let mut rx = MockReceiver::default();

    let mut presses = 0;
    let mut releases = Vec::new();
    // repeats every 40 ms for ~400 ms, then silence
    for t in (0..=1000).step_by(10) {
        if t <= 400 && t % 40 == 0 {
            rx.push(0x1234, 1);
        }
        for event in deb.poll(t, &mut rx) {
            match event {
                RadioEvent::Pressed(_) => presses += 1,
                RadioEvent::Released(p) => releases.push((t, p)),
            }
        }
    }
    assert_eq!(presses, 1);
    assert_eq!(releases, vec![(600, packet(0x1234, 1))]);
    assert_eq!(deb.active(), None);
}

#[test]
fn switching_buttons_presses_without_release() {
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let mut rx = MockReceiver::default();

    rx.push(1, 1);
    assert!(matches!(deb.poll(0, &mut rx).as_slice(), [RadioEvent::Pressed(_)]));
    rx.push(2, 1);
    let events = deb.poll(50, &mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], RadioEvent::Pressed(d) if d.value == 2));
    assert_eq!(deb.active(), Some(packet(2, 1)));

    // same value under another protocol is a different packet
    rx.push(2, 3);
    assert!(matches!(deb.poll(60, &mut rx).as_slice(), [RadioEvent::Pressed(_)]));
}

#[test]
fn release_and_new_press_in_one_poll() {
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let mut rx = MockReceiver::default();
    rx.push(7, 1);
    deb.poll(1_000, &mut rx);

    rx.push(7, 1);
    let events = deb.poll(1_000 + TIMEOUT, &mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], RadioEvent::Released(packet(7, 1)));
    assert!(matches!(&events[1], RadioEvent::Pressed(d) if d.value == 7));
}

#[test]
fn malformed_decodes_are_consumed_silently() {
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let mut rx = MockReceiver::default();
    rx.push(99, 0);
    assert!(deb.poll(0, &mut rx).is_empty());
    assert!(!kcbridge::app::ports::RadioReceiver::available(&rx));
    assert_eq!(deb.active(), None);
}

#[test]
fn timeout_survives_counter_wrap() {
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let mut rx = MockReceiver::default();
    let start = u32::MAX - 50;
    rx.push(5, 2);
    deb.poll(start, &mut rx);
    assert!(deb.poll(start.wrapping_add(TIMEOUT - 1), &mut rx).is_empty());
    let events = deb.poll(start.wrapping_add(TIMEOUT), &mut rx);
    assert_eq!(events.as_slice(), [RadioEvent::Released(packet(5, 2))]);
}

#[test]
fn edges_from_a_held_remote_debounce_to_one_press() {
    let (mut recorder, mut rx) = edge_channel();
    let mut deb = RadioDebouncer::new(TIMEOUT);
    let params = RadioTxParams {
        bit_size: 24,
        pulse_length_us: 350,
        protocol: 1,
        repeat: 10,
    };
    let frame = encode_frame(0x00C0_FFEE, &params).unwrap();
    let frame_us: u32 = frame.iter().map(|p| p.duration_us).sum();

    let mut now_us = 5_000_000u32;
    let mut pressed = Vec::new();
    recorder.on_edge(now_us);
    for _ in 0..params.repeat {
        for pulse in &frame {
            now_us += pulse.duration_us;
            recorder.on_edge(now_us);
        }
        rx.drain();
        for event in deb.poll(now_us / 1000, &mut rx) {
            if let RadioEvent::Pressed(d) = event {
                pressed.push(d);
            }
        }
    }
    assert_eq!(pressed.len(), 1);
    assert_eq!(pressed[0].value, 0x00C0_FFEE);
    assert_eq!(pressed[0].bit_length, 24);
    assert!(frame_us / 1000 < TIMEOUT);

    let released = deb.poll(now_us / 1000 + TIMEOUT, &mut rx);
    assert_eq!(released.as_slice(), [RadioEvent::Released(packet(0x00C0_FFEE, 1))]);
}
