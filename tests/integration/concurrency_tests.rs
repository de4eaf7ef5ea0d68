//! Two front ends on separate threads sharing one server and one set of
//! stores, and the radio edge path running beside a held store lock.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};

use kcbridge::adapters::radio::edge_channel;
use kcbridge::app::ports::RadioReceiver;
use kcbridge::config::RadioTxParams;
use kcbridge::modbus::channels::{FrontEndRequest, ReplyChannel, RequestChannel, service_requests};
use kcbridge::modbus::pdu::PduBuf;
use kcbridge::modbus::server::{FrontEnd, ModbusServer};
use kcbridge::radio::encoder::encode_frame;

use crate::bridge_tests::board;

fn write_block_pdu(start: u16, words: &[u16]) -> Vec<u8> {
    let mut pdu = vec![0x10];
    pdu.extend_from_slice(&start.to_be_bytes());
    pdu.extend_from_slice(&(words.len() as u16).to_be_bytes());
    pdu.push((words.len() * 2) as u8);
    for w in words {
        pdu.extend_from_slice(&w.to_be_bytes());
    }
    pdu
}

#[test]
fn block_writes_are_never_torn() {
    let (io, _, _) = board();
    let server = ModbusServer::new(&io, 1);

    thread::scope(|s| {
        s.spawn(|| {
            for n in 0..2_000u16 {
                let pdu = write_block_pdu(10, &[n; 8]);
                let reply = server.handle_pdu(FrontEnd::Rtu, 1, &pdu).unwrap();
                assert_eq!(reply[0], 0x10);
            }
        });
        s.spawn(|| {
            for _ in 0..2_000 {
                let reply = server.handle_pdu(FrontEnd::Tcp, 1, &[0x03, 0x00, 10, 0x00, 8]).unwrap();
                assert_eq!(reply[1], 16);
                let words: Vec<u16> = reply[2..]
                    .chunks_exact(2)
                    .map(|p| u16::from_be_bytes([p[0], p[1]]))
                    .collect();
                assert!(words.iter().all(|w| *w == words[0]), "torn read: {words:?}");
            }
        });
    });

    let last = io.with_registers(|r| r.read(17));
    assert_eq!(last, 1_999);
}

#[test]
fn coil_writes_from_both_front_ends_reach_hardware() {
    let (io, bus, _) = board();
    let server = ModbusServer::new(&io, 1);

    thread::scope(|s| {
        // RTU owns block 0x24, TCP owns block 0x25
        for (front_end, base) in [(FrontEnd::Rtu, 0u16), (FrontEnd::Tcp, 8u16)] {
            let server = &server;
            s.spawn(move || {
                for round in 0..200u16 {
                    let coil = base + round % 8;
                    let value: u16 = if round % 3 == 0 { 0xFF00 } else { 0x0000 };
                    let [ch, cl] = coil.to_be_bytes();
                    let [vh, vl] = value.to_be_bytes();
                    server.handle_pdu(front_end, 1, &[0x05, ch, cl, vh, vl]).unwrap();
                }
            });
        }
    });

    // hardware always receives the whole cached byte, so the last flush
    // matches the cache for both blocks
    let (cached0, cached1) = io.with_expander(|b| (b.outputs()[0].value, b.outputs()[1].value));
    assert_eq!(bus.port(0x24), Some(cached0));
    assert_eq!(bus.port(0x25), Some(cached1));
}

#[test]
fn queued_requests_are_served_in_order() {
    let (io, _, _) = board();
    let server = ModbusServer::new(&io, 1);
    let requests: RequestChannel<CriticalSectionRawMutex> = Channel::new();
    let replies: ReplyChannel<CriticalSectionRawMutex> = Channel::new();

    thread::scope(|s| {
        s.spawn(|| {
            for id in 0..32u16 {
                let pdu = PduBuf::from_slice(&[0x06, 0x00, 0x00, (id >> 8) as u8, id as u8]).unwrap();
                let req = FrontEndRequest {
                    front_end: FrontEnd::Tcp,
                    transaction_id: id,
                    unit_id: 1,
                    pdu,
                };
                // spin until the driver drains the queue
                let mut pending = req;
                loop {
                    match requests.try_send(pending) {
                        Ok(()) => break,
                        Err(TrySendError::Full(back)) => {
                            pending = back;
                            thread::yield_now();
                        }
                    }
                }
            }
        });

        let mut served = 0;
        let mut seen = Vec::new();
        while served < 32 {
            served += service_requests(&server, &requests, &replies, 4);
            while let Ok(reply) = replies.try_receive() {
                seen.push(reply.transaction_id);
            }
            thread::yield_now();
        }
        while let Ok(reply) = replies.try_receive() {
            seen.push(reply.transaction_id);
        }
        assert_eq!(seen, (0..32).collect::<Vec<u16>>());
    });

    assert_eq!(io.with_registers(|r| r.read(0)), 31);
}

#[test]
fn edges_are_recorded_while_a_flush_holds_the_expander() {
    let (io, _, _) = board();
    let io = &io;
    let (mut recorder, mut rx) = edge_channel();
    let frame = encode_frame(0x0055_AA55, &RadioTxParams::default()).unwrap();
    let hold = Duration::from_millis(200);
    let (locked_tx, locked_rx) = mpsc::channel();

    thread::scope(|s| {
        // a slow transfer keeps the store locked
        s.spawn(move || {
            io.with_expander(|bank| {
                locked_tx.send(()).unwrap();
                thread::sleep(hold);
                bank.write_bit(0, false);
                let _ = bank.flush_outputs();
            });
        });
        locked_rx.recv().unwrap();

        let started = Instant::now();
        let mut now_us = 1_000_000u32;
        recorder.on_edge(now_us);
        for _ in 0..4 {
            for pulse in &frame {
                now_us += pulse.duration_us;
                recorder.on_edge(now_us);
            }
        }
        let elapsed = started.elapsed();
        assert!(elapsed < hold / 4, "edge recording waited {elapsed:?} on the store lock");
    });

    assert!(rx.drain() > 0);
    assert!(rx.available());
    assert_eq!(rx.received().value, 0x0055_AA55);
    assert_eq!(rx.dropped_edges(), 0);
}
