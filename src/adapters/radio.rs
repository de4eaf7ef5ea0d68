//! Radio adapters.
//!
//! - [`PulseTransmitter`] bit-bangs encoded frames on any `embedded-hal`
//!   output pin with a blocking delay.
//! - [`edge_channel`] splits the receive path in two. The edge interrupt
//!   owns an [`EdgeRecorder`] that pushes pulse durations into a lock-free
//!   queue. The driver loop owns an [`EdgeReceiver`] that drains the queue
//!   into a [`PulseDecoder`] and is polled as a [`RadioReceiver`].

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::spsc::{Consumer, Producer, Queue};
use log::warn;

use crate::app::ports::{RadioReceiver, RadioTransmitter};
use crate::config::RadioTxParams;
use crate::radio::RadioDecode;
use crate::radio::decoder::PulseDecoder;
use crate::radio::encoder::encode_frame;

// ── Transmit ──────────────────────────────────────────────────

pub struct PulseTransmitter<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> PulseTransmitter<P, D> {
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_low();
        Self { pin, delay }
    }
}

impl<P: OutputPin, D: DelayNs> RadioTransmitter for PulseTransmitter<P, D> {
    fn transmit(&mut self, code: u32, params: &RadioTxParams) {
        let Some(frame) = encode_frame(code, params) else {
            warn!("radio: cannot encode with protocol {}", params.protocol);
            return;
        };
        for _ in 0..params.repeat {
            for pulse in &frame {
                let _ = if pulse.level {
                    self.pin.set_high()
                } else {
                    self.pin.set_low()
                };
                self.delay.delay_us(pulse.duration_us);
            }
        }
        // leave the carrier off
        let _ = self.pin.set_low();
    }
}

// ── Receive ───────────────────────────────────────────────────

/// Edge durations buffered between the interrupt and the driver loop.
/// One slot stays empty, so the usable depth is one less.
pub const EDGE_QUEUE_DEPTH: usize = 512;

type EdgeQueue = Queue<u32, EDGE_QUEUE_DEPTH>;

/// Build the two halves of the receive path: the [`EdgeRecorder`] the edge
/// interrupt owns, and the [`EdgeReceiver`] the driver loop polls.
///
/// The backing queue and drop counter are leaked, so call this once at
/// startup.
pub fn edge_channel() -> (EdgeRecorder, EdgeReceiver) {
    let queue: &'static mut EdgeQueue = Box::leak(Box::new(EdgeQueue::new()));
    let dropped: &'static AtomicU32 = Box::leak(Box::new(AtomicU32::new(0)));
    let (producer, consumer) = queue.split();
    (
        EdgeRecorder {
            producer,
            last_edge_us: 0,
            dropped,
        },
        EdgeReceiver {
            consumer,
            decoder: PulseDecoder::new(),
            dropped,
            reported_drops: 0,
        },
    )
}

/// Interrupt half. Takes no lock: each edge becomes one enqueue on a
/// single-producer queue, and an edge that finds the queue full is counted
/// and discarded.
pub struct EdgeRecorder {
    producer: Producer<'static, u32, EDGE_QUEUE_DEPTH>,
    last_edge_us: u32,
    dropped: &'static AtomicU32,
}

impl EdgeRecorder {
    /// Record an edge seen at `now_us` (wrapping microsecond counter).
    pub fn on_edge(&mut self, now_us: u32) {
        let duration = now_us.wrapping_sub(self.last_edge_us);
        self.last_edge_us = now_us;
        if self.producer.enqueue(duration).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Loop half. Owns the decoder; [`drain`](Self::drain) must run before each
/// debouncer poll so queued edges reach it.
pub struct EdgeReceiver {
    consumer: Consumer<'static, u32, EDGE_QUEUE_DEPTH>,
    decoder: PulseDecoder,
    dropped: &'static AtomicU32,
    reported_drops: u32,
}

impl EdgeReceiver {
    /// Feed every queued edge to the decoder. Returns the number consumed.
    pub fn drain(&mut self) -> usize {
        let mut consumed = 0;
        while let Some(duration) = self.consumer.dequeue() {
            self.decoder.on_edge(duration);
            consumed += 1;
        }
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped != self.reported_drops {
            warn!(
                "radio: edge queue overflowed, {} edges lost",
                dropped.wrapping_sub(self.reported_drops)
            );
            self.reported_drops = dropped;
        }
        consumed
    }

    /// Edges discarded by the interrupt since startup.
    pub fn dropped_edges(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl RadioReceiver for EdgeReceiver {
    fn available(&self) -> bool {
        self.decoder.available()
    }

    fn received(&self) -> RadioDecode {
        self.decoder.received()
    }

    fn reset_available(&mut self) {
        self.decoder.reset_available();
    }
}
