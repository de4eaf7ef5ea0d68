//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART in production). Multi-line reports go out one record per
//! line so the serial monitor keeps its prefixes aligned.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::radio::format::{received_report, transmit_report};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn info_lines(text: &str) {
    for line in text.lines() {
        info!("{}", line);
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                input_bits,
                output_bits,
                failures,
            } => {
                if *failures == 0 {
                    info!("START | inputs={} outputs={} | expanders OK", input_bits, output_bits);
                } else {
                    warn!(
                        "START | inputs={} outputs={} | {} expander transfers failed",
                        input_bits, output_bits, failures
                    );
                }
            }
            AppEvent::InputLevels(levels) => info!("IN    | {}", levels),
            AppEvent::OutputsMirrored { failures: 0 } => info!("OUT   | mirrored inputs"),
            AppEvent::OutputsMirrored { failures } => {
                warn!("OUT   | mirror flush had {} failures", failures);
            }
            AppEvent::RadioPressed { decode, show_raw } => {
                info_lines(&received_report(decode, *show_raw));
            }
            AppEvent::RadioReleased(packet) => {
                info!("RF    | released {} (protocol {})", packet.value, packet.protocol);
            }
            AppEvent::Transmitted { code, params } => {
                info_lines(&transmit_report(*code, params));
                info!("Data transmission completed");
            }
            AppEvent::ConfigChanged => info!("CFG   | changed (not saved)"),
            AppEvent::ConfigSaved => info!("CFG   | saved"),
            AppEvent::ConsoleReply(text) => info_lines(text),
        }
    }
}
