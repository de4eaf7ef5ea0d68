//! Mock hardware adapters for integration tests.
//!
//! The expander mock keeps its device table behind an `Arc<Mutex<..>>` so a
//! test can inspect or fault the bus while the bank owns its own handle.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use kcbridge::app::events::AppEvent;
use kcbridge::app::ports::{
    AnalogSampler, ConfigError, ConfigPort, EventSink, ExpanderBus, RadioReceiver, RadioTransmitter,
};
use kcbridge::config::{BridgeConfig, RadioTxParams};
use kcbridge::error::BusError;
use kcbridge::radio::RadioDecode;

// ── Expander bus ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Write { address: u8, byte: u8 },
    Read { address: u8 },
}

#[derive(Default)]
pub struct BusState {
    /// Port byte per device; reads return this value.
    pub ports: HashMap<u8, u8>,
    /// Addresses that NACK every transfer.
    pub offline: HashSet<u8>,
    pub ops: Vec<BusOp>,
}

#[derive(Clone, Default)]
pub struct MockExpanderBus {
    pub state: Arc<Mutex<BusState>>,
}

#[allow(dead_code)]
impl MockExpanderBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level a device will report on its next read.
    pub fn set_port(&self, address: u8, byte: u8) {
        self.state.lock().unwrap().ports.insert(address, byte);
    }

    pub fn port(&self, address: u8) -> Option<u8> {
        self.state.lock().unwrap().ports.get(&address).copied()
    }

    pub fn set_offline(&self, address: u8, offline: bool) {
        let mut s = self.state.lock().unwrap();
        if offline {
            s.offline.insert(address);
        } else {
            s.offline.remove(&address);
        }
    }

    pub fn ops(&self) -> Vec<BusOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                BusOp::Write { address: a, byte } if a == address => Some(byte),
                _ => None,
            })
            .collect()
    }
}

impl ExpanderBus for MockExpanderBus {
    fn write(&mut self, address: u8, byte: u8) -> Result<(), BusError> {
        let mut s = self.state.lock().unwrap();
        s.ops.push(BusOp::Write { address, byte });
        if s.offline.contains(&address) {
            return Err(BusError::Nack);
        }
        s.ports.insert(address, byte);
        Ok(())
    }

    fn read(&mut self, address: u8) -> Result<u8, BusError> {
        let mut s = self.state.lock().unwrap();
        s.ops.push(BusOp::Read { address });
        if s.offline.contains(&address) {
            return Err(BusError::Nack);
        }
        Ok(s.ports.get(&address).copied().unwrap_or(0xFF))
    }
}

// ── Analog sampler ────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSampler {
    pub values: Arc<Mutex<[u16; 8]>>,
}

#[allow(dead_code)]
impl MockSampler {
    pub fn set(&self, channel: usize, value: u16) {
        self.values.lock().unwrap()[channel] = value;
    }
}

impl AnalogSampler for MockSampler {
    fn sample(&mut self, channel: usize) -> u16 {
        self.values.lock().unwrap().get(channel).copied().unwrap_or(0)
    }
}

// ── Radio ─────────────────────────────────────────────────────

/// Receiver that yields queued decodes one per `available()` window.
#[derive(Default)]
pub struct MockReceiver {
    queue: VecDeque<RadioDecode>,
}

#[allow(dead_code)]
impl MockReceiver {
    pub fn push(&mut self, value: u32, protocol: u8) {
        self.queue.push_back(decode(value, protocol));
    }
}

pub fn decode(value: u32, protocol: u8) -> RadioDecode {
    RadioDecode {
        value,
        bit_length: 24,
        delay_us: 350,
        protocol,
        ..Default::default()
    }
}

impl RadioReceiver for MockReceiver {
    fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    fn received(&self) -> RadioDecode {
        self.queue.front().cloned().unwrap_or_default()
    }

    fn reset_available(&mut self) {
        self.queue.pop_front();
    }
}

#[derive(Default)]
pub struct MockTransmitter {
    pub sent: Vec<(u32, RadioTxParams)>,
}

impl RadioTransmitter for MockTransmitter {
    fn transmit(&mut self, code: u32, params: &RadioTxParams) {
        self.sent.push((code, *params));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn take(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockConfigStore {
    pub saved: RefCell<Option<BridgeConfig>>,
    pub fail: bool,
}

impl ConfigPort for MockConfigStore {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::IoError);
        }
        config.validate().map_err(ConfigError::ValidationFailed)?;
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}
