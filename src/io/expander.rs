//! Expander I/O bank.
//!
//! ## Hardware
//!
//! PCF8574-class quasi-bidirectional 8-bit expanders on a shared I2C bus.
//! A pin is read as an input only after `0xFF` has been written to it,
//! so input blocks are put into input mode once in [`ExpanderBank::begin`].
//!
//! ## Bit index space
//!
//! Blocks are ordered as configured; `bit index = block_index * 8 + bit`.
//! The index space is fixed for the process lifetime.
//!
//! | Space  | Backing         | Written by              |
//! |--------|-----------------|-------------------------|
//! | Input  | input blocks    | `refresh_inputs` only   |
//! | Output | output blocks   | `write_bit` + `flush`   |

use core::fmt;
use core::fmt::Write as _;

use heapless::{String, Vec};
use log::{debug, info, warn};

use crate::app::ports::ExpanderBus;
use crate::config::{ExpanderConfig, MAX_BLOCKS};

use super::interval_elapsed;

/// Every pin high: the power-on state of the expanders, and the value an
/// input pin must be driven to before it can be read.
const ALL_HIGH: u8 = 0xFF;

/// One 8-bit expander: its bus address and the cached byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareBlock {
    pub address: u8,
    pub value: u8,
}

impl HardwareBlock {
    const fn new(address: u8) -> Self {
        Self {
            address,
            value: ALL_HIGH,
        }
    }
}

/// Which bit space a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Input,
    Output,
}

/// Result of a rate-limited input refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The interval had not elapsed; nothing was read.
    Skipped,
    /// Every block was read once; `failures` of them kept their stale value.
    Completed { failures: u32 },
}

/// A bit index outside `[0, count)` of the addressed space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: usize,
    pub count: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit {} out of range (count {})", self.index, self.count)
    }
}

/// H/L rendering of every input bit, bit 0 first.
pub type LevelString = String<{ MAX_BLOCKS * 8 }>;

pub struct ExpanderBank<B> {
    bus: B,
    inputs: Vec<HardwareBlock, MAX_BLOCKS>,
    outputs: Vec<HardwareBlock, MAX_BLOCKS>,
    interval_ms: u32,
    last_refresh: Option<u32>,
}

impl<B: ExpanderBus> ExpanderBank<B> {
    /// Build the bank from configuration. Caches start all-high.
    pub fn new(bus: B, config: &ExpanderConfig) -> Self {
        let inputs = config
            .input_addresses
            .iter()
            .map(|&a| HardwareBlock::new(a))
            .collect();
        let outputs = config
            .output_addresses
            .iter()
            .map(|&a| HardwareBlock::new(a))
            .collect();

        Self {
            bus,
            inputs,
            outputs,
            interval_ms: config.refresh_interval_ms,
            last_refresh: None,
        }
    }

    /// Addressable input bits.
    pub fn input_count(&self) -> usize {
        self.inputs.len() * 8
    }

    /// Addressable output bits.
    pub fn output_count(&self) -> usize {
        self.outputs.len() * 8
    }

    /// Put every input block into input mode, flush the outputs and, if
    /// `initial_read` is set, read every input once regardless of the
    /// refresh interval. Returns the total number of failed transfers.
    pub fn begin(&mut self, now_ms: u32, initial_read: bool) -> u32 {
        let mut failures = 0;
        for block in &self.inputs {
            if let Err(e) = self.bus.write(block.address, ALL_HIGH) {
                debug!("expander 0x{:02X}: input mode failed: {}", block.address, e);
                failures += 1;
            }
        }
        failures += self.flush_outputs();
        if initial_read {
            failures += self.read_all_inputs(now_ms);
        }

        if failures == 0 {
            info!(
                "ExpanderBank: {} input / {} output blocks ready",
                self.inputs.len(),
                self.outputs.len()
            );
        } else {
            warn!("ExpanderBank: begin finished with {} failed transfers", failures);
        }
        failures
    }

    /// Re-read every input block if the refresh interval has elapsed.
    ///
    /// A failed block keeps its previous cached value.
    pub fn refresh_inputs(&mut self, now_ms: u32) -> RefreshOutcome {
        if !interval_elapsed(self.last_refresh, now_ms, self.interval_ms) {
            return RefreshOutcome::Skipped;
        }
        let failures = self.read_all_inputs(now_ms);
        if failures > 0 {
            warn!(
                "ExpanderBank: {} of {} input reads failed",
                failures,
                self.inputs.len()
            );
        }
        RefreshOutcome::Completed { failures }
    }

    /// Write every cached output byte to hardware. Returns the failure count.
    pub fn flush_outputs(&mut self) -> u32 {
        let mut failures = 0;
        for block in &self.outputs {
            if let Err(e) = self.bus.write(block.address, block.value) {
                debug!("expander 0x{:02X}: write failed: {}", block.address, e);
                failures += 1;
            }
        }
        if failures > 0 {
            warn!(
                "ExpanderBank: {} of {} output writes failed",
                failures,
                self.outputs.len()
            );
        }
        failures
    }

    /// Cached value of one bit.
    pub fn read_bit(&self, space: Space, index: usize) -> Result<bool, OutOfRange> {
        let blocks = match space {
            Space::Input => &self.inputs,
            Space::Output => &self.outputs,
        };
        blocks
            .get(index / 8)
            .map(|b| b.value & (1 << (index % 8)) != 0)
            .ok_or(OutOfRange {
                index,
                count: blocks.len() * 8,
            })
    }

    /// Set one cached output bit. Out-of-range indices are ignored; the
    /// caller validates against [`output_count`](Self::output_count).
    pub fn write_bit(&mut self, index: usize, value: bool) {
        if let Some(block) = self.outputs.get_mut(index / 8) {
            let mask = 1 << (index % 8);
            if value {
                block.value |= mask;
            } else {
                block.value &= !mask;
            }
        }
    }

    /// Copy the input caches onto the output caches when they differ.
    ///
    /// Returns `true` if anything changed; the caller flushes. Requires equal
    /// block counts, which config validation enforces for mirror mode.
    pub fn mirror_inputs(&mut self) -> bool {
        let mut changed = false;
        for (out, inp) in self.outputs.iter_mut().zip(self.inputs.iter()) {
            if out.value != inp.value {
                out.value = inp.value;
                changed = true;
            }
        }
        changed
    }

    /// `H`/`L` per input bit, bit 0 first.
    pub fn input_levels(&self) -> LevelString {
        let mut s = LevelString::new();
        for i in 0..self.input_count() {
            let c = if matches!(self.read_bit(Space::Input, i), Ok(true)) {
                'H'
            } else {
                'L'
            };
            let _ = s.write_char(c);
        }
        s
    }

    pub fn inputs(&self) -> &[HardwareBlock] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[HardwareBlock] {
        &self.outputs
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn read_all_inputs(&mut self, now_ms: u32) -> u32 {
        let mut failures = 0;
        for block in &mut self.inputs {
            match self.bus.read(block.address) {
                Ok(v) => block.value = v,
                Err(e) => {
                    debug!("expander 0x{:02X}: read failed: {}", block.address, e);
                    failures += 1;
                }
            }
        }
        self.last_refresh = Some(now_ms);
        failures
    }
}
