//! Application service: the periodic driver loop.
//!
//! [`BridgeService`] owns the live configuration and the radio debouncer.
//! The shared stores are handed in by reference on every call, since the
//! protocol front ends reach the same stores between ticks.
//!
//! ```text
//!  ExpanderBus ─┐                ┌────────────────────────┐
//!  AnalogSampler├─▶ SharedIo ──▶ │     BridgeService       │ ──▶ EventSink
//!  RadioReceiver ──────────────▶ │ refresh · mirror · RF   │
//!                                └────────────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::info;

use crate::config::{BridgeConfig, RadioTxParams};
use crate::console::{self, ConsoleError};
use crate::error::{Error, Result};
use crate::io::SharedIo;
use crate::io::expander::RefreshOutcome;
use crate::io::interval_elapsed;
use crate::radio::debounce::{RadioDebouncer, RadioEvent};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{AnalogSampler, ConfigPort, EventSink, ExpanderBus, RadioReceiver, RadioTransmitter};

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

pub struct BridgeService {
    config: BridgeConfig,
    debouncer: RadioDebouncer,
    last_report_ms: Option<u32>,
    config_dirty: bool,
}

impl BridgeService {
    pub fn new(config: BridgeConfig) -> Self {
        let debouncer = RadioDebouncer::new(config.radio.release_timeout_ms);
        Self {
            config,
            debouncer,
            last_report_ms: None,
            config_dirty: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up the expanders and take the first analog samples.
    /// Returns the number of failed bus transfers.
    pub fn begin<M, B, S>(&mut self, now_ms: u32, io: &SharedIo<M, B, S>, sink: &mut impl EventSink) -> u32
    where
        M: RawMutex,
        B: ExpanderBus,
        S: AnalogSampler,
    {
        let (failures, input_bits, output_bits) =
            io.with_expander(|bank| (bank.begin(now_ms, true), bank.input_count(), bank.output_count()));
        io.with_analog(|cache| cache.refresh(now_ms));
        self.last_report_ms = Some(now_ms);

        sink.emit(&AppEvent::Started {
            input_bits,
            output_bits,
            failures,
        });
        info!(
            "BridgeService started: {} inputs, {} outputs, unit {}",
            input_bits, output_bits, self.config.modbus.unit_id
        );
        failures
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass of the driver loop: refresh inputs (and mirror them),
    /// refresh analog samples, poll the radio, emit the periodic report.
    pub fn tick<M, B, S>(
        &mut self,
        now_ms: u32,
        io: &SharedIo<M, B, S>,
        rx: &mut impl RadioReceiver,
        sink: &mut impl EventSink,
    ) where
        M: RawMutex,
        B: ExpanderBus,
        S: AnalogSampler,
    {
        // 1. Expander inputs, then optional mirroring under the same lock
        let mirror = self.config.expander.mirror_inputs;
        let mirrored = io.with_expander(|bank| match bank.refresh_inputs(now_ms) {
            RefreshOutcome::Completed { .. } if mirror && bank.mirror_inputs() => {
                Some(bank.flush_outputs())
            }
            _ => None,
        });
        if let Some(failures) = mirrored {
            sink.emit(&AppEvent::OutputsMirrored { failures });
        }

        // 2. Analog cache
        io.with_analog(|cache| cache.refresh(now_ms));

        // 3. Radio
        for event in self.debouncer.poll(now_ms, rx) {
            match event {
                RadioEvent::Pressed(decode) => sink.emit(&AppEvent::RadioPressed {
                    decode,
                    show_raw: self.config.radio.print_raw,
                }),
                RadioEvent::Released(packet) => sink.emit(&AppEvent::RadioReleased(packet)),
            }
        }

        // 4. Input level report
        let interval = self.config.expander.status_report_interval_ms;
        if interval > 0 && interval_elapsed(self.last_report_ms, now_ms, interval) {
            self.last_report_ms = Some(now_ms);
            let levels = io.with_expander(|bank| bank.input_levels());
            sink.emit(&AppEvent::InputLevels(levels));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Parse and run one console line. Parse errors are reported through
    /// the sink and returned.
    pub fn handle_line(
        &mut self,
        line: &str,
        tx: &mut impl RadioTransmitter,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), ConsoleError> {
        match console::parse_command(line) {
            Ok(cmd) => {
                info!("console: {:?}", cmd);
                if let Err(e) = self.handle_command(cmd, tx, storage, sink) {
                    sink.emit(&AppEvent::ConsoleReply(e.to_string()));
                }
                Ok(())
            }
            Err(ConsoleError::Empty) => Ok(()),
            Err(e) => {
                sink.emit(&AppEvent::ConsoleReply(e.to_string()));
                Err(e)
            }
        }
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        tx: &mut impl RadioTransmitter,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::Transmit { code, overrides } => {
                let mut params = self.config.radio.tx;
                overrides.apply_tx(&mut params);
                params.validate().map_err(Error::Config)?;
                tx.transmit(code, &params);
                sink.emit(&AppEvent::Transmitted { code, params });
            }
            AppCommand::SetParams(update) => {
                let mut radio = self.config.radio.clone();
                update.apply(&mut radio.tx, &mut radio.print_raw);
                radio.tx.validate().map_err(Error::Config)?;
                self.config.radio = radio;
                self.mark_config_dirty();
                sink.emit(&AppEvent::ConfigChanged);
            }
            AppCommand::ShowConfig => {
                let json = serde_json::to_string(&self.config)
                    .map_err(|_| Error::Config("config not serialisable"))?;
                sink.emit(&AppEvent::ConsoleReply(json));
            }
            AppCommand::SaveConfig => {
                storage.save(&self.config)?;
                self.config_dirty = false;
                sink.emit(&AppEvent::ConfigSaved);
            }
            AppCommand::RestoreDefaults => {
                self.config.radio.tx = RadioTxParams::default();
                self.config.radio.print_raw = false;
                self.mark_config_dirty();
                sink.emit(&AppEvent::ConfigChanged);
            }
            AppCommand::Help => {
                sink.emit(&AppEvent::ConsoleReply(console::HELP.into()));
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn debouncer(&self) -> &RadioDebouncer {
        &self.debouncer
    }

    // ── Config dirty-flag management ──────────────────────────

    fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
