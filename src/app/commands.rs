//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial console,
//! startup code) that the [`BridgeService`](super::service::BridgeService)
//! interprets and acts upon.

use crate::config::RadioTxParams;

/// Optional changes to the radio parameters, as typed on the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamUpdate {
    pub bit_size: Option<u8>,
    pub pulse_length_us: Option<u16>,
    pub protocol: Option<u8>,
    pub repeat: Option<u8>,
    pub print_raw: Option<bool>,
}

impl ParamUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the set fields onto `tx` and `print_raw`.
    pub fn apply(&self, tx: &mut RadioTxParams, print_raw: &mut bool) {
        self.apply_tx(tx);
        if let Some(v) = self.print_raw {
            *print_raw = v;
        }
    }

    /// Overlay only the transmit fields onto `tx`.
    pub fn apply_tx(&self, tx: &mut RadioTxParams) {
        if let Some(v) = self.bit_size {
            tx.bit_size = v;
        }
        if let Some(v) = self.pulse_length_us {
            tx.pulse_length_us = v;
        }
        if let Some(v) = self.protocol {
            tx.protocol = v;
        }
        if let Some(v) = self.repeat {
            tx.repeat = v;
        }
    }
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Send one radio code. `overrides` apply to this transmission only.
    Transmit { code: u32, overrides: ParamUpdate },

    /// Change the stored radio parameters (validated, then marked dirty).
    SetParams(ParamUpdate),

    /// Print the live configuration.
    ShowConfig,

    /// Persist the current config to NVS immediately.
    SaveConfig,

    /// Reset the radio parameters to their defaults.
    RestoreDefaults,

    /// Print the console command summary.
    Help,
}
