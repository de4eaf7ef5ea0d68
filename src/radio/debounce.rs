//! Radio debounce state machine.
//!
//! Remotes repeat a code for as long as the button is held. This turns the
//! stream of decodes into one press per physical action and a release once
//! the code has not been seen for the release timeout.
//!
//! | State   | Input                     | Next    | Emits            |
//! |---------|---------------------------|---------|------------------|
//! | Idle    | valid decode              | Pressed | `Pressed`        |
//! | Pressed | same packet               | Pressed | (none)           |
//! | Pressed | different packet          | Pressed | `Pressed` (new)  |
//! | Pressed | silence ≥ release timeout | Idle    | `Released`       |
//!
//! Each poll checks the timeout first, then a pending decode, so one poll
//! can emit a release followed by a new press.

use heapless::Vec;
use log::debug;

use crate::app::ports::RadioReceiver;

use super::{RadioDecode, RadioPacket};

/// Notifications produced by [`RadioDebouncer::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// A new press, with the full decode that started it.
    Pressed(RadioDecode),
    /// The tracked press ended.
    Released(RadioPacket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Pressed { packet: RadioPacket, last_seen_ms: u32 },
}

/// At most a release and a press per poll.
pub type PollEvents = Vec<RadioEvent, 2>;

pub struct RadioDebouncer {
    state: DebounceState,
    release_timeout_ms: u32,
}

impl RadioDebouncer {
    pub fn new(release_timeout_ms: u32) -> Self {
        Self {
            state: DebounceState::Idle,
            release_timeout_ms,
        }
    }

    /// The packet currently held down, if any.
    pub fn active(&self) -> Option<RadioPacket> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Pressed { packet, .. } => Some(packet),
        }
    }

    /// Run one poll cycle. Never blocks.
    pub fn poll(&mut self, now_ms: u32, rx: &mut impl RadioReceiver) -> PollEvents {
        let mut events = PollEvents::new();

        if let DebounceState::Pressed {
            packet,
            last_seen_ms,
        } = self.state
        {
            if now_ms.wrapping_sub(last_seen_ms) >= self.release_timeout_ms {
                self.state = DebounceState::Idle;
                let _ = events.push(RadioEvent::Released(packet));
            }
        }

        if rx.available() {
            let decode = rx.received();
            rx.reset_available();

            match (decode.packet(), self.state) {
                (None, _) => debug!("radio: malformed decode ignored"),
                (
                    Some(packet),
                    DebounceState::Pressed {
                        packet: tracked, ..
                    },
                ) if packet == tracked => {
                    self.state = DebounceState::Pressed {
                        packet,
                        last_seen_ms: now_ms,
                    };
                }
                (Some(packet), _) => {
                    self.state = DebounceState::Pressed {
                        packet,
                        last_seen_ms: now_ms,
                    };
                    let _ = events.push(RadioEvent::Pressed(decode));
                }
            }
        }

        events
    }
}
