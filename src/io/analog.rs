//! Analog input cache backing the input-register space.

use heapless::Vec;

use crate::app::ports::AnalogSampler;
use crate::config::{AnalogConfig, MAX_ANALOG_CHANNELS};

use super::interval_elapsed;

pub struct AnalogCache<S> {
    sampler: S,
    samples: Vec<u16, MAX_ANALOG_CHANNELS>,
    interval_ms: u32,
    last_refresh: Option<u32>,
}

impl<S: AnalogSampler> AnalogCache<S> {
    pub fn new(sampler: S, config: &AnalogConfig) -> Self {
        let channels = usize::from(config.channels).min(MAX_ANALOG_CHANNELS);
        let mut samples = Vec::new();
        let _ = samples.resize(channels, 0);
        Self {
            sampler,
            samples,
            interval_ms: config.refresh_interval_ms,
            last_refresh: None,
        }
    }

    /// Number of channels (fixed at construction).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample every channel if the interval has elapsed. Returns whether it did.
    pub fn refresh(&mut self, now_ms: u32) -> bool {
        if !interval_elapsed(self.last_refresh, now_ms, self.interval_ms) {
            return false;
        }
        for (ch, slot) in self.samples.iter_mut().enumerate() {
            *slot = self.sampler.sample(ch);
        }
        self.last_refresh = Some(now_ms);
        true
    }

    /// Most recent sample of `channel`. The caller validates against
    /// [`len`](Self::len); an out-of-range channel reads as 0.
    pub fn read(&self, channel: usize) -> u16 {
        self.samples.get(channel).copied().unwrap_or(0)
    }
}
