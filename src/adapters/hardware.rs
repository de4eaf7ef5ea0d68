//! On-board peripherals outside the I2C bus: the analog inputs and the
//! radio receiver's edge interrupt.
//!
//! On ESP-IDF these use raw `esp_idf_svc::sys` calls. On the host the
//! ADC reads come from injectable atomics and the interrupt hookup is
//! a no-op.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use super::radio::EdgeRecorder;
use crate::app::ports::AnalogSampler;
#[cfg(not(target_os = "espidf"))]
use crate::config::MAX_ANALOG_CHANNELS;

#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1 init failed"),
            HwInitError::IsrInstallFailed(_) => Self::Init("GPIO ISR install failed"),
        }
    }
}

// ── Analog inputs ─────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; MAX_ANALOG_CHANNELS] = [const { AtomicU16::new(0) }; MAX_ANALOG_CHANNELS];

/// Inject a raw reading for the host build.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: usize, raw: u16) {
    if let Some(slot) = SIM_ADC.get(channel) {
        slot.store(raw, Ordering::Relaxed);
    }
}

/// ADC1 oneshot sampler over the board's analog terminals.
pub struct AdcSampler {
    #[cfg(target_os = "espidf")]
    handle: adc_oneshot_unit_handle_t,
}

impl AdcSampler {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, HwInitError> {
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        // SAFETY: called once from main before the driver loop starts.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        for &channel in pins::ANALOG_ADC1_CHANNELS.iter() {
            let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
            if ret != ESP_OK as i32 {
                return Err(HwInitError::AdcInitFailed(ret));
            }
        }
        info!("AdcSampler: {} ADC1 channels configured", pins::ANALOG_ADC1_CHANNELS.len());
        Ok(Self { handle })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, HwInitError> {
        Ok(Self {})
    }
}

impl AnalogSampler for AdcSampler {
    #[cfg(target_os = "espidf")]
    fn sample(&mut self, channel: usize) -> u16 {
        let Some(&adc_channel) = pins::ANALOG_ADC1_CHANNELS.get(channel) else {
            return 0;
        };
        let mut raw: i32 = 0;
        // SAFETY: the handle is owned by this sampler, which lives behind the
        // analog store's lock.
        let ret = unsafe { adc_oneshot_read(self.handle, adc_channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return 0;
        }
        raw.max(0) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample(&mut self, channel: usize) -> u16 {
        SIM_ADC.get(channel).map_or(0, |slot| slot.load(Ordering::Relaxed))
    }
}

// SAFETY: the oneshot handle is only used through `&mut self`.
#[cfg(target_os = "espidf")]
unsafe impl Send for AdcSampler {}

// ── Radio receiver interrupt ──────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn radio_edge_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the recorder leaked by `install_radio_isr`; this
    // handler is its only user.
    let recorder = unsafe { &mut *arg.cast::<EdgeRecorder>() };
    // SAFETY: esp_timer_get_time reads the RTC counter; safe in ISR context.
    let now_us = unsafe { esp_timer_get_time() } as u32;
    recorder.on_edge(now_us);
}

/// Configure the receiver pin and attach the any-edge interrupt. The
/// interrupt takes ownership of `recorder` and never takes a lock.
#[cfg(target_os = "espidf")]
pub fn install_radio_isr(recorder: EdgeRecorder) -> Result<(), HwInitError> {
    let arg = Box::into_raw(Box::new(recorder)).cast::<core::ffi::c_void>();
    // SAFETY: called once from main; `arg` stays valid for the life of the
    // handler and is reclaimed only if the handler was never attached.
    unsafe {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins::RF_RX_GPIO,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
            ..Default::default()
        };
        let mut ret = gpio_config(&cfg);
        if ret == ESP_OK as i32 {
            ret = gpio_install_isr_service(0);
            if ret == ESP_ERR_INVALID_STATE as i32 {
                ret = ESP_OK as i32;
            }
        }
        if ret == ESP_OK as i32 {
            ret = gpio_isr_handler_add(pins::RF_RX_GPIO, Some(radio_edge_isr), arg);
        }
        if ret != ESP_OK as i32 {
            drop(Box::from_raw(arg.cast::<EdgeRecorder>()));
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pins::RF_RX_GPIO);
    }
    info!("hardware: radio receiver on GPIO{}", pins::RF_RX_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_radio_isr(recorder: EdgeRecorder) -> Result<(), HwInitError> {
    // no edges on the host; the receiver half simply stays empty
    drop(recorder);
    log::info!("hardware(sim): radio ISR skipped");
    Ok(())
}
