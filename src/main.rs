//! KC868 bridge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  I2cExpanderBus  AdcSampler  EdgeReceiver  PulseTransmitter  │
//! │  LogEventSink    NvsAdapter  MonotonicClock  UART console    │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  SharedIo (expander · analog · registers)              │  │
//! │  │  BridgeService (refresh · mirror · radio debounce)     │  │
//! │  │  ModbusServer  ◀── REQUEST_CHANNEL ◀── RTU / TCP tasks │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_idf_hal::delay::{Ets, NON_BLOCK};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use kcbridge::adapters::hardware::{AdcSampler, install_radio_isr};
use kcbridge::adapters::i2c_expander::I2cExpanderBus;
use kcbridge::adapters::log_sink::LogEventSink;
use kcbridge::adapters::nvs::NvsAdapter;
use kcbridge::adapters::radio::{PulseTransmitter, edge_channel};
use kcbridge::adapters::time::MonotonicClock;
use kcbridge::app::ports::ConfigPort;
use kcbridge::app::service::BridgeService;
use kcbridge::config::BridgeConfig;
use kcbridge::console::{CharCase, LineReader};
use kcbridge::io::SharedIo;
use kcbridge::io::analog::AnalogCache;
use kcbridge::io::expander::ExpanderBank;
use kcbridge::io::registers::VirtualRegisters;
use kcbridge::modbus::channels::{REPLY_CHANNEL, REQUEST_CHANNEL, service_requests};
use kcbridge::modbus::server::ModbusServer;
use kcbridge::pins;

/// Requests executed per loop pass before the driver work resumes.
const REQUEST_BUDGET: usize = 4;
const LOOP_SLEEP_MS: u64 = 5;
const CONSOLE_BAUD: u32 = 115_200;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  KC868 bridge v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load().map(|cfg| cfg.validate().map(|()| cfg)) {
        Ok(Ok(cfg)) => {
            info!("Config loaded from NVS");
            cfg
        }
        Ok(Err(reason)) => {
            warn!("Stored config rejected ({}), using defaults", reason);
            BridgeConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            BridgeConfig::default()
        }
    };
    let net = &config.network;
    info!(
        "Network: {} {}.{}.{}.{} gw {}.{}.{}.{}",
        net.hostname, net.ip[0], net.ip[1], net.ip[2], net.ip[3],
        net.gateway[0], net.gateway[1], net.gateway[2], net.gateway[3]
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number comes from `pins` and is claimed exactly once.
    let (sda, scl, rf_tx) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyOutputPin::new(pins::RF_TX_GPIO),
        )
    };
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_cfg)?;
    info!("Init I2C OK (SDA {}, SCL {})", pins::I2C_SDA_GPIO, pins::I2C_SCL_GPIO);

    let uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio1,
        peripherals.pins.gpio3,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(CONSOLE_BAUD)),
    )?;

    let mut radio_tx = PulseTransmitter::new(PinDriver::output(rf_tx)?, Ets);
    let (edge_recorder, mut rx) = edge_channel();
    install_radio_isr(edge_recorder)?;

    // ── 4. Shared stores + protocol server ────────────────────
    let io: SharedIo<CriticalSectionRawMutex, _, _> = SharedIo::new(
        ExpanderBank::new(I2cExpanderBus::new(i2c), &config.expander),
        AnalogCache::new(AdcSampler::new()?, &config.analog),
        VirtualRegisters::new(usize::from(config.registers.holding_count)),
    );
    let server = ModbusServer::new(&io, config.modbus.unit_id);
    info!(
        "Modbus: unit {} (TCP port {}, RTU {} baud)",
        config.modbus.unit_id, config.modbus.tcp_port, config.modbus.rtu_baud
    );

    // ── 5. App service ────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut service = BridgeService::new(config);
    service.begin(clock.now_ms(), &io, &mut sink);

    let mut console = LineReader::new(CharCase::Lower, true);
    info!("System ready. Entering driver loop.");

    // ── 6. Driver loop ────────────────────────────────────────
    loop {
        rx.drain();
        service.tick(clock.now_ms(), &io, &mut rx, &mut sink);

        service_requests(&server, &REQUEST_CHANNEL, &REPLY_CHANNEL, REQUEST_BUDGET);

        let mut byte = [0u8; 1];
        while uart.read(&mut byte, NON_BLOCK).unwrap_or(0) == 1 {
            let mut echo = String::new();
            let line = console.feed(byte[0], &mut echo);
            if !echo.is_empty() {
                let _ = uart.write(echo.as_bytes());
            }
            if let Some(line) = line {
                // errors are already reported through the sink
                let _ = service.handle_line(&line, &mut radio_tx, &nvs, &mut sink);
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(LOOP_SLEEP_MS));
    }
}
