//! GrowLight firmware entry point
//!
//! Hexagonal architecture with a single cooperative run loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PixelStrip     NvsSettingsStore   BleAdapter        Watchdog  │
//! │  (PixelPort)    (SettingsPort)     (Advertising +    (Liveness │
//! │                                     ResponderPort)    Port)    │
//! │  LogEventSink   UptimeClock                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  LightEngine · Scheduler · write-through Settings      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runtime: TRANSPORT_EVENTS · ConnectionManager · 200 ms tick   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::peripherals::Peripherals;
use log::info;

use growlight::adapters::ble::BleAdapter;
use growlight::adapters::device_id;
use growlight::adapters::log_sink::LogEventSink;
use growlight::adapters::nvs::NvsSettingsStore;
use growlight::adapters::time::UptimeClock;
use growlight::app::runtime::{Ports, Runtime};
use growlight::config::{HardwareConfig, RuntimeConfig};
use growlight::drivers::pixel_strip::PixelStrip;
use growlight::drivers::watchdog::Watchdog;
use growlight::events::TRANSPORT_EVENTS;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GrowLight v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let hardware = HardwareConfig::default();
    let timing = RuntimeConfig::default();
    let peripherals = Peripherals::take()?;
    let clock = UptimeClock::new();

    // ── 2. Settings store ─────────────────────────────────────
    let store = NvsSettingsStore::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;

    // ── 3. Pixel strip ────────────────────────────────────────
    // SAFETY: the strip GPIO is not claimed by any other driver.
    let led_pin = unsafe { AnyOutputPin::new(hardware.led_gpio) };
    let pixels = PixelStrip::new(peripherals.rmt.channel0, led_pin, hardware.pixel_count)
        .map_err(|e| anyhow!("{}", e))?;

    // ── 4. BLE stack ──────────────────────────────────────────
    let mac = device_id::read_mac();
    let name = device_id::device_name(&mac);
    info!("Device name: {}", name);
    let ble = BleAdapter::init(name).map_err(|e| anyhow!("{}", e))?;

    // ── 5. Boot the run loop ──────────────────────────────────
    let ports = Ports {
        pixels,
        store,
        ble,
        watchdog: Watchdog::new(timing.watchdog_timeout_ms),
        sink: LogEventSink::new(),
    };
    let mut runtime = Runtime::boot(ports, &hardware, clock.uptime_us())
        .map_err(|e| anyhow!("boot failed: {}", e))?;

    info!("System ready. Entering run loop.");
    runtime.run_forever(
        &TRANSPORT_EVENTS,
        || clock.uptime_us(),
        &mut FreeRtos,
        timing.loop_interval_ms,
    )
}
