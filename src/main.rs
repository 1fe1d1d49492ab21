//! Cat smart-home firmware: main entry point.
//!
//! Hexagonal architecture driven by a fixed-rate tick.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   WifiAdapter   Esp32Time      │
//! │  (OutputPort)      (EventSink)    (NetworkPort) (Clock)        │
//! │  RtdbStream ×N     RtdbBackend                                 │
//! │  (StreamSource)    (BackendPort)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              SyncService (pure logic)                  │    │
//! │  │  Supervisor · Subscriptions · Mapper · Drivers         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TickScheduler (delegate-driven, fixed rate)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{debug, info, warn};

use cathome::adapters::hardware::HardwareAdapter;
use cathome::adapters::log_sink::LogEventSink;
use cathome::adapters::rtdb::esp_impl::{EspProbe, EspSseTransport};
use cathome::adapters::rtdb::{RtdbBackend, RtdbStream};
use cathome::adapters::time::Esp32TimeAdapter;
use cathome::adapters::wifi::WifiAdapter;
use cathome::app::channel::channel_table;
use cathome::app::ports::{Clock, TickDelegate};
use cathome::app::service::SyncService;
use cathome::app::supervisor::Readiness;
use cathome::config::SystemConfig;
use cathome::drivers::hw_init::{self, ServoChannels};
use cathome::scheduler::TickScheduler;
use cathome::startup;

// ── Tick delegate ─────────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the sync engine) to
// one `SyncService::tick` with every adapter wired in.

struct SyncLoop<P, S> {
    service: SyncService<RtdbStream<EspSseTransport>>,
    wifi: WifiAdapter,
    backend: RtdbBackend<EspProbe>,
    hw: HardwareAdapter<P, S>,
    sink: LogEventSink,
    not_ready_ticks: u32,
}

impl<P, S> TickDelegate for SyncLoop<P, S>
where
    P: embedded_hal::digital::OutputPin,
    S: embedded_hal::pwm::SetDutyCycle,
{
    fn on_tick(&mut self, now_ms: u64) {
        let report = self
            .service
            .tick(now_ms, &mut self.wifi, &mut self.backend, &mut self.hw, &mut self.sink);

        match report.readiness {
            Readiness::Ready => {
                if self.not_ready_ticks > 0 {
                    info!("Sync resumed after {} idle tick(s)", self.not_ready_ticks);
                    self.not_ready_ticks = 0;
                }
                if report.applied > 0 {
                    debug!("tick {}: {} write(s)", self.service.tick_count(), report.applied);
                }
            }
            Readiness::NotReady => self.not_ready_ticks = self.not_ready_ticks.saturating_add(1),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CatHome v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::load().unwrap_or_else(|e| {
        warn!("Config override rejected ({}), using defaults", e);
        SystemConfig::default()
    });
    info!("Database: {} ({:?})", config.database_url, config.camera_control);

    // ── 3. Hardware bring-up ──────────────────────────────────
    let peripherals = Peripherals::take()?;
    let servo_timer = hw_init::servo_timer(peripherals.ledc.timer0)?;
    let mut hw = hw_init::init_outputs(
        ServoChannels {
            camera_x: peripherals.ledc.channel0,
            camera_y: peripherals.ledc.channel1,
            laser_x: peripherals.ledc.channel2,
            laser_y: peripherals.ledc.channel3,
        },
        &servo_timer,
    )?;

    let channels = channel_table(config.camera_control);
    let mut service = SyncService::new(config.clone(), channels, |_| {
        RtdbStream::new(
            EspSseTransport::new(),
            &config.database_url,
            config.stream_keepalive_timeout_ms,
        )
    });
    service.bring_up(&mut hw);

    // ── 4. WiFi association ───────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?);
    wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)
        .map_err(|e| anyhow!("WiFi credentials: {e}"))?;

    let mut clock = Esp32TimeAdapter::new();
    startup::associate_network(&mut wifi, &mut clock, config.association_poll_ms);

    // ── 5. Backend bootstrap ──────────────────────────────────
    let mut backend = RtdbBackend::new(EspProbe, &config.database_url);
    startup::bootstrap_backend(
        &mut backend,
        &mut clock,
        config.backend_bootstrap_attempts,
        config.backend_bootstrap_delay_ms,
    );

    // ── 6. Initial subscriptions ──────────────────────────────
    let mut sink = LogEventSink::new();
    service.start(clock.now_ms(), &wifi, &backend, &mut sink);

    info!("System ready. Entering tick loop.");

    // ── 7. Tick loop ──────────────────────────────────────────
    let mut scheduler = TickScheduler::new(config.tick_interval_ms);
    let mut delegate = SyncLoop {
        service,
        wifi,
        backend,
        hw,
        sink,
        not_ready_ticks: 0,
    };
    scheduler.run(&mut clock, &mut delegate)
}
