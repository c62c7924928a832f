//! SenseStack main module: firmware entry point.
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  I2cBus        HttpDelivery    FlatFileStore   LogEventSink    │
//! │  (BusPort)     (DeliveryPort)  (ConfigPort)    (EventSink)     │
//! │  WifiAdapter   Web UI mailbox  StatusLed       ButtonDriver    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Roster · Exchange · Report · Publisher                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven): ReportCycle · Housekeeping       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use sensestack::adapters::device_id::DeviceId;
use sensestack::adapters::flat_store::{self, FlatFileStore, SETTINGS_PATH};
use sensestack::adapters::http_delivery::{HttpDelivery, OfflineDelivery};
use sensestack::adapters::i2c_bus::I2cBus;
use sensestack::adapters::log_sink::LogEventSink;
use sensestack::adapters::time::MonotonicClock;
use sensestack::adapters::web_ui::{self, SharedUi, UiSnapshot};
use sensestack::adapters::wifi::{ConnectivityPort, WifiAdapter};
use sensestack::app::commands::AppCommand;
use sensestack::app::events::AppEvent;
use sensestack::app::ports::{BusPort, ConfigPort, EventSink, ScheduleFiredKind, SchedulerDelegate};
use sensestack::app::service::{AppService, CommandEffect};
use sensestack::config::NodeConfig;
use sensestack::drivers::button::{ButtonAction, ButtonDriver};
use sensestack::drivers::status_led::StatusLed;
use sensestack::protocol::PROTOCOL_REVISION;
use sensestack::scheduler::{Schedule, ScheduleKind, Scheduler, TaskId};

const HOUSEKEEPING_MS: u32 = 50;
/// Grace period before a requested restart, so the log and HTTP reply
/// get out.
const RESTART_DELAY_MS: u32 = 1_000;

// ── Scheduler delegate ────────────────────────────────────────
//
// The scheduler only records what fired; the loop below acts on it, so
// the delegate never needs to borrow the service or the peripherals.

#[derive(Default)]
struct DueTasks {
    fired: heapless::Vec<TaskId, 4>,
}

impl SchedulerDelegate for DueTasks {
    fn on_schedule_fired(&mut self, task: TaskId, kind: ScheduleFiredKind) {
        if kind == ScheduleFiredKind::OneShot {
            info!("Schedule fired: {:?} (one-shot)", task);
        }
        let _ = self.fired.push(task);
    }
}

// ── Event sink with LED feedback ──────────────────────────────

/// Logs every event and blinks the status LED once per polled node.
struct CycleSink<'a, P: embedded_hal::digital::OutputPin> {
    log: &'a mut LogEventSink,
    led: &'a mut StatusLed<P>,
    clock: &'a MonotonicClock,
}

impl<P: embedded_hal::digital::OutputPin> EventSink for CycleSink<'_, P> {
    fn emit(&mut self, event: &AppEvent) {
        if matches!(event, AppEvent::ExchangeFinished { .. }) {
            self.led.blink(self.clock.now_ms());
        }
        self.log.emit(event);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SenseStack v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let clock = MonotonicClock::new();

    // ── 2. Settings (SPIFFS mount failure is fatal) ───────────
    flat_store::mount_spiffs().context("settings storage unavailable")?;
    let store = FlatFileStore::new(SETTINGS_PATH);

    let device = DeviceId::read();
    let hostname = device.default_name();
    info!("Device ID: {} (MAC {}, hostname {})", device.short_id(), device, hostname);

    let config = if store.exists() {
        store.load().unwrap_or_else(|e| {
            warn!("Settings unreadable ({}), using defaults", e);
            NodeConfig::with_name(&hostname)
        })
    } else {
        info!("First boot, using defaults");
        NodeConfig::with_name(&hostname)
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let i2c_config = I2cConfig::new().baudrate(100.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &i2c_config,
    )?;
    let mut bus = I2cBus::new(i2c);

    let mut led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?, config.led_enabled);
    let mut button_pin = PinDriver::input(peripherals.pins.gpio0)?;
    button_pin.set_pull(Pull::Up)?;
    let mut button = ButtonDriver::new();

    // ── 4. Network ────────────────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(esp_wifi);
    if let Err(e) = wifi.connect() {
        warn!("WiFi: {}", e);
    }
    let mut http = HttpDelivery::default();

    let ui: SharedUi = Arc::new(Mutex::new(UiSnapshot {
        config: config.clone(),
        ..Default::default()
    }));
    let _server = web_ui::start_server(ui.clone())?;

    // ── 5. App service ────────────────────────────────────────
    let mut log_sink = LogEventSink::new();
    let mut app = AppService::new(config);
    app.start(&mut bus, &mut log_sink);
    publish_ui(&ui, &app, &clock);

    // ── 6. Schedules ──────────────────────────────────────────
    let mut sched = Scheduler::new();
    let report_slot = sched.add(
        Schedule {
            label: "report",
            task: TaskId::ReportCycle,
            kind: ScheduleKind::Periodic {
                interval_ms: app.config().update_interval_ms,
                immediate: true,
            },
            enabled: true,
        },
        clock.now_ms(),
    );
    sched.add(
        Schedule {
            label: "housekeeping",
            task: TaskId::Housekeeping,
            kind: ScheduleKind::Periodic {
                interval_ms: HOUSEKEEPING_MS,
                immediate: false,
            },
            enabled: true,
        },
        clock.now_ms(),
    );
    let mut due = DueTasks::default();

    info!(
        "System ready ({} schedules, bus protocol rev {}). Entering control loop.",
        sched.active_count(),
        PROTOCOL_REVISION
    );

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();
        sched.tick(now, &mut due);

        for task in core::mem::take(&mut due.fired) {
            match task {
                TaskId::ReportCycle => {
                    let mut sink = CycleSink {
                        log: &mut log_sink,
                        led: &mut led,
                        clock: &clock,
                    };
                    if wifi.is_connected() {
                        app.run_report_cycle(&mut bus, &mut http, &mut sink);
                    } else {
                        app.run_report_cycle(&mut bus, &mut OfflineDelivery, &mut sink);
                    }
                    publish_ui(&ui, &app, &clock);
                }

                TaskId::Housekeeping => {
                    led.tick(now);
                    wifi.poll(now);
                    refresh_uptime(&ui, &app, &clock);

                    let mut commands = heapless::Vec::<AppCommand, 2>::new();
                    if let Some(action) = button.poll(&mut button_pin, now) {
                        info!("Button: {:?}", action);
                        let _ = commands.push(match action {
                            ButtonAction::Reboot => AppCommand::Reboot,
                            ButtonAction::FactoryReset => AppCommand::FactoryReset,
                        });
                    }
                    if let Some(cmd) = ui.lock().ok().and_then(|mut s| s.pending.take()) {
                        let _ = commands.push(cmd);
                    }

                    for cmd in commands {
                        match apply_command(&mut app, cmd, &mut bus, &store, &mut log_sink) {
                            Some(CommandEffect::IntervalChanged(ms)) => {
                                if let Some(slot) = report_slot {
                                    sched.set_interval(slot, ms, now);
                                }
                            }
                            Some(CommandEffect::Restart) => {
                                sched.add(
                                    Schedule {
                                        label: "restart",
                                        task: TaskId::Restart,
                                        kind: ScheduleKind::OneShot {
                                            delay_ms: RESTART_DELAY_MS,
                                        },
                                        enabled: true,
                                    },
                                    now,
                                );
                            }
                            Some(CommandEffect::None) | None => {}
                        }
                        led.set_enabled(app.config().led_enabled);
                        publish_ui(&ui, &app, &clock);
                    }
                }

                TaskId::Restart => {
                    warn!("Restarting");
                    esp_idf_hal::reset::restart();
                }
            }
        }

        FreeRtos::delay_ms(10);
    }
}

fn apply_command(
    app: &mut AppService,
    cmd: AppCommand,
    bus: &mut impl BusPort,
    store: &impl ConfigPort,
    sink: &mut impl EventSink,
) -> Option<CommandEffect> {
    match app.handle_command(cmd, bus, store, sink) {
        Ok(effect) => Some(effect),
        Err(e) => {
            warn!("Command rejected: {}", e);
            None
        }
    }
}

/// Push the latest report, status and settings into the UI mailbox.
fn publish_ui(ui: &SharedUi, app: &AppService, clock: &MonotonicClock) {
    if let Ok(mut snapshot) = ui.lock() {
        snapshot.status = Some(app.status(clock.uptime_secs()));
        snapshot.latest_json = app.publisher().latest_json().map(str::to_owned);
        snapshot.config = app.config().clone();
    }
}

fn refresh_uptime(ui: &SharedUi, app: &AppService, clock: &MonotonicClock) {
    if let Ok(mut snapshot) = ui.lock() {
        match snapshot.status.as_mut() {
            Some(status) => status.uptime = clock.uptime_secs(),
            None => snapshot.status = Some(app.status(clock.uptime_secs())),
        }
    }
}
