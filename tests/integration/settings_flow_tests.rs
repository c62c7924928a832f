//! Integration tests: settings form → mailbox → AppService → store.
//!
//! Mirrors what the control loop does with a pending UI command.

use sensestack::adapters::flat_store::FlatFileStore;
use sensestack::adapters::http_delivery::OfflineDelivery;
use sensestack::adapters::sim_bus::SimulatedBus;
use sensestack::adapters::web_ui::{dispatch, Route, UiSnapshot};
use sensestack::app::commands::AppCommand;
use sensestack::app::events::AppEvent;
use sensestack::app::ports::{ConfigError, ConfigPort};
use sensestack::app::service::{AppService, CommandEffect};
use sensestack::config::NodeConfig;

use crate::mock_ports::{addr, climate, standard_bus, MemoryStore, RecordingSink};

/// Post a form and hand whatever the handler queued to the service.
fn submit(
    app: &mut AppService,
    ui: &mut UiSnapshot,
    form: &str,
    bus: &mut SimulatedBus,
    store: &impl ConfigPort,
    sink: &mut RecordingSink,
) -> (u16, Option<Result<CommandEffect, ConfigError>>) {
    let response = dispatch(Route::SaveSettings, form.as_bytes(), ui);
    let effect = ui
        .pending
        .take()
        .map(|cmd| app.handle_command(cmd, bus, store, sink));
    (response.status, effect)
}

fn ui_for(app: &AppService) -> UiSnapshot {
    UiSnapshot {
        config: app.config().clone(),
        ..Default::default()
    }
}

#[test]
fn saved_form_is_persisted_and_applied() {
    let mut app = AppService::new(NodeConfig::with_name("sensestack-aabbcc"));
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();

    let (status, effect) = submit(
        &mut app,
        &mut ui,
        "nameInput=garden&urlInput=http%3A%2F%2Fcollector.local%2Fingest&latInput=51.5&longInput=-0.12",
        &mut bus,
        &store,
        &mut sink,
    );

    assert_eq!(status, 302);
    assert_eq!(effect, Some(Ok(CommandEffect::None)));
    assert_eq!(app.config().name, "garden");
    assert_eq!(app.config().endpoint_url, "http://collector.local/ingest");
    assert_eq!(store.saved.borrow().as_ref(), Some(app.config()));
    assert_eq!(*store.saves.borrow(), 1);
    assert!(sink.events.contains(&AppEvent::SettingsChanged));
}

#[test]
fn new_identity_shows_up_in_the_next_report() {
    let mut app = AppService::new(NodeConfig::default());
    let mut ui = ui_for(&app);
    let mut bus = standard_bus();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();

    submit(&mut app, &mut ui, "uuidInput=abc-123&latInput=10&longInput=20", &mut bus, &store, &mut sink);
    app.run_report_cycle(&mut bus, &mut OfflineDelivery, &mut sink);

    let json: serde_json::Value =
        serde_json::from_str(app.publisher().latest_json().unwrap()).unwrap();
    assert_eq!(json["uuid"], "abc-123");
    assert_eq!(json["lat"], "10");
    assert_eq!(json["long"], "20");
}

#[test]
fn interval_change_re_arms_the_schedule() {
    let mut app = AppService::new(NodeConfig::default());
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();

    let (_, effect) = submit(&mut app, &mut ui, "intervalInput=15000", &mut bus, &store, &mut sink);

    assert_eq!(effect, Some(Ok(CommandEffect::IntervalChanged(15_000))));
    assert_eq!(app.status(0).update_interval_ms, 15_000);
}

#[test]
fn rejected_form_queues_nothing() {
    let mut app = AppService::new(NodeConfig::default());
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();

    let (status, effect) = submit(&mut app, &mut ui, "latInput=123.4", &mut bus, &store, &mut sink);

    assert_eq!(status, 400);
    assert!(effect.is_none());
    assert_eq!(app.config(), &NodeConfig::default());
    assert!(store.saved.borrow().is_none());
}

#[test]
fn storage_failure_keeps_the_running_settings() {
    let mut app = AppService::new(NodeConfig::default());
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let store = MemoryStore {
        fail_writes: true,
        ..MemoryStore::default()
    };
    let mut sink = RecordingSink::new();

    let (_, effect) = submit(&mut app, &mut ui, "nameInput=garden", &mut bus, &store, &mut sink);

    assert_eq!(effect, Some(Err(ConfigError::IoError)));
    assert_eq!(app.config().name, "sensestack");
    assert!(!sink.events.contains(&AppEvent::SettingsChanged));
}

#[test]
fn led_toggle_round_trips() {
    let mut app = AppService::new(NodeConfig::default());
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();

    submit(&mut app, &mut ui, "ledInput=Off", &mut bus, &store, &mut sink);
    assert!(!app.config().led_enabled);
    submit(&mut app, &mut ui, "ledInput=On", &mut bus, &store, &mut sink);
    assert!(app.config().led_enabled);
    assert_eq!(*store.saves.borrow(), 2);
}

#[test]
fn factory_reset_erases_and_restarts() {
    let mut app = AppService::new(NodeConfig::default());
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    store.save(&NodeConfig::with_name("old")).unwrap();
    let mut sink = RecordingSink::new();

    let effect = app.handle_command(AppCommand::FactoryReset, &mut bus, &store, &mut sink);

    assert_eq!(effect, Ok(CommandEffect::Restart));
    assert!(*store.erased.borrow());
    assert_eq!(store.load().unwrap(), NodeConfig::default());
    assert!(sink.events.contains(&AppEvent::FactoryReset));
}

#[test]
fn rescan_command_picks_up_new_nodes() {
    let mut app = AppService::new(NodeConfig::default());
    let mut bus = SimulatedBus::new();
    let store = MemoryStore::new();
    let mut sink = RecordingSink::new();
    app.start(&mut bus, &mut sink);
    assert!(app.roster().is_empty());

    bus.attach(addr(11), climate(20.0, 50.0));
    let effect = app.handle_command(AppCommand::RescanBus, &mut bus, &store, &mut sink);

    assert_eq!(effect, Ok(CommandEffect::None));
    assert_eq!(app.status(0).connected_sensors, vec![11]);
}

#[test]
fn settings_survive_a_restart_on_flash() {
    let dir = std::env::temp_dir().join(format!("sensestack-flow-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let store = FlatFileStore::new(dir.join("settings.txt"));
    let _ = store.erase();

    let mut app = AppService::new(store.load().unwrap());
    let mut ui = ui_for(&app);
    let mut bus = SimulatedBus::new();
    let mut sink = RecordingSink::new();
    submit(
        &mut app,
        &mut ui,
        "nameInput=attic&intervalInput=60000&ledInput=Off",
        &mut bus,
        &store,
        &mut sink,
    );

    // "Reboot": a fresh service from what is on flash.
    let reloaded = AppService::new(store.load().unwrap());
    assert_eq!(reloaded.config(), app.config());
    assert_eq!(reloaded.config().update_interval_ms, 60_000);
    assert!(!reloaded.config().led_enabled);

    store.erase().unwrap();
    assert!(!store.exists());
}
