//! Integration tests: report cycle → JSON body → delivery outcome.

use sensestack::adapters::http_delivery::OfflineDelivery;
use sensestack::adapters::sim_bus::SimulatedBus;
use sensestack::app::events::AppEvent;
use sensestack::app::service::AppService;
use sensestack::config::NodeConfig;

use crate::mock_ports::{addr, climate, standard_bus, RecordingDelivery, RecordingSink};

fn configured() -> NodeConfig {
    NodeConfig {
        uuid: "6f1c2a9e-0000-4000-8000-00000000beef".into(),
        name: "roof-station".into(),
        endpoint_url: "https://collector.example/api/report".into(),
        update_interval_ms: 10_000,
        latitude: "52.3702".into(),
        longitude: "4.8952".into(),
        led_enabled: true,
    }
}

#[test]
fn cycle_posts_the_merged_report_once() {
    let mut app = AppService::new(configured());
    let mut bus = standard_bus();
    let mut delivery = RecordingDelivery::accepting();
    let mut sink = RecordingSink::new();

    let summary = app.run_report_cycle(&mut bus, &mut delivery, &mut sink);

    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.fields, 7);
    assert!(summary.outcome.is_success());
    assert_eq!(delivery.posts.len(), 1);
    assert_eq!(delivery.posts[0].0, "https://collector.example/api/report");

    let body = delivery.last_json();
    assert_eq!(body["uuid"], "6f1c2a9e-0000-4000-8000-00000000beef");
    assert_eq!(body["name"], "roof-station");
    assert_eq!(body["lat"], "52.3702");
    assert_eq!(body["long"], "4.8952");
    assert_eq!(body["data"]["temperature"], "21.4 c");
    assert_eq!(body["data"]["co_density"], "3.2 ppm");
    assert_eq!(body["data"].as_object().unwrap().len(), 7);

    assert!(sink
        .events
        .contains(&AppEvent::Delivered(summary.outcome.clone())));
}

#[test]
fn served_json_matches_the_posted_body() {
    let mut app = AppService::new(configured());
    let mut delivery = RecordingDelivery::accepting();
    let mut sink = RecordingSink::new();

    app.run_report_cycle(&mut standard_bus(), &mut delivery, &mut sink);

    assert_eq!(app.publisher().latest_json(), Some(delivery.posts[0].1.as_str()));
}

#[test]
fn failed_delivery_is_reported_in_status_and_not_retried() {
    let mut app = AppService::new(configured());
    let mut delivery = RecordingDelivery::failing(503, "Service Unavailable");
    let mut sink = RecordingSink::new();

    let summary = app.run_report_cycle(&mut standard_bus(), &mut delivery, &mut sink);

    assert_eq!(summary.outcome.code, 503);
    assert_eq!(delivery.posts.len(), 1);
    let status = app.status(5);
    assert_eq!(status.latest_post_reply, "503 Service Unavailable");
    // The report is still kept for the local viewer.
    assert!(app.publisher().latest_report().is_some());
}

#[test]
fn offline_cycle_still_refreshes_the_viewer() {
    let mut app = AppService::new(configured());
    let mut sink = RecordingSink::new();

    let summary = app.run_report_cycle(&mut standard_bus(), &mut OfflineDelivery, &mut sink);

    assert_eq!(summary.outcome.code, -1);
    let json: serde_json::Value =
        serde_json::from_str(app.publisher().latest_json().unwrap()).unwrap();
    assert_eq!(json["data"]["pm10"], "30 ug/m3");
}

#[test]
fn no_endpoint_means_nothing_is_sent() {
    let mut app = AppService::new(NodeConfig::default());
    let mut delivery = RecordingDelivery::accepting();
    let mut sink = RecordingSink::new();

    let summary = app.run_report_cycle(&mut standard_bus(), &mut delivery, &mut sink);

    assert_eq!(summary.outcome.code, 0);
    assert!(delivery.posts.is_empty());
    assert!(app.publisher().latest_json().is_some());
}

#[test]
fn each_cycle_posts_fresh_readings() {
    let mut app = AppService::new(configured());
    let mut bus = SimulatedBus::new();
    bus.attach(addr(11), climate(20.0, 40.0));
    let mut delivery = RecordingDelivery::accepting();
    let mut sink = RecordingSink::new();

    app.run_report_cycle(&mut bus, &mut delivery, &mut sink);
    bus.attach(addr(11), climate(24.5, 41.0));
    let summary = app.run_report_cycle(&mut bus, &mut delivery, &mut sink);

    assert_eq!(summary.cycle, 2);
    assert_eq!(delivery.posts.len(), 2);
    assert_eq!(delivery.last_json()["data"]["temperature"], "24.5 c");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CycleCompleted { .. })),
        2
    );
}
