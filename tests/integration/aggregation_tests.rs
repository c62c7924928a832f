//! Integration tests: bus scan → per-node exchange → merged report.
//!
//! Real responders sit behind the simulated bus, so every byte goes
//! through the node-side encoder and the master-side decoder.

use sensestack::adapters::sim_bus::SimulatedBus;
use sensestack::app::aggregator::{self, AggregatorState, Diagnostic, ExchangeOutcome};
use sensestack::app::events::AppEvent;
use sensestack::app::report::NodeIdentity;
use sensestack::error::BusError;
use sensestack::frame::{encode_empty, encode_field, FieldKind, ReplyChunk};
use sensestack::node::{Field, FieldTable};
use sensestack::protocol::{DATA_TRANSMISSION_TIMEOUT, MAX_SENSORS};

use crate::mock_ports::{addr, carbon_monoxide, climate, shared, standard_bus, RecordingSink};

fn identity() -> NodeIdentity {
    NodeIdentity {
        name: "roof".into(),
        uuid: "6f1c2a9e".into(),
        latitude: "52.37".into(),
        longitude: "4.89".into(),
    }
}

fn key(text: &str, more: bool) -> ReplyChunk {
    encode_field(FieldKind::Key, text, more).unwrap()
}

fn value(text: &str, more: bool) -> ReplyChunk {
    encode_field(FieldKind::Value, text, more).unwrap()
}

#[test]
fn standard_nodes_merge_into_one_report() {
    let mut bus = standard_bus();
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::new(identity()), &mut bus, &mut sink);

    let polled: Vec<u8> = out.state.roster.iter().map(|a| a.get()).collect();
    assert_eq!(polled, vec![11, 12, 16, 17]);
    assert_eq!(out.state.cycles, 1);

    let data = out.report.flattened();
    assert_eq!(data.get("temperature"), Some(&"21.4 c"));
    assert_eq!(data.get("humidity"), Some(&"55 %"));
    assert_eq!(data.get("pm1"), Some(&"5 ug/m3"));
    assert_eq!(data.get("pm2_5"), Some(&"12 ug/m3"));
    assert_eq!(data.get("pm10"), Some(&"30 ug/m3"));
    assert_eq!(data.get("uv_intensity"), Some(&"7.5 mw/cm^2"));
    assert_eq!(data.get("co_density"), Some(&"3.2 ppm"));
    assert_eq!(data.len(), 7);

    assert!(out.exchanges.iter().all(|ex| ex.outcome == ExchangeOutcome::Terminated));
    assert!(out.exchanges.iter().all(|ex| ex.diagnostics.is_empty()));
    // Two requests per field, no extras.
    assert_eq!(bus.requests_to(addr(12)), 6);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ExchangeFinished { .. })),
        4
    );
}

#[test]
fn empty_bus_is_a_valid_cycle() {
    let mut bus = SimulatedBus::new();
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::new(identity()), &mut bus, &mut sink);

    assert!(out.state.roster.is_empty());
    assert_eq!(out.report.node_count(), 0);
    assert_eq!(out.report.to_json().unwrap(), r#"{"uuid":"6f1c2a9e","name":"roof","lat":"52.37","long":"4.89","data":{}}"#);
    assert!(sink
        .events
        .contains(&AppEvent::ScanCompleted { nodes: 0, full: false }));
}

#[test]
fn silent_node_contributes_an_empty_record() {
    let mut bus = SimulatedBus::new();
    bus.attach(addr(14), FieldTable::new());
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(out.report.node_count(), 1);
    assert!(out.report.record(addr(14)).unwrap().is_empty());
    assert_eq!(out.exchanges[0].requests, 1);
    assert_eq!(out.exchanges[0].outcome, ExchangeOutcome::Terminated);
}

#[test]
fn runaway_node_is_cut_off_and_others_still_polled() {
    let mut bus = standard_bus();
    // Never terminates: keys forever.
    bus.attach_scripted(addr(13), vec![key("spam", true)]);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(bus.requests_to(addr(13)), u32::from(DATA_TRANSMISSION_TIMEOUT));
    let runaway = out.exchanges.iter().find(|ex| ex.address == addr(13)).unwrap();
    assert_eq!(runaway.outcome, ExchangeOutcome::TimedOut);
    assert!(runaway.record.is_empty());

    // Nodes after the runaway one in roster order were still drained.
    assert!(out.report.record(addr(16)).is_some_and(|r| r.get("uv_intensity").is_some()));
    assert!(out.report.record(addr(17)).is_some_and(|r| r.get("co_density").is_some()));
}

#[test]
fn probe_faults_are_reported_and_skipped() {
    let mut bus = SimulatedBus::new();
    bus.attach(addr(11), climate(20.0, 40.0));
    bus.attach_faulty(addr(40), BusError::ArbitrationLoss);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(out.state.roster.len(), 1);
    assert!(sink.events.contains(&AppEvent::ProbeFailed {
        address: addr(40),
        error: BusError::ArbitrationLoss,
    }));
}

#[test]
fn roster_stops_at_capacity() {
    let mut bus = SimulatedBus::new();
    for raw in 20..20 + MAX_SENSORS as u8 + 2 {
        bus.attach(addr(raw), carbon_monoxide(f32::from(raw)));
    }
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(out.state.roster.len(), MAX_SENSORS);
    assert!(sink.events.contains(&AppEvent::ScanCompleted {
        nodes: MAX_SENSORS,
        full: true,
    }));
    assert_eq!(bus.requests_to(addr(20 + MAX_SENSORS as u8)), 0);
}

#[test]
fn idle_high_padding_decodes_the_same() {
    let mut plain = standard_bus();
    let mut padded = SimulatedBus::new().padded();
    padded.attach(addr(11), climate(21.43, 55.2));
    padded.attach(addr(17), carbon_monoxide(3.24));
    let mut sink = RecordingSink::new();

    let a = aggregator::run_cycle(AggregatorState::default(), &mut plain, &mut sink);
    let b = aggregator::run_cycle(AggregatorState::default(), &mut padded, &mut sink);

    assert_eq!(a.report.record(addr(11)), b.report.record(addr(11)));
    assert_eq!(a.report.record(addr(17)), b.report.record(addr(17)));
}

#[test]
fn later_node_wins_a_key_collision() {
    let mut bus = SimulatedBus::new();
    bus.attach(addr(11), climate(10.0, 50.0));
    bus.attach(addr(30), climate(30.0, 50.0));
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(out.report.flattened().get("temperature"), Some(&"30.0 c"));
    // Both records are kept per node.
    assert_eq!(out.report.record(addr(11)).unwrap().get("temperature"), Some("10.0 c"));
}

#[test]
fn protocol_violations_become_diagnostics() {
    let mut bus = SimulatedBus::new();
    bus.attach_scripted(
        addr(50),
        vec![
            value("orphan", true),
            key("rain", true),
            value("0 mm", true),
            key("dangling", false),
        ],
    );
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    let ex = &out.exchanges[0];
    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert_eq!(ex.record.get("rain"), Some("0 mm"));
    assert_eq!(ex.record.len(), 1);
    assert!(ex.diagnostics.iter().any(|d| matches!(d, Diagnostic::OrphanValue(t) if t == "orphan")));
    assert!(ex.diagnostics.iter().any(|d| matches!(d, Diagnostic::DanglingKey(t) if t == "dangling")));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Diagnostic { .. })),
        2
    );
}

#[test]
fn bare_terminate_leaves_the_key_dangling() {
    let mut bus = SimulatedBus::new();
    bus.attach_scripted(addr(60), vec![key("status", true), encode_empty(false)]);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    let ex = &out.exchanges[0];
    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert!(ex.record.is_empty());
    assert!(ex.diagnostics.iter().any(|d| matches!(d, Diagnostic::DanglingKey(_))));
}

#[test]
fn a_full_field_table_fits_the_request_budget() {
    let mut table = FieldTable::new();
    for i in 0..table.capacity() {
        table.push(Field::new(&format!("k{i}"), &format!("v{i}"))).unwrap();
    }
    let mut bus = SimulatedBus::new();
    bus.attach(addr(70), table);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    let ex = &out.exchanges[0];
    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert_eq!(ex.requests, DATA_TRANSMISSION_TIMEOUT);
    assert_eq!(ex.record.len(), DATA_TRANSMISSION_TIMEOUT as usize / 2);
}

#[test]
fn readings_change_between_cycles() {
    let (probe, source) = shared(climate(18.0, 60.0));
    let mut bus = SimulatedBus::new();
    bus.attach(addr(11), source);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);
    assert_eq!(out.report.flattened().get("temperature"), Some(&"18.0 c"));

    probe.lock().unwrap().record(19.5, 61.0);
    let out = aggregator::run_cycle(out.state, &mut bus, &mut sink);
    assert_eq!(out.report.flattened().get("temperature"), Some(&"19.5 c"));
    assert_eq!(out.state.cycles, 2);
}

#[test]
fn departed_node_drops_out_of_the_next_cycle() {
    let mut bus = standard_bus();
    let mut sink = RecordingSink::new();
    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);
    assert_eq!(out.report.node_count(), 4);

    bus.detach(addr(12));
    let out = aggregator::run_cycle(out.state, &mut bus, &mut sink);
    assert_eq!(out.report.node_count(), 3);
    assert!(out.report.flattened().get("pm2_5").is_none());
}

#[test]
fn two_nodes_merge_without_cross_contamination() {
    let mut bus = SimulatedBus::new();
    bus.attach_scripted(
        addr(11),
        vec![
            key("temperature", true),
            value("21.4 c", true),
            key("humidity", true),
            value("55 %", false),
        ],
    );
    bus.attach_scripted(addr(16), vec![key("uv_intensity", true), value("3.1 mw/cm^2", false)]);
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    assert_eq!(out.exchanges[0].requests, 4);
    assert_eq!(out.exchanges[1].requests, 2);
    let climate = out.report.record(addr(11)).unwrap();
    let uv = out.report.record(addr(16)).unwrap();
    assert_eq!(climate.len(), 2);
    assert_eq!(uv.len(), 1);
    assert!(uv.get("temperature").is_none());
    assert!(climate.get("uv_intensity").is_none());
    assert_eq!(out.report.flattened().len(), 3);
}

#[test]
fn rescanning_an_unchanged_bus_gives_the_same_roster() {
    let mut bus = standard_bus();
    let mut sink = RecordingSink::new();

    let first = aggregator::rescan(AggregatorState::default(), &mut bus, &mut sink);
    let second = aggregator::rescan(first.clone(), &mut bus, &mut sink);

    assert_eq!(first.roster, second.roster);
}

#[test]
fn all_runaway_nodes_stay_within_the_cycle_bound() {
    let mut bus = SimulatedBus::new();
    for raw in [5, 9, 33, 90] {
        bus.attach_scripted(addr(raw), vec![value("x", true)]);
    }
    let mut sink = RecordingSink::new();

    let out = aggregator::run_cycle(AggregatorState::default(), &mut bus, &mut sink);

    let total: u32 = [5, 9, 33, 90].iter().map(|&raw| bus.requests_to(addr(raw))).sum();
    assert_eq!(total, 4 * u32::from(DATA_TRANSMISSION_TIMEOUT));
    assert!(out.exchanges.iter().all(|ex| ex.outcome == ExchangeOutcome::TimedOut));
}
