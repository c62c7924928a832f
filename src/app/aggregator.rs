//! Reading aggregator: scan the bus, drain every node, merge a report.
//!
//! ```text
//!  scan ──▶ NodeRoster ──▶ for each node:                ──▶ Report
//!                            request ─▶ decode ─▶ pair
//!                            (≤ DATA_TRANSMISSION_TIMEOUT)
//! ```
//!
//! All cycle state travels in an explicit [`AggregatorState`] that goes
//! into [`run_cycle`] and comes back out with the report.

use log::{debug, warn};

use crate::error::{BusError, FrameError};
use crate::frame::{FieldKind, FieldText, FrameDecoder, FrameEvent};
use crate::protocol::{BusAddress, DATA_TRANSMISSION_TIMEOUT, MAX_SENSOR_REPLY_LENGTH};

use super::events::AppEvent;
use super::ports::{BusPort, EventSink};
use super::report::{NodeIdentity, Report, SensorRecord};
use super::roster::NodeRoster;

/// Diagnostics kept per exchange; extras are only logged.
const MAX_DIAGNOSTICS: usize = 8;

// ───────────────────────────────────────────────────────────────
// Exchange
// ───────────────────────────────────────────────────────────────

/// Something dropped while pairing a node's units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A value arrived with no key waiting for it.
    OrphanValue(FieldText),
    /// A key was never followed by a value.
    DanglingKey(FieldText),
    /// The decoder discarded a field.
    Frame(FrameError),
    /// A data request failed on the bus.
    Bus(BusError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The node sent `TERMINATE`.
    Terminated,
    /// The request budget ran out first; the record holds what was paired.
    TimedOut,
}

/// Result of draining one node.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub address: BusAddress,
    pub record: SensorRecord,
    pub requests: u16,
    pub outcome: ExchangeOutcome,
    pub diagnostics: heapless::Vec<Diagnostic, MAX_DIAGNOSTICS>,
}

impl Exchange {
    fn note(&mut self, diagnostic: Diagnostic) {
        debug!("Aggregator: {} {:?}", self.address, diagnostic);
        let _ = self.diagnostics.push(diagnostic);
    }
}

/// Request units from `address` until it terminates or `budget` requests
/// have been made.
///
/// A key is held until the next value completes the pair.  A value with
/// no key is dropped.  A key still waiting when the exchange ends is
/// dropped.  Failed requests count against the budget.
pub fn exchange(bus: &mut impl BusPort, address: BusAddress, budget: u16) -> Exchange {
    let mut ex = Exchange {
        address,
        record: SensorRecord::new(),
        requests: 0,
        outcome: ExchangeOutcome::TimedOut,
        diagnostics: heapless::Vec::new(),
    };
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; MAX_SENSOR_REPLY_LENGTH];
    let mut last: Option<FieldKind> = None;
    let mut pending_key: Option<FieldText> = None;

    while ex.requests < budget {
        ex.requests += 1;
        let received = match bus.request(address, &mut buf) {
            Ok(n) => n.min(buf.len()),
            Err(e) => {
                ex.note(Diagnostic::Bus(e));
                continue;
            }
        };

        for event in decoder.decode(&buf[..received]) {
            match event {
                FrameEvent::BeginKey => last = Some(FieldKind::Key),
                FrameEvent::BeginValue => last = Some(FieldKind::Value),
                FrameEvent::Discarded(e) => {
                    last = None;
                    ex.note(Diagnostic::Frame(e));
                }
                FrameEvent::ChunkBoundary { has_more, payload } => {
                    match last.take() {
                        Some(FieldKind::Key) => {
                            if let Some(stale) = pending_key.replace(payload) {
                                ex.note(Diagnostic::DanglingKey(stale));
                            }
                        }
                        Some(FieldKind::Value) => match pending_key.take() {
                            Some(key) => {
                                ex.record.insert(&key, &payload);
                            }
                            None => ex.note(Diagnostic::OrphanValue(payload)),
                        },
                        None => {}
                    }
                    if !has_more {
                        ex.outcome = ExchangeOutcome::Terminated;
                        break;
                    }
                }
            }
        }

        if ex.outcome == ExchangeOutcome::Terminated {
            break;
        }
    }

    if let Some(key) = pending_key {
        ex.note(Diagnostic::DanglingKey(key));
    }
    ex
}

// ───────────────────────────────────────────────────────────────
// Cycle
// ───────────────────────────────────────────────────────────────

/// Everything a polling cycle needs to carry to the next one.
#[derive(Debug, Clone, Default)]
pub struct AggregatorState {
    pub identity: NodeIdentity,
    pub roster: NodeRoster,
    pub cycles: u64,
}

impl AggregatorState {
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }
}

/// What one cycle hands back.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub state: AggregatorState,
    pub report: Report,
    pub exchanges: Vec<Exchange>,
}

/// Rebuild the roster without polling.
pub fn rescan(state: AggregatorState, bus: &mut impl BusPort, sink: &mut impl EventSink) -> AggregatorState {
    AggregatorState {
        roster: NodeRoster::scan(bus, sink),
        ..state
    }
}

/// One full cycle: scan, drain every node in roster order, merge.
///
/// Nothing in here fails: a silent node contributes an empty record and
/// a misbehaving one contributes whatever paired cleanly.
pub fn run_cycle(state: AggregatorState, bus: &mut impl BusPort, sink: &mut impl EventSink) -> CycleOutput {
    let state = rescan(state, bus, sink);
    let mut report = Report::new(state.identity.clone());
    let mut exchanges = Vec::with_capacity(state.roster.len());

    for address in state.roster.iter() {
        let ex = exchange(bus, address, DATA_TRANSMISSION_TIMEOUT);

        if ex.outcome == ExchangeOutcome::TimedOut {
            warn!(
                "Aggregator: {} gave no TERMINATE within {} requests",
                address, DATA_TRANSMISSION_TIMEOUT
            );
        }
        for diagnostic in &ex.diagnostics {
            sink.emit(&AppEvent::Diagnostic {
                address,
                diagnostic: diagnostic.clone(),
            });
        }
        sink.emit(&AppEvent::ExchangeFinished {
            address,
            fields: ex.record.len(),
            requests: ex.requests,
            outcome: ex.outcome,
        });

        report.insert(address, ex.record.clone());
        exchanges.push(ex);
    }

    let cycles = state.cycles + 1;
    sink.emit(&AppEvent::CycleCompleted {
        cycle: cycles,
        nodes: report.node_count(),
        fields: report.field_count(),
    });

    CycleOutput {
        state: AggregatorState { cycles, ..state },
        report,
        exchanges,
    }
}
