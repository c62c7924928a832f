//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the aggregator emit
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use crate::error::BusError;
use crate::protocol::BusAddress;

use super::aggregator::{Diagnostic, ExchangeOutcome};
use super::publisher::DeliveryOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service finished its boot scan.
    Started { nodes: usize },

    /// A bus scan finished.  `full` means the roster hit capacity and the
    /// scan stopped early.
    ScanCompleted { nodes: usize, full: bool },

    /// A probe failed with something other than a missing acknowledge.
    ProbeFailed { address: BusAddress, error: BusError },

    /// One node exchange is over.
    ExchangeFinished {
        address: BusAddress,
        fields: usize,
        requests: u16,
        outcome: ExchangeOutcome,
    },

    /// Something was dropped during an exchange.
    Diagnostic {
        address: BusAddress,
        diagnostic: Diagnostic,
    },

    /// A full polling cycle produced a report.
    CycleCompleted { cycle: u64, nodes: usize, fields: usize },

    /// Outcome of pushing the report to the endpoint.
    Delivered(DeliveryOutcome),

    /// Operator settings were validated and persisted.
    SettingsChanged,

    /// Stored settings were erased.
    FactoryReset,
}
