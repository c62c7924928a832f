//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::aggregator::ExchangeOutcome;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::protocol::{sensor_label, BusAddress};

/// ` (particulate)` style suffix for well-known node addresses.
fn label(address: BusAddress) -> String {
    sensor_label(address).map_or_else(String::new, |l| format!(" ({l})"))
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { nodes } => {
                info!("START | nodes={}", nodes);
            }
            AppEvent::ScanCompleted { nodes, full } => {
                info!("SCAN  | nodes={}{}", nodes, if *full { " (roster full)" } else { "" });
            }
            AppEvent::ProbeFailed { address, error } => {
                warn!("SCAN  | {} probe failed: {}", address, error);
            }
            AppEvent::ExchangeFinished {
                address,
                fields,
                requests,
                outcome,
            } => match outcome {
                ExchangeOutcome::Terminated => {
                    info!(
                        "XCHG  | {}{} fields={} requests={}",
                        address,
                        label(*address),
                        fields,
                        requests
                    );
                }
                ExchangeOutcome::TimedOut => {
                    warn!(
                        "XCHG  | {}{} timed out after {} requests, kept {} field(s)",
                        address,
                        label(*address),
                        requests,
                        fields
                    );
                }
            },
            AppEvent::Diagnostic { address, diagnostic } => {
                warn!("XCHG  | {} dropped {:?}", address, diagnostic);
            }
            AppEvent::CycleCompleted { cycle, nodes, fields } => {
                info!("CYCLE | #{} nodes={} fields={}", cycle, nodes, fields);
            }
            AppEvent::Delivered(outcome) => {
                if outcome.is_success() {
                    info!("POST  | {}", outcome);
                } else {
                    warn!("POST  | {}", outcome);
                }
            }
            AppEvent::SettingsChanged => {
                info!("CONF  | settings saved");
            }
            AppEvent::FactoryReset => {
                warn!("CONF  | settings erased");
            }
        }
    }
}
