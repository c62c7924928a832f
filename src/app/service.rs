//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the aggregator state, the live settings and the
//! publisher.  It exposes a hardware-agnostic API; all I/O flows through
//! port traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!     BusPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AppService        │
//! DeliveryPort ◀──│ Roster · Exchange · Pub │◀── ConfigPort
//!                 └────────────────────────┘
//! ```

use log::info;
use serde::Serialize;

use crate::config::NodeConfig;

use super::aggregator::{self, AggregatorState};
use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{BusPort, ConfigError, ConfigPort, DeliveryPort, EventSink};
use super::publisher::{DeliveryOutcome, ReportPublisher};
use super::roster::NodeRoster;

// ───────────────────────────────────────────────────────────────
// Results handed back to the main loop
// ───────────────────────────────────────────────────────────────

/// Summary of one report cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub nodes: usize,
    pub fields: usize,
    pub outcome: DeliveryOutcome,
}

/// What the main loop must do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    None,
    /// Re-arm the report schedule with the new interval.
    IntervalChanged(u32),
    /// Restart the device.
    Restart,
}

/// Snapshot served at `/getNodeInfo` and on the status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub uuid: String,
    #[serde(rename = "lat")]
    pub latitude: String,
    #[serde(rename = "long")]
    pub longitude: String,
    #[serde(rename = "currentEndpoint")]
    pub endpoint_url: String,
    #[serde(rename = "latestPostReply")]
    pub latest_post_reply: String,
    #[serde(rename = "updateInterval")]
    pub update_interval_ms: u32,
    /// Seconds since boot.
    pub uptime: u64,
    #[serde(rename = "connectedSensors")]
    pub connected_sensors: Vec<u8>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    state: AggregatorState,
    config: NodeConfig,
    publisher: ReportPublisher,
}

impl AppService {
    /// Construct the service from settings.  Call [`start`](Self::start) next.
    pub fn new(config: NodeConfig) -> Self {
        Self {
            state: AggregatorState::new(config.identity()),
            config,
            publisher: ReportPublisher::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot scan, so the status page has a roster before the first report.
    pub fn start(&mut self, bus: &mut impl BusPort, sink: &mut impl EventSink) {
        self.rescan(bus, sink);
        sink.emit(&AppEvent::Started {
            nodes: self.state.roster.len(),
        });
        info!(
            "AppService started with {} node(s), slots {:?}",
            self.state.roster.len(),
            self.state.roster.as_slots()
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Scan, drain every node, publish the merged report.
    pub fn run_report_cycle(
        &mut self,
        bus: &mut impl BusPort,
        delivery: &mut impl DeliveryPort,
        sink: &mut impl EventSink,
    ) -> CycleSummary {
        let output = aggregator::run_cycle(core::mem::take(&mut self.state), bus, sink);
        self.state = output.state;

        let nodes = output.report.node_count();
        let fields = output.report.field_count();
        let outcome = self
            .publisher
            .publish(output.report, &self.config.endpoint_url, delivery);
        sink.emit(&AppEvent::Delivered(outcome.clone()));

        CycleSummary {
            cycle: self.state.cycles,
            nodes,
            fields,
            outcome,
        }
    }

    /// Rebuild the roster without polling.  Returns the node count.
    pub fn rescan(&mut self, bus: &mut impl BusPort, sink: &mut impl EventSink) -> usize {
        self.state = aggregator::rescan(core::mem::take(&mut self.state), bus, sink);
        self.state.roster.len()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (settings page, button, scheduler).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        bus: &mut impl BusPort,
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<CommandEffect, ConfigError> {
        match cmd {
            AppCommand::RescanBus => {
                self.rescan(bus, sink);
                Ok(CommandEffect::None)
            }
            AppCommand::UpdateSettings(new_config) => {
                new_config.validate()?;
                store.save(&new_config)?;
                let interval_changed =
                    new_config.update_interval_ms != self.config.update_interval_ms;
                self.state.identity = new_config.identity();
                self.config = new_config;
                sink.emit(&AppEvent::SettingsChanged);
                info!("Settings updated and saved");
                Ok(if interval_changed {
                    CommandEffect::IntervalChanged(self.config.update_interval_ms)
                } else {
                    CommandEffect::None
                })
            }
            AppCommand::FactoryReset => {
                store.erase()?;
                sink.emit(&AppEvent::FactoryReset);
                Ok(CommandEffect::Restart)
            }
            AppCommand::Reboot => Ok(CommandEffect::Restart),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn roster(&self) -> &NodeRoster {
        &self.state.roster
    }

    /// Completed report cycles since boot.
    pub fn cycles(&self) -> u64 {
        self.state.cycles
    }

    pub fn publisher(&self) -> &ReportPublisher {
        &self.publisher
    }

    /// Status snapshot for the UI.
    pub fn status(&self, uptime_secs: u64) -> NodeStatus {
        NodeStatus {
            name: self.config.name.clone(),
            uuid: self.config.uuid.clone(),
            latitude: self.config.latitude.clone(),
            longitude: self.config.longitude.clone(),
            endpoint_url: self.config.endpoint_url.clone(),
            latest_post_reply: self
                .publisher
                .last_outcome()
                .map_or_else(|| "none yet".to_owned(), ToString::to_string),
            update_interval_ms: self.config.update_interval_ms,
            uptime: uptime_secs,
            connected_sensors: self.state.roster.iter().map(|a| a.get()).collect(),
        }
    }
}
