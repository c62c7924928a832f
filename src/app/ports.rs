//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor bus, HTTP delivery, settings store, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.

use crate::config::NodeConfig;
use crate::error::BusError;
use crate::frame::ReplyChunk;
use crate::protocol::BusAddress;
use crate::scheduler::TaskId;

use super::publisher::DeliveryOutcome;

// ───────────────────────────────────────────────────────────────
// Bus ports (driven adapters: domain ↔ sensor bus, both ends)
// ───────────────────────────────────────────────────────────────

/// Master side of the sensor bus.
pub trait BusPort {
    /// Address-only transaction.  `Ok(())` means a device acknowledged;
    /// [`BusError::NoAcknowledge`] means nothing is there.
    fn probe(&mut self, address: BusAddress) -> Result<(), BusError>;

    /// One data request.  Fills at most `buf.len()` bytes and returns how
    /// many arrived.
    fn request(&mut self, address: BusAddress, buf: &mut [u8]) -> Result<usize, BusError>;
}

/// Slave side of the sensor bus, as seen by a node.
///
/// The peripheral holds one staged reply; the master's next read clocks
/// it out.  There is no per-request callback, so the node stages the
/// following reply as soon as the slot frees up.
pub trait SlaveBusPort {
    /// Stage `chunk` for the master's next read.  [`BusError::Timeout`]
    /// means the previous reply was not collected in time and nothing was
    /// staged.
    fn queue_reply(&mut self, chunk: &ReplyChunk) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Delivery port (driven adapter: domain → remote collector)
// ───────────────────────────────────────────────────────────────

/// Pushes a serialized report to the remote endpoint.
///
/// Never fails as such: every failure is folded into the returned
/// [`DeliveryOutcome`] so the caller can show it to the operator.
pub trait DeliveryPort {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists node settings.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load settings.  Returns [`NodeConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist settings.
    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError>;

    /// Remove stored settings (factory reset).
    fn erase(&self) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the main loop)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, task: TaskId, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    Periodic,
    /// A one-shot schedule fired; its slot is now free.
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored settings failed to parse.
    Corrupted,
    /// A field failed validation.  The `&'static str` names the field
    /// and the rule.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from the storage backend itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The settings partition could not be mounted.
    MountFailed,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MountFailed => write!(f, "mount failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
