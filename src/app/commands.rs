//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (settings page,
//! status button, scheduler) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::config::NodeConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Rebuild the roster now instead of waiting for the next cycle.
    RescanBus,

    /// Validate, persist and apply new operator settings.
    UpdateSettings(NodeConfig),

    /// Erase stored settings.  The caller restarts the device afterwards.
    FactoryReset,

    /// Restart the device.
    Reboot,
}
