//! Node settings.
//!
//! Everything the operator can change from the configuration page.  The
//! settings are persisted as a flat, positional, newline-separated text
//! file:
//!
//! ```text
//! <uuid>
//! <name>
//! <endpoint url>
//! <update interval, ms>
//! <latitude>
//! <longitude>
//! On|Off
//! ```

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::app::report::NodeIdentity;

/// Shortest and longest allowed report interval.
pub const MIN_UPDATE_INTERVAL_MS: u32 = 1_000;
pub const MAX_UPDATE_INTERVAL_MS: u32 = 86_400_000;

const FLAT_LINES: usize = 7;

/// Operator-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub uuid: String,
    pub name: String,
    /// Where reports are POSTed.  Empty disables delivery.
    pub endpoint_url: String,
    /// Report cadence in milliseconds.
    pub update_interval_ms: u32,
    pub latitude: String,
    pub longitude: String,
    /// Status LED blinks on each polled node.
    pub led_enabled: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            name: "sensestack".into(),
            endpoint_url: String::new(),
            update_interval_ms: 6_000,
            latitude: "0".into(),
            longitude: "0".into(),
            led_enabled: true,
        }
    }
}

impl NodeConfig {
    /// Defaults, named after the device.
    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity {
            name: self.name.clone(),
            uuid: self.uuid.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
        }
    }

    /// Check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let text_fields = [
            &self.uuid,
            &self.name,
            &self.endpoint_url,
            &self.latitude,
            &self.longitude,
        ];
        if text_fields.iter().any(|f| f.contains(['\n', '\r'])) {
            return Err(ConfigError::ValidationFailed("fields must be single-line"));
        }
        if !(MIN_UPDATE_INTERVAL_MS..=MAX_UPDATE_INTERVAL_MS).contains(&self.update_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "update_interval_ms must be 1000..=86400000",
            ));
        }
        if !self.endpoint_url.is_empty()
            && !self.endpoint_url.starts_with("http://")
            && !self.endpoint_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationFailed(
                "endpoint_url must start with http:// or https://",
            ));
        }
        if !coordinate_ok(&self.latitude, 90.0) {
            return Err(ConfigError::ValidationFailed("latitude must be within -90..=90"));
        }
        if !coordinate_ok(&self.longitude, 180.0) {
            return Err(ConfigError::ValidationFailed("longitude must be within -180..=180"));
        }
        Ok(())
    }

    /// Parse the flat settings file.
    pub fn from_flat(text: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < FLAT_LINES {
            return Err(ConfigError::Corrupted);
        }
        let update_interval_ms = lines[3].trim().parse().map_err(|_| ConfigError::Corrupted)?;
        let led_enabled = match lines[6].trim() {
            "On" => true,
            "Off" => false,
            _ => return Err(ConfigError::Corrupted),
        };
        Ok(Self {
            uuid: lines[0].to_owned(),
            name: lines[1].to_owned(),
            endpoint_url: lines[2].to_owned(),
            update_interval_ms,
            latitude: lines[4].to_owned(),
            longitude: lines[5].to_owned(),
            led_enabled,
        })
    }

    /// Render the flat settings file.
    pub fn to_flat(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            self.uuid,
            self.name,
            self.endpoint_url,
            self.update_interval_ms,
            self.latitude,
            self.longitude,
            if self.led_enabled { "On" } else { "Off" },
        )
    }
}

fn coordinate_ok(text: &str, limit: f64) -> bool {
    if text.is_empty() {
        return true;
    }
    text.trim()
        .parse::<f64>()
        .is_ok_and(|v| v.is_finite() && v.abs() <= limit)
}
