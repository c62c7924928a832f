//! Report publisher.
//!
//! Keeps the most recent report (served to the local UI) and pushes each
//! new one to the configured endpoint exactly once.  Only the last
//! delivery outcome is kept; a failed delivery is not retried, the next
//! cycle simply publishes a fresh report.

use core::fmt;

use log::{info, warn};
use serde::Serialize;

use super::ports::DeliveryPort;
use super::report::Report;

// ───────────────────────────────────────────────────────────────
// DeliveryOutcome
// ───────────────────────────────────────────────────────────────

/// What happened to the last push.
///
/// `code` is the HTTP status when the request reached the server,
/// negative for a transport failure, and `0` when nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub code: i32,
    pub detail: String,
}

impl DeliveryOutcome {
    pub fn new(code: i32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    /// Delivery was not attempted.
    pub fn not_attempted(detail: impl Into<String>) -> Self {
        Self::new(0, detail)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.detail)
    }
}

// ───────────────────────────────────────────────────────────────
// ReportPublisher
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ReportPublisher {
    latest: Option<Report>,
    latest_json: Option<String>,
    last_outcome: Option<DeliveryOutcome>,
}

impl ReportPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `report` as the latest one and push it to `endpoint`.
    ///
    /// An empty endpoint skips the push.  The report becomes
    /// [`latest_report`](Self::latest_report) whatever the outcome.
    pub fn publish(
        &mut self,
        report: Report,
        endpoint: &str,
        delivery: &mut impl DeliveryPort,
    ) -> DeliveryOutcome {
        let outcome = match report.to_json() {
            Ok(json) => {
                let outcome = if endpoint.is_empty() {
                    DeliveryOutcome::not_attempted("no endpoint configured")
                } else {
                    delivery.post_json(endpoint, &json)
                };
                self.latest_json = Some(json);
                outcome
            }
            Err(e) => {
                self.latest_json = None;
                DeliveryOutcome::not_attempted(format!("serialization failed: {e}"))
            }
        };
        self.latest = Some(report);

        if outcome.is_success() {
            info!("Publisher: delivered ({})", outcome);
        } else {
            warn!("Publisher: not delivered ({})", outcome);
        }
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    pub fn latest_report(&self) -> Option<&Report> {
        self.latest.as_ref()
    }

    /// Serialized form of [`latest_report`](Self::latest_report).
    pub fn latest_json(&self) -> Option<&str> {
        self.latest_json.as_deref()
    }

    pub fn last_outcome(&self) -> Option<&DeliveryOutcome> {
        self.last_outcome.as_ref()
    }
}
