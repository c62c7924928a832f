//! Outbound report delivery.
//!
//! Implements [`DeliveryPort`]: one JSON POST per report cycle, no retry.
//! Every failure is folded into the returned [`DeliveryOutcome`]:
//!
//! | code      | meaning                                   |
//! |-----------|-------------------------------------------|
//! | `100..`   | HTTP status from the collector            |
//! | `-1`      | connection / TLS / write failure          |
//! | `-2`      | response could not be read                |
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client` with the
//!   built-in certificate bundle for `https://` endpoints.
//! - **all other targets**: a loopback that records the last body.

use core::time::Duration;

use log::{debug, warn};

use crate::app::ports::DeliveryPort;
use crate::app::publisher::DeliveryOutcome;

/// Longest reply text kept in the outcome.
const MAX_DETAIL_BYTES: usize = 64;

pub struct HttpDelivery {
    timeout: Duration,
    #[cfg(not(target_os = "espidf"))]
    last_body: Option<String>,
}

impl Default for HttpDelivery {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl HttpDelivery {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            #[cfg(not(target_os = "espidf"))]
            last_body: None,
        }
    }

    /// Simulation: the last body "sent".
    #[cfg(not(target_os = "espidf"))]
    pub fn last_body(&self) -> Option<&str> {
        self.last_body.as_deref()
    }
}

/// Stand-in used while the station link is down, so a cycle does not
/// wait out a connect timeout.
pub struct OfflineDelivery;

impl DeliveryPort for OfflineDelivery {
    fn post_json(&mut self, _url: &str, _body: &str) -> DeliveryOutcome {
        DeliveryOutcome::new(-1, "WiFi not connected")
    }
}

fn reply_detail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    let mut end = trimmed.len().min(MAX_DETAIL_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_owned()
}

#[cfg(target_os = "espidf")]
impl DeliveryPort for HttpDelivery {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        use embedded_svc::http::client::Client;
        use embedded_svc::http::Status;
        use embedded_svc::io::{Read, Write};
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let config = Configuration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = match EspHttpConnection::new(&config) {
            Ok(c) => c,
            Err(e) => return DeliveryOutcome::new(-1, format!("client init: {e}")),
        };
        let mut client = Client::wrap(connection);

        let length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", length.as_str()),
        ];
        debug!("Delivery: POST {} ({} bytes)", url, body.len());

        let mut request = match client.post(url, &headers) {
            Ok(r) => r,
            Err(e) => return DeliveryOutcome::new(-1, format!("connect: {e}")),
        };
        if let Err(e) = request.write_all(body.as_bytes()).and_then(|()| request.flush()) {
            return DeliveryOutcome::new(-1, format!("write: {e:?}"));
        }
        let mut response = match request.submit() {
            Ok(r) => r,
            Err(e) => return DeliveryOutcome::new(-1, format!("submit: {e}")),
        };

        let status = response.status();
        let mut buf = [0u8; MAX_DETAIL_BYTES];
        match response.read(&mut buf) {
            Ok(n) => DeliveryOutcome::new(i32::from(status), reply_detail(&buf[..n])),
            Err(e) => {
                warn!("Delivery: reading reply failed: {:?}", e);
                DeliveryOutcome::new(-2, format!("HTTP {status}, unreadable reply"))
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl DeliveryPort for HttpDelivery {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        debug!(
            "Delivery(sim): POST {} ({} bytes, timeout {:?})",
            url,
            body.len(),
            self.timeout
        );
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warn!("Delivery(sim): unsupported URL '{}'", url);
            return DeliveryOutcome::new(-1, "unsupported URL scheme");
        }
        self.last_body = Some(body.to_owned());
        DeliveryOutcome::new(200, reply_detail(b"OK (simulated)\n"))
    }
}
