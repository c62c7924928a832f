//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  Credentials are provisioned into NVS elsewhere; this
//! adapter only brings the station up and keeps it up.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.  `poll()` drives everything and
//! never blocks.

use core::fmt;
use log::{info, warn};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials provisioned"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    /// Start associating.  Completion is observed through `poll()`.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Advance the link state machine.
    fn poll(&mut self, now_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { since_ms: u32 },
    Connected,
    Reconnecting { attempt: u32, since_ms: u32 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;
/// Give up on an association attempt after this long.
const CONNECT_TIMEOUT_MS: u32 = 15_000;

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    backoff_secs: u32,
    last_poll_ms: u32,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: whether the access point is reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            backoff_secs: INITIAL_BACKOFF_SECS,
            last_poll_ms: 0,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            backoff_secs: INITIAL_BACKOFF_SECS,
            last_poll_ms: 0,
            sim_reachable: true,
            sim_link_up: false,
        }
    }

    /// Simulation: make the access point (un)reachable.  Going
    /// unreachable drops an established link.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
        if !reachable {
            self.sim_link_up = false;
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_secs(&self) -> u32 {
        self.backoff_secs
    }

    fn back_off(&mut self, attempt: u32, now_ms: u32) {
        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
        self.state = WifiState::Reconnecting {
            attempt: attempt + 1,
            since_ms: now_ms,
        };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_has_credentials(&self) -> bool {
        use esp_idf_svc::wifi::Configuration;
        match self.wifi.get_configuration() {
            Ok(Configuration::Client(c)) | Ok(Configuration::Mixed(c, _)) => !c.ssid.is_empty(),
            _ => false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_has_credentials(&self) -> bool {
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect failed: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if !self.sim_reachable {
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if !self.platform_has_credentials() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting");
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting {
                    since_ms: self.last_poll_ms,
                };
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: {}, retrying in {}s", e, self.backoff_secs);
                self.state = WifiState::Reconnecting {
                    attempt: 0,
                    since_ms: self.last_poll_ms,
                };
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u32) {
        self.last_poll_ms = now_ms;
        match self.state {
            WifiState::Disconnected => {}
            WifiState::Connecting { since_ms } => {
                if self.platform_is_connected() {
                    self.state = WifiState::Connected;
                    self.backoff_secs = INITIAL_BACKOFF_SECS;
                    info!("WiFi: connected");
                } else if now_ms.wrapping_sub(since_ms) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.back_off(0, now_ms);
                }
            }
            WifiState::Connected => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.state = WifiState::Reconnecting {
                        attempt: 0,
                        since_ms: now_ms,
                    };
                }
            }
            WifiState::Reconnecting { attempt, since_ms } => {
                if now_ms.wrapping_sub(since_ms) < self.backoff_secs * 1_000 {
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {}s)", attempt + 1, self.backoff_secs);
                match self.platform_connect() {
                    Ok(()) => self.state = WifiState::Connecting { since_ms: now_ms },
                    Err(_) => self.back_off(attempt, now_ms),
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
