//! Device identity from the factory MAC.
//!
//! The last three MAC bytes give both the short log tag (`SS-XXYYZZ`)
//! and the default node name (`sensestack-xxyyzz`), which is also used
//! as the station hostname.

use core::fmt::{self, Write};

/// Longest rendering of either form.
pub type IdString = heapless::String<24>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId([u8; 6]);

impl DeviceId {
    pub const fn from_mac(mac: [u8; 6]) -> Self {
        Self(mac)
    }

    /// Factory MAC from eFuse.
    #[cfg(target_os = "espidf")]
    pub fn read() -> Self {
        let mut mac = [0u8; 6];
        // Writes exactly six bytes into `mac`.
        unsafe {
            esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
        }
        Self(mac)
    }

    /// Host builds get a fixed MAC so names are reproducible.
    #[cfg(not(target_os = "espidf"))]
    pub fn read() -> Self {
        Self([0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE])
    }

    pub fn mac(&self) -> [u8; 6] {
        self.0
    }

    fn tail(&self, prefix: &str, upper: bool) -> IdString {
        let [.., a, b, c] = self.0;
        let mut out = IdString::new();
        let _ = if upper {
            write!(out, "{prefix}{a:02X}{b:02X}{c:02X}")
        } else {
            write!(out, "{prefix}{a:02x}{b:02x}{c:02x}")
        };
        out
    }

    /// `SS-XXYYZZ`, used in logs.
    pub fn short_id(&self) -> IdString {
        self.tail("SS-", true)
    }

    /// `sensestack-xxyyzz`: default node name and hostname.
    pub fn default_name(&self) -> IdString {
        self.tail("sensestack-", false)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}
