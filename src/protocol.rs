//! Bus protocol constants: single source of truth.
//!
//! Both sides of the sensor bus (the main module and every sensor node)
//! are built from this module, so changing a value here changes the wire
//! contract for the whole network.
//!
//! ## Address map
//!
//! | Address | Node                         |
//! |---------|------------------------------|
//! | 0       | reserved (general call)      |
//! | 11      | temperature / humidity       |
//! | 12      | particulate matter (PM2.5)   |
//! | 13      | rain                         |
//! | 14      | CO2 / NO2                    |
//! | 15      | GPS                          |
//! | 16      | light / UV                   |
//! | 17      | carbon monoxide              |
//! | 127     | reserved (scan upper bound)  |
//!
//! Well-known addresses only give nodes a readable label.  Discovery
//! always comes from the bus scan.

use core::fmt;

use serde::Serialize;

// ── Capacities ────────────────────────────────────────────────

/// Maximum number of sensor nodes the main module tracks.
pub const MAX_SENSORS: usize = 10;

/// Maximum bytes in one reply chunk (one bus data request).
pub const MAX_SENSOR_REPLY_LENGTH: usize = 32;

/// Payload bytes available in one unit: a begin token and a boundary
/// token frame every payload.
pub const MAX_FIELD_LENGTH: usize = MAX_SENSOR_REPLY_LENGTH - 2;

/// Upper (exclusive) bound of the address scan.
pub const TOP_ADDRESS: u8 = 127;

/// Per-node request budget for one exchange.
pub const DATA_TRANSMISSION_TIMEOUT: u16 = 20;

/// Wire protocol revision: 4-token, multi-transmission framing.
pub const PROTOCOL_REVISION: u8 = 3;

// ── Well-known node addresses ─────────────────────────────────

pub const SENSOR_TEMP_HUM: u8 = 11;
pub const SENSOR_PM25: u8 = 12;
pub const SENSOR_RAIN: u8 = 13;
pub const SENSOR_CO2_NO2: u8 = 14;
pub const SENSOR_GPS: u8 = 15;
pub const SENSOR_LIGHT_UV: u8 = 16;
pub const SENSOR_CO: u8 = 17;

/// Display label for a well-known node address.
pub fn sensor_label(address: BusAddress) -> Option<&'static str> {
    match address.get() {
        SENSOR_TEMP_HUM => Some("temperature/humidity"),
        SENSOR_PM25 => Some("particulate"),
        SENSOR_RAIN => Some("rain"),
        SENSOR_CO2_NO2 => Some("co2/no2"),
        SENSOR_GPS => Some("gps"),
        SENSOR_LIGHT_UV => Some("light/uv"),
        SENSOR_CO => Some("carbon monoxide"),
        _ => None,
    }
}

// ── Bus address ───────────────────────────────────────────────

/// A 7-bit bus address in `1..=126`.
///
/// Address 0 is the general-call address and 127 is the scan bound, so
/// neither can ever be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BusAddress(u8);

impl BusAddress {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = TOP_ADDRESS - 1;

    /// Validate a raw address.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= Self::MIN && raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every address the scan visits, in ascending order.
    pub fn scan_range() -> impl Iterator<Item = BusAddress> {
        (Self::MIN..TOP_ADDRESS).map(BusAddress)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
