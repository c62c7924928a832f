//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                   |
//! |-----------------|--------------------|-------------------------------|
//! | `i2c_bus`       | BusPort            | I2C master (`embedded-hal`)   |
//! | `i2c_slave`     | SlaveBusPort       | I2C slave (`esp-idf-hal`)     |
//! | `sim_bus`       | both bus ports     | in-memory nodes and links     |
//! | `flat_store`    | ConfigPort         | settings file on SPIFFS       |
//! | `http_delivery` | DeliveryPort       | ESP-IDF HTTP client           |
//! | `log_sink`      | EventSink          | Serial log output             |
//! | `web_ui`        | —                  | ESP-IDF HTTP server           |
//! | `wifi`          | ConnectivityPort   | ESP-IDF WiFi STA              |
//! | `time`          | —                  | ESP32 system timer            |
//! | `device_id`     | —                  | eFuse MAC                     |

pub mod device_id;
pub mod flat_store;
pub mod http_delivery;
pub mod i2c_bus;
#[cfg(target_os = "espidf")]
pub mod i2c_slave;
pub mod log_sink;
pub mod sim_bus;
pub mod time;
pub mod web_ui;
pub mod wifi;
