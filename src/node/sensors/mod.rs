//! Field builders for each sensor-node variant.
//!
//! | Variant           | Sensor   | Fields                        |
//! |-------------------|----------|-------------------------------|
//! | `climate`         | DHT22    | `temperature`, `humidity`     |
//! | `carbon_monoxide` | MQ-7     | `co_density`                  |
//! | `uv`              | ML8511   | `uv_intensity`                |
//! | `particulate`     | PMS5003  | `pm1`, `pm2_5`, `pm10`        |
//!
//! Each variant converts raw readings into display text and implements
//! [`FieldSource`](super::FieldSource).  Hardware sampling stays on the
//! node; these types only hold the latest converted reading.

pub mod carbon_monoxide;
pub mod climate;
pub mod particulate;
pub mod uv;

pub use carbon_monoxide::CarbonMonoxideNode;
pub use climate::ClimateNode;
pub use particulate::ParticulateNode;
pub use uv::UvNode;
