//! DHT22 temperature / humidity node.

use crate::node::{push_field, FieldSource, FieldTable};

/// Latest DHT22 reading.  A failed read leaves the channel at `NaN`, and
/// a `NaN` channel is left out of the field table.
#[derive(Debug, Clone, Copy)]
pub struct ClimateNode {
    temperature_c: f32,
    humidity_pct: f32,
}

impl Default for ClimateNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateNode {
    pub fn new() -> Self {
        Self {
            temperature_c: f32::NAN,
            humidity_pct: f32::NAN,
        }
    }

    pub fn record(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.temperature_c = temperature_c;
        self.humidity_pct = humidity_pct;
    }
}

impl FieldSource for ClimateNode {
    fn fields(&self) -> FieldTable {
        let mut table = FieldTable::new();
        if !self.temperature_c.is_nan() {
            push_field(&mut table, "temperature", format_args!("{:.1} c", self.temperature_c));
        }
        if !self.humidity_pct.is_nan() {
            push_field(&mut table, "humidity", format_args!("{:.0} %", self.humidity_pct));
        }
        table
    }
}
