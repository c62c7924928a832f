//! MQ-7 carbon monoxide node.

use crate::node::{push_field, FieldSource, FieldTable};

#[derive(Debug, Clone, Copy, Default)]
pub struct CarbonMonoxideNode {
    ppm: Option<f32>,
}

impl CarbonMonoxideNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a concentration.  Negative or non-finite values (sensor still
    /// heating, ADC glitch) clear the reading.
    pub fn record(&mut self, ppm: f32) {
        self.ppm = (ppm.is_finite() && ppm >= 0.0).then_some(ppm);
    }
}

impl FieldSource for CarbonMonoxideNode {
    fn fields(&self) -> FieldTable {
        let mut table = FieldTable::new();
        if let Some(ppm) = self.ppm {
            push_field(&mut table, "co_density", format_args!("{:.1} ppm", ppm));
        }
        table
    }
}
