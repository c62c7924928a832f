//! ML8511 UV node.
//!
//! The ML8511 output is read against the 3.3 V rail on a second ADC
//! channel, which cancels supply drift.  The sensor's linear region runs
//! from 0.99 V (no UV) to 2.8 V (15 mW/cm²).

use crate::node::{push_field, FieldSource, FieldTable};

const SUPPLY_VOLTS: f32 = 3.3;
const ZERO_UV_VOLTS: f32 = 0.99;
const FULL_SCALE_VOLTS: f32 = 2.8;
const FULL_SCALE_MW_CM2: f32 = 15.0;

/// Mean of a burst of ADC samples.
pub fn average(samples: &[u16]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    Some(sum as f32 / samples.len() as f32)
}

/// Linear re-map of `x` from one range onto another.
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// UV intensity in mW/cm² from averaged sensor and reference levels.
pub fn intensity(uv_level: f32, ref_level: f32) -> Option<f32> {
    if ref_level <= 0.0 {
        return None;
    }
    let volts = SUPPLY_VOLTS / ref_level * uv_level;
    Some(map_range(volts, ZERO_UV_VOLTS, FULL_SCALE_VOLTS, 0.0, FULL_SCALE_MW_CM2))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UvNode {
    intensity: Option<f32>,
}

impl UvNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one burst of sensor and reference samples.
    pub fn record_samples(&mut self, uv: &[u16], reference: &[u16]) {
        self.intensity = match (average(uv), average(reference)) {
            (Some(u), Some(r)) => intensity(u, r),
            _ => None,
        };
    }

    pub fn intensity(&self) -> Option<f32> {
        self.intensity
    }
}

impl FieldSource for UvNode {
    fn fields(&self) -> FieldTable {
        let mut table = FieldTable::new();
        if let Some(mw) = self.intensity {
            push_field(&mut table, "uv_intensity", format_args!("{:.1} mw/cm^2", mw));
        }
        table
    }
}
