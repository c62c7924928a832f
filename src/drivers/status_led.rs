//! Single-colour status LED.
//!
//! Blinks once per polled sensor node.  The blink is non-blocking: `blink()`
//! lights the LED and `tick()` (housekeeping rate) turns it off once
//! [`BLINK_MS`] has passed.  With the LED setting off it stays dark.

use embedded_hal::digital::OutputPin;
use log::warn;

pub const BLINK_MS: u32 = 500;

pub struct StatusLed<P> {
    pin: P,
    enabled: bool,
    /// When the current blink started, if lit.
    lit_since: Option<u32>,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P, enabled: bool) -> Self {
        let mut led = Self {
            pin,
            enabled,
            lit_since: None,
        };
        led.write(false);
        led
    }

    fn write(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            warn!("LED: GPIO write failed");
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled && self.lit_since.take().is_some() {
            self.write(false);
        }
    }

    /// Start (or restart) a blink.
    pub fn blink(&mut self, now_ms: u32) {
        if !self.enabled {
            return;
        }
        self.write(true);
        self.lit_since = Some(now_ms);
    }

    pub fn tick(&mut self, now_ms: u32) {
        if let Some(since) = self.lit_since {
            if now_ms.wrapping_sub(since) >= BLINK_MS {
                self.write(false);
                self.lit_since = None;
            }
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit_since.is_some()
    }
}
