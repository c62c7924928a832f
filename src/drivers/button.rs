//! Debounced hold-time button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with a pull-up (the BOOT button on most
//! ESP32 boards).  The pin is sampled from the housekeeping tick; no ISR.
//!
//! ## Gestures
//!
//! | Gesture        | Condition                         | Action          |
//! |----------------|-----------------------------------|-----------------|
//! | Reboot         | released after holding >= 3 s     | `Reboot`        |
//! | Factory reset  | still held at 10 s (fires once)   | `FactoryReset`  |
//!
//! Shorter presses and contact bounce under 50 ms do nothing.

use embedded_hal::digital::InputPin;
use log::warn;

const DEBOUNCE_MS: u32 = 50;
const REBOOT_HOLD_MS: u32 = 3_000;
const FACTORY_RESET_HOLD_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Reboot,
    FactoryReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldState {
    Released,
    Debouncing { since_ms: u32 },
    Held { since_ms: u32 },
    /// Factory reset already fired; wait for release.
    Spent,
}

pub struct ButtonDriver {
    state: HoldState,
}

impl Default for ButtonDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonDriver {
    pub fn new() -> Self {
        Self {
            state: HoldState::Released,
        }
    }

    /// Sample an active-low pin.  A read error counts as released.
    pub fn poll<P: InputPin>(&mut self, pin: &mut P, now_ms: u32) -> Option<ButtonAction> {
        let pressed = match pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Button: GPIO read failed");
                false
            }
        };
        self.update(pressed, now_ms)
    }

    /// Advance the classifier with a raw pressed/released sample.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonAction> {
        match self.state {
            HoldState::Released => {
                if pressed {
                    self.state = HoldState::Debouncing { since_ms: now_ms };
                }
                None
            }
            HoldState::Debouncing { since_ms } => {
                if !pressed {
                    self.state = HoldState::Released;
                } else if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = HoldState::Held { since_ms };
                }
                None
            }
            HoldState::Held { since_ms } => {
                let held_ms = now_ms.wrapping_sub(since_ms);
                if pressed {
                    if held_ms >= FACTORY_RESET_HOLD_MS {
                        self.state = HoldState::Spent;
                        return Some(ButtonAction::FactoryReset);
                    }
                    return None;
                }
                self.state = HoldState::Released;
                (held_ms >= REBOOT_HOLD_MS).then_some(ButtonAction::Reboot)
            }
            HoldState::Spent => {
                if !pressed {
                    self.state = HoldState::Released;
                }
                None
            }
        }
    }
}
