//! Front-panel peripherals: status LED and reset button.

pub mod button;
pub mod status_led;
