//! SenseStack ML8511 UV node: firmware entry point.
//!
//! Samples the sensor and the 3.3 V reference once a second and answers
//! the main module's data requests as bus slave [`SENSOR_LIGHT_UV`].
//!
//! ```text
//!   ADC (UV, 3V3 ref) ──▶ UvNode ──▶ SlaveResponder ──▶ I2cSlaveBus ──▶ master
//! ```
//!
//! The slave write blocks (bounded) until the master collects the staged
//! reply, so the loop idles on the bus instead of spinning.
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{debug, info, warn};

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::I2cSlaveDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::sys::EspError;

use sensestack::adapters::i2c_slave::{self, I2cSlaveBus};
use sensestack::adapters::time::MonotonicClock;
use sensestack::drivers::status_led::StatusLed;
use sensestack::error::BusError;
use sensestack::node::sensors::uv::UvNode;
use sensestack::node::SlaveResponder;
use sensestack::protocol::{PROTOCOL_REVISION, SENSOR_LIGHT_UV};

const SAMPLE_PERIOD_MS: u32 = 1_000;
const SAMPLES_PER_BURST: usize = 8;
/// Longest a single slave write waits for the master.
const SERVE_TIMEOUT_MS: u64 = 50;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!(
        "SenseStack UV node v{} (bus address {}, protocol rev {})",
        env!("CARGO_PKG_VERSION"),
        SENSOR_LIGHT_UV,
        PROTOCOL_REVISION
    );

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let clock = MonotonicClock::new();

    // ── Bus (slave) ───────────────────────────────────────────
    let driver = I2cSlaveDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        SENSOR_LIGHT_UV,
        &i2c_slave::slave_config(),
    )
    .context("I2C slave init")?;
    let mut slave = I2cSlaveBus::new(driver, SERVE_TIMEOUT_MS);
    let mut responder = SlaveResponder::new();

    // ── Sensor ────────────────────────────────────────────────
    let adc = AdcDriver::new(peripherals.adc1)?;
    let adc_config = AdcChannelConfig {
        attenuation: DB_11,
        ..Default::default()
    };
    let mut uv_channel = AdcChannelDriver::new(&adc, peripherals.pins.gpio34, &adc_config)?;
    let mut ref_channel = AdcChannelDriver::new(&adc, peripherals.pins.gpio35, &adc_config)?;
    let mut sample = |uv: &mut [u16], reference: &mut [u16]| -> Result<(), EspError> {
        for (u, r) in uv.iter_mut().zip(reference.iter_mut()) {
            *u = adc.read(&mut uv_channel)?;
            *r = adc.read(&mut ref_channel)?;
        }
        Ok(())
    };

    let mut led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?, true);
    let mut node = UvNode::new();
    let mut last_sample: Option<u32> = None;

    info!("UV node ready");

    loop {
        let now = clock.now_ms();

        if last_sample.is_none_or(|t| now.wrapping_sub(t) >= SAMPLE_PERIOD_MS) {
            let mut uv = [0u16; SAMPLES_PER_BURST];
            let mut reference = [0u16; SAMPLES_PER_BURST];
            match sample(&mut uv, &mut reference) {
                Ok(()) => {
                    node.record_samples(&uv, &reference);
                    debug!("UV: {:?} mW/cm^2", node.intensity());
                }
                Err(e) => warn!("UV: ADC read failed: {}", e),
            }
            last_sample = Some(now);
        }

        match responder.serve(&mut slave, &node) {
            Ok(()) => led.blink(now),
            // Master not polling right now.
            Err(BusError::Timeout) => {}
            Err(e) => warn!("Slave: {}", e),
        }
        led.tick(now);
    }
}
