//! I2C slave adapter for sensor nodes.
//!
//! Implements [`SlaveBusPort`] over `esp_idf_hal::i2c::I2cSlaveDriver`.
//!
//! The ESP-IDF slave driver has no per-request callback: it clocks out
//! whatever sits in its transmit ring buffer.  The buffer is created at
//! exactly one reply ([`TX_BUFFER_LENGTH`]) and every reply is written
//! at full length, so a write blocks until the master has read the
//! previous reply and each master read drains exactly one.

use esp_idf_hal::delay::TickType;
use esp_idf_hal::i2c::{I2cSlaveConfig, I2cSlaveDriver};
use esp_idf_svc::sys::{TickType_t, ESP_ERR_TIMEOUT};
use log::warn;

use crate::app::ports::SlaveBusPort;
use crate::error::BusError;
use crate::frame::{padded_reply, ReplyChunk};
use crate::protocol::MAX_SENSOR_REPLY_LENGTH;

/// Transmit ring buffer size: one reply.
pub const TX_BUFFER_LENGTH: usize = MAX_SENSOR_REPLY_LENGTH;

/// Driver settings for a node: internal pull-ups, one-reply TX buffer.
/// The master never writes data, so the RX buffer is minimal.
pub fn slave_config() -> I2cSlaveConfig {
    I2cSlaveConfig::new()
        .sda_enable_pullup(true)
        .scl_enable_pullup(true)
        .tx_buffer_length(TX_BUFFER_LENGTH)
        .rx_buffer_length(MAX_SENSOR_REPLY_LENGTH)
}

pub struct I2cSlaveBus<'d> {
    driver: I2cSlaveDriver<'d>,
    timeout: TickType_t,
}

impl<'d> I2cSlaveBus<'d> {
    /// `timeout_ms` bounds how long one [`queue_reply`](SlaveBusPort::queue_reply)
    /// waits for the master, so the node loop can keep sampling.
    pub fn new(driver: I2cSlaveDriver<'d>, timeout_ms: u64) -> Self {
        Self {
            driver,
            timeout: TickType::new_millis(timeout_ms).ticks(),
        }
    }
}

impl SlaveBusPort for I2cSlaveBus<'_> {
    fn queue_reply(&mut self, chunk: &ReplyChunk) -> Result<(), BusError> {
        let reply = padded_reply(chunk);
        match self.driver.write(&reply, self.timeout) {
            Ok(n) if n == reply.len() => Ok(()),
            Ok(n) => {
                warn!("Slave: short write {}/{} bytes", n, reply.len());
                Err(BusError::Bus)
            }
            Err(e) if e.code() == ESP_ERR_TIMEOUT as i32 => Err(BusError::Timeout),
            Err(e) => {
                warn!("Slave: write failed: {}", e);
                Err(BusError::Bus)
            }
        }
    }
}
