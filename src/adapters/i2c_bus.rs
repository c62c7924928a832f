//! I2C bus master adapter.
//!
//! Implements [`BusPort`] over any `embedded_hal::i2c::I2c` driver, which
//! on the ESP32 is `esp_idf_hal::i2c::I2cDriver`.
//!
//! - **probe**: zero-length write; the address phase alone tells us
//!   whether a node is there.
//! - **request**: plain read of a full reply chunk.  A node that sends
//!   fewer bytes leaves the bus idle-high, so the tail reads as `0xFF`
//!   filler, which the frame decoder skips.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::app::ports::BusPort;
use crate::error::BusError;
use crate::protocol::BusAddress;

pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }
}

fn classify(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusError::NoAcknowledge,
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss,
        _ => BusError::Bus,
    }
}

impl<I: I2c> BusPort for I2cBus<I> {
    fn probe(&mut self, address: BusAddress) -> Result<(), BusError> {
        self.i2c
            .write(address.get(), &[])
            .map_err(|e| classify(e.kind()))
    }

    fn request(&mut self, address: BusAddress, buf: &mut [u8]) -> Result<usize, BusError> {
        self.i2c
            .read(address.get(), buf)
            .map_err(|e| classify(e.kind()))?;
        Ok(buf.len())
    }
}
