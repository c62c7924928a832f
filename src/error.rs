//! Unified error types for the SenseStack firmware.
//!
//! Every subsystem error converts into [`Error`], so the boot path in
//! `main` handles failures uniformly.  All variants are `Copy` so they can
//! be stored in diagnostics and events without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus transaction failed.
    Bus(BusError),
    /// A reply chunk could not be framed or parsed.
    Frame(FrameError),
    /// Settings are invalid or could not be loaded.
    Config(ConfigError),
    /// The persistent store is unavailable.
    Storage(StorageError),
    /// Peripheral or service initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Nothing acknowledged the address.
    NoAcknowledge,
    /// Another master won arbitration.
    ArbitrationLoss,
    /// The slave held the clock or never answered.
    Timeout,
    /// Electrical or driver-level fault.
    Bus,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAcknowledge => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Timeout => write!(f, "timeout"),
            Self::Bus => write!(f, "bus fault"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

/// Why a field was dropped by the decoder or refused by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Payload longer than one unit can carry.
    Overflow,
    /// A reserved (token or filler) byte inside a payload.
    ReservedByte(u8),
    /// A begin token arrived before the open field reached a boundary.
    Interrupted,
    /// Completed payload is not valid UTF-8.
    InvalidUtf8,
    /// Payload bytes with no begin token in front of them.
    StrayPayload,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "payload overflow"),
            Self::ReservedByte(b) => write!(f, "reserved byte 0x{b:02X} in payload"),
            Self::Interrupted => write!(f, "field interrupted"),
            Self::InvalidUtf8 => write!(f, "payload is not UTF-8"),
            Self::StrayPayload => write!(f, "payload outside a field"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
