//! PMS5003-style particulate node.
//!
//! The sensor streams 32-byte frames over UART:
//!
//! ```text
//! 0x42 0x4D │ len(2) │ PM1.0(2) │ PM2.5(2) │ PM10(2) │ … │ checksum(2)
//! ```
//!
//! All words are big-endian.  The checksum is the sum of bytes 0..30.

use core::fmt;

use crate::node::{push_field, FieldSource, FieldTable};

pub const FRAME_HEADER: [u8; 2] = [0x42, 0x4D];
pub const FRAME_LENGTH: usize = 32;

/// Bytes needed to reach the PM10 word.
const MIN_FRAME_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticulateReading {
    pub pm1: u16,
    pub pm2_5: u16,
    pub pm10: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameParseError {
    BadHeader,
    TooShort,
    Checksum { expected: u16, actual: u16 },
}

impl fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHeader => write!(f, "missing 0x42 0x4D header"),
            Self::TooShort => write!(f, "frame too short"),
            Self::Checksum { expected, actual } => {
                write!(f, "checksum mismatch (expected {expected}, got {actual})")
            }
        }
    }
}

fn word(frame: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([frame[at], frame[at + 1]])
}

/// Parse one sensor frame.  The checksum is only checked when the full
/// 32-byte frame is present.
pub fn parse_frame(frame: &[u8]) -> Result<ParticulateReading, FrameParseError> {
    if frame.len() < 2 || frame[..2] != FRAME_HEADER {
        return Err(FrameParseError::BadHeader);
    }
    if frame.len() < MIN_FRAME_LENGTH {
        return Err(FrameParseError::TooShort);
    }
    if frame.len() >= FRAME_LENGTH {
        let actual = frame[..FRAME_LENGTH - 2]
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
        let expected = word(frame, FRAME_LENGTH - 2);
        if actual != expected {
            return Err(FrameParseError::Checksum { expected, actual });
        }
    }
    Ok(ParticulateReading {
        pm1: word(frame, 4),
        pm2_5: word(frame, 6),
        pm10: word(frame, 8),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParticulateNode {
    latest: Option<ParticulateReading>,
}

impl ParticulateNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and keep a frame.  A bad frame keeps the previous reading.
    pub fn ingest(&mut self, frame: &[u8]) -> Result<ParticulateReading, FrameParseError> {
        let reading = parse_frame(frame)?;
        self.latest = Some(reading);
        Ok(reading)
    }

    pub fn latest(&self) -> Option<ParticulateReading> {
        self.latest
    }
}

impl FieldSource for ParticulateNode {
    fn fields(&self) -> FieldTable {
        let mut table = FieldTable::new();
        if let Some(r) = self.latest {
            push_field(&mut table, "pm1", format_args!("{} ug/m3", r.pm1));
            push_field(&mut table, "pm2_5", format_args!("{} ug/m3", r.pm2_5));
            push_field(&mut table, "pm10", format_args!("{} ug/m3", r.pm10));
        }
        table
    }
}
