//! Sensor-bus frame codec.
//!
//! Every bus data request returns one reply chunk of at most
//! [`MAX_SENSOR_REPLY_LENGTH`] bytes.  A chunk carries one *unit*:
//!
//! ```text
//! ┌──────────────┬───────────────────────┬────────────────────┐
//! │ IS_KEY (SOH) │ payload (0..=30 B)    │ MORE (ETB)         │
//! │ IS_VALUE(STX)│ UTF-8, no reserved B  │ TERMINATE (EOT)    │
//! └──────────────┴───────────────────────┴────────────────────┘
//! ```
//!
//! `MORE` means the node has further units queued for this round;
//! `TERMINATE` ends the round.  A bare `TERMINATE` is a node with
//! nothing to report.  `0x00` and `0xFF` are filler (an idle slave clocks
//! out `0xFF` past the end of its reply) and are skipped between units.

pub mod decoder;
pub mod encoder;

pub use decoder::{Decode, FrameDecoder};
pub use encoder::{encode_empty, encode_field, padded_reply, sanitize_payload};

use crate::error::FrameError;
use crate::protocol::{MAX_FIELD_LENGTH, MAX_SENSOR_REPLY_LENGTH};

/// Text carried by one unit.
pub type FieldText = heapless::String<MAX_FIELD_LENGTH>;

/// One reply to one bus data request.
pub type ReplyChunk = heapless::Vec<u8, MAX_SENSOR_REPLY_LENGTH>;

// ── Alphabet ──────────────────────────────────────────────────

/// The four control tokens of the wire alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameToken {
    IsKey,
    IsValue,
    More,
    Terminate,
}

impl FrameToken {
    pub const fn byte(self) -> u8 {
        match self {
            Self::IsKey => 0x01,
            Self::IsValue => 0x02,
            Self::More => 0x17,
            Self::Terminate => 0x04,
        }
    }

    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::IsKey),
            0x02 => Some(Self::IsValue),
            0x17 => Some(Self::More),
            0x04 => Some(Self::Terminate),
            _ => None,
        }
    }

    /// `MORE` and `TERMINATE` close a unit.
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::More | Self::Terminate)
    }

    pub const fn boundary(has_more: bool) -> Self {
        if has_more { Self::More } else { Self::Terminate }
    }
}

/// Filler bytes: never part of a payload.
pub const FILLER_BYTES: [u8; 2] = [0x00, 0xFF];

/// True for any token or filler byte.
pub const fn is_reserved(byte: u8) -> bool {
    FrameToken::from_byte(byte).is_some() || byte == FILLER_BYTES[0] || byte == FILLER_BYTES[1]
}

// ── Fields and events ─────────────────────────────────────────

/// Which half of a key/value pair a unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Key,
    Value,
}

impl FieldKind {
    pub const fn begin_token(self) -> FrameToken {
        match self {
            Self::Key => FrameToken::IsKey,
            Self::Value => FrameToken::IsValue,
        }
    }
}

/// What the decoder reports while walking a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    BeginKey,
    BeginValue,
    /// A `MORE`/`TERMINATE` token, with the payload collected since the
    /// last begin token (empty when no field was open).
    ChunkBoundary { has_more: bool, payload: FieldText },
    /// The open field was dropped.
    Discarded(FrameError),
}
