//! Streaming frame decoder.
//!
//! The decoder is fed the raw chunks of one node exchange, in order, and
//! keeps its state across chunk boundaries.  It never fails: malformed
//! input turns into [`FrameEvent::Discarded`] and the decoder skips ahead
//! to the next control token.

use crate::error::FrameError;

use super::{FieldText, FrameEvent, FrameToken, FILLER_BYTES};
use crate::protocol::MAX_FIELD_LENGTH;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Between units: filler is skipped, payload bytes are stray.
    Idle,
    /// Collecting a payload after a begin token.
    Field,
    /// A field was dropped; ignore everything up to the next token.
    Skipping,
}

/// Byte-at-a-time frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    payload: heapless::Vec<u8, MAX_FIELD_LENGTH>,
    /// Second event produced by a single byte (discard + begin, or
    /// discard + boundary).
    pending: Option<FrameEvent>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            payload: heapless::Vec::new(),
            pending: None,
        }
    }

    /// Lazily decode `bytes`, continuing from wherever the previous chunk
    /// left off.
    pub fn decode<'a>(&'a mut self, bytes: &'a [u8]) -> Decode<'a> {
        Decode {
            decoder: self,
            bytes: bytes.iter(),
        }
    }

    /// Feed one byte.
    ///
    /// Some bytes produce two events; the second one is returned by
    /// [`take_pending`](Self::take_pending).
    pub fn push(&mut self, byte: u8) -> Option<FrameEvent> {
        if let Some(token) = FrameToken::from_byte(byte) {
            return Some(self.on_token(token));
        }

        if byte == FILLER_BYTES[0] || byte == FILLER_BYTES[1] {
            return match self.state {
                DecoderState::Field => Some(self.discard(FrameError::ReservedByte(byte))),
                DecoderState::Idle | DecoderState::Skipping => None,
            };
        }

        match self.state {
            DecoderState::Idle => Some(self.discard(FrameError::StrayPayload)),
            DecoderState::Skipping => None,
            DecoderState::Field => {
                if self.payload.push(byte).is_err() {
                    Some(self.discard(FrameError::Overflow))
                } else {
                    None
                }
            }
        }
    }

    pub fn take_pending(&mut self) -> Option<FrameEvent> {
        self.pending.take()
    }

    /// Whether a field is open (begin token seen, no boundary yet).
    #[cfg(test)]
    fn in_field(&self) -> bool {
        self.state == DecoderState::Field
    }

    /// Drop all state before talking to the next node.
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.payload.clear();
        self.pending = None;
    }

    fn on_token(&mut self, token: FrameToken) -> FrameEvent {
        let was_open = self.state == DecoderState::Field;

        if !token.is_boundary() {
            self.payload.clear();
            self.state = DecoderState::Field;
            let begin = if token == FrameToken::IsKey {
                FrameEvent::BeginKey
            } else {
                FrameEvent::BeginValue
            };
            if was_open {
                self.pending = Some(begin);
                return FrameEvent::Discarded(FrameError::Interrupted);
            }
            return begin;
        }

        let has_more = token == FrameToken::More;
        self.state = DecoderState::Idle;
        let bytes = core::mem::take(&mut self.payload);
        if !was_open {
            return FrameEvent::ChunkBoundary {
                has_more,
                payload: FieldText::new(),
            };
        }

        match FieldText::from_utf8(bytes) {
            Ok(payload) => FrameEvent::ChunkBoundary { has_more, payload },
            Err(_) => {
                self.pending = Some(FrameEvent::ChunkBoundary {
                    has_more,
                    payload: FieldText::new(),
                });
                FrameEvent::Discarded(FrameError::InvalidUtf8)
            }
        }
    }

    fn discard(&mut self, reason: FrameError) -> FrameEvent {
        self.payload.clear();
        self.state = DecoderState::Skipping;
        FrameEvent::Discarded(reason)
    }
}

/// Iterator returned by [`FrameDecoder::decode`].
pub struct Decode<'a> {
    decoder: &'a mut FrameDecoder,
    bytes: core::slice::Iter<'a, u8>,
}

impl Iterator for Decode<'_> {
    type Item = FrameEvent;

    fn next(&mut self) -> Option<FrameEvent> {
        if let Some(event) = self.decoder.take_pending() {
            return Some(event);
        }
        for &byte in self.bytes.by_ref() {
            if let Some(event) = self.decoder.push(byte) {
                return Some(event);
            }
        }
        None
    }
}
