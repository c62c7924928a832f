//! Unit encoder, shared by every sensor node.

use crate::error::FrameError;

use super::{is_reserved, FieldKind, FieldText, FrameToken, ReplyChunk, FILLER_BYTES};
use crate::protocol::{MAX_FIELD_LENGTH, MAX_SENSOR_REPLY_LENGTH};

/// Encode one key or value unit: `[begin][payload][MORE|TERMINATE]`.
///
/// Refuses payloads that would not round-trip: too long for a chunk, or
/// containing a token / filler byte.
pub fn encode_field(kind: FieldKind, payload: &str, has_more: bool) -> Result<ReplyChunk, FrameError> {
    if payload.len() > MAX_FIELD_LENGTH {
        return Err(FrameError::Overflow);
    }
    if let Some(byte) = payload.bytes().find(|b| is_reserved(*b)) {
        return Err(FrameError::ReservedByte(byte));
    }

    let mut chunk = ReplyChunk::new();
    chunk
        .push(kind.begin_token().byte())
        .map_err(|_| FrameError::Overflow)?;
    chunk
        .extend_from_slice(payload.as_bytes())
        .map_err(|_| FrameError::Overflow)?;
    chunk
        .push(FrameToken::boundary(has_more).byte())
        .map_err(|_| FrameError::Overflow)?;
    Ok(chunk)
}

/// A unit with no field: just the boundary token.
pub fn encode_empty(has_more: bool) -> ReplyChunk {
    let mut chunk = ReplyChunk::new();
    // A one-byte push into an empty 32-byte vec cannot fail.
    let _ = chunk.push(FrameToken::boundary(has_more).byte());
    chunk
}

/// A full-length reply: `chunk` followed by idle-high filler.  Slave
/// peripherals transmit whole buffers, and the master reads whole
/// chunks, so every reply is sent at full length.
pub fn padded_reply(chunk: &ReplyChunk) -> [u8; MAX_SENSOR_REPLY_LENGTH] {
    let mut out = [FILLER_BYTES[1]; MAX_SENSOR_REPLY_LENGTH];
    out[..chunk.len()].copy_from_slice(chunk);
    out
}

/// Make arbitrary text encodable: reserved bytes are removed and the
/// result is cut at a char boundary to fit one unit.
pub fn sanitize_payload(text: &str) -> FieldText {
    let mut out = FieldText::new();
    for c in text.chars() {
        if c.is_ascii() && is_reserved(c as u8) {
            continue;
        }
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
