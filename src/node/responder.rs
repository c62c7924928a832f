//! Reply sequencing for one sensor node.

use crate::app::ports::SlaveBusPort;
use crate::error::BusError;
use crate::frame::{encode_empty, encode_field, FieldKind, ReplyChunk};

use super::{FieldSource, FieldTable};

/// Produce the unit for `cursor` and the cursor for the next request.
///
/// Units alternate key, value, key, value…  Keys always carry `MORE`;
/// values carry `MORE` except the last one, which carries `TERMINATE`
/// and wraps the cursor back to 0.  An empty table answers with a bare
/// `TERMINATE`.  A cursor past the end of the table (the table shrank)
/// restarts the round.
pub fn respond(cursor: usize, table: &FieldTable) -> (ReplyChunk, usize) {
    let units = table.len() * 2;
    if units == 0 {
        return (encode_empty(false), 0);
    }

    let cursor = if cursor < units { cursor } else { 0 };
    let field = &table[cursor / 2];
    let last = cursor + 1 == units;

    let chunk = if cursor % 2 == 0 {
        encode_unit(FieldKind::Key, &field.key, true)
    } else {
        encode_unit(FieldKind::Value, &field.value, !last)
    };

    (chunk, if last { 0 } else { cursor + 1 })
}

fn encode_unit(kind: FieldKind, text: &str, has_more: bool) -> ReplyChunk {
    // Field text is sanitised on construction; the fallback keeps the
    // boundary so the master still sees MORE/TERMINATE.
    encode_field(kind, text, has_more).unwrap_or_else(|_| encode_empty(has_more))
}

/// Stateful wrapper used by the bus request handler.
///
/// The field table is captured when a round starts, so a key and its
/// value always come from the same reading even if the sensor updates
/// mid-round.
#[derive(Debug, Default)]
pub struct SlaveResponder {
    cursor: usize,
    round: FieldTable,
    /// Reply the port has not accepted yet.
    pending: Option<ReplyChunk>,
}

impl SlaveResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer one data request.
    pub fn on_request(&mut self, source: &dyn FieldSource) -> ReplyChunk {
        if self.cursor == 0 {
            self.round = source.fields();
        }
        let (chunk, next) = respond(self.cursor, &self.round);
        self.cursor = next;
        chunk
    }

    /// Stage the next reply on a slave peripheral.
    ///
    /// A reply the port refuses is kept and offered again on the next
    /// call, so the master never sees a unit skipped.
    pub fn serve(&mut self, port: &mut impl SlaveBusPort, source: &dyn FieldSource) -> Result<(), BusError> {
        let chunk = match self.pending.take() {
            Some(chunk) => chunk,
            None => self.on_request(source),
        };
        if let Err(e) = port.queue_reply(&chunk) {
            self.pending = Some(chunk);
            return Err(e);
        }
        Ok(())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
