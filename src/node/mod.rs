//! Sensor-node side of the bus.
//!
//! A node owns a table of key/value fields describing its latest
//! reading.  Each bus data request pulls exactly one unit of that table
//! through [`respond`], which is a pure function of the reply cursor and
//! the table.  [`SlaveResponder`] keeps the cursor between requests.
//!
//! Per-variant field builders (climate, UV, particulate, CO) live in
//! [`sensors`].

pub mod responder;
pub mod sensors;

pub use responder::{respond, SlaveResponder};

use core::fmt;

use crate::frame::{sanitize_payload, FieldText};
use crate::protocol::DATA_TRANSMISSION_TIMEOUT;

/// Most fields a node can publish per round: each field costs two
/// requests and the master stops after [`DATA_TRANSMISSION_TIMEOUT`].
pub const MAX_FIELDS: usize = DATA_TRANSMISSION_TIMEOUT as usize / 2;

/// One key/value pair, already cleaned for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: FieldText,
    pub value: FieldText,
}

impl Field {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: sanitize_payload(key),
            value: sanitize_payload(value),
        }
    }
}

/// A node's published fields for one round.
pub type FieldTable = heapless::Vec<Field, MAX_FIELDS>;

/// Anything that can describe its latest reading as fields.
pub trait FieldSource {
    fn fields(&self) -> FieldTable;
}

/// Format `value` and append it under `key`.  Full tables drop the field.
pub fn push_field(table: &mut FieldTable, key: &str, value: fmt::Arguments<'_>) {
    let text = value.to_string();
    if table.push(Field::new(key, &text)).is_err() {
        log::warn!("Node: field table full, dropping '{}'", key);
    }
}

/// A fixed table, for nodes whose fields never change.
impl FieldSource for FieldTable {
    fn fields(&self) -> FieldTable {
        self.clone()
    }
}
