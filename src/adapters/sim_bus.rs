//! In-memory sensor bus.
//!
//! Implements [`BusPort`] by routing requests straight into node
//! responders, so the whole master/node protocol runs on the host.  Used
//! by the integration tests and by host-side simulation.  [`SlaveLink`]
//! stands in for a node's slave peripheral.

use std::collections::BTreeMap;

use crate::app::ports::{BusPort, SlaveBusPort};
use crate::error::BusError;
use crate::frame::{padded_reply, ReplyChunk};
use crate::node::{FieldSource, FieldTable, SlaveResponder};
use crate::protocol::BusAddress;

/// Wrap a closure as a [`FieldSource`].
pub struct FnSource<F>(pub F);

impl<F: Fn() -> FieldTable> FieldSource for FnSource<F> {
    fn fields(&self) -> FieldTable {
        (self.0)()
    }
}

enum SimDevice {
    /// A real responder over a field source.
    Node {
        responder: SlaveResponder,
        source: Box<dyn FieldSource + Send>,
    },
    /// Replays raw chunks in a loop, for malformed or hostile nodes.
    Scripted { chunks: Vec<ReplyChunk>, next: usize },
    /// Acknowledges nothing; every transaction fails with this error.
    Faulty(BusError),
}

#[derive(Default)]
pub struct SimulatedBus {
    devices: BTreeMap<u8, SimDevice>,
    requests: BTreeMap<u8, u32>,
    padded: bool,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every reply to the full buffer with `0xFF`, like an idle
    /// I2C slave.
    pub fn padded(mut self) -> Self {
        self.padded = true;
        self
    }

    pub fn attach(&mut self, address: BusAddress, source: impl FieldSource + Send + 'static) {
        self.devices.insert(
            address.get(),
            SimDevice::Node {
                responder: SlaveResponder::new(),
                source: Box::new(source),
            },
        );
    }

    pub fn attach_scripted(&mut self, address: BusAddress, chunks: Vec<ReplyChunk>) {
        self.devices
            .insert(address.get(), SimDevice::Scripted { chunks, next: 0 });
    }

    pub fn attach_faulty(&mut self, address: BusAddress, error: BusError) {
        self.devices.insert(address.get(), SimDevice::Faulty(error));
    }

    pub fn detach(&mut self, address: BusAddress) {
        self.devices.remove(&address.get());
    }

    /// Data requests served to `address` so far.
    pub fn requests_to(&self, address: BusAddress) -> u32 {
        self.requests.get(&address.get()).copied().unwrap_or(0)
    }
}

impl BusPort for SimulatedBus {
    fn probe(&mut self, address: BusAddress) -> Result<(), BusError> {
        match self.devices.get(&address.get()) {
            None => Err(BusError::NoAcknowledge),
            Some(SimDevice::Faulty(e)) => Err(*e),
            Some(_) => Ok(()),
        }
    }

    fn request(&mut self, address: BusAddress, buf: &mut [u8]) -> Result<usize, BusError> {
        let chunk = match self.devices.get_mut(&address.get()) {
            None => return Err(BusError::NoAcknowledge),
            Some(SimDevice::Faulty(e)) => return Err(*e),
            Some(SimDevice::Node { responder, source }) => responder.on_request(source.as_ref()),
            Some(SimDevice::Scripted { chunks, next }) => {
                if chunks.is_empty() {
                    ReplyChunk::new()
                } else {
                    let chunk = chunks[*next % chunks.len()].clone();
                    *next += 1;
                    chunk
                }
            }
        };
        *self.requests.entry(address.get()).or_insert(0) += 1;

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if self.padded {
            buf[n..].fill(0xFF);
            Ok(buf.len())
        } else {
            Ok(n)
        }
    }
}

// ── Slave side ────────────────────────────────────────────────

/// Host stand-in for a slave peripheral's transmit buffer: one staged
/// reply, clocked out by the master's next read.
#[derive(Debug, Default)]
pub struct SlaveLink {
    staged: Option<ReplyChunk>,
}

impl SlaveLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Master read.  Clocks out the staged reply at full length, or plain
    /// idle-high filler when nothing is staged.
    pub fn collect(&mut self, buf: &mut [u8]) -> usize {
        let reply = padded_reply(&self.staged.take().unwrap_or_default());
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        n
    }
}

impl SlaveBusPort for SlaveLink {
    fn queue_reply(&mut self, chunk: &ReplyChunk) -> Result<(), BusError> {
        if self.staged.is_some() {
            return Err(BusError::Timeout);
        }
        self.staged = Some(chunk.clone());
        Ok(())
    }
}
