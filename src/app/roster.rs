//! Node roster: which bus addresses answered the last scan.

use log::{debug, info, warn};

use crate::error::BusError;
use crate::protocol::{BusAddress, MAX_SENSORS};

use super::events::AppEvent;
use super::ports::{BusPort, EventSink};

/// Addresses that acknowledged a probe, in ascending order, without
/// duplicates, at most [`MAX_SENSORS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRoster {
    nodes: heapless::Vec<BusAddress, MAX_SENSORS>,
}

impl NodeRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe every address in `[1, TOP_ADDRESS)` and collect the ones that
    /// acknowledge.  Stops early once the roster is full.  Probe errors
    /// other than a missing acknowledge are reported and the address is
    /// treated as absent.
    pub fn scan(bus: &mut impl BusPort, sink: &mut impl EventSink) -> Self {
        let mut roster = Self::new();

        for address in BusAddress::scan_range() {
            if roster.is_full() {
                warn!("Bus: roster full ({} nodes), scan stopped at {}", MAX_SENSORS, address);
                break;
            }
            match bus.probe(address) {
                Ok(()) => {
                    info!("Bus: node found at {}", address);
                    roster.insert(address);
                }
                Err(BusError::NoAcknowledge) => {}
                Err(error) => {
                    warn!("Bus: probe error at {} ({})", address, error);
                    sink.emit(&AppEvent::ProbeFailed { address, error });
                }
            }
        }

        debug!("Bus: scan done, {} node(s)", roster.len());
        sink.emit(&AppEvent::ScanCompleted {
            nodes: roster.len(),
            full: roster.is_full(),
        });
        roster
    }

    /// Add an address.  Returns `false` if it is already present or the
    /// roster is full.
    pub fn insert(&mut self, address: BusAddress) -> bool {
        if self.contains(address) {
            return false;
        }
        let at = self.nodes.partition_point(|a| *a < address);
        self.nodes.insert(at, address).is_ok()
    }

    pub fn contains(&self, address: BusAddress) -> bool {
        self.nodes.binary_search(&address).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = BusAddress> + '_ {
        self.nodes.iter().copied()
    }

    #[cfg(test)]
    fn as_slice(&self) -> &[BusAddress] {
        &self.nodes
    }

    /// Fixed-width view: raw addresses, unused slots hold 0.
    pub fn as_slots(&self) -> [u8; MAX_SENSORS] {
        let mut slots = [0u8; MAX_SENSORS];
        for (slot, address) in slots.iter_mut().zip(self.nodes.iter()) {
            *slot = address.get();
        }
        slots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.nodes.is_full()
    }
}
