//! Integration tests: node responder → slave port → master exchange.
//!
//! The node stages each reply on a [`SlaveLink`] the way it would on the
//! I2C slave peripheral; the master only ever sees what the link clocks out.

use sensestack::adapters::sim_bus::SlaveLink;
use sensestack::app::aggregator::{exchange, ExchangeOutcome};
use sensestack::app::ports::BusPort;
use sensestack::error::BusError;
use sensestack::node::sensors::uv::UvNode;
use sensestack::node::{FieldSource, SlaveResponder};
use sensestack::protocol::{BusAddress, DATA_TRANSMISSION_TIMEOUT, SENSOR_LIGHT_UV};

use crate::mock_ports::{addr, climate};

/// One node on its own link.  The node loop stages a reply whenever the
/// slot is free; a master read then clocks it out.
struct LinkedNode<S> {
    address: BusAddress,
    link: SlaveLink,
    responder: SlaveResponder,
    source: S,
    staged: u32,
}

impl<S: FieldSource> LinkedNode<S> {
    fn new(address: BusAddress, source: S) -> Self {
        Self {
            address,
            link: SlaveLink::new(),
            responder: SlaveResponder::new(),
            source,
            staged: 0,
        }
    }

    fn node_loop_step(&mut self) -> Result<(), BusError> {
        self.responder.serve(&mut self.link, &self.source)?;
        self.staged += 1;
        Ok(())
    }
}

impl<S: FieldSource> BusPort for LinkedNode<S> {
    fn probe(&mut self, address: BusAddress) -> Result<(), BusError> {
        if address == self.address {
            Ok(())
        } else {
            Err(BusError::NoAcknowledge)
        }
    }

    fn request(&mut self, address: BusAddress, buf: &mut [u8]) -> Result<usize, BusError> {
        self.probe(address)?;
        if !self.link.is_staged() {
            self.node_loop_step()?;
        }
        Ok(self.link.collect(buf))
    }
}

#[test]
fn climate_node_is_drained_through_the_slave_port() {
    let mut node = LinkedNode::new(addr(11), climate(21.43, 55.2));

    let ex = exchange(&mut node, addr(11), DATA_TRANSMISSION_TIMEOUT);

    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert_eq!(ex.requests, 4);
    assert_eq!(ex.record.get("temperature"), Some("21.4 c"));
    assert_eq!(ex.record.get("humidity"), Some("55 %"));
    assert!(ex.diagnostics.is_empty());
    assert_eq!(node.staged, 4);
}

#[test]
fn uv_node_answers_at_its_bus_address() {
    let mut uv = UvNode::new();
    // Sensor at 0.99 V + 1/2 span against a 3.3 V reference.
    let level = ((0.99 + (2.8 - 0.99) / 2.0) / 3.3 * 4095.0) as u16;
    uv.record_samples(&[level; 8], &[4095; 8]);
    let address = BusAddress::new(SENSOR_LIGHT_UV).unwrap();
    let mut node = LinkedNode::new(address, uv);

    let ex = exchange(&mut node, address, DATA_TRANSMISSION_TIMEOUT);

    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert_eq!(ex.requests, 2);
    assert_eq!(ex.record.get("uv_intensity"), Some("7.5 mw/cm^2"));
}

#[test]
fn early_staging_keeps_units_in_order() {
    let mut node = LinkedNode::new(addr(11), climate(19.0, 40.0));

    // The node stages ahead of the master; the slot then stays busy.
    node.node_loop_step().unwrap();
    assert_eq!(node.node_loop_step(), Err(BusError::Timeout));
    assert_eq!(node.node_loop_step(), Err(BusError::Timeout));

    let ex = exchange(&mut node, addr(11), DATA_TRANSMISSION_TIMEOUT);

    assert_eq!(ex.outcome, ExchangeOutcome::Terminated);
    assert_eq!(ex.record.get("temperature"), Some("19.0 c"));
    assert_eq!(ex.record.get("humidity"), Some("40 %"));
    assert!(ex.diagnostics.is_empty());
}

#[test]
fn consecutive_rounds_repeat_the_table() {
    let mut node = LinkedNode::new(addr(11), climate(22.0, 60.0));

    let first = exchange(&mut node, addr(11), DATA_TRANSMISSION_TIMEOUT);
    let second = exchange(&mut node, addr(11), DATA_TRANSMISSION_TIMEOUT);

    assert_eq!(first.record, second.record);
    assert_eq!(second.requests, 4);
}
