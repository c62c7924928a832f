//! Fuzz target: one master/node exchange against a hostile node
//!
//! The input is cut into reply chunks that a scripted node replays.
//! Whatever it sends, the exchange must stay within its request budget
//! and never panic.
//!
//! cargo fuzz run fuzz_exchange

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensestack::adapters::sim_bus::SimulatedBus;
use sensestack::app::aggregator::exchange;
use sensestack::frame::ReplyChunk;
use sensestack::protocol::{BusAddress, DATA_TRANSMISSION_TIMEOUT, MAX_SENSOR_REPLY_LENGTH};

fuzz_target!(|data: &[u8]| {
    let Some(address) = BusAddress::new(42) else {
        return;
    };
    let chunks: Vec<ReplyChunk> = data
        .chunks(MAX_SENSOR_REPLY_LENGTH)
        .filter_map(|c| ReplyChunk::from_slice(c).ok())
        .collect();

    let mut bus = SimulatedBus::new().padded();
    bus.attach_scripted(address, chunks);

    let result = exchange(&mut bus, address, DATA_TRANSMISSION_TIMEOUT);
    assert!(result.requests <= DATA_TRANSMISSION_TIMEOUT);
    assert!(bus.requests_to(address) <= u32::from(DATA_TRANSMISSION_TIMEOUT));
});
