//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the main module: bus
//! discovery, per-node exchanges, report merging and publishing.  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod aggregator;
pub mod commands;
pub mod events;
pub mod ports;
pub mod publisher;
pub mod report;
pub mod roster;
pub mod service;
