//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters and the simulated bus.  All tests run on the
//! host (x86_64) with no real hardware required.

mod aggregation_tests;
mod mock_ports;
mod node_link_tests;
mod publisher_tests;
mod settings_flow_tests;
