//! SenseStack firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod node;
pub mod protocol;
pub mod scheduler;

// The ESP-IDF-only parts of these are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
