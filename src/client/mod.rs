//! Producer-side client
//!
//! Posts readings and reset requests to a running relay.

pub mod publisher;

pub use publisher::TelemetryPublisher;
