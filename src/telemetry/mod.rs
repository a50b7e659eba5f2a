//! Telemetry payloads
//!
//! This module defines the reading pushed by the producer and the messages
//! written to subscribers.

pub mod event;
pub mod message;

pub use event::Event;
pub use message::{ClientMessage, OutboundMessage};
