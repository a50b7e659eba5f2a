//! Real-time battery telemetry relay
//!
//! A single producer posts readings over HTTP; any number of browser
//! subscribers receive them live over WebSocket. New subscribers are first
//! replayed the most recent readings so their charts start populated.
//!
//! ```text
//!   producer ──POST /webhook──► Hub::publish ──► HistoryBuffer (last N)
//!                                    │
//!                                    └─► fan-out ──► Subscriber ──► WebSocket
//!                                                    Subscriber ──► WebSocket
//!   browser  ──GET /ws──────► Hub::admit ──► replay history, then live
//!                                  └─► keepalive::supervise (probe + read loop)
//! ```
//!
//! # Example
//! ```no_run
//! use telemetry_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> telemetry_relay::error::Result<()> {
//! let server = RelayServer::new(ServerConfig::default())?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod history;
pub mod hub;
pub mod keepalive;
pub mod registry;
pub mod server;
pub mod stats;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::TelemetryPublisher;
pub use error::{Error, Result};
pub use history::HistoryBuffer;
pub use hub::{DisconnectReason, Hub, HubConfig};
pub use server::{Credentials, RelayServer, ServerConfig};
pub use stats::{DeliveryReport, HubStats};
pub use telemetry::{Event, OutboundMessage};
