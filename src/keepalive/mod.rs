//! Keepalive supervision
//!
//! Every admitted subscriber is driven by two cooperating tasks:
//!
//! - a probe task writing a ping every `ping_interval`
//! - a read loop refreshing the read deadline on every receipt and
//!   answering application-level pings
//!
//! Both watch the subscriber's dead signal. Whichever side detects a failure
//! removes the subscriber, which raises the signal and stops the other.

pub mod state;
pub mod supervisor;

pub use state::{KeepalivePhase, KeepaliveState};
pub use supervisor::supervise;
