//! Subscriber registry
//!
//! Tracks which streaming connections are live. Membership is the only
//! source of truth for who receives broadcasts.
//!
//! # Architecture
//!
//! ```text
//!                  SubscriberRegistry
//!          ┌──────────────────────────────────┐
//!          │ members: HashMap<SubscriberId,   │
//!          │   Arc<Subscriber {               │
//!          │     sink: Mutex<S>,              │
//!          │     keepalive,                   │
//!          │     dead_tx,                     │
//!          │   }>                             │
//!          │ >                                │
//!          └────────────────┬─────────────────┘
//!                           │ snapshot() (copy out)
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!     sink.lock()      sink.lock()      sink.lock()
//!     write frame      write frame      write frame
//! ```
//!
//! Each subscriber has its own write lock, so writes to different
//! subscribers never contend with each other.

pub mod store;
pub mod subscriber;

pub use store::SubscriberRegistry;
pub use subscriber::{Subscriber, SubscriberId};
