//! Recent-history cache for late-joiner replay
//!
//! New subscribers receive the last few readings before any live traffic so
//! their charts are not empty on connect.

pub mod buffer;

pub use buffer::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
