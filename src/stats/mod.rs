//! Delivery and hub statistics

pub mod metrics;

pub use metrics::{DeliveryReport, HubStats};
pub(crate) use metrics::HubCounters;
