//! Telemetry event
//!
//! One battery/USB sample as posted by the producer.

use serde::{Deserialize, Serialize};

/// A single telemetry sample
///
/// Events are plain values: they are cloned into the history buffer and
/// never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Producer-defined timestamp (epoch seconds or millis, not necessarily monotonic)
    pub timestamp: i64,
    /// Accumulated charge in mAh
    pub milliamp_hours: f64,
    /// Battery voltage
    pub voltage: f64,
    /// Board temperature in degrees Celsius
    pub temperature: f64,
    /// Battery chemistry label (e.g. "lipo")
    pub battery_chemistry: String,
    /// Whether USB power has been lost
    pub usb_alert: bool,
}

impl Event {
    /// Create a new event
    pub fn new(
        timestamp: i64,
        milliamp_hours: f64,
        voltage: f64,
        temperature: f64,
        battery_chemistry: impl Into<String>,
        usb_alert: bool,
    ) -> Self {
        Self {
            timestamp,
            milliamp_hours,
            voltage,
            temperature,
            battery_chemistry: battery_chemistry.into(),
            usb_alert,
        }
    }
}
