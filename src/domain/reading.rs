//! Meter reading domain type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cumulative meter reading in liters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Measurement point (meter) identifier
    #[serde(alias = "meter")]
    pub measurement_point: String,
    /// Cumulative register value in liters
    pub value: u64,
    /// When the register was read
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a new reading
    pub fn new(measurement_point: impl Into<String>, value: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement_point: measurement_point.into(),
            value,
            timestamp,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}L @ {}",
            self.measurement_point,
            self.value,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
