//! Domain models for hydrowatch
//!
//! Meter readings and the consumption nodes that aggregate them.

pub mod consumption;
pub mod reading;

pub use consumption::{AggregateConsumption, Consumption, MeterConsumption, TimeWindow};
pub use reading::Reading;
