//! Service layer for consumption monitoring
//!
//! Services wire configuration into the alert pipeline and drive periodic sweeps.

pub mod alert_service;
pub mod monitor;

pub use alert_service::{AlertService, CheckOutcome};
pub use monitor::{Monitor, MonitorConfig, SweepReport};
