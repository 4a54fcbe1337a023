//! hydrowatch - consumption alert library
//!
//! This library evaluates metered consumption against per-subject rules, materializes
//! alerts for violations and fans them out to notification sinks.
//!
//! # Modules
//!
//! - [`alerts`]: Rules, alert engine and notification fan-out
//! - [`analysis`]: Pluggable analysis strategies
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Readings and consumption nodes
//! - [`error`]: Error types
//! - [`repository`]: Reading and subject collaborators
//! - [`services`]: Pipeline wiring and periodic sweeps

pub mod alerts;
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;

#[cfg(test)]
pub mod mock;

pub use error::{AppError, Result};
