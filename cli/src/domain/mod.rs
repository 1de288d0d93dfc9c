//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod encoding;
pub mod error;
pub mod extension;
pub mod os;
pub mod poll;
pub mod report;
pub mod status;

pub use config::{PollSettings, ValidatorConfig, set_config_value, validate_config_key};
pub use error::{ConfigError, HostError, PollConfigError};
pub use poll::{PollConfig, PollOutcome, PollResult};
pub use report::{Step, StepReport, ValidationReport};
pub use status::{StatusObservation, StatusSummary};
