//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Poll errors ───────────────────────────────────────────────────────────────

/// Invalid polling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("poll timeout must be greater than zero")]
    ZeroTimeout,

    #[error("poll attempt limit must be greater than zero")]
    ZeroAttempts,
}

// ── Host errors ───────────────────────────────────────────────────────────────

/// Errors describing the guest host or the inputs pointing at it.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unsupported operating system '{0}': no known package manager")]
    UnsupportedOs(String),

    #[error("Cannot determine the operating system: {0}")]
    UnknownOs(String),

    #[error("Invalid package name '{0}': must not be empty, start with '-' or contain spaces")]
    InvalidPackageName(String),

    #[error("Invalid package URL: {0}")]
    InvalidPackageUrl(String),

    #[error("Extension directory not found under {0}")]
    ExtensionNotFound(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
