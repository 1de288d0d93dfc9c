//! Application layer — port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` — never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod poll;
pub mod ports;
pub mod services;

pub use poll::poll_until;
pub use ports::{
    CommandRunner, ConfigStore, DirEntry, FileSystem, GuestHost, HttpClient, ProcessTable,
    ProgressReporter,
};
