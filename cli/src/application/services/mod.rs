//! Application services — use-case orchestration.
//!
//! Each service module implements a single validation step by composing
//! domain logic with port trait calls. Services import only from
//! `crate::domain` and `crate::application` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod config_service;
pub mod extension_status;
pub mod locate;
pub mod package;
pub mod process;
pub mod reinstall;
pub mod validate;
