//! Unit tests for extcheck
//!
//! These tests drive the application services against an in-memory guest
//! and run on a paused clock, so they are fast and need no real VM.

mod config_store;
mod locate_service;
mod mocks;
mod process_service;
mod reinstall_service;
mod status_service;
