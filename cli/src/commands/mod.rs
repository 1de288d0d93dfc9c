//! Command implementations

pub mod check_process;
pub mod config;
pub mod ensure_package;
pub mod locate;
pub mod reinstall;
pub mod status;
pub mod validate;
pub mod version;

use std::process::ExitCode;

use indicatif::ProgressBar;

use crate::app::AppContext;
use crate::domain::error::{ConfigError, HostError, PollConfigError};
use crate::output::progress;

/// Stable error code for `--json` error objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<HostError>() {
        return match e {
            HostError::UnsupportedOs(_) => "UNSUPPORTED_OS",
            HostError::UnknownOs(_) => "UNKNOWN_OS",
            HostError::InvalidPackageName(_) => "INVALID_PACKAGE_NAME",
            HostError::InvalidPackageUrl(_) => "INVALID_PACKAGE_URL",
            HostError::ExtensionNotFound(_) => "EXTENSION_NOT_FOUND",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "INVALID_CONFIG";
    }
    if err.downcast_ref::<PollConfigError>().is_some() {
        return "INVALID_POLL_SETTINGS";
    }
    "ERROR"
}

/// Exit code for a pass/fail verdict.
#[must_use]
pub fn verdict(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Spinner shown while a command waits on the guest.
#[must_use]
pub fn wait_spinner(app: &AppContext, msg: &str) -> ProgressBar {
    progress::maybe_spinner(app.output.show_progress(), msg)
}

/// Close a wait spinner with the verdict.
pub fn finish_spinner(pb: &ProgressBar, ok: bool, msg: &str) {
    if ok {
        progress::finish_ok(pb, msg);
    } else {
        progress::finish_error(pb, msg);
    }
}
