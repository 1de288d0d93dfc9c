//! Validation report written at the end of a run.

use serde::Serialize;

use crate::domain::poll::{PollOutcome, PollResult};

/// Validation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    LocateExtension,
    ExtensionStatus,
    HelperPackage,
    CompanionProcess,
    Reinstall,
}

impl Step {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LocateExtension => "locate extension directory",
            Self::ExtensionStatus => "extension status",
            Self::HelperPackage => "helper package",
            Self::CompanionProcess => "companion process",
            Self::Reinstall => "reinstall",
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: Step,
    pub succeeded: bool,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub detail: String,
}

impl StepReport {
    /// Report a polled step; `succeeded` may be stricter than the poll outcome.
    pub fn from_poll<T>(step: Step, result: &PollResult<T>, succeeded: bool, detail: String) -> Self {
        let detail = match result.outcome {
            PollOutcome::Succeeded => detail,
            other => format!("{} after {} attempt(s): {detail}", other.as_str(), result.attempts),
        };
        Self {
            step,
            succeeded,
            attempts: result.attempts,
            elapsed_ms: u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            detail,
        }
    }

    #[must_use]
    pub fn skipped(step: Step, reason: &str) -> Self {
        Self {
            step,
            succeeded: false,
            attempts: 0,
            elapsed_ms: 0,
            detail: format!("skipped: {reason}"),
        }
    }
}

/// Everything a validation run found out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    pub os: Option<String>,
    pub extension_dir: Option<String>,
    pub extension_version: Option<String>,
    pub proxy_agent_version: Option<String>,
    pub process_ids: Vec<u32>,
    pub downloaded_bytes: Option<u64>,
    pub package_sha256: Option<String>,
    pub cancelled: bool,
    pub steps: Vec<StepReport>,
}

impl ValidationReport {
    #[must_use]
    pub fn new(timestamp: String) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// True when at least one step ran and every step succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.cancelled && !self.steps.is_empty() && self.steps.iter().all(|s| s.succeeded)
    }

    #[must_use]
    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// Serialize with the overall result included.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("succeeded".to_string(), self.succeeded().into());
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
