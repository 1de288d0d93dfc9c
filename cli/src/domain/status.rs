//! Evaluation of the extension handler status file.

use extcheck_common::{HandlerState, OverallState, parse_status_file};

/// The parts of a handler status the validator reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    /// Status file the summary was read from.
    pub file: String,
    pub state: HandlerState,
    pub operation: String,
    pub code: i64,
    pub message: String,
    pub proxy_agent_version: Option<String>,
    pub proxy_agent_state: Option<OverallState>,
    /// Proxy agent modules not reported as running.
    pub stopped_modules: Vec<&'static str>,
}

/// One observation of the extension status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusObservation {
    /// No status file written yet.
    Missing,
    /// A status file exists but could not be read or parsed.
    Unreadable(String),
    /// The handler is still working (`transitioning`, `warning`, or unknown).
    Pending(StatusSummary),
    Succeeded(StatusSummary),
    Failed(StatusSummary),
}

impl StatusObservation {
    /// Classify the content of status file `file`.
    #[must_use]
    pub fn from_content(file: &str, content: &str) -> Self {
        let status = match parse_status_file(content) {
            Ok(s) => s,
            Err(e) => return Self::Unreadable(format!("{file}: {e}")),
        };
        let agent = status.proxy_agent_status();
        let summary = StatusSummary {
            file: file.to_string(),
            state: status.status.status.clone(),
            operation: status.status.operation.clone(),
            code: status.status.code,
            message: status.status.formatted_message.message.clone(),
            proxy_agent_version: agent.as_ref().map(|a| a.version.clone()),
            proxy_agent_state: agent.as_ref().map(|a| a.status),
            stopped_modules: agent.as_ref().map(|a| a.stopped_modules()).unwrap_or_default(),
        };
        match summary.state {
            HandlerState::Success => Self::Succeeded(summary),
            HandlerState::Error => Self::Failed(summary),
            _ => Self::Pending(summary),
        }
    }

    /// Whether polling can stop: the handler reached success or error.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    #[must_use]
    pub fn summary(&self) -> Option<&StatusSummary> {
        match self {
            Self::Pending(s) | Self::Succeeded(s) | Self::Failed(s) => Some(s),
            Self::Missing | Self::Unreadable(_) => None,
        }
    }

    /// One-line description for progress output and reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Missing => "no status file yet".to_string(),
            Self::Unreadable(reason) => format!("unreadable status: {reason}"),
            Self::Pending(s) | Self::Succeeded(s) | Self::Failed(s) => {
                let mut line = format!("{} ({} code {})", s.state, s.file, s.code);
                if !s.message.is_empty() {
                    line.push_str(": ");
                    line.push_str(&s.message);
                }
                line
            }
        }
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
