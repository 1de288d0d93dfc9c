use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proxy::{GuestProxyAgentAggregateStatus, ProxyAgentStatus};

/// Substatus carrying the proxy agent status document.
pub const PROXY_AGENT_STATUS_SUBSTATUS: &str = "ProxyAgentStatus";

/// Errors produced while decoding a handler status file.
#[derive(Debug, Error)]
pub enum StatusParseError {
    #[error("status file is empty")]
    Empty,

    #[error("status file contains no status entries")]
    NoEntries,

    #[error("invalid status JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handler state as reported in `status.status`.
///
/// Unknown values are kept verbatim so they can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HandlerState {
    Transitioning,
    Success,
    Warning,
    Error,
    Other(String),
}

impl HandlerState {
    /// Whether the handler has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Transitioning => "transitioning",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for HandlerState {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "transitioning" => Self::Transitioning,
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<HandlerState> for String {
    fn from(value: HandlerState) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for HandlerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Localized message attached to a status or substatus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub message: String,
}

/// One substatus entry reported by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStatus {
    pub name: String,
    pub status: HandlerState,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub formatted_message: FormattedMessage,
}

/// The `status` object of a handler status entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operation: String,
    pub status: HandlerState,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub formatted_message: FormattedMessage,
    #[serde(default)]
    pub substatus: Vec<SubStatus>,
}

/// One entry of the handler status array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerStatus {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "timestampUTC", default)]
    pub timestamp_utc: String,
    pub status: StatusDetail,
}

impl HandlerStatus {
    /// Proxy agent status embedded in the `ProxyAgentStatus` substatus.
    ///
    /// The message is either a bare `ProxyAgentStatus` document or a full
    /// aggregate status; both shapes are accepted.
    #[must_use]
    pub fn proxy_agent_status(&self) -> Option<ProxyAgentStatus> {
        let sub = self
            .status
            .substatus
            .iter()
            .find(|s| s.name == PROXY_AGENT_STATUS_SUBSTATUS)?;
        let message = sub.formatted_message.message.as_str();
        serde_json::from_str::<ProxyAgentStatus>(message)
            .ok()
            .or_else(|| {
                serde_json::from_str::<GuestProxyAgentAggregateStatus>(message)
                    .ok()
                    .map(|agg| agg.proxy_agent_status)
            })
    }
}

/// Parse a handler status file and return its first entry.
///
/// # Errors
///
/// Returns an error if the content is blank, not valid JSON, or an empty array.
pub fn parse_status_file(content: &str) -> Result<HandlerStatus, StatusParseError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(StatusParseError::Empty);
    }
    let entries: Vec<HandlerStatus> = serde_json::from_str(trimmed)?;
    entries.into_iter().next().ok_or(StatusParseError::NoEntries)
}
