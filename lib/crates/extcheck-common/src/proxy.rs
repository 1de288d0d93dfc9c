//! Status documents produced by the proxy agent itself.

use serde::{Deserialize, Serialize};

/// Run state of one proxy agent module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModuleState {
    #[default]
    Unknown,
    Running,
    Stopped,
}

/// Overall proxy agent health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallState {
    Success,
    Error,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAgentDetailStatus {
    #[serde(default)]
    pub status: ModuleState,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<std::collections::HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyAgentStatus {
    pub version: String,
    #[serde(default)]
    pub status: OverallState,
    #[serde(default)]
    pub monitor_status: ProxyAgentDetailStatus,
    #[serde(default)]
    pub key_latch_status: ProxyAgentDetailStatus,
    #[serde(default)]
    pub ebpf_program_status: ProxyAgentDetailStatus,
    #[serde(default)]
    pub proxy_listener_status: ProxyAgentDetailStatus,
    #[serde(default)]
    pub telemetry_logger_status: ProxyAgentDetailStatus,
    #[serde(default)]
    pub proxy_connections_count: u64,
}

impl ProxyAgentStatus {
    /// Modules that are not reported as running, by name.
    #[must_use]
    pub fn stopped_modules(&self) -> Vec<&'static str> {
        [
            ("monitor", &self.monitor_status),
            ("keyLatch", &self.key_latch_status),
            ("ebpfProgram", &self.ebpf_program_status),
            ("proxyListener", &self.proxy_listener_status),
            ("telemetryLogger", &self.telemetry_logger_status),
        ]
        .into_iter()
        .filter(|(_, detail)| detail.status != ModuleState::Running)
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConnectionSummary {
    pub user_name: String,
    pub ip: String,
    pub port: u16,
    pub process_cmd_line: String,
    pub response_status: String,
    pub count: u64,
    #[serde(default)]
    pub user_groups: Option<Vec<String>>,
    #[serde(default)]
    pub process_full_path: Option<String>,
}

/// Aggregate status file written by the proxy agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestProxyAgentAggregateStatus {
    pub timestamp: String,
    pub proxy_agent_status: ProxyAgentStatus,
    #[serde(default)]
    pub proxy_connection_summary: Vec<ProxyConnectionSummary>,
    #[serde(default)]
    pub failed_authenticate_summary: Vec<ProxyConnectionSummary>,
}
