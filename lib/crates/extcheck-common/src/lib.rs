//! Shared schema of the guest agent extension status documents.
//!
//! `handler` covers the status file the extension handler writes under
//! `<extension dir>/status/`; `proxy` covers the proxy agent's own status
//! document that the handler embeds in a substatus message.

pub mod handler;
pub mod proxy;

pub use handler::{
    FormattedMessage, HandlerState, HandlerStatus, StatusDetail, StatusParseError, SubStatus,
    parse_status_file,
};
pub use proxy::{
    GuestProxyAgentAggregateStatus, ModuleState, OverallState, ProxyAgentDetailStatus,
    ProxyAgentStatus, ProxyConnectionSummary,
};
