//! Error types for the tool hub.
//!
//! Defines error variants for transport selection, session/connection
//! lifecycle, tool invocation, and the upstream catalog API boundary.

use thiserror::Error;

pub type HubResult<T> = Result<T, HubError>;

#[derive(Debug, Error)]
pub enum HubError {
    /// No usable transport could be derived from a server descriptor, or a
    /// required credential is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every candidate transport failed to connect, or an operation was
    /// attempted on a session that is not connected.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A tool was routed to a connection for a different server.
    #[error("Server mismatch: tool belongs to '{expected}' but connection is for '{actual}'")]
    ServerMismatch { expected: String, actual: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool input failed schema validation.
    #[error("Invalid tool input arguments: {0}")]
    InvalidArguments(String),

    /// The remote call itself failed, or a provider adapter misbehaved.
    #[error("Tool call failed: {0}")]
    ToolCall(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Failure from the upstream catalog API, carrying the HTTP status when
    /// one was received.
    #[error("Upstream API error{}: {message}", fmt_status(.status))]
    UpstreamApi {
        status: Option<u16>,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl HubError {
    /// True for invocation-time failures that the safe handle converts into
    /// result values; setup-time failures stay `false` and propagate.
    pub fn is_call_failure(&self) -> bool {
        matches!(
            self,
            HubError::InvalidArguments(_) | HubError::ToolCall(_) | HubError::Unsupported(_)
        )
    }

    pub(crate) fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        HubError::UpstreamApi {
            status,
            message: message.into(),
        }
    }
}
