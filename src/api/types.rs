//! Wire records returned by the upstream catalog API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{catalog::types::AccessPolicy, core::config::ServerDescriptor};

/// Server summary (name + integration display data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    /// Integration display name; defaults to the server name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ServerRecord {
    pub fn integration_name(&self) -> &str {
        self.integration.as_deref().unwrap_or(&self.name)
    }
}

/// Tool summary as listed upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Upstream-assigned id; when absent the canonical
    /// `serverName::toolName` form is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub server_id: String,
    #[serde(default)]
    pub input_schema: Value,
}

/// Per-tool resource: provider properties and the access policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResourceRecord {
    pub tool_id: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub policy: AccessPolicy,
}

/// Batched snapshot used by the catalog's bulk refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeSnapshot {
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
    #[serde(default)]
    pub clients: Vec<ServerDescriptor>,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
}

/// One search or recommendation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub tool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}
