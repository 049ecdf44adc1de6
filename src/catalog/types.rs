//! Catalog data model: tool identities, details, and equipped tools.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    core::{
        config::ServerDescriptor, connection::ToolHandle,
        connection_manager::ConnectionManager, metrics::HubMetrics,
    },
    error::HubResult,
    handle::SafeToolHandle,
};

/// Canonical tool identity: `serverName::toolName`. Used whenever the
/// upstream API has not assigned its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolId {
    pub server_name: String,
    pub tool_name: String,
}

impl ToolId {
    pub fn new(server_name: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            tool_name: tool_name.into(),
        }
    }

    /// Parse from `server::tool` format.
    pub fn parse(s: &str) -> Option<Self> {
        let (server, tool) = s.split_once("::")?;
        if server.is_empty() || tool.is_empty() {
            return None;
        }
        Some(Self::new(server, tool))
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.server_name, self.tool_name)
    }
}

/// Access decision attached to a tool by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    #[default]
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccessPolicy {
    #[serde(default)]
    pub decision: PolicyDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessPolicy {
    pub fn is_allowed(&self) -> bool {
        self.decision == PolicyDecision::Allow
    }
}

/// TTL-cached tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicToolDetails {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub server_id: String,
    /// Provider display name, resolved through the server-name cache.
    pub integration: String,
    pub input_schema: Value,
}

/// Full tool details. Never cached: `equip` binds to a live connection, so
/// the binding is recomputed on every use.
#[derive(Debug, Clone)]
pub struct ToolDetails {
    pub basic: BasicToolDetails,
    pub properties: Value,
    pub policy: AccessPolicy,
    /// Descriptor used to reach the owning server when equipping.
    pub server_client: ServerDescriptor,
}

impl ToolDetails {
    pub fn tool_id(&self) -> &str {
        &self.basic.id
    }

    /// Bind these details to a live connection, producing an invocable tool.
    pub async fn equip(&self, connections: &ConnectionManager) -> HubResult<EquippedTool> {
        self.equip_inner(connections, None).await
    }

    pub(crate) async fn equip_inner(
        &self,
        connections: &ConnectionManager,
        metrics: Option<Arc<HubMetrics>>,
    ) -> HubResult<EquippedTool> {
        let connection = connections.connect(&self.server_client).await?;
        let handle = ToolHandle::bind(
            connection,
            &self.basic.server_id,
            &self.basic.name,
            &self.basic.input_schema,
        )?;
        let mut safe = SafeToolHandle::new(handle);
        if let Some(metrics) = metrics {
            safe = safe.with_metrics(metrics);
        }
        Ok(EquippedTool {
            details: self.clone(),
            handle: safe,
        })
    }
}

/// Tool details bound to a live connection.
pub struct EquippedTool {
    pub details: ToolDetails,
    pub handle: SafeToolHandle,
}
