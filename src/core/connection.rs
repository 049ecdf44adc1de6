//! Provider-aware connections and tool handles.
//!
//! A [`Connection`] adapts one server's session (or a provider's own client)
//! into a uniform call surface. [`ToolHandle::bind`] validates that a tool
//! belongs to the connection and compiles its input schema; the handle then
//! validates arguments on every call and normalizes results into
//! [`ToolOutput`]. Factories are plain values dispatched by [`ClientKind`],
//! injected into the connection manager so tests can substitute fakes.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    core::{
        config::{CallToolResult, ClientKind, ServerDescriptor, ServerParams},
        session::ClientSession,
        session_manager::SessionManager,
    },
    error::{HubError, HubResult},
};

/// Common result shape for tool invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Value,
    pub is_error: bool,
}

/// Uniform call surface over one tool server.
#[async_trait]
pub trait Connection: Send + Sync {
    fn server_id(&self) -> &str;

    /// One-time discovery so `has_tool` can fail fast before any call.
    async fn initialize(&self) -> HubResult<()>;

    /// True when the provider's client resolves tool names itself, making
    /// local discovery validation unnecessary.
    fn resolves_tools(&self) -> bool {
        false
    }

    fn has_tool(&self, name: &str) -> bool;

    async fn call_raw(
        &self,
        tool_name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<ToolOutput>;

    async fn close(&self);
}

/// Collapse protocol content into the common result shape: a single text
/// item becomes a plain string, anything else stays structured JSON.
pub(crate) fn normalize_result(result: &CallToolResult) -> Value {
    let content = serde_json::to_value(&result.content).unwrap_or(Value::Null);
    if let Value::Array(items) = &content {
        if items.len() == 1 {
            if let Some(text) = items[0].get("text").and_then(Value::as_str) {
                return Value::String(text.to_string());
            }
        }
    }
    content
}

/// Session-backed connection, shared by the Mcp, Faas, and Deployment kinds
/// (they speak the same wire protocol and differ only in transport
/// selection).
pub struct SessionConnection {
    server_id: String,
    session: Arc<ClientSession>,
    discovered: RwLock<HashSet<String>>,
}

impl SessionConnection {
    pub fn new(server_id: impl Into<String>, session: Arc<ClientSession>) -> Self {
        Self {
            server_id: server_id.into(),
            session,
            discovered: RwLock::new(HashSet::new()),
        }
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }
}

#[async_trait]
impl Connection for SessionConnection {
    fn server_id(&self) -> &str {
        &self.server_id
    }

    async fn initialize(&self) -> HubResult<()> {
        let tools = self.session.list_tools().await?;
        let names: HashSet<String> = tools.iter().map(|t| t.name.to_string()).collect();
        info!(
            "Discovered {} tool(s) on server '{}'",
            names.len(),
            self.server_id
        );
        *self.discovered.write() = names;
        Ok(())
    }

    fn has_tool(&self, name: &str) -> bool {
        self.discovered.read().contains(name)
    }

    async fn call_raw(
        &self,
        tool_name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<ToolOutput> {
        let result = self.session.call_tool(tool_name, arguments).await?;
        Ok(ToolOutput {
            content: normalize_result(&result),
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(&self) {
        self.session.close().await;
    }
}

/// Connection through a provider's own client API. The provider resolves
/// tool names itself, so no local discovery is performed.
pub struct ManagedConnection {
    server_id: String,
    provider: String,
    invoke_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl ManagedConnection {
    pub fn new(
        server_id: impl Into<String>,
        provider: impl Into<String>,
        invoke_url: impl Into<String>,
        api_key: Option<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            provider: provider.into(),
            invoke_url: invoke_url.into(),
            api_key,
            http,
        }
    }
}

#[async_trait]
impl Connection for ManagedConnection {
    fn server_id(&self) -> &str {
        &self.server_id
    }

    async fn initialize(&self) -> HubResult<()> {
        debug!(
            "Managed provider '{}' performs its own tool resolution",
            self.provider
        );
        Ok(())
    }

    fn resolves_tools(&self) -> bool {
        true
    }

    fn has_tool(&self, _name: &str) -> bool {
        true
    }

    async fn call_raw(
        &self,
        tool_name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<ToolOutput> {
        let url = format!("{}/tools/{}", self.invoke_url.trim_end_matches('/'), tool_name);
        let mut request = self
            .http
            .post(&url)
            .json(&arguments.map(Value::Object).unwrap_or(Value::Null));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HubError::ToolCall(format!("provider '{}': {}", self.provider, e)))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(HubError::ToolCall(format!(
                "provider '{}' returned {}: {}",
                self.provider, status, body
            )));
        }

        Ok(ToolOutput {
            content: body,
            is_error: false,
        })
    }

    async fn close(&self) {
        // Stateless HTTP client; nothing to tear down.
    }
}

/// One invocable tool, bound to a specific connection.
pub struct ToolHandle {
    connection: Arc<dyn Connection>,
    tool_name: String,
    validator: Option<jsonschema::Validator>,
}

impl std::fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandle")
            .field("server_id", &self.connection.server_id())
            .field("tool_name", &self.tool_name)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl ToolHandle {
    /// Bind a tool to a connection, validating ownership and discovery and
    /// compiling the input schema once.
    pub fn bind(
        connection: Arc<dyn Connection>,
        server_id: &str,
        tool_name: &str,
        input_schema: &Value,
    ) -> HubResult<Self> {
        if connection.server_id() != server_id {
            return Err(HubError::ServerMismatch {
                expected: server_id.to_string(),
                actual: connection.server_id().to_string(),
            });
        }

        if !connection.resolves_tools() && !connection.has_tool(tool_name) {
            return Err(HubError::ToolNotFound(tool_name.to_string()));
        }

        let validator = if input_schema.is_null() {
            None
        } else {
            Some(jsonschema::validator_for(input_schema).map_err(|e| {
                HubError::Configuration(format!("invalid input schema for '{}': {}", tool_name, e))
            })?)
        };

        Ok(Self {
            connection,
            tool_name: tool_name.to_string(),
            validator,
        })
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn server_id(&self) -> &str {
        self.connection.server_id()
    }

    /// Validate arguments against the tool's input schema and perform the
    /// remote call. Any failure past validation surfaces as a tool-call
    /// error rather than leaking transport details.
    pub async fn call(&self, args: Value) -> HubResult<ToolOutput> {
        let map = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(HubError::InvalidArguments(format!(
                    "expected a JSON object, got {}",
                    value_kind(&other)
                )))
            }
        };

        if let Some(validator) = &self.validator {
            validator
                .validate(&Value::Object(map.clone()))
                .map_err(|e| HubError::InvalidArguments(e.to_string()))?;
        }

        self.connection
            .call_raw(&self.tool_name, Some(map))
            .await
            .map_err(|e| match e {
                HubError::ToolCall(_) => e,
                other => HubError::ToolCall(other.to_string()),
            })
    }

    /// Synchronous invocation. No current provider transport supports it.
    pub fn call_sync(&self, _args: Value) -> HubResult<ToolOutput> {
        Err(HubError::Unsupported(
            "synchronous tool calls are not supported".to_string(),
        ))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Factory producing connections for one or more client kinds.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(
        &self,
        descriptor: &ServerDescriptor,
        sessions: &SessionManager,
    ) -> HubResult<Arc<dyn Connection>>;
}

/// Factory for the session-backed kinds (Mcp, Faas, Deployment).
pub struct SessionConnectionFactory;

#[async_trait]
impl ConnectionFactory for SessionConnectionFactory {
    async fn create(
        &self,
        descriptor: &ServerDescriptor,
        sessions: &SessionManager,
    ) -> HubResult<Arc<dyn Connection>> {
        let session = sessions.get_session(descriptor).await?;
        Ok(Arc::new(SessionConnection::new(
            descriptor.cache_key(),
            session,
        )))
    }
}

/// Factory for the managed provider kind.
pub struct ManagedConnectionFactory {
    http: reqwest::Client,
}

impl ManagedConnectionFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for ManagedConnectionFactory {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ConnectionFactory for ManagedConnectionFactory {
    async fn create(
        &self,
        descriptor: &ServerDescriptor,
        _sessions: &SessionManager,
    ) -> HubResult<Arc<dyn Connection>> {
        let ServerParams::Managed {
            provider,
            invoke_url,
            api_key,
        } = &descriptor.params
        else {
            warn!(
                "Managed factory received '{}' descriptor for '{}'",
                descriptor.kind(),
                descriptor.name
            );
            return Err(HubError::Configuration(format!(
                "descriptor '{}' is not a managed provider",
                descriptor.name
            )));
        };

        Ok(Arc::new(ManagedConnection::new(
            descriptor.cache_key(),
            provider.clone(),
            invoke_url.clone(),
            api_key.clone(),
            self.http.clone(),
        )))
    }
}

/// Default factory registry: session-backed connections for every kind that
/// selects transports, the managed client for the rest.
pub fn default_factories() -> std::collections::HashMap<ClientKind, Arc<dyn ConnectionFactory>> {
    let session_factory: Arc<dyn ConnectionFactory> = Arc::new(SessionConnectionFactory);
    let mut factories: std::collections::HashMap<ClientKind, Arc<dyn ConnectionFactory>> =
        std::collections::HashMap::new();
    factories.insert(ClientKind::Mcp, Arc::clone(&session_factory));
    factories.insert(ClientKind::Faas, Arc::clone(&session_factory));
    factories.insert(ClientKind::Deployment, session_factory);
    factories.insert(
        ClientKind::Managed,
        Arc::new(ManagedConnectionFactory::default()),
    );
    factories
}
