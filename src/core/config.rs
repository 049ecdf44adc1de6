//! Configuration types: server descriptors, transport endpoints, tunables.

use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    time::Duration,
};

pub use rmcp::model::{CallToolResult, Tool};
use serde::{Deserialize, Serialize};

/// Provider kind of a tool server (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    /// Native tool-server protocol, endpoints described directly.
    Mcp,
    /// Hosted function runtime: internal gateway first, public fallback.
    Faas,
    /// Dedicated deployment reachable at one URL.
    Deployment,
    /// Provider SDK client that performs its own tool resolution.
    Managed,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientKind::Mcp => "mcp",
            ClientKind::Faas => "faas",
            ClientKind::Deployment => "deployment",
            ClientKind::Managed => "managed",
        };
        f.write_str(s)
    }
}

/// Immutable description of one remote tool server, as returned by the
/// upstream catalog API. Identifies the server and carries the
/// provider-specific parameters needed to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Opaque stable identifier. May be empty for ad-hoc servers, in which
    /// case a content hash is used as the cache key.
    #[serde(default)]
    pub server_id: String,

    /// Human-readable server name (also the integration display name prefix).
    pub name: String,

    #[serde(flatten)]
    pub params: ServerParams,
}

impl ServerDescriptor {
    pub fn kind(&self) -> ClientKind {
        self.params.kind()
    }

    /// Stable cache key: the server id, or a content hash when no id was
    /// assigned upstream.
    pub fn cache_key(&self) -> String {
        if !self.server_id.is_empty() {
            return self.server_id.clone();
        }
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.params.identity().hash(&mut hasher);
        format!("anon-{:016x}", hasher.finish())
    }
}

/// Provider-specific connection parameters, tagged by client kind.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "client_type", rename_all = "snake_case")]
pub enum ServerParams {
    Mcp {
        endpoints: Vec<TransportEndpoint>,
    },
    Faas {
        function_name: String,
        /// Provider-internal gateway URL, preferred when present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        internal_url: Option<String>,
        /// Public URL, used as fallback.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    Deployment {
        /// Deployment URL; may be pre-signed, in which case no token is set.
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Managed {
        provider: String,
        /// Invocation endpoint of the provider's own client API.
        invoke_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

impl ServerParams {
    pub fn kind(&self) -> ClientKind {
        match self {
            ServerParams::Mcp { .. } => ClientKind::Mcp,
            ServerParams::Faas { .. } => ClientKind::Faas,
            ServerParams::Deployment { .. } => ClientKind::Deployment,
            ServerParams::Managed { .. } => ClientKind::Managed,
        }
    }

    /// Connection identity for hashing, excluding credentials.
    fn identity(&self) -> String {
        match self {
            ServerParams::Mcp { endpoints } => endpoints
                .iter()
                .map(TransportEndpoint::address)
                .collect::<Vec<_>>()
                .join(","),
            ServerParams::Faas {
                function_name,
                internal_url,
                public_url,
                ..
            } => format!(
                "{}:{}:{}",
                function_name,
                internal_url.as_deref().unwrap_or(""),
                public_url.as_deref().unwrap_or("")
            ),
            ServerParams::Deployment { url, .. } => url.clone(),
            ServerParams::Managed {
                provider,
                invoke_url,
                ..
            } => format!("{}:{}", provider, invoke_url),
        }
    }
}

impl fmt::Debug for ServerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerParams::Mcp { endpoints } => {
                f.debug_struct("Mcp").field("endpoints", endpoints).finish()
            }
            ServerParams::Faas {
                function_name,
                internal_url,
                public_url,
                api_key,
            } => f
                .debug_struct("Faas")
                .field("function_name", function_name)
                .field("internal_url", internal_url)
                .field("public_url", public_url)
                .field("api_key", &api_key.as_ref().map(|_| "****"))
                .finish(),
            ServerParams::Deployment { url, token } => f
                .debug_struct("Deployment")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "****"))
                .finish(),
            ServerParams::Managed {
                provider,
                invoke_url,
                api_key,
            } => f
                .debug_struct("Managed")
                .field("provider", provider)
                .field("invoke_url", invoke_url)
                .field("api_key", &api_key.as_ref().map(|_| "****"))
                .finish(),
        }
    }
}

/// One concrete wire-level channel to a tool server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum TransportEndpoint {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        envs: HashMap<String, String>,
    },
    Sse {
        url: String,
        /// Bearer token for the Authorization header.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        /// Additional headers (e.g. X-Api-Key).
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
    Streamable {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
}

impl TransportEndpoint {
    /// Credential-free address, for logs and hashing.
    pub fn address(&self) -> String {
        match self {
            TransportEndpoint::Stdio { command, args, .. } => {
                format!("stdio:{} {}", command, args.join(" "))
            }
            TransportEndpoint::Sse { url, .. } => format!("sse:{}", url),
            TransportEndpoint::Streamable { url, .. } => format!("streamable:{}", url),
        }
    }
}

impl fmt::Debug for TransportEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportEndpoint::Stdio {
                command,
                args,
                envs,
            } => f
                .debug_struct("Stdio")
                .field("command", command)
                .field("args", args)
                .field("envs", &format!("{} vars", envs.len()))
                .finish(),
            TransportEndpoint::Sse {
                url,
                token,
                headers,
            } => f
                .debug_struct("Sse")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "****"))
                .field("headers", &format!("{} headers", headers.len()))
                .finish(),
            TransportEndpoint::Streamable {
                url,
                token,
                headers,
            } => f
                .debug_struct("Streamable")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "****"))
                .field("headers", &format!("{} headers", headers.len()))
                .finish(),
        }
    }
}

/// HTTP proxy configuration for network transports (does not affect the
/// upstream catalog API client).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
    /// Comma-separated hosts to exclude, e.g. "localhost,10.*".
    pub no_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Load proxy config from standard environment variables.
    pub fn from_env() -> Option<Self> {
        let http = std::env::var("HUB_HTTP_PROXY")
            .ok()
            .or_else(|| std::env::var("HTTP_PROXY").ok());

        let https = std::env::var("HUB_HTTPS_PROXY")
            .ok()
            .or_else(|| std::env::var("HTTPS_PROXY").ok());

        let no_proxy = std::env::var("HUB_NO_PROXY")
            .ok()
            .or_else(|| std::env::var("NO_PROXY").ok());

        if http.is_some() || https.is_some() {
            Some(Self {
                http,
                https,
                no_proxy,
                username: None,
                password: None,
            })
        } else {
            None
        }
    }
}

/// Per-session tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Idle timeout (milliseconds) before a connected session auto-closes.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

/// TTLs for the catalog caches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Server display names (seconds).
    #[serde(default = "default_server_ttl")]
    pub server_name_ttl_secs: u64,

    /// Server client descriptors (seconds).
    #[serde(default = "default_server_ttl")]
    pub server_client_ttl_secs: u64,

    /// Basic tool details (seconds).
    #[serde(default = "default_tool_ttl")]
    pub tool_details_ttl_secs: u64,
}

impl CacheConfig {
    pub fn server_name_ttl(&self) -> Duration {
        Duration::from_secs(self.server_name_ttl_secs)
    }

    pub fn server_client_ttl(&self) -> Duration {
        Duration::from_secs(self.server_client_ttl_secs)
    }

    pub fn tool_details_ttl(&self) -> Duration {
        Duration::from_secs(self.tool_details_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            server_name_ttl_secs: default_server_ttl(),
            server_client_ttl_secs: default_server_ttl(),
            tool_details_ttl_secs: default_tool_ttl(),
        }
    }
}

/// Top-level hub configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HubConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Global proxy for network transports; overridable per endpoint source.
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Base URL of the upstream catalog API.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl HubConfig {
    /// Load configuration from a YAML file.
    pub async fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with environment-based proxy config.
    pub fn with_env_proxy(mut self) -> Self {
        if self.proxy.is_none() {
            self.proxy = ProxyConfig::from_env();
        }
        self
    }
}

// Default value functions

fn default_idle_timeout_ms() -> u64 {
    5000
}

fn default_server_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_tool_ttl() -> u64 {
    3600 // 1 hour
}
