//! Transport selection and the protocol client seam.
//!
//! `select_transports` is a pure function from a server descriptor to the
//! priority-ordered list of candidate endpoints. The `ProtocolClient` and
//! `TransportConnector` traits are the injection points that let tests run
//! the whole session stack against fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    core::config::{CallToolResult, ServerDescriptor, ServerParams, Tool, TransportEndpoint},
    error::{HubError, HubResult},
};

/// Header carrying the provider API key on hosted-function fallbacks.
const API_KEY_HEADER: &str = "X-Api-Key";

/// One live, initialized protocol client bound to a single transport.
///
/// Implementations forward to the underlying wire client; the session layer
/// above owns liveness and idle reclamation.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Session id assigned by the remote peer on connect, if any.
    fn session_id(&self) -> Option<String>;

    async fn list_tools(&self) -> HubResult<Vec<Tool>>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> HubResult<CallToolResult>;

    async fn ping(&self) -> HubResult<()>;

    /// Close the underlying transport. Must be idempotent.
    async fn close(&self) -> HubResult<()>;
}

/// Factory turning one endpoint into a connected protocol client.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, endpoint: &TransportEndpoint) -> HubResult<Box<dyn ProtocolClient>>;
}

/// Derive the ordered candidate transports for a server descriptor.
///
/// Pure, no I/O. Ordering is priority order: provider-internal or direct
/// endpoints first, public fallbacks second, auth attached per endpoint.
/// Fails with a configuration error when the descriptor yields no usable
/// transport or lacks a required credential.
pub fn select_transports(descriptor: &ServerDescriptor) -> HubResult<Vec<TransportEndpoint>> {
    let endpoints = match &descriptor.params {
        ServerParams::Mcp { endpoints } => endpoints.clone(),

        ServerParams::Faas {
            function_name,
            internal_url,
            public_url,
            api_key,
        } => {
            let key = api_key.as_ref().ok_or_else(|| {
                HubError::Configuration(format!(
                    "function '{}' is missing an API key",
                    function_name
                ))
            })?;

            let mut endpoints = Vec::new();
            // Internal gateway speaks streamable HTTP with the key as bearer.
            if let Some(url) = internal_url {
                endpoints.push(TransportEndpoint::Streamable {
                    url: url.clone(),
                    token: Some(key.clone()),
                    headers: HashMap::new(),
                });
            }
            // Public edge expects the key in a header, over SSE.
            if let Some(url) = public_url {
                let mut headers = HashMap::new();
                headers.insert(API_KEY_HEADER.to_string(), key.clone());
                endpoints.push(TransportEndpoint::Sse {
                    url: url.clone(),
                    token: None,
                    headers,
                });
            }
            endpoints
        }

        ServerParams::Deployment { url, token } => {
            // A pre-signed URL carries its own credential; otherwise bearer.
            vec![TransportEndpoint::Streamable {
                url: url.clone(),
                token: token.clone(),
                headers: HashMap::new(),
            }]
        }

        ServerParams::Managed { provider, .. } => {
            return Err(HubError::Configuration(format!(
                "managed provider '{}' does not use selectable transports",
                provider
            )));
        }
    };

    if endpoints.is_empty() {
        return Err(HubError::Configuration(format!(
            "no transport available for server '{}'",
            descriptor.name
        )));
    }

    Ok(endpoints)
}
