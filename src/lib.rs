//! Uniform connection, session, and tool-catalog management for remote tool
//! servers.
//!
//! A caller discovers tools through the [`catalog::ToolCatalog`] (three
//! TTL caches over the upstream catalog API), then equips a tool: the
//! catalog asks the [`core::ConnectionManager`] for the server's connection,
//! which asks the [`core::SessionManager`] for the live session, which
//! selects and connects a transport if none exists yet. The resulting
//! [`handle::SafeToolHandle`] never throws from invocation; failures come
//! back as result values.
//!
//! ## Modules
//!
//! - [`core`]: descriptors, transport selection, sessions, connections
//! - [`catalog`]: TTL-cached tool metadata, search, recommend, equip
//! - [`api`]: upstream catalog API boundary
//! - [`handle`]: exception-safe tool invocation
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use toolhub::{
//!     api::HttpCatalogApi,
//!     catalog::ToolCatalog,
//!     core::{default_factories, ConnectionManager, HubConfig, RmcpConnector, SessionManager},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubConfig::default().with_env_proxy();
//!
//! let sessions = Arc::new(SessionManager::new(
//!     Arc::new(RmcpConnector::new(config.proxy.clone())),
//!     config.session.clone(),
//! ));
//! let connections = Arc::new(ConnectionManager::new(default_factories(), sessions));
//! let api = Arc::new(HttpCatalogApi::new("https://api.example.com", None)?);
//! let catalog = ToolCatalog::new(api, connections, &config.cache);
//!
//! catalog.refresh().await;
//! let details = catalog.get("github::create_issue").await?;
//! let equipped = catalog.equip(&details).await?;
//! let outcome = equipped
//!     .handle
//!     .call(serde_json::json!({ "query": "hello" }))
//!     .await;
//! assert!(!outcome.is_error);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod error;
pub mod handle;

pub use api::{CatalogApi, HttpCatalogApi};
pub use catalog::{
    AccessPolicy, BasicToolDetails, EquippedTool, FilterOptions, ToolCatalog, ToolDetails, ToolId,
};
pub use crate::core::{
    default_factories, ClientKind, ClientSession, Connection, ConnectionManager, HubConfig,
    HubMetrics, RmcpConnector, ServerDescriptor, SessionManager, SessionState, ToolHandle,
    ToolOutput,
};
pub use error::{HubError, HubResult};
pub use handle::{SafeToolHandle, ToolCallOutcome};
