//! Upstream catalog API boundary.
//!
//! The hub core talks to the catalog service only through [`CatalogApi`],
//! so tests (and alternative backends) substitute their own implementation.

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::HttpCatalogApi;
pub use types::{InitializeSnapshot, SearchHit, ServerRecord, ToolRecord, ToolResourceRecord};

use crate::{core::config::ServerDescriptor, error::HubResult};

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One batched snapshot of all servers, server clients, and tools.
    async fn initialize_snapshot(&self) -> HubResult<InitializeSnapshot>;

    async fn get_server(&self, server_id: &str) -> HubResult<ServerRecord>;

    /// The connection descriptor for a server.
    async fn get_server_client(&self, server_id: &str) -> HubResult<ServerDescriptor>;

    async fn list_tools(&self) -> HubResult<Vec<ToolRecord>>;

    async fn get_tool(&self, tool_id: &str) -> HubResult<ToolRecord>;

    /// Batched fetch of tool resources (properties + policy). One upstream
    /// call regardless of how many ids are passed.
    async fn get_tool_resources(&self, tool_ids: &[String])
        -> HubResult<Vec<ToolResourceRecord>>;

    async fn search_tools(&self, query: &str) -> HubResult<Vec<SearchHit>>;

    /// Curated recommendations for a goal; `None` when the upstream has no
    /// curated set, in which case callers fall back to search.
    async fn recommend_tools(&self, goal: &str) -> HubResult<Option<Vec<SearchHit>>>;
}
