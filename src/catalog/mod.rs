//! Tool catalog: TTL-cached tool metadata and lazy equipping.

pub mod store;
pub mod ttl;
pub mod types;

pub use store::{FilterOptions, ToolCatalog};
pub use ttl::TtlCache;
pub use types::{
    AccessPolicy, BasicToolDetails, EquippedTool, PolicyDecision, ToolDetails, ToolId,
};
