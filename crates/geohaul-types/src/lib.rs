//! Shared data model for geohaul catalog extraction.

pub mod catalog;
pub mod error;
pub mod layer;

pub use catalog::{CatalogNode, LayerRef, NodeKind, ServiceEntry};
pub use error::{ExtractError, GatewayError};
pub use layer::{IdentifierSet, LayerDescriptor, LayerMeta, Window};
