//! Catalog listing wire types and node classification.
//!
//! A catalog endpoint answers `?f=json` with some combination of `folders`,
//! `services`, `layers`, and `subLayers` keys; which keys are present
//! determines how the node is expanded. [`CatalogNode`] deserializes any of
//! these shapes and [`CatalogNode::kind`] classifies the result.

use serde::{Deserialize, Serialize};

/// Service types that expose queryable layers.
const QUERYABLE_SERVICE_TYPES: [&str; 2] = ["MapServer", "FeatureServer"];

/// One service entry from a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

impl ServiceEntry {
    /// Whether this service type can be walked for queryable layers.
    pub fn is_queryable(&self) -> bool {
        QUERYABLE_SERVICE_TYPES.contains(&self.service_type.as_str())
    }

    /// Canonical URL of this service under `endpoint`.
    ///
    /// Service names under a folder come back qualified (`folder/name`);
    /// when `endpoint` already ends with that folder the qualifier is
    /// dropped so the path segment is not doubled.
    pub fn canonical_url(&self, endpoint: &str) -> String {
        if let Some((folder, short_name)) = self.name.split_once('/') {
            if endpoint.ends_with(folder) {
                return format!("{}/{}/{}", endpoint, short_name, self.service_type);
            }
        }
        format!("{}/{}/{}", endpoint, self.name, self.service_type)
    }
}

/// One layer entry inside a `layers` or `subLayers` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Present and non-empty on group layers.
    #[serde(default)]
    pub sub_layer_ids: Option<Vec<i64>>,
}

impl LayerRef {
    /// Group layers carry child ids and are never directly queryable.
    pub fn is_group(&self) -> bool {
        self.sub_layer_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }
}

/// Classification of a fetched catalog node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Folder/service listing.
    Listing,
    /// Has a `layers` array; children are addressed by appending their id.
    LayerContainer,
    /// Has a `subLayers` array; children replace the parent's last path
    /// segment.
    SubLayerContainer,
    /// Organizational group layer, never queryable.
    Group,
    /// Raster layer, never queryable.
    Raster,
    /// Directly queryable layer or table.
    Leaf,
    /// No recognizable keys; nothing to expand or emit.
    Opaque,
}

/// One node of the service catalog, in whichever shape the server returned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogNode {
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub layers: Vec<LayerRef>,
    #[serde(default)]
    pub sub_layers: Vec<LayerRef>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
}

impl CatalogNode {
    pub fn kind(&self) -> NodeKind {
        if !self.folders.is_empty() || !self.services.is_empty() {
            NodeKind::Listing
        } else if !self.layers.is_empty() {
            NodeKind::LayerContainer
        } else if !self.sub_layers.is_empty() {
            NodeKind::SubLayerContainer
        } else {
            match self.node_type.as_deref() {
                Some("Group Layer") => NodeKind::Group,
                Some("Raster Layer") => NodeKind::Raster,
                Some(_) => NodeKind::Leaf,
                None => NodeKind::Opaque,
            }
        }
    }
}
