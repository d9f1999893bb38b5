//! Layer metadata, resolved descriptors, and the identifier-window model.

use serde::{Deserialize, Serialize};

/// Field type marker the service uses for the row identifier.
pub const OID_FIELD_TYPE: &str = "esriFieldTypeOID";

/// Identifier field assumed when the layer metadata does not name one.
pub const DEFAULT_OID_FIELD: &str = "OBJECTID";

/// One field entry from layer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Reference to the enclosing group layer, when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Layer metadata as served at `<layer endpoint>?f=json`.
///
/// Only the keys the extraction pipeline consults are modelled; the raw
/// body is carried alongside for the metadata sidecar.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMeta {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldMeta>>,
    #[serde(default)]
    pub max_record_count: Option<u64>,
    #[serde(default)]
    pub supported_query_formats: Option<String>,
    #[serde(default)]
    pub drawing_info: Option<serde_json::Value>,
    #[serde(default)]
    pub parent_layer: Option<ParentRef>,
}

impl LayerMeta {
    /// Group and raster layers hold no rows of their own.
    pub fn holds_rows(&self) -> bool {
        !matches!(
            self.layer_type.as_deref(),
            Some("Group Layer") | Some("Raster Layer")
        )
    }

    /// The identifier field named by the field list, if any.
    pub fn declared_oid_field(&self) -> Option<&str> {
        self.fields
            .as_deref()?
            .iter()
            .find(|field| field.field_type == OID_FIELD_TYPE)
            .map(|field| field.name.as_str())
    }

    /// Whether the advertised query formats include JSON.
    ///
    /// `None` when the metadata does not list formats at all.
    pub fn supports_json(&self) -> Option<bool> {
        self.supported_query_formats
            .as_deref()
            .map(|formats| formats.split(',').any(|format| format.trim() == "JSON"))
    }
}

/// Resolved description of one queryable leaf layer.
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    pub endpoint: String,
    /// Human-readable service name, before sanitization.
    pub name: String,
    pub id: i64,
    pub parent_id: Option<i64>,
    /// Field used for identifier-range windowing.
    pub oid_field: String,
    /// Per-request row cap, already clamped to the sanity ceiling.
    pub window_cap: u64,
    pub supports_json: bool,
    /// Row count reported by the service for the active filter.
    pub row_count: Option<u64>,
}

/// Sorted, deduplicated row identifiers for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentifierSet {
    ids: Vec<i64>,
}

impl IdentifierSet {
    pub fn new(mut ids: Vec<i64>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.ids
    }
}

/// A contiguous, closed identifier range fetched in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub lower: i64,
    pub upper: i64,
}

impl Window {
    /// Closed-range predicate over the identifier field.
    pub fn predicate(&self, oid_field: &str) -> String {
        format!(
            "{oid} >= {lower} AND {oid} <= {upper}",
            oid = oid_field,
            lower = self.lower,
            upper = self.upper
        )
    }
}
