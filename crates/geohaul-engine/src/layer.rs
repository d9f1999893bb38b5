//! Leaf metadata resolution: layer JSON -> [`LayerDescriptor`].

use serde_json::Value;

use geohaul_types::error::ExtractError;
use geohaul_types::layer::{LayerDescriptor, LayerMeta, DEFAULT_OID_FIELD};

use crate::gateway::Gateway;

/// A resolved leaf plus the raw metadata body it was derived from.
///
/// The raw body is kept for the metadata sidecar and style export.
#[derive(Debug)]
pub struct LayerResolution {
    pub descriptor: LayerDescriptor,
    pub metadata: Value,
}

/// Fetch and resolve a leaf's metadata.
///
/// Returns `Ok(None)` for group and raster layers, which are skipped
/// without being queried. In strict mode a layer that does not advertise
/// JSON query output is a [`ExtractError::Capability`] failure.
pub async fn resolve_layer(
    gateway: &dyn Gateway,
    endpoint: &str,
    token: Option<&str>,
    strict_json: bool,
    cap_ceiling: u64,
) -> Result<Option<LayerResolution>, ExtractError> {
    let mut params = vec![("f".to_string(), "json".to_string())];
    if let Some(token) = token {
        params.push(("token".to_string(), token.to_string()));
    }
    let metadata = gateway
        .get_json(endpoint, &params)
        .await
        .map_err(|err| ExtractError::fetch(endpoint, 1, err.to_string()))?;

    let meta: LayerMeta = serde_json::from_value(metadata.clone())
        .map_err(|err| ExtractError::fetch(endpoint, 1, format!("unusable metadata: {err}")))?;

    if !meta.holds_rows() {
        tracing::debug!(
            endpoint,
            layer_type = meta.layer_type.as_deref().unwrap_or("unknown"),
            "layer holds no rows, skipping"
        );
        return Ok(None);
    }

    let supports_json = if strict_json {
        meta.supports_json().unwrap_or_else(|| {
            tracing::warn!(endpoint, "metadata lists no query formats");
            false
        })
    } else {
        true
    };
    if !supports_json {
        return Err(ExtractError::Capability {
            endpoint: endpoint.to_string(),
        });
    }

    let oid_field = match meta.declared_oid_field() {
        Some(field) => field.to_string(),
        None => {
            tracing::warn!(
                endpoint,
                fallback = DEFAULT_OID_FIELD,
                "no identifier field declared, using fallback"
            );
            DEFAULT_OID_FIELD.to_string()
        }
    };

    let advertised = meta.max_record_count.unwrap_or(cap_ceiling);
    let window_cap = if advertised > cap_ceiling {
        tracing::warn!(
            endpoint,
            advertised,
            ceiling = cap_ceiling,
            "advertised record cap exceeds the sanity ceiling, clamping"
        );
        cap_ceiling
    } else {
        advertised.max(1)
    };

    let id = meta.id.unwrap_or_default();
    let name = meta
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("layer_{id}"));

    Ok(Some(LayerResolution {
        descriptor: LayerDescriptor {
            endpoint: endpoint.to_string(),
            name,
            id,
            parent_id: meta.parent_layer.as_ref().map(|parent| parent.id),
            oid_field,
            window_cap,
            supports_json,
            row_count: None,
        },
        metadata,
    }))
}
