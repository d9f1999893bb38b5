//! Catalog walk: expand a service catalog root into its queryable leaves.

use std::collections::HashSet;

use geohaul_types::catalog::{CatalogNode, NodeKind};
use geohaul_types::error::ExtractError;

use crate::gateway::Gateway;

/// Folders never walked, by convention (server-side utility services).
const EXCLUDED_FOLDERS: [&str; 1] = ["utilities"];

/// Walks the catalog tree depth-first in listing order.
pub struct CatalogWalker<'a> {
    gateway: &'a dyn Gateway,
    token: Option<&'a str>,
}

impl<'a> CatalogWalker<'a> {
    pub fn new(gateway: &'a dyn Gateway, token: Option<&'a str>) -> Self {
        Self { gateway, token }
    }

    /// Resolve `root` to the ordered list of queryable leaf endpoints.
    ///
    /// Any unreachable or malformed node fails the whole resolution; a
    /// node whose expansion revisits an already-expanded endpoint is a
    /// cycle and fails the same way.
    pub async fn leaves(&self, root: &str) -> Result<Vec<String>, ExtractError> {
        let mut stack = vec![root.trim_end_matches('/').to_string()];
        let mut visited: HashSet<String> = HashSet::new();
        let mut leaves = Vec::new();

        while let Some(url) = stack.pop() {
            if !visited.insert(url.clone()) {
                return Err(ExtractError::catalog(
                    url,
                    "expansion revisits an already-walked endpoint",
                ));
            }

            let node = self.fetch_node(&url).await?;
            let mut children: Vec<String> = Vec::new();

            for folder in &node.folders {
                if EXCLUDED_FOLDERS
                    .iter()
                    .any(|excluded| folder.eq_ignore_ascii_case(excluded))
                {
                    tracing::debug!(folder, "skipping excluded folder");
                    continue;
                }
                tracing::info!(folder, "searching folder");
                children.push(format!("{url}/{folder}"));
            }

            for service in &node.services {
                if service.is_queryable() {
                    children.push(service.canonical_url(&url));
                } else {
                    tracing::debug!(
                        name = service.name,
                        service_type = service.service_type,
                        "skipping non-queryable service"
                    );
                }
            }

            match node.kind() {
                NodeKind::LayerContainer => {
                    for layer in &node.layers {
                        if layer.is_group() {
                            // Group layers are not leaves; their children
                            // appear in the same flat layer listing.
                            continue;
                        }
                        children.push(format!("{url}/{id}", id = layer.id));
                    }
                }
                NodeKind::SubLayerContainer => {
                    // Sub-layer ids address siblings of this node: the id
                    // replaces the parent's last path segment.
                    let parent = url.rsplit_once('/').map_or(url.as_str(), |(head, _)| head);
                    for layer in &node.sub_layers {
                        children.push(format!("{parent}/{id}", id = layer.id));
                    }
                }
                NodeKind::Leaf => {
                    leaves.push(url.clone());
                }
                NodeKind::Group | NodeKind::Raster => {
                    tracing::debug!(endpoint = url, "organizational layer, not a leaf");
                }
                NodeKind::Listing => {}
                NodeKind::Opaque => {
                    tracing::debug!(endpoint = url, "node exposes nothing queryable");
                }
            }

            // Reverse so the stack pops children in listing order.
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }

        tracing::info!(count = leaves.len(), "catalog resolved to leaf layers");
        Ok(leaves)
    }

    async fn fetch_node(&self, url: &str) -> Result<CatalogNode, ExtractError> {
        let mut params = vec![("f".to_string(), "json".to_string())];
        if let Some(token) = self.token {
            params.push(("token".to_string(), token.to_string()));
        }
        let body = self
            .gateway
            .get_json(url, &params)
            .await
            .map_err(|err| ExtractError::catalog(url, err.to_string()))?;
        serde_json::from_value(body).map_err(|err| ExtractError::catalog(url, err.to_string()))
    }
}
