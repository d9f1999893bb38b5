//! Row queries: count, identifier discovery, and windowed page fetches.
//!
//! Window fetches carry the retry budget; discovery queries are single-shot.

use std::time::Duration;

use serde_json::Value;

use geohaul_types::error::ExtractError;
use geohaul_types::layer::{IdentifierSet, LayerDescriptor, Window};

use crate::gateway::Gateway;

/// One fetched window: the raw feature-collection body plus its row count.
#[derive(Debug)]
pub struct WindowPage {
    pub body: Value,
    pub rows: u64,
}

/// Issues row queries against leaf layers with bounded retry.
pub struct FetchExecutor<'a> {
    gateway: &'a dyn Gateway,
    token: Option<String>,
    max_tries: u32,
    retry_wait: Duration,
}

impl<'a> FetchExecutor<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        token: Option<String>,
        max_tries: u32,
        retry_wait: Duration,
    ) -> Self {
        Self {
            gateway,
            token,
            max_tries: max_tries.max(1),
            retry_wait,
        }
    }

    fn base_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("f".to_string(), "json".to_string())];
        if let Some(token) = &self.token {
            params.push(("token".to_string(), token.clone()));
        }
        params
    }

    /// Row count for the active filter, single-shot.
    pub async fn row_count(
        &self,
        endpoint: &str,
        filter: Option<&str>,
    ) -> Result<u64, ExtractError> {
        let url = query_url(endpoint);
        let mut params = self.base_params();
        params.push(("where".to_string(), filter.unwrap_or("1=1").to_string()));
        params.push(("returnCountOnly".to_string(), "true".to_string()));

        let body = self
            .gateway
            .get_json(&url, &params)
            .await
            .map_err(|err| ExtractError::fetch(&url, 1, err.to_string()))?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ExtractError::fetch(&url, 1, "response carries no count"))
    }

    /// Every row identifier matching the active filter, single-shot.
    pub async fn identifiers(
        &self,
        endpoint: &str,
        oid_field: &str,
        filter: Option<&str>,
    ) -> Result<IdentifierSet, ExtractError> {
        let url = query_url(endpoint);
        let mut params = self.base_params();
        let predicate = match filter {
            Some(filter) => filter.to_string(),
            None => format!("{oid_field} > 0"),
        };
        params.push(("where".to_string(), predicate));
        params.push(("returnIdsOnly".to_string(), "true".to_string()));

        let body = self
            .gateway
            .get_json(&url, &params)
            .await
            .map_err(|err| ExtractError::fetch(&url, 1, err.to_string()))?;
        let ids = body
            .get("objectIds")
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractError::fetch(&url, 1, "response carries no identifier list"))?
            .iter()
            .filter_map(Value::as_i64)
            .collect();
        Ok(IdentifierSet::new(ids))
    }

    /// Fetch one window of rows, with attributes and geometry, retrying up
    /// to the configured attempt cap.
    pub async fn window_page(
        &self,
        layer: &LayerDescriptor,
        window: Window,
        filter: Option<&str>,
    ) -> Result<WindowPage, ExtractError> {
        let url = query_url(&layer.endpoint);
        let range = window.predicate(&layer.oid_field);
        let predicate = match filter {
            Some(filter) => format!("{filter} AND {range}"),
            None => range,
        };
        let mut params = self.base_params();
        params.push(("where".to_string(), predicate));
        params.push(("outFields".to_string(), "*".to_string()));
        params.push(("returnGeometry".to_string(), "true".to_string()));

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let (reason, reset) = match self.gateway.get_json(&url, &params).await {
                Ok(body) => {
                    let rows = body
                        .get("features")
                        .and_then(Value::as_array)
                        .map(|features| features.len() as u64);
                    match rows {
                        Some(rows) => {
                            if rows == 0 {
                                // Rows can disappear between identifier
                                // discovery and the fetch.
                                tracing::warn!(
                                    url,
                                    lower = window.lower,
                                    upper = window.upper,
                                    "window returned no rows"
                                );
                            }
                            return Ok(WindowPage { body, rows });
                        }
                        None => ("response carries no feature array".to_string(), false),
                    }
                }
                Err(err) => {
                    let reset = err.is_connection_reset();
                    (err.to_string(), reset)
                }
            };

            if attempt >= self.max_tries {
                return Err(ExtractError::fetch(&url, attempt, reason));
            }
            if reset {
                // Forcibly closed connections get an extra pause before the
                // normal retry wait.
                tracing::warn!(url, "connection forcibly closed, pausing before retry");
                tokio::time::sleep(self.retry_wait).await;
            }
            tracing::warn!(
                url,
                attempt,
                max_tries = self.max_tries,
                wait_secs = self.retry_wait.as_secs(),
                reason,
                "window fetch failed, retrying"
            );
            tokio::time::sleep(self.retry_wait).await;
        }
    }
}

fn query_url(endpoint: &str) -> String {
    format!("{endpoint}/query")
}
