//! HTTP transport seam.
//!
//! All catalog, token, and row traffic goes through the [`Gateway`] trait so
//! tests can substitute an in-memory fake. [`HttpGateway`] is the production
//! implementation over `reqwest`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use geohaul_types::error::GatewayError;

/// Some servers answer differently for script clients; the reference
/// implementation always presented a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// JSON-over-HTTP exchanges with the catalog service.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// GET `url` with `params` as the query string, expecting a JSON body.
    async fn get_json(&self, url: &str, params: &[(String, String)])
        -> Result<Value, GatewayError>;

    /// POST `form` as `application/x-www-form-urlencoded`, expecting JSON.
    async fn post_form(&self, url: &str, form: &[(String, String)])
        -> Result<Value, GatewayError>;
}

/// Production gateway over a shared `reqwest` client.
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn decode_body(url: &str, response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_error(url, &err))?;

        // Decode as UTF-8, falling back to lossy replacement; some servers
        // emit mis-encoded attribute text inside otherwise valid JSON.
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        let value: Value =
            serde_json::from_str(&text).map_err(|err| GatewayError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        // Services report failures inside HTTP 200 bodies.
        if let Some(error) = value.get("error") {
            return Err(GatewayError::Service {
                url: url.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("service reported an error")
                    .to_string(),
            });
        }

        Ok(value)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|err| transport_error(url, &err))?;
        Self::decode_body(url, response).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|err| transport_error(url, &err))?;
        Self::decode_body(url, response).await
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        url: url.to_string(),
        message: err.to_string(),
        connection_reset: source_chain_has_reset(err),
    }
}

/// Walk the error's source chain looking for a reset I/O error.
fn source_chain_has_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            if io_err.kind() == std::io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
