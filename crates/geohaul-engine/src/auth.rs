//! Bearer-token acquisition against the service's credential provider.
//!
//! Two conventional token endpoint shapes exist: the hosted-portal form
//! (`<referer>/sharing/rest/generateToken`) and the adapter-relative form
//! (`<referer>/<adapter>/tokens/generateToken`). Whichever answers
//! successfully first wins.

use url::Url;

use geohaul_types::error::ExtractError;

use crate::config::types::AuthConfig;
use crate::gateway::Gateway;

/// Hosted portal domain; endpoints under it always authenticate against the
/// portal itself with referer-pinned tokens.
const HOSTED_PORTAL: &str = "https://www.arcgis.com";

/// Token validity requested from the provider, in minutes.
const TOKEN_EXPIRATION_MINUTES: u32 = 240;

/// Resolve the token to use for this run, if any.
///
/// A pre-supplied token is used verbatim. Without credentials the run
/// proceeds anonymously. Any provider failure is fatal for the run.
pub async fn acquire_token(
    gateway: &dyn Gateway,
    endpoint: &str,
    auth: &AuthConfig,
) -> Result<Option<String>, ExtractError> {
    if let Some(token) = auth.token.as_deref().filter(|token| !token.is_empty()) {
        tracing::debug!("using pre-supplied token");
        return Ok(Some(token.to_string()));
    }
    let Some(username) = auth.username.as_deref().filter(|name| !name.is_empty()) else {
        return Ok(None);
    };
    let password = auth.password.as_deref().unwrap_or_default();

    let (referer, client_type) = match auth.referer.as_deref().filter(|r| !r.is_empty()) {
        Some(configured) => (configured.replace("http:", "https:"), "referer"),
        None => referring_domain(endpoint)?,
    };
    let adapter = adapter_segment(endpoint)?;

    let candidates = [
        format!("{referer}/sharing/rest/generateToken"),
        format!("{referer}/{adapter}/tokens/generateToken"),
    ];

    let form = vec![
        ("username".to_string(), username.to_string()),
        ("password".to_string(), password.to_string()),
        ("expiration".to_string(), TOKEN_EXPIRATION_MINUTES.to_string()),
        ("client".to_string(), client_type.to_string()),
        ("referer".to_string(), referer.clone()),
        ("f".to_string(), "json".to_string()),
    ];

    let mut last_failure = String::new();
    for token_url in &candidates {
        match gateway.post_form(token_url, &form).await {
            Ok(body) => {
                let Some(token) = body.get("token").and_then(|t| t.as_str()) else {
                    return Err(ExtractError::Auth(format!(
                        "{token_url} answered without a token"
                    )));
                };
                tracing::info!(token_url, "token acquired");
                return Ok(Some(token.to_string()));
            }
            Err(err) => {
                tracing::debug!(token_url, error = %err, "token endpoint did not answer");
                last_failure = err.to_string();
            }
        }
    }

    Err(ExtractError::Auth(format!(
        "no token endpoint answered for {endpoint}: {last_failure}"
    )))
}

/// Referring domain and token client type derived from the endpoint.
fn referring_domain(endpoint: &str) -> Result<(String, &'static str), ExtractError> {
    let parsed = parse_endpoint(endpoint)?;
    let host = parsed.host_str().unwrap_or_default();
    if host.contains("arcgis.com") {
        return Ok((HOSTED_PORTAL.to_string(), "referer"));
    }
    let mut domain = format!("https://{host}");
    if let Some(port) = parsed.port() {
        domain.push_str(&format!(":{port}"));
    }
    Ok((domain, "requestip"))
}

/// Web adapter segment of the endpoint path: the first path segment, or the
/// second on hosted-portal endpoints (whose paths lead with an org id).
fn adapter_segment(endpoint: &str) -> Result<String, ExtractError> {
    let parsed = parse_endpoint(endpoint)?;
    let host = parsed.host_str().unwrap_or_default();
    let mut segments = parsed.path_segments().into_iter().flatten();
    let segment = if host.contains("arcgis.com") {
        segments.nth(1)
    } else {
        segments.next()
    };
    segment
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ExtractError::Auth(format!("{endpoint} has no adapter path segment"))
        })
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ExtractError> {
    Url::parse(endpoint)
        .map_err(|err| ExtractError::Auth(format!("invalid endpoint {endpoint}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referring_domain_upgrades_to_https() {
        let (domain, client) =
            referring_domain("http://gis.example.gov/arcgis/rest/services").unwrap();
        assert_eq!(domain, "https://gis.example.gov");
        assert_eq!(client, "requestip");
    }

    #[test]
    fn referring_domain_keeps_port() {
        let (domain, _) =
            referring_domain("https://gis.example.gov:6443/arcgis/rest/services").unwrap();
        assert_eq!(domain, "https://gis.example.gov:6443");
    }

    #[test]
    fn hosted_portal_pins_referer() {
        let (domain, client) = referring_domain(
            "https://services1.arcgis.com/abc123/arcgis/rest/services",
        )
        .unwrap();
        assert_eq!(domain, HOSTED_PORTAL);
        assert_eq!(client, "referer");
    }

    #[test]
    fn adapter_segment_on_premise() {
        let adapter = adapter_segment("https://gis.example.gov/arcgis/rest/services").unwrap();
        assert_eq!(adapter, "arcgis");
    }

    #[test]
    fn adapter_segment_hosted() {
        let adapter = adapter_segment(
            "https://services1.arcgis.com/abc123/arcgis/rest/services",
        )
        .unwrap();
        assert_eq!(adapter, "arcgis");
    }

    #[test]
    fn adapter_segment_missing_is_an_error() {
        assert!(adapter_segment("https://gis.example.gov").is_err());
        assert!(adapter_segment("not a url").is_err());
    }
}
