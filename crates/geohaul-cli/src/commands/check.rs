use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use geohaul_engine::auth;
use geohaul_engine::config::{parser, validator};
use geohaul_engine::{Gateway, HttpGateway};

/// Execute the `check` command: validate configuration, credentials, and
/// endpoint reachability without extracting anything.
pub async fn execute(job_path: &Path) -> Result<()> {
    let config = parser::parse_job(job_path)
        .with_context(|| format!("Failed to parse job: {}", job_path.display()))?;
    validator::validate_job(&config)?;
    println!("Configuration: ok");

    let gateway = HttpGateway::new(Duration::from_secs(config.request_timeout_secs))?;

    let token = auth::acquire_token(&gateway, &config.endpoint, &config.auth).await?;
    match &token {
        Some(_) => println!("Credentials:   ok (token acquired)"),
        None => println!("Credentials:   none configured, proceeding anonymously"),
    }

    let mut params = vec![("f".to_string(), "json".to_string())];
    if let Some(token) = &token {
        params.push(("token".to_string(), token.clone()));
    }
    gateway
        .get_json(&config.endpoint, &params)
        .await
        .with_context(|| format!("Endpoint unreachable: {}", config.endpoint))?;
    println!("Endpoint:      ok ({})", config.endpoint);

    Ok(())
}
