//! Job configuration validation, run before any network traffic.

use anyhow::{bail, Result};
use url::Url;

use crate::config::types::JobConfig;

/// Reject configurations that cannot possibly run.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn validate_job(config: &JobConfig) -> Result<()> {
    if config.endpoint.trim().is_empty() {
        bail!("endpoint must not be empty");
    }
    let parsed = Url::parse(&config.endpoint)
        .map_err(|err| anyhow::anyhow!("endpoint is not a valid URL: {err}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("endpoint must use http or https, got '{}'", parsed.scheme());
    }

    if config.output_dir.as_os_str().is_empty() {
        bail!("output_dir must not be empty");
    }
    if config.max_tries == 0 {
        bail!("max_tries must be at least 1");
    }
    if config.max_record_cap == 0 {
        bail!("max_record_cap must be at least 1");
    }
    if config.auth.username.is_some() && config.auth.password.is_none() {
        bail!("auth.username requires auth.password");
    }

    Ok(())
}
