use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use geohaul_engine::auth;
use geohaul_engine::catalog::CatalogWalker;
use geohaul_engine::config::{parser, validator};
use geohaul_engine::HttpGateway;

/// Execute the `discover` command: resolve the catalog and list its leaves.
pub async fn execute(job_path: &Path) -> Result<()> {
    let config = parser::parse_job(job_path)
        .with_context(|| format!("Failed to parse job: {}", job_path.display()))?;
    validator::validate_job(&config)?;

    let gateway = HttpGateway::new(Duration::from_secs(config.request_timeout_secs))?;
    let token = auth::acquire_token(&gateway, &config.endpoint, &config.auth).await?;

    let walker = CatalogWalker::new(&gateway, token.as_deref());
    let leaves = walker.leaves(&config.endpoint).await?;

    println!("{} queryable layer(s) under {}", leaves.len(), config.endpoint);
    for leaf in &leaves {
        println!("  {leaf}");
    }
    Ok(())
}
