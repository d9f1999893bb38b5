use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use geohaul_engine::config::{parser, validator};
use geohaul_engine::orchestrator;
use geohaul_engine::result::LeafOutcome;
use geohaul_engine::{HttpGateway, JsonDirSink};

/// Execute the `run` command: parse, validate, and run an extraction job.
pub async fn execute(job_path: &Path) -> Result<()> {
    let config = parser::parse_job(job_path)
        .with_context(|| format!("Failed to parse job: {}", job_path.display()))?;
    validator::validate_job(&config)?;

    tracing::info!(
        endpoint = config.endpoint,
        output = %config.output_dir.display(),
        max_tries = config.max_tries,
        strict_json = config.strict_json,
        "Job validated"
    );

    let gateway = HttpGateway::new(Duration::from_secs(config.request_timeout_secs))?;
    let sink = JsonDirSink::new(&config.output_dir)
        .with_context(|| format!("Failed to prepare output: {}", config.output_dir.display()))?;

    let report = orchestrator::run_extraction(&config, &gateway, &sink).await?;

    println!("Extraction of '{}' completed.", config.endpoint);
    for leaf in &report.leaves {
        match &leaf.outcome {
            LeafOutcome::Extracted {
                artifact,
                rows,
                windows,
            } => println!(
                "  extracted  {artifact}: {rows} rows in {windows} window(s) ({:.1}s)",
                leaf.duration_secs
            ),
            LeafOutcome::Mismatch {
                artifact,
                expected,
                actual,
            } => println!(
                "  MISMATCH   {artifact}: expected {expected} rows, merged {actual}; partials retained"
            ),
            LeafOutcome::Skipped { reason } => {
                println!("  skipped    {}: {reason}", leaf.endpoint);
            }
            LeafOutcome::Failed { reason } => {
                println!("  FAILED     {}: {reason}", leaf.endpoint);
            }
        }
    }
    println!("  Layers:    {}", report.leaves.len());
    println!(
        "  Extracted: {} ({} rows)",
        report.extracted(),
        report.total_rows()
    );
    println!("  Skipped:   {}", report.skipped());
    println!("  Failed:    {}", report.failed());
    println!("  Mismatch:  {}", report.mismatched());
    println!("  Duration:  {:.2}s", report.duration_secs);

    if report.has_failures() {
        anyhow::bail!("{} layer(s) failed to extract", report.failed());
    }
    Ok(())
}
