//! Run orchestration: resolve the catalog, then drive each leaf through
//! descriptor resolution, window planning, fetching, and reconciliation.

use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use geohaul_types::error::ExtractError;
use geohaul_types::layer::{LayerDescriptor, Window};

use crate::auth;
use crate::catalog::CatalogWalker;
use crate::config::types::JobConfig;
use crate::fetch::FetchExecutor;
use crate::gateway::Gateway;
use crate::layer::{resolve_layer, LayerResolution};
use crate::naming::NameAllocator;
use crate::planner::plan_windows;
use crate::reconcile::merge_partials;
use crate::result::{LeafOutcome, LeafReport, RunReport};
use crate::sink::FeatureSink;
use crate::style::export_style;

/// Execute one extraction run.
///
/// Catalog and authentication failures abort the run. Everything after the
/// leaf list is resolved is contained per leaf: capability gaps skip the
/// leaf, fetch exhaustion and artifact failures fail the leaf, and
/// reconciliation mismatches are recorded as warnings.
///
/// # Errors
///
/// Returns [`ExtractError::Auth`] or [`ExtractError::Catalog`] when the run
/// cannot start.
pub async fn run_extraction(
    config: &JobConfig,
    gateway: &dyn Gateway,
    sink: &dyn FeatureSink,
) -> Result<RunReport, ExtractError> {
    let start = Instant::now();
    tracing::info!(
        endpoint = config.endpoint,
        output = %config.output_dir.display(),
        "starting catalog extraction"
    );

    let token = auth::acquire_token(gateway, &config.endpoint, &config.auth).await?;

    let walker = CatalogWalker::new(gateway, token.as_deref());
    let leaves = walker.leaves(&config.endpoint).await?;

    let executor = FetchExecutor::new(
        gateway,
        token.clone(),
        config.max_tries,
        Duration::from_secs(config.retry_wait_secs),
    );
    let mut allocator = NameAllocator::new(
        config.sink,
        config.output_dir.to_string_lossy().chars().count(),
    );

    let mut reports = Vec::with_capacity(leaves.len());
    for leaf in &leaves {
        let leaf_start = Instant::now();
        let outcome = match extract_leaf(
            config,
            gateway,
            &executor,
            sink,
            &mut allocator,
            token.as_deref(),
            leaf,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(err) if err.skips_leaf() => {
                tracing::warn!(endpoint = leaf, reason = %err, "leaf skipped");
                LeafOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                tracing::error!(endpoint = leaf, error = %err, "leaf extraction failed");
                LeafOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        reports.push(LeafReport {
            endpoint: leaf.clone(),
            outcome,
            duration_secs: leaf_start.elapsed().as_secs_f64(),
        });
    }

    let report = RunReport {
        leaves: reports,
        duration_secs: start.elapsed().as_secs_f64(),
    };
    tracing::info!(
        leaves = report.leaves.len(),
        extracted = report.extracted(),
        skipped = report.skipped(),
        failed = report.failed(),
        mismatched = report.mismatched(),
        rows = report.total_rows(),
        duration_secs = report.duration_secs,
        "extraction run completed"
    );
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
async fn extract_leaf(
    config: &JobConfig,
    gateway: &dyn Gateway,
    executor: &FetchExecutor<'_>,
    sink: &dyn FeatureSink,
    allocator: &mut NameAllocator,
    token: Option<&str>,
    leaf: &str,
) -> Result<LeafOutcome, ExtractError> {
    tracing::info!(endpoint = leaf, "extracting layer");

    let Some(LayerResolution {
        mut descriptor,
        metadata,
    }) = resolve_layer(
        gateway,
        leaf,
        token,
        config.strict_json,
        config.max_record_cap,
    )
    .await?
    else {
        return Ok(LeafOutcome::Skipped {
            reason: "organizational layer holds no rows".into(),
        });
    };

    let filter = config.row_filter();
    let count = executor.row_count(leaf, filter).await?;
    descriptor.row_count = Some(count);

    let name = allocator.allocate(&descriptor.name, descriptor.id, descriptor.parent_id);
    write_info_sidecar(&config.output_dir, &name, leaf, &metadata, count)?;

    let ids = executor
        .identifiers(leaf, &descriptor.oid_field, filter)
        .await?;
    if ids.is_empty() {
        return Err(ExtractError::fetch(
            leaf,
            1,
            "no row identifiers matched the filter",
        ));
    }

    let windows = plan_windows(&ids, descriptor.window_cap);
    tracing::info!(
        endpoint = leaf,
        rows = ids.len(),
        cap = descriptor.window_cap,
        windows = windows.len(),
        "planned identifier windows"
    );

    let partials = fetch_windows(executor, sink, &descriptor, &windows, filter, &name).await?;
    let outcome = merge_partials(sink, &name, &partials, ids.len() as u64)?;

    export_style(&config.output_dir, &name, &metadata);

    if outcome.is_complete() {
        Ok(LeafOutcome::Extracted {
            artifact: name,
            rows: outcome.rows,
            windows: windows.len() as u32,
        })
    } else {
        Ok(LeafOutcome::Mismatch {
            artifact: name,
            expected: outcome.expected,
            actual: outcome.rows,
        })
    }
}

/// Fetch every window in ascending order, storing each as a partial
/// artifact named `<name>_pNNNN` (the counter advances by one per window).
async fn fetch_windows(
    executor: &FetchExecutor<'_>,
    sink: &dyn FeatureSink,
    descriptor: &LayerDescriptor,
    windows: &[Window],
    filter: Option<&str>,
    name: &str,
) -> Result<Vec<String>, ExtractError> {
    let mut partials = Vec::with_capacity(windows.len());
    for (index, window) in windows.iter().enumerate() {
        let page = executor.window_page(descriptor, *window, filter).await?;
        let partial = format!("{name}_p{index:04}");
        sink.write(&partial, &page.body)
            .map_err(|err| ExtractError::artifact(partial.as_str(), err))?;
        tracing::debug!(
            partial,
            rows = page.rows,
            lower = window.lower,
            upper = window.upper,
            "stored window artifact"
        );
        partials.push(partial);
    }
    Ok(partials)
}

/// Record the layer metadata beside the artifact for later reference.
fn write_info_sidecar(
    output_dir: &Path,
    name: &str,
    endpoint: &str,
    metadata: &Value,
    row_count: u64,
) -> Result<(), ExtractError> {
    let mut info = metadata.clone();
    if let Some(map) = info.as_object_mut() {
        map.insert("serviceURL".to_string(), json!(endpoint));
        map.insert("featureCount".to_string(), json!(row_count));
        map.insert(
            "retrievedAt".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
    }

    let path = output_dir.join(format!("{name}_info.json"));
    let text = serde_json::to_string_pretty(&info)
        .map_err(|err| {
            ExtractError::artifact(
                name,
                std::io::Error::new(std::io::ErrorKind::InvalidData, err),
            )
        })?;
    std::fs::write(&path, text).map_err(|err| ExtractError::artifact(name, err))?;
    tracing::info!(path = %path.display(), "layer metadata recorded");
    Ok(())
}
