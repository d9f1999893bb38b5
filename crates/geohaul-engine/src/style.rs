//! Portable style-descriptor export.
//!
//! Layers that carry renderer information get a `<name>_renderer.json`
//! descriptor beside their artifact. Extraction never fails on account of
//! styling, so everything here only warns.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

/// Write a portable style descriptor for `name` if the layer metadata
/// carries renderer information.
pub fn export_style(output_dir: &Path, name: &str, metadata: &Value) {
    let Some(renderer) = metadata
        .get("drawingInfo")
        .and_then(|info| info.get("renderer"))
    else {
        tracing::debug!(artifact = name, "no renderer information to export");
        return;
    };

    let descriptor = json!({"drawingInfo": {"renderer": renderer}});
    let path = output_dir.join(format!("{name}_renderer.json"));
    match fs::write(&path, descriptor.to_string()) {
        Ok(()) => tracing::info!(path = %path.display(), "style descriptor written"),
        Err(err) => tracing::warn!(
            path = %path.display(),
            error = %err,
            "style descriptor export failed"
        ),
    }
}
