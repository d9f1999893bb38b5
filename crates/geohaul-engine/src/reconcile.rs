//! Merge per-window partial artifacts into one verified final artifact.

use geohaul_types::error::ExtractError;

use crate::sink::FeatureSink;

/// Result of a merge: row counts only; whether partials survived follows
/// from [`MergeOutcome::is_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub rows: u64,
    pub expected: u64,
}

impl MergeOutcome {
    pub fn is_complete(&self) -> bool {
        self.rows == self.expected
    }
}

/// Merge `partials`, in order, into `final_name` and verify the row count.
///
/// The first partial is renamed into place; the rest are appended to it.
/// When the merged count matches `expected` the partials are deleted;
/// otherwise every remaining partial is retained for inspection and the
/// mismatch is reported as a warning.
pub fn merge_partials(
    sink: &dyn FeatureSink,
    final_name: &str,
    partials: &[String],
    expected: u64,
) -> Result<MergeOutcome, ExtractError> {
    let Some((first, rest)) = partials.split_first() else {
        return Err(ExtractError::artifact(
            final_name,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no partial artifacts to merge",
            ),
        ));
    };

    if sink.exists(final_name) {
        tracing::warn!(artifact = final_name, "final artifact exists, replacing");
        sink.delete(final_name)
            .map_err(|err| ExtractError::artifact(final_name, err))?;
    }

    sink.rename(first, final_name)
        .map_err(|err| ExtractError::artifact(first.as_str(), err))?;
    for partial in rest {
        sink.append_rows(partial, final_name)
            .map_err(|err| ExtractError::artifact(partial.as_str(), err))?;
        tracing::debug!(partial, artifact = final_name, "appended partial artifact");
    }

    let rows = sink
        .row_count(final_name)
        .map_err(|err| ExtractError::artifact(final_name, err))?;

    if rows == expected {
        for partial in rest {
            sink.delete(partial)
                .map_err(|err| ExtractError::artifact(partial.as_str(), err))?;
        }
        tracing::info!(
            artifact = final_name,
            rows,
            partials = partials.len(),
            "merged and reconciled"
        );
    } else {
        let mismatch = ExtractError::ReconciliationMismatch {
            artifact: final_name.to_string(),
            expected,
            actual: rows,
        };
        tracing::warn!(%mismatch, "retaining partial artifacts for inspection");
    }

    Ok(MergeOutcome { rows, expected })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::sink::JsonDirSink;

    fn page(ids: std::ops::RangeInclusive<i64>) -> serde_json::Value {
        json!({
            "features": ids
                .map(|id| json!({"attributes": {"OBJECTID": id}}))
                .collect::<Vec<_>>()
        })
    }

    fn sink_with_partials(
        dir: &std::path::Path,
        counts: &[std::ops::RangeInclusive<i64>],
    ) -> (JsonDirSink, Vec<String>) {
        let sink = JsonDirSink::new(dir).unwrap();
        let mut names = Vec::new();
        for (index, range) in counts.iter().enumerate() {
            let name = format!("roads_p{index:04}");
            sink.write(&name, &page(range.clone())).unwrap();
            names.push(name);
        }
        (sink, names)
    }

    #[test]
    fn complete_merge_deletes_partials() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, partials) = sink_with_partials(dir.path(), &[1..=4, 5..=8, 9..=10]);

        let outcome = merge_partials(&sink, "roads", &partials, 10).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.rows, 10);

        assert_eq!(sink.row_count("roads").unwrap(), 10);
        for partial in &partials {
            assert!(!sink.exists(partial), "{partial} should be gone");
        }
    }

    #[test]
    fn merged_rows_keep_window_order() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, partials) = sink_with_partials(dir.path(), &[1..=2, 3..=4]);
        merge_partials(&sink, "roads", &partials, 4).unwrap();

        let body: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("roads.json")).unwrap(),
        )
        .unwrap();
        let ids: Vec<i64> = body["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|feature| feature["attributes"]["OBJECTID"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn mismatch_retains_partials() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, partials) = sink_with_partials(dir.path(), &[1..=4, 5..=6]);

        // Expected 10 but only 6 rows came back.
        let outcome = merge_partials(&sink, "roads", &partials, 10).unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.rows, 6);

        // First partial became the final artifact; the rest survive.
        assert!(sink.exists("roads"));
        assert!(sink.exists(&partials[1]));
    }

    #[test]
    fn single_partial_is_promoted_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, partials) = sink_with_partials(dir.path(), &[1..=3]);

        let outcome = merge_partials(&sink, "roads", &partials, 3).unwrap();
        assert!(outcome.is_complete());
        assert!(sink.exists("roads"));
        assert!(!sink.exists(&partials[0]));
    }

    #[test]
    fn no_partials_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();
        let err = merge_partials(&sink, "roads", &[], 5).unwrap_err();
        assert!(matches!(err, ExtractError::Artifact { .. }));
    }

    #[test]
    fn existing_final_artifact_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, partials) = sink_with_partials(dir.path(), &[1..=2]);
        sink.write("roads", &page(90..=99)).unwrap();

        let outcome = merge_partials(&sink, "roads", &partials, 2).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(sink.row_count("roads").unwrap(), 2);
    }
}
