//! Window planning: slice a sorted identifier set into fetchable ranges.

use geohaul_types::layer::{IdentifierSet, Window};

/// Partition `ids` into closed-range windows of at most `window_cap`
/// identifiers each.
///
/// Bounds are taken from the identifiers actually present, so the final,
/// possibly short, window ends at the true last identifier rather than a
/// padded value. Windows come back in ascending order and partition the
/// set exactly.
pub fn plan_windows(ids: &IdentifierSet, window_cap: u64) -> Vec<Window> {
    let cap = window_cap.max(1) as usize;
    ids.as_slice()
        .chunks(cap)
        .map(|chunk| Window {
            lower: chunk[0],
            upper: *chunk.last().expect("chunks are never empty"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: std::ops::RangeInclusive<i64>) -> IdentifierSet {
        IdentifierSet::new(range.collect())
    }

    #[test]
    fn empty_set_plans_no_windows() {
        assert!(plan_windows(&IdentifierSet::default(), 100).is_empty());
    }

    #[test]
    fn window_count_is_ceiling_of_n_over_cap() {
        for (n, cap, expected) in [
            (1_i64, 1_u64, 1_usize),
            (10, 3, 4),
            (9, 3, 3),
            (100, 100, 1),
            (101, 100, 2),
        ] {
            let windows = plan_windows(&ids(1..=n), cap);
            assert_eq!(windows.len(), expected, "n={n} cap={cap}");
        }
    }

    #[test]
    fn windows_partition_the_set_exactly() {
        // Sparse, unevenly spaced identifiers.
        let set = IdentifierSet::new(vec![2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233]);
        let windows = plan_windows(&set, 4);
        assert_eq!(windows.len(), 3);

        // Pairwise disjoint and ascending.
        for pair in windows.windows(2) {
            assert!(pair[0].upper < pair[1].lower);
        }

        // Union covers every identifier exactly once.
        let mut covered: Vec<i64> = Vec::new();
        for window in &windows {
            covered.extend(
                set.as_slice()
                    .iter()
                    .filter(|id| **id >= window.lower && **id <= window.upper),
            );
        }
        assert_eq!(covered, set.as_slice());
    }

    #[test]
    fn short_final_window_ends_at_true_maximum() {
        let set = IdentifierSet::new(vec![10, 20, 30, 40, 50, 60, 70]);
        let windows = plan_windows(&set, 3);
        assert_eq!(
            windows,
            vec![
                Window { lower: 10, upper: 30 },
                Window { lower: 40, upper: 60 },
                Window { lower: 70, upper: 70 },
            ]
        );
    }

    #[test]
    fn capped_extraction_shape_for_large_layer() {
        let set = ids(1..=25_000);
        let windows = plan_windows(&set, 10_000);
        assert_eq!(
            windows,
            vec![
                Window { lower: 1, upper: 10_000 },
                Window { lower: 10_001, upper: 20_000 },
                Window { lower: 20_001, upper: 25_000 },
            ]
        );
    }
}
