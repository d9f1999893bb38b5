//! Safe artifact naming with per-run collision tracking.

use std::collections::HashSet;

use crate::config::types::SinkKind;

/// Longest path a flat-file destination tolerates.
const MAX_PATH_BUDGET: usize = 230;

/// Component-name limit for record-oriented (workspace) destinations.
const WORKSPACE_NAME_BUDGET: usize = 150;

/// Names are never truncated below this, however long the folder path is.
const MIN_NAME_BUDGET: usize = 16;

const FALLBACK_NAME: &str = "layer";

/// Allocates destination-safe, run-unique artifact names.
///
/// Collision resolution tries, in order: the sanitized candidate, the
/// candidate suffixed with the layer id, the candidate suffixed with the
/// parent and layer ids, and finally a numeric counter. Every allocation is
/// recorded so later layers cannot collide with earlier ones.
pub struct NameAllocator {
    taken: HashSet<String>,
    budget: usize,
}

impl NameAllocator {
    pub fn new(kind: SinkKind, destination_path_len: usize) -> Self {
        let budget = match kind {
            SinkKind::Workspace => WORKSPACE_NAME_BUDGET,
            SinkKind::Folder => MAX_PATH_BUDGET
                .saturating_sub(destination_path_len)
                .max(MIN_NAME_BUDGET),
        };
        Self {
            taken: HashSet::new(),
            budget,
        }
    }

    pub fn allocate(&mut self, raw: &str, layer_id: i64, parent_id: Option<i64>) -> String {
        let base = sanitize(raw);

        let mut candidate = fit(&base, "", self.budget);
        if self.taken.contains(&candidate) {
            candidate = fit(&base, &format!("_{layer_id}"), self.budget);
        }
        if self.taken.contains(&candidate) {
            let parent = parent_id.unwrap_or_default();
            candidate = fit(&base, &format!("_{parent}_{layer_id}"), self.budget);
        }
        let mut counter = 2u32;
        while self.taken.contains(&candidate) {
            candidate = fit(&base, &format!("_{counter}"), self.budget);
            counter += 1;
        }

        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Reduce a human-readable name to destination-safe characters.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_separator = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    let out = out.trim_end_matches('_');
    let mut out = out.to_string();
    if out.is_empty() {
        out = FALLBACK_NAME.to_string();
    }
    if out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Truncate `base` so that `base + suffix` stays inside `budget`.
fn fit(base: &str, suffix: &str, budget: usize) -> String {
    let room = budget.saturating_sub(suffix.len()).max(1);
    let truncated: String = base.chars().take(room).collect();
    let truncated = truncated.trim_end_matches('_');
    format!("{truncated}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize("Road  Centre-lines (2024)"), "Road_Centre_lines_2024");
        assert_eq!(sanitize("already_safe"), "already_safe");
        assert_eq!(sanitize("___"), "layer");
        assert_eq!(sanitize("2024 Parcels"), "_2024_Parcels");
        assert_eq!(sanitize("données août"), "donn_es_ao_t");
    }

    #[test]
    fn first_allocation_uses_the_sanitized_name() {
        let mut allocator = NameAllocator::new(SinkKind::Workspace, 0);
        assert_eq!(allocator.allocate("City Parks", 3, None), "City_Parks");
    }

    #[test]
    fn collisions_fall_through_the_suffix_tiers() {
        let mut allocator = NameAllocator::new(SinkKind::Workspace, 0);
        assert_eq!(allocator.allocate("Parks", 1, Some(9)), "Parks");
        assert_eq!(allocator.allocate("Parks", 2, Some(9)), "Parks_2");
        assert_eq!(allocator.allocate("Parks", 2, Some(9)), "Parks_9_2");
        // Identical name, id, and parent exhaust every tier; the counter
        // still produces a fresh name.
        let fourth = allocator.allocate("Parks", 2, Some(9));
        assert!(allocator.allocate("Parks", 2, Some(9)) != fourth);
    }

    #[test]
    fn repeats_are_always_pairwise_distinct_and_within_budget() {
        let mut allocator = NameAllocator::new(SinkKind::Folder, 200);
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let name = allocator.allocate("Waterlines: main supply network", 42, Some(7));
            assert!(name.len() <= MIN_NAME_BUDGET + 16);
            assert!(seen.insert(name));
        }
    }

    #[test]
    fn workspace_budget_caps_component_length() {
        let mut allocator = NameAllocator::new(SinkKind::Workspace, 0);
        let long = "x".repeat(400);
        let name = allocator.allocate(&long, 1, None);
        assert!(name.len() <= WORKSPACE_NAME_BUDGET);
    }

    #[test]
    fn folder_budget_shrinks_with_destination_path() {
        let mut allocator = NameAllocator::new(SinkKind::Folder, 220);
        let name = allocator.allocate(&"y".repeat(100), 1, None);
        assert!(name.len() <= MIN_NAME_BUDGET);
    }
}
