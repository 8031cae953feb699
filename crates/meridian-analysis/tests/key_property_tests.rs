//! Property tests for analysis key set semantics

use std::path::PathBuf;

use meridian_analysis::AnalysisKey;
use proptest::prelude::*;

fn entries_strategy() -> impl Strategy<Value = Vec<(PathBuf, u64)>> {
    prop::collection::vec(("[a-z]{1,8}", 1u64..100), 1..10).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(name, revision)| (PathBuf::from(format!("/src/{name}.mn")), revision))
            .collect()
    })
}

proptest! {
    #[test]
    fn key_is_invariant_under_ordering(entries in entries_strategy(), seed in any::<u64>()) {
        let forward = AnalysisKey::new(entries.clone());

        let mut shuffled = entries;
        // Cheap deterministic shuffle
        let len = shuffled.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(31).wrapping_add(i * 7) % len;
            shuffled.swap(i, j);
        }
        let backward = AnalysisKey::new(shuffled);

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn key_contains_every_entry(entries in entries_strategy()) {
        let key = AnalysisKey::new(entries.clone());

        for (path, _) in &entries {
            prop_assert!(key.contains(path));
        }
    }

    #[test]
    fn revision_change_changes_key(entries in entries_strategy()) {
        let original = AnalysisKey::new(entries.clone());

        let mut bumped = entries;
        bumped[0].1 += 1;
        // Duplicate paths may collapse to a different surviving revision, so
        // only distinct-path inputs are comparable
        let distinct = {
            let mut paths: Vec<_> = bumped.iter().map(|(p, _)| p.clone()).collect();
            paths.sort();
            paths.dedup();
            paths.len() == bumped.len()
        };
        prop_assume!(distinct);

        let changed = AnalysisKey::new(bumped);
        prop_assert_ne!(original, changed);
    }
}
