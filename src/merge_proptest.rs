//! Property-based tests for list deduplication, document merging and flag
//! resolution.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{BTreeMap, HashSet};

    use crate::config::{Document, Manager, PackageEntry};
    use crate::flags::resolve_flags;
    use crate::merge::{dedup_first_wins, merge_all, merge_into};
    use proptest::prelude::*;

    fn package_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]{1,2}", 0..12)
    }

    fn entries(names: &[String], tag: &str) -> Vec<PackageEntry> {
        names
            .iter()
            .map(|name| PackageEntry::with_flags(name.clone(), [tag.to_string()]))
            .collect()
    }

    fn apt_document(names: &[String], tag: &str) -> Document {
        let mut document = Document::default();
        *document.packages.for_manager_mut(Manager::Apt) = entries(names, tag);
        document
    }

    // ============================================================================
    // dedup_first_wins property tests
    // ============================================================================

    proptest! {
        /// Property: no identity appears twice in the output
        #[test]
        fn dedup_output_is_unique(names in package_names()) {
            let deduped = dedup_first_wins(entries(&names, "x"));
            let mut seen = HashSet::new();
            for entry in &deduped {
                prop_assert!(seen.insert(entry.name.clone()), "duplicate '{}'", entry.name);
            }
        }

        /// Property: output is the input's distinct names in first-seen order
        #[test]
        fn dedup_preserves_first_seen_order(names in package_names()) {
            let deduped: Vec<String> = dedup_first_wins(entries(&names, "x"))
                .into_iter()
                .map(|entry| entry.name)
                .collect();

            let mut seen = HashSet::new();
            let expected: Vec<String> = names
                .iter()
                .filter(|name| seen.insert(name.to_string()))
                .cloned()
                .collect();
            prop_assert_eq!(deduped, expected);
        }

        /// Property: deduplication is idempotent
        #[test]
        fn dedup_is_idempotent(names in package_names()) {
            let once = dedup_first_wins(entries(&names, "x"));
            let twice = dedup_first_wins(once.clone());
            prop_assert_eq!(once, twice);
        }
    }

    // ============================================================================
    // merge property tests
    // ============================================================================

    proptest! {
        /// Property: an entry present in both documents keeps the destination's attributes
        #[test]
        fn merge_keeps_first_occurrence_attributes(
            first in package_names(),
            second in package_names(),
        ) {
            let mut merged = apt_document(&first, "first");
            merge_into(&mut merged, apt_document(&second, "second")).unwrap();

            let first_names: HashSet<&String> = first.iter().collect();
            for entry in merged.packages.for_manager(Manager::Apt) {
                let expected = if first_names.contains(&entry.name) { "first" } else { "second" };
                let expected_flags = [expected.to_string()];
                prop_assert_eq!(entry.flags.as_slice(), expected_flags.as_slice());
            }
        }

        /// Property: merging is deterministic across repeated folds
        #[test]
        fn merge_is_deterministic(
            first in package_names(),
            second in package_names(),
        ) {
            let one = merge_all([apt_document(&first, "a"), apt_document(&second, "b")]).unwrap();
            let two = merge_all([apt_document(&first, "a"), apt_document(&second, "b")]).unwrap();
            prop_assert_eq!(
                serde_yaml::to_string(&one).unwrap(),
                serde_yaml::to_string(&two).unwrap()
            );
        }

        /// Property: keyed sections are last-merged-wins
        #[test]
        fn merge_dconf_last_wins(
            first in prop::collection::btree_map("/[a-c]{1,2}", "[0-9]{1,2}", 0..6),
            second in prop::collection::btree_map("/[a-c]{1,2}", "[0-9]{1,2}", 0..6),
        ) {
            let mut destination = Document::default();
            destination.dconf.settings = first.clone();
            let mut source = Document::default();
            source.dconf.settings = second.clone();
            merge_into(&mut destination, source).unwrap();

            let mut expected = first;
            expected.extend(second);
            prop_assert_eq!(destination.dconf.settings, expected);
        }
    }

    // ============================================================================
    // resolve_flags property tests
    // ============================================================================

    proptest! {
        /// Property: an entry's own flags always win
        #[test]
        fn entry_flags_always_win(
            flags in prop::collection::vec("--[a-z]{1,8}", 1..4),
            defaults in prop::collection::vec("--[a-z]{1,8}", 0..4),
        ) {
            let entry = PackageEntry::with_flags("git", flags.clone());
            let mut user_defaults = BTreeMap::new();
            user_defaults.insert("apt".to_string(), defaults);
            prop_assert_eq!(resolve_flags(&entry, Manager::Apt, &user_defaults), flags);
        }

        /// Property: a user default for one manager never affects another
        #[test]
        fn user_defaults_are_per_manager(
            defaults in prop::collection::vec("--[a-z]{1,8}", 0..4),
        ) {
            let entry = PackageEntry::new("code");
            let mut user_defaults = BTreeMap::new();
            user_defaults.insert("apt".to_string(), defaults);
            prop_assert!(resolve_flags(&entry, Manager::Snap, &user_defaults).is_empty());
        }
    }
}
