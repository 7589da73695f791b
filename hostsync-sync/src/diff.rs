//! Set algebra over two manifests.
//!
//! `source` is the side being reconciled and `target` the side it must come
//! to match. A push reconciles the remote (`diff(remote, local)`), a pull
//! reconciles the local tree (`diff(local, remote)`).

use hostsync_core::{DiffSets, Manifest};

/// Which side of the sync is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local tree is the truth; remote is reconciled.
    Push,
    /// Remote manifest is the truth; local tree is reconciled.
    Pull,
}

/// Classify every differing key.
///
/// 1. `to_delete`: in `source`, missing from `target`.
/// 2. `to_upload`: in `target`, missing from `source`.
/// 3. `to_update`: in both after removing the above, with different hashes;
///    the value is taken from `source`.
pub fn diff(source: &Manifest, target: &Manifest) -> DiffSets {
    let to_delete: Manifest = source
        .iter()
        .filter(|(key, _)| !target.contains_key(*key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let to_upload: Manifest = target
        .iter()
        .filter(|(key, _)| !source.contains_key(*key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let to_update: Manifest = source
        .iter()
        .filter(|(key, _)| !to_delete.contains_key(*key))
        .filter_map(|(key, hash)| {
            if to_upload.contains_key(key) {
                return None;
            }
            let other = target.get(key)?;
            (other != hash).then(|| (key.clone(), hash.clone()))
        })
        .collect();

    DiffSets {
        to_delete,
        to_upload,
        to_update,
    }
}

/// Diff sets for reconciling in `direction`.
pub fn plan(direction: SyncDirection, local: &Manifest, remote: &Manifest) -> DiffSets {
    match direction {
        SyncDirection::Push => diff(remote, local),
        SyncDirection::Pull => diff(local, remote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case::added_and_removed(
        &[("a", "1"), ("b", "2")], &[("b", "2"), ("c", "3")],
        &[("a", "1")], &[("c", "3")], &[]
    )]
    #[case::changed(&[("a", "1")], &[("a", "2")], &[], &[], &[("a", "1")])]
    #[case::empty_source(&[], &[("x", "9")], &[], &[("x", "9")], &[])]
    #[case::empty_target(&[("x", "9")], &[], &[("x", "9")], &[], &[])]
    #[case::mixed(
        &[("keep", "k"), ("gone", "g"), ("edit", "old")],
        &[("keep", "k"), ("new", "n"), ("edit", "new")],
        &[("gone", "g")], &[("new", "n")], &[("edit", "old")]
    )]
    fn classifies(
        #[case] source: &[(&str, &str)],
        #[case] target: &[(&str, &str)],
        #[case] to_delete: &[(&str, &str)],
        #[case] to_upload: &[(&str, &str)],
        #[case] to_update: &[(&str, &str)],
    ) {
        let sets = diff(&manifest(source), &manifest(target));
        assert_eq!(sets.to_delete, manifest(to_delete));
        assert_eq!(sets.to_upload, manifest(to_upload));
        assert_eq!(sets.to_update, manifest(to_update));
    }

    #[test]
    fn self_diff_is_empty() {
        let m = manifest(&[("a", "1"), ("b/c", "2"), ("d", "3")]);
        assert!(diff(&m, &m).is_empty());
        assert!(diff(&Manifest::new(), &Manifest::new()).is_empty());
    }

    #[test]
    fn sets_partition_symmetric_difference_plus_changed() {
        let source = manifest(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
        let target = manifest(&[("b", "2"), ("c", "X"), ("e", "5"), ("f", "6")]);
        let sets = diff(&source, &target);

        let mut seen = std::collections::BTreeSet::new();
        for key in sets
            .to_delete
            .keys()
            .chain(sets.to_upload.keys())
            .chain(sets.to_update.keys())
        {
            assert!(seen.insert(key.clone()), "{key} classified twice");
        }

        let expected: std::collections::BTreeSet<String> = source
            .keys()
            .chain(target.keys())
            .filter(|k| source.get(*k) != target.get(*k))
            .cloned()
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn push_deletes_remote_only_files() {
        let local = manifest(&[("a", "1")]);
        let remote = manifest(&[("a", "1"), ("stale", "2")]);
        let sets = plan(SyncDirection::Push, &local, &remote);
        assert_eq!(sets.to_delete, manifest(&[("stale", "2")]));
        assert!(sets.to_upload.is_empty());
    }

    #[test]
    fn pull_deletes_local_only_files() {
        let local = manifest(&[("a", "1"), ("scratch", "2")]);
        let remote = manifest(&[("a", "1"), ("fresh", "3")]);
        let sets = plan(SyncDirection::Pull, &local, &remote);
        assert_eq!(sets.to_delete, manifest(&[("scratch", "2")]));
        assert_eq!(sets.to_upload, manifest(&[("fresh", "3")]));
    }

    #[test]
    fn identical_trees_round_trip_to_empty() {
        let tree = manifest(&[("a", "1"), ("b", "2")]);
        assert!(plan(SyncDirection::Push, &tree, &tree).is_empty());
        assert!(plan(SyncDirection::Pull, &tree, &tree).is_empty());
    }
}
