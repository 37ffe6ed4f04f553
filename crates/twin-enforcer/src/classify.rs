//! # Subject Classification
//!
//! Traversal folds over the [`ResourceTree`] computing which subjects
//! are unrestricted, partially granted, or directly effected for one
//! query. These are free functions over the immutable tree; the
//! combined [`classify_subjects`] fold answers all three questions in
//! one traversal and is equivalent, for every input, to running the
//! underlying folds independently.
//!
//! Traversal rule for "unrestricted": walking root to the queried path,
//! a grant anywhere on the chain counts and a revoke anywhere on the
//! chain removes the subject's candidacy for that permission from that
//! point downward (closest declaration wins, revoke wins at the same
//! node). A revoke strictly below the queried path removes the subject
//! from "unrestricted" only, never from "partial", since partial
//! ignores revokes entirely.

use std::collections::{BTreeMap, BTreeSet};

use twin_model::{
    EffectedSubjectIds, JsonPointer, Permission, PermissionSet, SubjectClassification, SubjectId,
};

use crate::tree::ResourceTree;

/// Per-subject, per-permission fold state.
///
/// `path_state[i]`: latest declaration for permission `i` on the chain
/// (`None` = undeclared, `Some(true)` = granted, `Some(false)` =
/// revoked). `covered[i]`: permission `i` granted anywhere relevant,
/// ignoring revokes. `revoked_below`: some queried permission revoked
/// strictly below the queried path.
#[derive(Debug, Clone)]
struct SubjectState {
    path_state: Vec<Option<bool>>,
    covered: Vec<bool>,
    revoked_below: bool,
}

impl SubjectState {
    fn new(permission_count: usize) -> Self {
        Self {
            path_state: vec![None; permission_count],
            covered: vec![false; permission_count],
            revoked_below: false,
        }
    }

    fn effective_on_path(&self) -> bool {
        self.path_state.iter().all(|s| *s == Some(true))
    }

    fn partial(&self) -> bool {
        self.covered.iter().all(|c| *c)
    }
}

/// The single fold shared by every classification query.
fn fold(tree: &ResourceTree, path: &JsonPointer, permissions: &PermissionSet) -> Fold {
    let perms: Vec<&Permission> = permissions.iter().collect();
    let mut states: BTreeMap<SubjectId, SubjectState> = BTreeMap::new();

    // Root-to-path chain: accumulates both the closest-declaration path
    // state and grant coverage.
    let chain = tree.chain(path);
    for &idx in &chain {
        for (subject, effected) in tree.node(idx).subjects() {
            let state = states
                .entry(subject.clone())
                .or_insert_with(|| SubjectState::new(perms.len()));
            for (i, p) in perms.iter().enumerate() {
                // Coverage ignores revokes entirely, also when the same
                // node declares both sides.
                if effected.granted.contains(p) {
                    state.covered[i] = true;
                }
                if effected.revoked.contains(p) {
                    state.path_state[i] = Some(false);
                } else if effected.granted.contains(p) {
                    state.path_state[i] = Some(true);
                }
            }
        }
    }

    // Everything strictly below the queried path: grants extend
    // coverage, revokes break "unrestricted".
    if let Some(node) = tree.node_at(path) {
        for idx in tree.descendants(node) {
            for (subject, effected) in tree.node(idx).subjects() {
                let state = states
                    .entry(subject.clone())
                    .or_insert_with(|| SubjectState::new(perms.len()));
                for (i, p) in perms.iter().enumerate() {
                    if effected.granted.contains(p) {
                        state.covered[i] = true;
                    }
                }
                if effected.revokes_any(permissions) {
                    state.revoked_below = true;
                }
            }
        }
    }

    Fold { states }
}

struct Fold {
    states: BTreeMap<SubjectId, SubjectState>,
}

/// Subjects whose permissions are effectively granted at the exact
/// path: a grant from self or an ancestor with no closer revoke,
/// ignoring everything below the path.
pub fn effective_subjects(
    tree: &ResourceTree,
    path: &JsonPointer,
    permissions: &PermissionSet,
) -> BTreeSet<SubjectId> {
    if permissions.is_empty() {
        return BTreeSet::new();
    }
    fold(tree, path, permissions)
        .states
        .into_iter()
        .filter(|(_, state)| state.effective_on_path())
        .map(|(subject, _)| subject)
        .collect()
}

/// Subjects unrestricted at the path: effectively granted there, with
/// no revoke of any queried permission anywhere strictly below.
pub fn unrestricted_subjects(
    tree: &ResourceTree,
    path: &JsonPointer,
    permissions: &PermissionSet,
) -> BTreeSet<SubjectId> {
    if permissions.is_empty() {
        return BTreeSet::new();
    }
    fold(tree, path, permissions)
        .states
        .into_iter()
        .filter(|(_, state)| state.effective_on_path() && !state.revoked_below)
        .map(|(subject, _)| subject)
        .collect()
}

/// Subjects granted all queried permissions at the path or anywhere
/// below it, ignoring all revokes. Each permission may be supplied by a
/// different node; an ancestor grant counts because it propagates to
/// the path.
pub fn partial_subjects(
    tree: &ResourceTree,
    path: &JsonPointer,
    permissions: &PermissionSet,
) -> BTreeSet<SubjectId> {
    if permissions.is_empty() {
        return BTreeSet::new();
    }
    fold(tree, path, permissions)
        .states
        .into_iter()
        .filter(|(_, state)| state.partial())
        .map(|(subject, _)| subject)
        .collect()
}

/// Subjects directly granted (all permissions) or revoked (any
/// permission) exactly at the path. Ancestors and descendants are not
/// consulted; a revoke at the node knocks the subject out of `granted`.
pub fn direct_effected(
    tree: &ResourceTree,
    path: &JsonPointer,
    permissions: &PermissionSet,
) -> EffectedSubjectIds {
    let mut result = EffectedSubjectIds::default();
    if permissions.is_empty() {
        return result;
    }
    let Some(node) = tree.node_at(path) else {
        return result;
    };
    for (subject, effected) in tree.node(node).subjects() {
        if effected.grants_all(permissions) {
            result.granted.insert(subject.clone());
        }
        if effected.revokes_any(permissions) {
            result.revoked.insert(subject.clone());
        }
    }
    result
}

/// Compute unrestricted, partial-only and directly-effected-granted
/// subject sets in one traversal.
///
/// Equivalent to combining [`unrestricted_subjects`],
/// [`partial_subjects`] and [`direct_effected`] and differencing; the
/// single fold only saves walks, never changes a result.
pub fn classify_subjects(
    tree: &ResourceTree,
    path: &JsonPointer,
    permissions: &PermissionSet,
) -> SubjectClassification {
    let mut classification = SubjectClassification::default();
    if permissions.is_empty() {
        return classification;
    }

    let folded = fold(tree, path, permissions);
    for (subject, state) in &folded.states {
        if state.effective_on_path() && !state.revoked_below {
            classification.unrestricted.insert(subject.clone());
        } else if state.partial() {
            classification.partial_only.insert(subject.clone());
        }
    }
    classification.effected_granted = direct_effected(tree, path, permissions).granted;
    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_model::{EffectedPermissions, Policy, PolicyEntry, ResourceKey, ResourceType};

    fn tree_of(declarations: &[(&str, &str, &[&str], &[&str])]) -> ResourceTree {
        // (subject, key, granted, revoked)
        let entries: Vec<PolicyEntry> = declarations
            .iter()
            .enumerate()
            .map(|(i, (subject, key, granted, revoked))| {
                PolicyEntry::new(
                    format!("entry-{i}"),
                    [*subject],
                    [(
                        ResourceKey::parse(key).unwrap(),
                        EffectedPermissions::new(
                            PermissionSet::of(granted.iter().copied()),
                            PermissionSet::of(revoked.iter().copied()),
                        ),
                    )],
                )
                .unwrap()
            })
            .collect();
        ResourceTree::build(&Policy::new(entries), &ResourceType::new("thing"))
    }

    fn ptr(s: &str) -> JsonPointer {
        JsonPointer::parse(s).unwrap()
    }

    fn read() -> PermissionSet {
        PermissionSet::of(["READ"])
    }

    fn subjects(names: &[&str]) -> BTreeSet<SubjectId> {
        names.iter().map(|n| SubjectId::new(*n)).collect()
    }

    #[test]
    fn test_root_grant_is_unrestricted_without_deeper_revoke() {
        let tree = tree_of(&[("alice", "thing:/", &["READ"], &[])]);
        assert_eq!(
            unrestricted_subjects(&tree, &ptr("/"), &read()),
            subjects(&["alice"])
        );
        // Inherited downward too.
        assert_eq!(
            unrestricted_subjects(&tree, &ptr("/attributes/vin"), &read()),
            subjects(&["alice"])
        );
    }

    #[test]
    fn test_deep_revoke_downgrades_root_to_partial() {
        let tree = tree_of(&[
            ("alice", "thing:/", &["READ"], &[]),
            ("alice", "thing:/attributes/secret", &[], &["READ"]),
        ]);
        assert!(unrestricted_subjects(&tree, &ptr("/"), &read()).is_empty());
        assert_eq!(partial_subjects(&tree, &ptr("/"), &read()), subjects(&["alice"]));

        // Unaffected sibling branch stays unrestricted.
        assert_eq!(
            unrestricted_subjects(&tree, &ptr("/features"), &read()),
            subjects(&["alice"])
        );
        // At the revoked node itself nothing is effective.
        assert!(effective_subjects(&tree, &ptr("/attributes/secret"), &read()).is_empty());
    }

    #[test]
    fn test_revoke_on_chain_interrupts_grant() {
        let tree = tree_of(&[
            ("alice", "thing:/", &["READ"], &[]),
            ("alice", "thing:/features", &[], &["READ"]),
            ("alice", "thing:/features/motor", &["READ"], &[]),
        ]);
        // Revoked at /features, re-granted at /features/motor.
        assert!(effective_subjects(&tree, &ptr("/features"), &read()).is_empty());
        assert_eq!(
            effective_subjects(&tree, &ptr("/features/motor"), &read()),
            subjects(&["alice"])
        );
        assert_eq!(
            unrestricted_subjects(&tree, &ptr("/features/motor"), &read()),
            subjects(&["alice"])
        );
    }

    #[test]
    fn test_revoke_wins_at_equal_depth() {
        let tree = tree_of(&[("alice", "thing:/a", &["READ"], &["READ"])]);
        assert!(effective_subjects(&tree, &ptr("/a"), &read()).is_empty());
        assert!(unrestricted_subjects(&tree, &ptr("/a"), &read()).is_empty());
        // Partial ignores revokes: the grant still covers READ.
        assert_eq!(partial_subjects(&tree, &ptr("/a"), &read()), subjects(&["alice"]));
        // And the direct query lists the subject on both sides' rules:
        let direct = direct_effected(&tree, &ptr("/a"), &read());
        assert!(direct.granted.is_empty());
        assert_eq!(direct.revoked, subjects(&["alice"]));
    }

    #[test]
    fn test_partial_from_descendant_grant_only() {
        let tree = tree_of(&[("bob", "thing:/features/motor", &["READ"], &[])]);
        assert!(unrestricted_subjects(&tree, &ptr("/"), &read()).is_empty());
        assert_eq!(partial_subjects(&tree, &ptr("/"), &read()), subjects(&["bob"]));
        assert_eq!(
            partial_subjects(&tree, &ptr("/features"), &read()),
            subjects(&["bob"])
        );
        // A sibling path sees nothing.
        assert!(partial_subjects(&tree, &ptr("/attributes"), &read()).is_empty());
    }

    #[test]
    fn test_direct_effected_ignores_ancestors() {
        let tree = tree_of(&[("alice", "thing:/", &["READ"], &[])]);
        let direct = direct_effected(&tree, &ptr("/attributes"), &read());
        assert!(direct.is_empty());
    }

    #[test]
    fn test_multi_permission_queries_require_all() {
        let tree = tree_of(&[
            ("alice", "thing:/", &["READ"], &[]),
            ("alice", "thing:/features", &["WRITE"], &[]),
        ]);
        let both = PermissionSet::of(["READ", "WRITE"]);
        // READ from root, WRITE only from /features downward.
        assert!(unrestricted_subjects(&tree, &ptr("/"), &both).is_empty());
        assert_eq!(
            unrestricted_subjects(&tree, &ptr("/features"), &both),
            subjects(&["alice"])
        );
        // Partial at root: READ covered on chain, WRITE covered below.
        assert_eq!(partial_subjects(&tree, &ptr("/"), &both), subjects(&["alice"]));
    }

    #[test]
    fn test_empty_permission_set_matches_nothing() {
        let tree = tree_of(&[("alice", "thing:/", &["READ"], &[])]);
        let none = PermissionSet::new();
        assert!(unrestricted_subjects(&tree, &ptr("/"), &none).is_empty());
        assert!(partial_subjects(&tree, &ptr("/"), &none).is_empty());
        assert!(direct_effected(&tree, &ptr("/"), &none).is_empty());
        assert_eq!(classify_subjects(&tree, &ptr("/"), &none), SubjectClassification::default());
    }

    #[test]
    fn test_classify_matches_individual_folds() {
        let tree = tree_of(&[
            ("alice", "thing:/", &["READ"], &[]),
            ("alice", "thing:/attributes/secret", &[], &["READ"]),
            ("bob", "thing:/features", &["READ"], &[]),
            ("carol", "thing:/", &[], &["READ"]),
        ]);
        for path in ["/", "/attributes", "/features", "/features/motor"] {
            let path = ptr(path);
            let classification = classify_subjects(&tree, &path, &read());
            let unrestricted = unrestricted_subjects(&tree, &path, &read());
            let partial = partial_subjects(&tree, &path, &read());
            let direct = direct_effected(&tree, &path, &read());

            assert_eq!(classification.unrestricted, unrestricted);
            assert_eq!(
                classification.partial_only,
                partial.difference(&unrestricted).cloned().collect()
            );
            assert_eq!(classification.effected_granted, direct.granted);
            // unrestricted ⊆ partial
            assert!(classification.unrestricted.is_subset(&classification.partial()));
        }
    }
}
