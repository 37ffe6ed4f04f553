//! Differential agreement suite for the two enforcement engines.
//!
//! The tree-based and trie-based engines implement one contract with
//! different structures; this suite generates random policies and
//! queries and holds them to identical answers for every operation. It
//! also checks the classification-consistency and construction-
//! idempotence properties on the same inputs.

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;

use twin_enforcer::{PolicyEnforcer, TreeBasedEnforcer, TrieBasedEnforcer};
use twin_model::{
    AuthorizationContext, EffectedPermissions, JsonPointer, PermissionSet, Policy, PolicyEntry,
    ResourceKey,
};

/// One generated declaration: subject, resource type, path segments,
/// granted tokens, revoked tokens.
type Decl = (String, String, Vec<String>, BTreeSet<String>, BTreeSet<String>);

/// One generated query: resource type, path segments, permissions,
/// context subjects.
type Query = (String, Vec<String>, BTreeSet<String>, BTreeSet<String>);

fn subjects() -> Vec<String> {
    ["alice", "bob", "carol"].map(String::from).to_vec()
}

fn permissions() -> Vec<String> {
    ["READ", "WRITE"].map(String::from).to_vec()
}

fn segments() -> Vec<String> {
    ["a", "b", "c"].map(String::from).to_vec()
}

fn types() -> Vec<String> {
    ["thing", "policy"].map(String::from).to_vec()
}

fn path_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(segments()), 0..=3)
}

fn decl_strategy() -> impl Strategy<Value = Decl> {
    (
        prop::sample::select(subjects()),
        prop::sample::select(types()),
        path_strategy(),
        prop::collection::btree_set(prop::sample::select(permissions()), 0..=2),
        prop::collection::btree_set(prop::sample::select(permissions()), 0..=2),
    )
}

fn query_strategy() -> impl Strategy<Value = Query> {
    (
        prop::sample::select(types()),
        // Queries may run deeper than any declaration.
        prop::collection::vec(prop::sample::select(segments()), 0..=4),
        prop::collection::btree_set(prop::sample::select(permissions()), 1..=2),
        prop::collection::btree_set(prop::sample::select(subjects()), 0..=2),
    )
}

fn build_policy(decls: &[Decl]) -> Policy {
    let entries: Vec<PolicyEntry> = decls
        .iter()
        .enumerate()
        .map(|(i, (subject, rtype, path, granted, revoked))| {
            PolicyEntry::new(
                format!("entry-{i}"),
                [subject.as_str()],
                [(
                    ResourceKey::new(rtype.as_str(), JsonPointer::of(path.clone())),
                    EffectedPermissions::new(
                        PermissionSet::of(granted.iter().cloned()),
                        PermissionSet::of(revoked.iter().cloned()),
                    ),
                )],
            )
            .unwrap()
        })
        .collect();
    Policy::new(entries)
}

/// A document whose field names overlap the generated path segments,
/// so views exercise grants, revokes and untouched branches alike.
fn sample_document() -> serde_json::Value {
    json!({
        "a": {"a": 1, "b": {"c": true}, "c": "leaf"},
        "b": [1, 2, 3],
        "c": {"b": {"a": null}}
    })
}

fn check_agreement(engines: &[&dyn PolicyEnforcer], query: &Query) {
    let (rtype, path, perms, ctx_subjects) = query;
    let key = ResourceKey::new(rtype.as_str(), JsonPointer::of(path.clone()));
    let perms = PermissionSet::of(perms.iter().cloned());
    let ctx = AuthorizationContext::of(ctx_subjects.iter().cloned());
    let document = sample_document();

    let reference = engines[0];
    let ref_unrestricted = reference.has_unrestricted_permissions(&key, &ctx, &perms);
    let ref_effective = reference.has_effective_permissions(&key, &ctx, &perms);
    let ref_partial = reference.has_partial_permissions(&key, &ctx, &perms);
    let ref_direct = reference.get_subject_ids_with_permission(&key, &perms);
    let ref_partial_ids = reference.get_subject_ids_with_partial_permission(&key, &perms);
    let ref_classification = reference.classify_subjects(&key, &perms);
    let ref_view = reference.build_json_view(&key, &document, &ctx, &perms);

    for engine in &engines[1..] {
        assert_eq!(
            engine.has_unrestricted_permissions(&key, &ctx, &perms),
            ref_unrestricted,
            "hasUnrestrictedPermissions disagree at {key}"
        );
        assert_eq!(
            engine.has_effective_permissions(&key, &ctx, &perms),
            ref_effective,
            "hasEffectivePermissions disagree at {key}"
        );
        assert_eq!(
            engine.has_partial_permissions(&key, &ctx, &perms),
            ref_partial,
            "hasPartialPermissions disagree at {key}"
        );
        assert_eq!(
            engine.get_subject_ids_with_permission(&key, &perms),
            ref_direct,
            "getSubjectIdsWithPermission disagree at {key}"
        );
        assert_eq!(
            engine.get_subject_ids_with_partial_permission(&key, &perms),
            ref_partial_ids,
            "getSubjectIdsWithPartialPermission disagree at {key}"
        );
        assert_eq!(
            engine.classify_subjects(&key, &perms),
            ref_classification,
            "classifySubjects disagree at {key}"
        );
        assert_eq!(
            engine.build_json_view(&key, &document, &ctx, &perms),
            ref_view,
            "buildJsonView disagree at {key}"
        );
    }

    // Classification consistency within the reference result.
    assert!(ref_classification
        .unrestricted
        .intersection(&ref_classification.partial_only)
        .next()
        .is_none());
    assert!(ref_classification
        .unrestricted
        .is_subset(&ref_classification.partial()));
    assert_eq!(ref_classification.partial(), ref_partial_ids);
    assert_eq!(ref_classification.effected_granted, ref_direct.granted);

    // The aggregate booleans match their defining sets.
    assert_eq!(
        ref_partial,
        ctx.iter().any(|s| ref_partial_ids.contains(s))
    );
    assert_eq!(
        ref_unrestricted,
        ctx.iter().any(|s| ref_classification.unrestricted.contains(s))
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn tree_and_trie_agree_on_every_operation(
        decls in prop::collection::vec(decl_strategy(), 0..=8),
        queries in prop::collection::vec(query_strategy(), 1..=8),
    ) {
        let policy = build_policy(&decls);
        let tree = TreeBasedEnforcer::new(&policy).unwrap();
        let trie = TrieBasedEnforcer::new(&policy).unwrap();

        // Same declaration multiset, reversed entry order: construction
        // must be order-independent.
        let mut reversed = decls.clone();
        reversed.reverse();
        let tree_reordered = TreeBasedEnforcer::new(&build_policy(&reversed)).unwrap();
        let trie_reordered = TrieBasedEnforcer::new(&build_policy(&reversed)).unwrap();

        let engines: [&dyn PolicyEnforcer; 4] = [&tree, &trie, &tree_reordered, &trie_reordered];
        for query in &queries {
            check_agreement(&engines, query);
        }
    }

    #[test]
    fn merge_with_self_is_identity_for_generated_documents(
        decls in prop::collection::vec(decl_strategy(), 0..=6),
        query in query_strategy(),
    ) {
        // Views are valid JSON documents; merging one with itself must
        // return it unchanged.
        let policy = build_policy(&decls);
        let tree = TreeBasedEnforcer::new(&policy).unwrap();
        let (rtype, path, perms, ctx_subjects) = &query;
        let key = ResourceKey::new(rtype.as_str(), JsonPointer::of(path.clone()));
        let perms = PermissionSet::of(perms.iter().cloned());
        let ctx = AuthorizationContext::of(ctx_subjects.iter().cloned());

        let view = tree.build_json_view(&key, &sample_document(), &ctx, &perms);
        prop_assert_eq!(twin_enforcer::merge_json(&view, &view), view);
    }
}
