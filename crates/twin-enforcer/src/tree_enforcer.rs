//! # Tree-Based Enforcer
//!
//! The memory-optimized engine: one [`ResourceTree`] per resource type
//! present in the policy, storing exactly the declarations. Queries
//! walk the matching tree with the classification folds; a resource
//! type absent from the policy degrades to empty-set behavior.

use std::collections::{BTreeMap, BTreeSet};

use twin_model::{
    AuthorizationContext, EffectedSubjectIds, PermissionSet, Policy, ResourceKey, ResourceType,
    SubjectClassification, SubjectId,
};

use crate::classify;
use crate::enforcer::PolicyEnforcer;
use crate::error::EnforcerResult;
use crate::tree::ResourceTree;

/// Memory-optimized policy enforcer over per-type resource trees.
#[derive(Debug, Clone)]
pub struct TreeBasedEnforcer {
    trees: BTreeMap<ResourceType, ResourceTree>,
}

impl TreeBasedEnforcer {
    /// Build the engine from a policy.
    pub fn new(policy: &Policy) -> EnforcerResult<Self> {
        let types: BTreeSet<ResourceType> = policy
            .triples()
            .map(|(_, key, _)| key.resource_type().clone())
            .collect();
        let trees = types
            .into_iter()
            .map(|resource_type| {
                let tree = ResourceTree::build(policy, &resource_type);
                (resource_type, tree)
            })
            .collect();
        Ok(Self { trees })
    }

    fn tree(&self, resource_type: &ResourceType) -> Option<&ResourceTree> {
        self.trees.get(resource_type)
    }
}

impl PolicyEnforcer for TreeBasedEnforcer {
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        let Some(tree) = self.tree(key.resource_type()) else {
            return false;
        };
        let unrestricted = classify::unrestricted_subjects(tree, key.path(), permissions);
        context.iter().any(|subject| unrestricted.contains(subject))
    }

    fn has_effective_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        let Some(tree) = self.tree(key.resource_type()) else {
            return false;
        };
        let effective = classify::effective_subjects(tree, key.path(), permissions);
        context.iter().any(|subject| effective.contains(subject))
    }

    fn get_subject_ids_with_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> EffectedSubjectIds {
        match self.tree(key.resource_type()) {
            Some(tree) => classify::direct_effected(tree, key.path(), permissions),
            None => EffectedSubjectIds::default(),
        }
    }

    fn get_subject_ids_with_partial_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> BTreeSet<SubjectId> {
        match self.tree(key.resource_type()) {
            Some(tree) => classify::partial_subjects(tree, key.path(), permissions),
            None => BTreeSet::new(),
        }
    }

    fn classify_subjects(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> SubjectClassification {
        match self.tree(key.resource_type()) {
            Some(tree) => classify::classify_subjects(tree, key.path(), permissions),
            None => SubjectClassification::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_model::{EffectedPermissions, PolicyEntry};

    fn sample_policy() -> Policy {
        Policy::new([
            PolicyEntry::new(
                "owner",
                ["alice"],
                [(
                    ResourceKey::parse("thing:/").unwrap(),
                    EffectedPermissions::granted(PermissionSet::of(["READ", "WRITE"])),
                )],
            )
            .unwrap(),
            PolicyEntry::new(
                "secrecy",
                ["alice"],
                [(
                    ResourceKey::parse("thing:/attributes/secret").unwrap(),
                    EffectedPermissions::revoked(PermissionSet::of(["READ"])),
                )],
            )
            .unwrap(),
        ])
    }

    fn read() -> PermissionSet {
        PermissionSet::of(["READ"])
    }

    #[test]
    fn test_unknown_resource_type_is_empty_behavior() {
        let enforcer = TreeBasedEnforcer::new(&sample_policy()).unwrap();
        let ctx = AuthorizationContext::of(["alice"]);
        let key = ResourceKey::parse("message:/inbox").unwrap();

        assert!(!enforcer.has_unrestricted_permissions(&key, &ctx, &read()));
        assert!(!enforcer.has_partial_permissions(&key, &ctx, &read()));
        assert!(enforcer.get_subject_ids_with_permission(&key, &read()).is_empty());
        assert!(enforcer
            .get_subject_ids_with_partial_permission(&key, &read())
            .is_empty());
    }

    #[test]
    fn test_deep_revoke_blocks_unrestricted_at_root() {
        let enforcer = TreeBasedEnforcer::new(&sample_policy()).unwrap();
        let ctx = AuthorizationContext::of(["alice"]);
        let root = ResourceKey::parse("thing:/").unwrap();

        assert!(!enforcer.has_unrestricted_permissions(&root, &ctx, &read()));
        assert!(enforcer.has_partial_permissions(&root, &ctx, &read()));
        // WRITE is untouched by the revoke.
        assert!(enforcer.has_unrestricted_permissions(
            &root,
            &ctx,
            &PermissionSet::of(["WRITE"])
        ));
    }

    #[test]
    fn test_unknown_subject_is_absent_not_an_error() {
        let enforcer = TreeBasedEnforcer::new(&sample_policy()).unwrap();
        let stranger = AuthorizationContext::of(["mallory"]);
        let root = ResourceKey::parse("thing:/").unwrap();

        assert!(!enforcer.has_unrestricted_permissions(&root, &stranger, &read()));
        assert!(!enforcer.has_partial_permissions(&root, &stranger, &read()));
    }
}
