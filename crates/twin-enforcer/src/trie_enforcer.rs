//! # Trie-Based Enforcer
//!
//! The throughput-optimized engine. Construction flattens the policy
//! into one ordered index per (resource type, subject, permission):
//! the set of paths where the permission is granted and the set where
//! it is revoked. Paths order lexicographically by segment, so a
//! subtree is a contiguous range and "any declaration below" is a
//! bounded range scan rather than a tree walk.
//!
//! The index trades memory for lookup speed and must agree with the
//! tree engine on every query for every policy; the differential suite
//! in `tests/agreement_tests.rs` holds both engines to that.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use twin_model::{
    AuthorizationContext, EffectedSubjectIds, Permission, PermissionSet, Policy, ResourceKey,
    ResourceType, SubjectClassification, SubjectId,
};

use crate::enforcer::PolicyEnforcer;
use crate::error::EnforcerResult;

/// A path as an ordered segment vector. Lexicographic `Vec` order puts
/// every descendant of a path directly after it, which the range scans
/// rely on.
type PathKey = Vec<String>;

/// Grant and revoke points of one (subject, permission).
#[derive(Debug, Clone, Default)]
struct PermissionIndex {
    grant_points: BTreeSet<PathKey>,
    revoke_points: BTreeSet<PathKey>,
}

impl PermissionIndex {
    /// Decision of the closest declaration on the root-to-`path` chain:
    /// `Some(true)` grant, `Some(false)` revoke, `None` undeclared.
    /// Revoke wins when both sides are declared at the same node.
    fn closest_on_chain(&self, path: &[String]) -> Option<bool> {
        let mut decision = None;
        let mut prefix: PathKey = Vec::with_capacity(path.len());
        for depth in 0..=path.len() {
            if depth > 0 {
                prefix.push(path[depth - 1].clone());
            }
            if self.revoke_points.contains(&prefix) {
                decision = Some(false);
            } else if self.grant_points.contains(&prefix) {
                decision = Some(true);
            }
        }
        decision
    }

    /// Any grant point on the root-to-`path` chain, ignoring revokes.
    fn grant_on_chain(&self, path: &[String]) -> bool {
        let mut prefix: PathKey = Vec::with_capacity(path.len());
        if self.grant_points.contains(&prefix) {
            return true;
        }
        for segment in path {
            prefix.push(segment.clone());
            if self.grant_points.contains(&prefix) {
                return true;
            }
        }
        false
    }

    fn grant_below(&self, path: &[String]) -> bool {
        Self::any_below(&self.grant_points, path)
    }

    fn revoke_below(&self, path: &[String]) -> bool {
        Self::any_below(&self.revoke_points, path)
    }

    /// Whether `points` contains a path strictly below `path`. All
    /// descendants sort in one contiguous run right after the path
    /// itself, so the scan stops at the first non-descendant.
    fn any_below(points: &BTreeSet<PathKey>, path: &[String]) -> bool {
        points
            .range::<PathKey, _>((Bound::Excluded(&path.to_vec()), Bound::Unbounded))
            .take_while(|p| p.len() > path.len() && p[..path.len()] == *path)
            .next()
            .is_some()
    }

    fn granted_exactly(&self, path: &[String]) -> bool {
        self.grant_points.contains(path) && !self.revoke_points.contains(path)
    }

    fn revoked_exactly(&self, path: &[String]) -> bool {
        self.revoke_points.contains(path)
    }
}

/// All subjects' permission indexes of one resource type.
type TypeIndex = BTreeMap<SubjectId, BTreeMap<Permission, PermissionIndex>>;

/// Throughput-optimized policy enforcer over precomputed path indexes.
#[derive(Debug, Clone)]
pub struct TrieBasedEnforcer {
    index: BTreeMap<ResourceType, TypeIndex>,
}

impl TrieBasedEnforcer {
    /// Build the engine from a policy.
    pub fn new(policy: &Policy) -> EnforcerResult<Self> {
        let mut index: BTreeMap<ResourceType, TypeIndex> = BTreeMap::new();
        let mut points = 0usize;
        for (subject, key, effected) in policy.triples() {
            let path: PathKey = key.path().segments().to_vec();
            let per_subject = index
                .entry(key.resource_type().clone())
                .or_default()
                .entry(subject.clone())
                .or_default();
            for permission in effected.granted.iter() {
                per_subject
                    .entry(permission.clone())
                    .or_default()
                    .grant_points
                    .insert(path.clone());
                points += 1;
            }
            for permission in effected.revoked.iter() {
                per_subject
                    .entry(permission.clone())
                    .or_default()
                    .revoke_points
                    .insert(path.clone());
                points += 1;
            }
        }
        tracing::debug!(
            resource_types = index.len(),
            points,
            "built trie permission index"
        );
        Ok(Self { index })
    }

    fn type_index(&self, resource_type: &ResourceType) -> Option<&TypeIndex> {
        self.index.get(resource_type)
    }

    /// Per-subject predicates over the subject's permission indexes.
    fn subject_effective(
        indexes: &BTreeMap<Permission, PermissionIndex>,
        path: &[String],
        permissions: &PermissionSet,
    ) -> bool {
        permissions.iter().all(|p| {
            indexes
                .get(p)
                .and_then(|idx| idx.closest_on_chain(path))
                .unwrap_or(false)
        })
    }

    fn subject_revoked_below(
        indexes: &BTreeMap<Permission, PermissionIndex>,
        path: &[String],
        permissions: &PermissionSet,
    ) -> bool {
        permissions
            .iter()
            .any(|p| indexes.get(p).is_some_and(|idx| idx.revoke_below(path)))
    }

    fn subject_partial(
        indexes: &BTreeMap<Permission, PermissionIndex>,
        path: &[String],
        permissions: &PermissionSet,
    ) -> bool {
        permissions.iter().all(|p| {
            indexes
                .get(p)
                .is_some_and(|idx| idx.grant_on_chain(path) || idx.grant_below(path))
        })
    }
}

impl PolicyEnforcer for TrieBasedEnforcer {
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        if permissions.is_empty() {
            return false;
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return false;
        };
        let path = key.path().segments();
        context.iter().any(|subject| {
            type_index.get(subject).is_some_and(|indexes| {
                Self::subject_effective(indexes, path, permissions)
                    && !Self::subject_revoked_below(indexes, path, permissions)
            })
        })
    }

    fn has_effective_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        if permissions.is_empty() {
            return false;
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return false;
        };
        let path = key.path().segments();
        context.iter().any(|subject| {
            type_index
                .get(subject)
                .is_some_and(|indexes| Self::subject_effective(indexes, path, permissions))
        })
    }

    fn get_subject_ids_with_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> EffectedSubjectIds {
        let mut result = EffectedSubjectIds::default();
        if permissions.is_empty() {
            return result;
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return result;
        };
        let path = key.path().segments();
        for (subject, indexes) in type_index {
            let granted = permissions
                .iter()
                .all(|p| indexes.get(p).is_some_and(|idx| idx.granted_exactly(path)));
            if granted {
                result.granted.insert(subject.clone());
            }
            let revoked = permissions
                .iter()
                .any(|p| indexes.get(p).is_some_and(|idx| idx.revoked_exactly(path)));
            if revoked {
                result.revoked.insert(subject.clone());
            }
        }
        result
    }

    fn has_partial_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        // Per-subject lookups over the context instead of materializing
        // the full partial subject set of the type index.
        if permissions.is_empty() {
            return false;
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return false;
        };
        let path = key.path().segments();
        context.iter().any(|subject| {
            type_index
                .get(subject)
                .is_some_and(|indexes| Self::subject_partial(indexes, path, permissions))
        })
    }

    fn get_subject_ids_with_partial_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> BTreeSet<SubjectId> {
        if permissions.is_empty() {
            return BTreeSet::new();
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return BTreeSet::new();
        };
        let path = key.path().segments();
        type_index
            .iter()
            .filter(|(_, indexes)| Self::subject_partial(indexes, path, permissions))
            .map(|(subject, _)| subject.clone())
            .collect()
    }

    fn classify_subjects(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> SubjectClassification {
        let mut classification = SubjectClassification::default();
        if permissions.is_empty() {
            return classification;
        }
        let Some(type_index) = self.type_index(key.resource_type()) else {
            return classification;
        };
        let path = key.path().segments();
        for (subject, indexes) in type_index {
            let unrestricted = Self::subject_effective(indexes, path, permissions)
                && !Self::subject_revoked_below(indexes, path, permissions);
            if unrestricted {
                classification.unrestricted.insert(subject.clone());
            } else if Self::subject_partial(indexes, path, permissions) {
                classification.partial_only.insert(subject.clone());
            }
            let granted_exactly = permissions
                .iter()
                .all(|p| indexes.get(p).is_some_and(|idx| idx.granted_exactly(path)));
            if granted_exactly {
                classification.effected_granted.insert(subject.clone());
            }
        }
        classification
    }
}
