//! # Policy Enforcer Contract
//!
//! The query contract both engines implement, and the factory that
//! builds one from a policy. Every operation is a pure read over
//! structures frozen at construction time, so one enforcer instance can
//! serve any number of concurrent queries without synchronization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use twin_model::{
    AuthorizationContext, EffectedSubjectIds, PermissionSet, Policy, ResourceKey,
    SubjectClassification, SubjectId,
};

use crate::error::EnforcerResult;
use crate::tree_enforcer::TreeBasedEnforcer;
use crate::trie_enforcer::TrieBasedEnforcer;
use crate::view::{self, FieldWhitelist};

/// Space/time trade-off a caller picks when building an enforcer.
///
/// Both engines satisfy the identical query contract; the hint only
/// selects the structure behind it. Pick [`Memory`](Self::Memory) for
/// write-heavy or memory-tight deployments,
/// [`Throughput`](Self::Throughput) for read-heavy request serving.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationHint {
    /// Store just the declarations; queries walk the tree.
    Memory,
    /// Precompute per-subject/permission indexes; queries do prefix
    /// lookups.
    #[default]
    Throughput,
}

/// The permission query contract over one immutable policy version.
///
/// Implementations are thread-safe by construction: no operation
/// blocks, suspends, retries or performs I/O, and "no permission" is a
/// normal result, never an error.
///
/// # Example
///
/// ```
/// use twin_enforcer::{build_enforcer, OptimizationHint, PolicyEnforcer};
/// use twin_model::{
///     AuthorizationContext, EffectedPermissions, PermissionSet, Policy,
///     PolicyEntry, ResourceKey,
/// };
///
/// let policy = Policy::new([PolicyEntry::new(
///     "owner",
///     ["oidc:alice"],
///     [(
///         ResourceKey::parse("thing:/").unwrap(),
///         EffectedPermissions::granted(PermissionSet::of(["READ"])),
///     )],
/// )
/// .unwrap()]);
///
/// let enforcer = build_enforcer(&policy, OptimizationHint::Throughput).unwrap();
/// let ctx = AuthorizationContext::of(["oidc:alice"]);
/// let key = ResourceKey::parse("thing:/features").unwrap();
/// assert!(enforcer.has_unrestricted_permissions(&key, &ctx, &PermissionSet::of(["READ"])));
/// ```
pub trait PolicyEnforcer: Send + Sync {
    /// Check whether at least one context subject is unrestricted for
    /// `permissions` at `key`: granted there (directly or inherited
    /// from the closest declaring ancestor, revoke wins at equal
    /// depth), with no revoke of any queried permission anywhere
    /// strictly below the key.
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool;

    /// Check whether at least one context subject holds `permissions`
    /// effectively at the exact key: the single-path half of
    /// "unrestricted", ignoring everything below the key. This is the
    /// per-field test the JSON view builder runs.
    fn has_effective_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool;

    /// Subjects directly granted all / revoked any of `permissions`
    /// exactly at `key`. Ancestors and descendants are not consulted.
    fn get_subject_ids_with_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> EffectedSubjectIds;

    /// Subjects granted all `permissions` at `key` or anywhere below
    /// it, ignoring all revokes.
    fn get_subject_ids_with_partial_permission(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> BTreeSet<SubjectId>;

    /// Check whether the context intersects the partial set at `key`.
    fn has_partial_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> bool {
        let partial = self.get_subject_ids_with_partial_permission(key, permissions);
        context.iter().any(|subject| partial.contains(subject))
    }

    /// Compute the unrestricted, partial-only and directly-granted
    /// subject sets for one query in a single traversal.
    fn classify_subjects(
        &self,
        key: &ResourceKey,
        permissions: &PermissionSet,
    ) -> SubjectClassification;

    /// Build the permission-filtered view of a JSON document rooted at
    /// `key`: a leaf field survives iff the context holds an effective
    /// grant at the field's sub-path; nested objects are filtered
    /// recursively and dropped when nothing inside survives.
    fn build_json_view(
        &self,
        key: &ResourceKey,
        fields: &Value,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
    ) -> Value {
        view::build_view(self, key, fields, context, permissions, None)
    }

    /// Like [`build_json_view`](Self::build_json_view), but
    /// force-includes white-listed fields. The whitelist only applies
    /// when the context has partial standing at the resource type's
    /// root; a context with no standing in the policy at all never
    /// sees white-listed fields.
    fn build_json_view_with_whitelist(
        &self,
        key: &ResourceKey,
        fields: &Value,
        context: &AuthorizationContext,
        permissions: &PermissionSet,
        whitelist: &FieldWhitelist,
    ) -> Value {
        view::build_view(self, key, fields, context, permissions, Some(whitelist))
    }
}

/// Build an enforcer for a policy, choosing the engine by hint.
///
/// Plain factory function, no process-wide state. Construction is a
/// one-time synchronous computation proportional to the declaration
/// count; the instance is immutable afterwards and meant to be reused
/// for the policy version's whole lifetime.
///
/// # Errors
///
/// Fails fast when the policy violates a construction precondition; a
/// failed build yields no usable instance.
pub fn build_enforcer(
    policy: &Policy,
    hint: OptimizationHint,
) -> EnforcerResult<Box<dyn PolicyEnforcer>> {
    let enforcer: Box<dyn PolicyEnforcer> = match hint {
        OptimizationHint::Memory => Box::new(TreeBasedEnforcer::new(policy)?),
        OptimizationHint::Throughput => Box::new(TrieBasedEnforcer::new(policy)?),
    };
    Ok(enforcer)
}
