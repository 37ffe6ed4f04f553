//! # Policy
//!
//! The immutable policy value the enforcement engines are built from.
//! A policy is a set of labeled entries, each associating a set of
//! subjects with per-resource-key granted/revoked permission sets.
//! Loading, persisting and validating raw policy documents is the job
//! of external collaborators; this model only represents the result.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::permissions::{Permission, PermissionSet};
use crate::resource::ResourceKey;
use crate::subjects::SubjectId;

/// The granted and revoked permission sets declared directly at one
/// (subject, resource key).
///
/// Revoke wins at the same node: a permission present in both sets is
/// treated as revoked there.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EffectedPermissions {
    /// Permissions granted at this node.
    pub granted: PermissionSet,
    /// Permissions revoked at this node.
    pub revoked: PermissionSet,
}

impl EffectedPermissions {
    /// Create from granted and revoked sets.
    pub fn new(granted: PermissionSet, revoked: PermissionSet) -> Self {
        Self { granted, revoked }
    }

    /// A declaration granting `permissions` and revoking nothing.
    pub fn granted(permissions: PermissionSet) -> Self {
        Self::new(permissions, PermissionSet::new())
    }

    /// A declaration revoking `permissions` and granting nothing.
    pub fn revoked(permissions: PermissionSet) -> Self {
        Self::new(PermissionSet::new(), permissions)
    }

    /// Union both sides of another declaration into this one.
    ///
    /// Used when multiple policy entries target the same subject and
    /// resource key; the merge is commutative and associative, so entry
    /// order never matters.
    pub fn merge(&mut self, other: &EffectedPermissions) {
        self.granted.merge(&other.granted);
        self.revoked.merge(&other.revoked);
    }

    /// Check whether a single permission is granted at this node,
    /// applying revoke-wins at equal depth.
    pub fn grants(&self, permission: &Permission) -> bool {
        self.granted.contains(permission) && !self.revoked.contains(permission)
    }

    /// Check whether every permission of a non-empty set is granted at
    /// this node (revoke-wins applied per permission).
    pub fn grants_all(&self, permissions: &PermissionSet) -> bool {
        !permissions.is_empty() && permissions.iter().all(|p| self.grants(p))
    }

    /// Check whether any permission of the set is revoked at this node.
    pub fn revokes_any(&self, permissions: &PermissionSet) -> bool {
        self.revoked.intersects(permissions)
    }

    /// Check if both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty() && self.revoked.is_empty()
    }
}

/// A policy entry's label.
///
/// Labels identify entries for the surrounding tooling (diagnostics,
/// policy editing); the engines themselves never interpret them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Label(String);

// The non-empty invariant also holds for deserialized labels.
impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

impl Label {
    /// Create a label.
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyLabel`] if the label is empty.
    pub fn new(label: impl Into<String>) -> ModelResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(ModelError::EmptyLabel);
        }
        Ok(Self(label))
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One labeled policy entry: a set of subjects and their declarations
/// per resource key.
///
/// # Example
///
/// ```
/// use twin_model::{
///     EffectedPermissions, PermissionSet, PolicyEntry, ResourceKey,
/// };
///
/// let entry = PolicyEntry::new(
///     "owner",
///     ["oidc:alice"],
///     [(
///         ResourceKey::parse("thing:/").unwrap(),
///         EffectedPermissions::granted(PermissionSet::of(["READ", "WRITE"])),
///     )],
/// )
/// .unwrap();
/// assert_eq!(entry.label().as_str(), "owner");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEntry {
    label: Label,
    subjects: BTreeSet<SubjectId>,
    resources: BTreeMap<ResourceKey, EffectedPermissions>,
}

impl PolicyEntry {
    /// Create a policy entry.
    ///
    /// # Arguments
    ///
    /// * `label` - non-empty entry label
    /// * `subjects` - the subjects this entry speaks for
    /// * `resources` - declarations per resource key
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyLabel`] if the label is empty.
    pub fn new<S, R>(
        label: impl Into<String>,
        subjects: impl IntoIterator<Item = S>,
        resources: impl IntoIterator<Item = R>,
    ) -> ModelResult<Self>
    where
        S: Into<SubjectId>,
        R: Into<(ResourceKey, EffectedPermissions)>,
    {
        Ok(Self {
            label: Label::new(label)?,
            subjects: subjects.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        })
    }

    /// Get the entry label.
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Get the subjects of this entry.
    pub fn subjects(&self) -> &BTreeSet<SubjectId> {
        &self.subjects
    }

    /// Get the per-resource-key declarations of this entry.
    pub fn resources(&self) -> &BTreeMap<ResourceKey, EffectedPermissions> {
        &self.resources
    }
}

/// An immutable set of policy entries.
///
/// Multiple entries may target the same subject and resource key; the
/// effective declaration is the union of all of them. Engines are built
/// once per policy version and never mutated; a new version requires a
/// brand-new build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Policy {
    entries: Vec<PolicyEntry>,
}

impl Policy {
    /// Create an empty policy (every query on it answers "no").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a policy from entries.
    pub fn new(entries: impl IntoIterator<Item = PolicyEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.iter()
    }

    /// Iterate over every (subject, resource key, declaration) triple
    /// across all entries, in entry order.
    pub fn triples(
        &self,
    ) -> impl Iterator<Item = (&SubjectId, &ResourceKey, &EffectedPermissions)> {
        self.entries.iter().flat_map(|entry| {
            entry.subjects().iter().flat_map(move |subject| {
                entry
                    .resources()
                    .iter()
                    .map(move |(key, effected)| (subject, key, effected))
            })
        })
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the policy has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PolicyEntry> for Policy {
    fn from_iter<T: IntoIterator<Item = PolicyEntry>>(iter: T) -> Self {
        Self::new(iter)
    }
}
