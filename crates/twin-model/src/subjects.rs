//! # Subjects
//!
//! Authenticated identities receiving permission decisions, the
//! per-request authorization context, and the subject-set result types
//! returned by the enforcement engines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An authenticated identity (user, device, service).
///
/// Subject ids are opaque: the engine interprets nothing beyond
/// equality. Providers typically prefix them with an issuer, e.g.
/// `"oidc:alice"` or `"connection:bridge-01"`, but that structure is
/// the caller's business.
///
/// # Example
///
/// ```
/// use twin_model::SubjectId;
///
/// let subject = SubjectId::new("oidc:alice");
/// assert_eq!(subject.as_str(), "oidc:alice");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a subject id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The set of subjects an incoming request is authenticated as.
///
/// The surrounding middleware builds one context per request (e.g. from
/// validated token claims) and passes it to every enforcer query. A
/// context subject that never appears in the policy is simply absent
/// from every result set.
///
/// # Example
///
/// ```
/// use twin_model::{AuthorizationContext, SubjectId};
///
/// let ctx = AuthorizationContext::of(["oidc:alice", "group:engineers"]);
/// assert!(ctx.contains(&SubjectId::new("oidc:alice")));
/// assert_eq!(ctx.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AuthorizationContext {
    subjects: BTreeSet<SubjectId>,
}

impl AuthorizationContext {
    /// Create an empty context (matches nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from any iterable of subject-id-like values.
    pub fn of<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubjectId>,
    {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the context contains a subject.
    pub fn contains(&self, subject: &SubjectId) -> bool {
        self.subjects.contains(subject)
    }

    /// Check whether the context shares at least one subject with `set`.
    pub fn intersects(&self, set: &BTreeSet<SubjectId>) -> bool {
        self.subjects.iter().any(|s| set.contains(s))
    }

    /// Iterate over the subjects in the context.
    pub fn iter(&self) -> impl Iterator<Item = &SubjectId> {
        self.subjects.iter()
    }

    /// Get the number of subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Check if the context has no subjects.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<S: Into<SubjectId>> FromIterator<S> for AuthorizationContext {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::of(iter)
    }
}

/// Subjects directly granted or revoked at one resource node.
///
/// Result of the direct-declaration query: ancestors and descendants of
/// the queried key are not consulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EffectedSubjectIds {
    /// Subjects with all queried permissions granted exactly at the key.
    pub granted: BTreeSet<SubjectId>,
    /// Subjects with any queried permission revoked exactly at the key.
    pub revoked: BTreeSet<SubjectId>,
}

impl EffectedSubjectIds {
    /// Create a result with the given granted and revoked sets.
    pub fn new(granted: BTreeSet<SubjectId>, revoked: BTreeSet<SubjectId>) -> Self {
        Self { granted, revoked }
    }

    /// Check if both sets are empty.
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty() && self.revoked.is_empty()
    }
}

/// The three subject sets computed by one classification traversal.
///
/// Invariants maintained by the engines:
/// - `partial_only` is disjoint from `unrestricted`
/// - the full partial set is `unrestricted ∪ partial_only`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectClassification {
    /// Subjects whose grant holds at the key with no revoke anywhere in
    /// its subtree.
    pub unrestricted: BTreeSet<SubjectId>,
    /// Subjects granted somewhere at or below the key, minus the
    /// unrestricted ones.
    pub partial_only: BTreeSet<SubjectId>,
    /// Subjects granted directly at the key (equal to the `granted` side
    /// of the direct-declaration query).
    pub effected_granted: BTreeSet<SubjectId>,
}

impl SubjectClassification {
    /// The full partial set: `unrestricted ∪ partial_only`.
    pub fn partial(&self) -> BTreeSet<SubjectId> {
        self.unrestricted
            .union(&self.partial_only)
            .cloned()
            .collect()
    }
}
