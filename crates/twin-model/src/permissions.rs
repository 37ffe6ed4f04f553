//! # Permissions
//!
//! Permission tokens and sets for the authorization model. A permission
//! is an opaque named capability; the engine compares tokens for
//! equality and nothing else. The platform conventionally uses `READ`,
//! `WRITE` and `ADMINISTRATE`, but callers may declare any token.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A named capability checked against a resource.
///
/// # Example
///
/// ```
/// use twin_model::Permission;
///
/// let read = Permission::read();
/// assert_eq!(read.as_str(), "READ");
/// assert_eq!(read, Permission::new("READ"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Create a permission from any string-like token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The conventional `READ` permission.
    pub fn read() -> Self {
        Self::new("READ")
    }

    /// The conventional `WRITE` permission.
    pub fn write() -> Self {
        Self::new("WRITE")
    }

    /// The conventional `ADMINISTRATE` permission.
    pub fn administrate() -> Self {
        Self::new("ADMINISTRATE")
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An immutable-by-convention set of permission tokens.
///
/// Declarations and queries both carry permission sets; a query with
/// multiple permissions asks for **all** of them unless the operation
/// documents otherwise.
///
/// # Example
///
/// ```
/// use twin_model::{Permission, PermissionSet};
///
/// let set = PermissionSet::of([Permission::read(), Permission::write()]);
/// assert!(set.contains(&Permission::read()));
/// assert!(set.contains_all(&PermissionSet::of([Permission::read()])));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from any iterable of permission-like values.
    pub fn of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a permission to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Union another set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for permission in &other.permissions {
            self.permissions.insert(permission.clone());
        }
    }

    /// Check if the set contains a permission.
    pub fn contains(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Check if this set contains every permission of `other`.
    ///
    /// The empty `other` is contained vacuously; operations that must
    /// not treat "all of nothing" as a grant guard for emptiness before
    /// calling this.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        other.permissions.iter().all(|p| self.permissions.contains(p))
    }

    /// Check if this set shares at least one permission with `other`.
    pub fn intersects(&self, other: &PermissionSet) -> bool {
        other.permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Iterate over the permissions in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self::of(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_constants() {
        assert_eq!(Permission::read().as_str(), "READ");
        assert_eq!(Permission::write().as_str(), "WRITE");
        assert_eq!(Permission::administrate().as_str(), "ADMINISTRATE");
    }

    #[test]
    fn test_opaque_tokens_compare_by_equality() {
        assert_eq!(Permission::new("READ"), Permission::read());
        assert_ne!(Permission::new("read"), Permission::read());
    }

    #[test]
    fn test_set_contains_all() {
        let set = PermissionSet::of(["READ", "WRITE"]);
        assert!(set.contains_all(&PermissionSet::of(["READ"])));
        assert!(set.contains_all(&PermissionSet::of(["READ", "WRITE"])));
        assert!(!set.contains_all(&PermissionSet::of(["READ", "ADMINISTRATE"])));
    }

    #[test]
    fn test_set_contains_all_vacuous_on_empty() {
        let set = PermissionSet::of(["READ"]);
        assert!(set.contains_all(&PermissionSet::new()));
    }

    #[test]
    fn test_set_intersects() {
        let set = PermissionSet::of(["READ"]);
        assert!(set.intersects(&PermissionSet::of(["READ", "WRITE"])));
        assert!(!set.intersects(&PermissionSet::of(["WRITE"])));
        assert!(!set.intersects(&PermissionSet::new()));
    }

    #[test]
    fn test_set_merge() {
        let mut set = PermissionSet::of(["READ"]);
        set.merge(&PermissionSet::of(["WRITE"]));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Permission::write()));
    }
}
