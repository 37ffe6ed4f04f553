//! # Twin Model (Authorization Policy Data Model)
//!
//! This crate provides the policy data model for the twin platform's
//! authorization core, shared by the enforcement engines and the
//! surrounding gateway and connectivity services.
//!
//! ## Overview
//!
//! The twin-model crate handles:
//! - **Subjects**: authenticated identities and per-request contexts
//! - **Permissions**: opaque capability tokens and sets of them
//! - **Pointers**: JSON-Pointer paths and their relative location
//! - **Resources**: typed resource keys addressing document nodes
//! - **Policy**: labeled entries binding subjects to per-key grants
//!   and revokes
//!
//! ## Architecture
//!
//! ```text
//! Policy = [ PolicyEntry ]
//! PolicyEntry = Label + { SubjectId } + { ResourceKey -> EffectedPermissions }
//! ResourceKey = ResourceType + JsonPointer
//! EffectedPermissions = granted PermissionSet + revoked PermissionSet
//! ```
//!
//! Everything here is an immutable value: a policy is built once per
//! version, handed to an enforcement engine, and shared freely across
//! threads. Query results ([`EffectedSubjectIds`],
//! [`SubjectClassification`]) are plain data too.
//!
//! ## Usage
//!
//! ```rust
//! use twin_model::{
//!     EffectedPermissions, PermissionSet, Policy, PolicyEntry, ResourceKey,
//! };
//!
//! let entry = PolicyEntry::new(
//!     "owner",
//!     ["oidc:alice"],
//!     [(
//!         ResourceKey::parse("thing:/").unwrap(),
//!         EffectedPermissions::granted(PermissionSet::of(["READ", "WRITE"])),
//!     )],
//! )
//! .unwrap();
//!
//! let policy = Policy::new([entry]);
//! assert_eq!(policy.len(), 1);
//! ```
//!
//! ## Integration with twin-enforcer
//!
//! The `twin-enforcer` crate consumes a [`Policy`] to build its tree- or
//! trie-based engine; the model crate carries no evaluation logic.

pub mod error;
pub mod permissions;
pub mod pointer;
pub mod policy;
pub mod resource;
pub mod subjects;

// Re-export main types for convenience
pub use error::{ModelError, ModelResult};
pub use permissions::{Permission, PermissionSet};
pub use pointer::{JsonPointer, PointerLocation};
pub use policy::{EffectedPermissions, Label, Policy, PolicyEntry};
pub use resource::{ResourceKey, ResourceType};
pub use subjects::{
    AuthorizationContext, EffectedSubjectIds, SubjectClassification, SubjectId,
};
