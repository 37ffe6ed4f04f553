//! # Twin Enforcer (Policy Enforcement Engines)
//!
//! This crate provides the policy enforcement core of the twin
//! platform: given an immutable [`Policy`](twin_model::Policy), it
//! builds an engine that decides which authenticated subjects may
//! read, write or administrate which sub-resources of a hierarchical,
//! JSON-Pointer-addressed resource tree, and that produces
//! permission-filtered views of JSON documents.
//!
//! ## Overview
//!
//! The twin-enforcer crate handles:
//! - **Resource tree**: per-type arena tree of merged declarations
//! - **Classification**: unrestricted / partial / directly-effected
//!   subject sets per query
//! - **Engines**: a memory-optimized tree walker and a
//!   throughput-optimized trie index behind one [`PolicyEnforcer`]
//!   trait
//! - **Views**: permission-filtered JSON projections and the
//!   depth-first document merger
//!
//! ## Architecture
//!
//! ```text
//! Policy ──build once──► TreeBasedEnforcer │ TrieBasedEnforcer
//!                          (pick per read/write ratio via OptimizationHint)
//!                               │
//!                               ▼  many concurrent pure queries
//!            bool / EffectedSubjectIds / subject sets / filtered JSON
//! ```
//!
//! One enforcer is built per policy version and shared across threads;
//! every query is a pure read. Invalidation on a policy change is the
//! caller's job: build a new enforcer, drop the old one.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use twin_enforcer::{build_enforcer, OptimizationHint, PolicyEnforcer};
//! use twin_model::{
//!     AuthorizationContext, EffectedPermissions, PermissionSet, Policy,
//!     PolicyEntry, ResourceKey,
//! };
//!
//! let policy = Policy::new([
//!     PolicyEntry::new(
//!         "owner",
//!         ["oidc:alice"],
//!         [(
//!             ResourceKey::parse("thing:/").unwrap(),
//!             EffectedPermissions::granted(PermissionSet::of(["READ"])),
//!         )],
//!     )
//!     .unwrap(),
//! ]);
//!
//! let enforcer = build_enforcer(&policy, OptimizationHint::default()).unwrap();
//! let ctx = AuthorizationContext::of(["oidc:alice"]);
//! let read = PermissionSet::of(["READ"]);
//!
//! let view = enforcer.build_json_view(
//!     &ResourceKey::parse("thing:/").unwrap(),
//!     &json!({"attributes": {"vin": "X1"}}),
//!     &ctx,
//!     &read,
//! );
//! assert_eq!(view, json!({"attributes": {"vin": "X1"}}));
//! ```

pub mod classify;
pub mod enforcer;
pub mod error;
pub mod tree;
pub mod tree_enforcer;
pub mod trie_enforcer;
pub mod view;

// Re-export main types for convenience
pub use enforcer::{build_enforcer, OptimizationHint, PolicyEnforcer};
pub use error::{EnforcerError, EnforcerResult};
pub use tree::{NodeIdx, ResourceTree, TreeNode};
pub use tree_enforcer::TreeBasedEnforcer;
pub use trie_enforcer::TrieBasedEnforcer;
pub use view::{merge_json, FieldWhitelist};
