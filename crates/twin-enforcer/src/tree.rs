//! # Resource Tree
//!
//! The immutable tree of resource nodes one resource type's
//! declarations are merged into. Nodes live in an arena and address
//! each other by index: each node stores its parent's index and a
//! segment-to-child-index map, giving O(1) parent walks without
//! reference cycles.
//!
//! A tree is built once per policy version and then shared read-only
//! across any number of concurrent queries.

use std::collections::BTreeMap;

use twin_model::{EffectedPermissions, JsonPointer, Policy, ResourceType, SubjectId};

/// Index of a node in the tree arena. The root is always index 0.
pub type NodeIdx = usize;

/// One node of the resource tree.
///
/// Holds the declarations made *exactly* at this node, one per subject
/// touching it. Ancestor and descendant declarations are reached
/// through the arena links.
#[derive(Debug, Clone)]
pub struct TreeNode {
    parent: Option<NodeIdx>,
    children: BTreeMap<String, NodeIdx>,
    subjects: BTreeMap<SubjectId, EffectedPermissions>,
}

impl TreeNode {
    fn new(parent: Option<NodeIdx>) -> Self {
        Self {
            parent,
            children: BTreeMap::new(),
            subjects: BTreeMap::new(),
        }
    }

    /// The parent node's index, or `None` for the root.
    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    /// The children of this node, keyed by path segment.
    pub fn children(&self) -> &BTreeMap<String, NodeIdx> {
        &self.children
    }

    /// The declarations made exactly at this node, per subject.
    pub fn subjects(&self) -> &BTreeMap<SubjectId, EffectedPermissions> {
        &self.subjects
    }
}

/// The immutable resource tree of one resource type.
///
/// Construction merges every (subject, resource key, declaration)
/// triple of the policy whose type matches: missing nodes are created
/// per path segment and declarations for the same subject and path are
/// unioned. The merge is commutative, so the same entry multiset in any
/// order produces a behaviorally identical tree.
#[derive(Debug, Clone)]
pub struct ResourceTree {
    nodes: Vec<TreeNode>,
}

impl ResourceTree {
    /// Build the tree for `resource_type` from a policy.
    pub fn build(policy: &Policy, resource_type: &ResourceType) -> Self {
        let mut tree = Self {
            nodes: vec![TreeNode::new(None)],
        };
        let mut declarations = 0usize;
        for (subject, key, effected) in policy.triples() {
            if key.resource_type() != resource_type {
                continue;
            }
            let idx = tree.ensure_path(key.path());
            tree.nodes[idx]
                .subjects
                .entry(subject.clone())
                .or_default()
                .merge(effected);
            declarations += 1;
        }
        tracing::debug!(
            resource_type = %resource_type,
            nodes = tree.nodes.len(),
            declarations,
            "built resource tree"
        );
        tree
    }

    /// Walk from the root along `path`, creating missing nodes, and
    /// return the terminal node's index.
    fn ensure_path(&mut self, path: &JsonPointer) -> NodeIdx {
        let mut current = 0;
        for segment in path.segments() {
            if let Some(&child) = self.nodes[current].children.get(segment) {
                current = child;
                continue;
            }
            let child = self.nodes.len();
            self.nodes.push(TreeNode::new(Some(current)));
            self.nodes[current].children.insert(segment.clone(), child);
            current = child;
        }
        current
    }

    /// Get a node by index.
    pub fn node(&self, idx: NodeIdx) -> &TreeNode {
        &self.nodes[idx]
    }

    /// The total number of nodes (at least 1: the root).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree carries no declarations at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].subjects.is_empty()
    }

    /// Resolve `path` to a node index, or `None` if the tree has no
    /// node there.
    pub fn node_at(&self, path: &JsonPointer) -> Option<NodeIdx> {
        let mut current = 0;
        for segment in path.segments() {
            current = *self.nodes[current].children.get(segment)?;
        }
        Some(current)
    }

    /// The indices of the existing nodes on the root-to-`path` chain,
    /// root first.
    ///
    /// The chain stops early where the tree has no deeper node; a
    /// declaration beyond the stored prefix cannot exist, so the
    /// truncated chain still carries every declaration relevant to the
    /// path.
    pub fn chain(&self, path: &JsonPointer) -> Vec<NodeIdx> {
        let mut chain = vec![0];
        let mut current = 0;
        for segment in path.segments() {
            match self.nodes[current].children.get(segment) {
                Some(&child) => {
                    chain.push(child);
                    current = child;
                }
                None => break,
            }
        }
        chain
    }

    /// The indices of every node strictly below `idx`, depth-first.
    pub fn descendants(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIdx> = self.nodes[idx].children.values().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node].children.values().copied());
        }
        out
    }
}
