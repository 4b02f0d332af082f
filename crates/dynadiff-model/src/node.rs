//! Document node and diff bucket types.
//!
//! A document is viewed as a flat, path-sorted list of [`Node`]s. The differ
//! classifies nodes into ADD / SET / DELETE buckets ([`DiffResult`]), which the
//! partitioner regroups into DynamoDB's SET / REMOVE / DELETE update clauses
//! ([`PartitionedDiff`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single (path, value) location in a document.
///
/// `path` is the canonical stringified access path from the document root,
/// e.g. `$.a.b[0]`, or `$["odd-name"]` for attribute names that are not plain
/// identifiers. Paths are unique within one document's node list and totally
/// ordered by byte-wise string comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical stringified path from the document root.
    pub path: String,
    /// The value at that path.
    pub value: Value,
}

impl Node {
    /// Create a node from a path and value.
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Canonical diff buckets produced by the tree differ.
///
/// `add` holds newly introduced subtree roots (or, in orphan mode, newly
/// introduced leaves only); `delete` holds leaves present in the original but
/// absent, nullified, or emptied in the modified document; `set` holds leaves
/// whose value changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Newly introduced nodes.
    pub add: Vec<Node>,
    /// Removed (or nullified / emptied) leaves.
    pub delete: Vec<Node>,
    /// Leaves whose value changed.
    pub set: Vec<Node>,
}

impl DiffResult {
    /// Returns `true` if no changes were detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty() && self.set.is_empty()
    }
}

/// Diff buckets regrouped into DynamoDB update clause groups.
///
/// `set` merges diff additions and updates; `remove` holds deletions expressed
/// as attribute/element removal; `delete` holds the subset of deletions
/// speculatively routed to set-element removal when set support is enabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedDiff {
    /// Nodes for the SET clause (additions and updates).
    pub set: Vec<Node>,
    /// Nodes for the REMOVE clause (map/list deletions).
    pub remove: Vec<Node>,
    /// Nodes for the DELETE clause (scalar-set element deletions).
    pub delete: Vec<Node>,
}

/// Merge-ready partial documents materialized from a diff, one per bucket.
///
/// Useful for logging a change set or re-applying it through a path setter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patches {
    /// Document containing only the added fields.
    pub add: Value,
    /// Document containing only the updated fields.
    pub set: Value,
    /// Document containing only the deleted fields (with their prior values).
    pub delete: Value,
}
