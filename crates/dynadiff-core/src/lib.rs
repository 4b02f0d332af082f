//! Document diffing and DynamoDB update expression compilation.
//!
//! Dynadiff computes the minimal structural difference between two JSON
//! documents and compiles it into the expression language of DynamoDB's
//! partial-update API: an update clause, name/value placeholder maps, and —
//! for versioned updates — a conditional clause implementing optimistic
//! concurrency control. The pipeline is:
//!
//! 1. **Flattening**: each document becomes a path-sorted node list.
//! 2. **Diffing**: node lists are compared into ADD / SET / DELETE buckets.
//! 3. **Partitioning**: buckets regroup into the store's SET / REMOVE /
//!    DELETE update clauses.
//! 4. **Compilation**: every path segment and value is aliased behind
//!    placeholders and the clause strings are assembled.
//!
//! The whole pipeline is a pure, synchronous computation; the only mutable
//! state is the caller-owned [`AliasContext`].

pub mod alias;
pub mod diff;
pub mod error;
pub mod expression;
pub mod path;
pub mod tree;
pub mod version;

pub use alias::{AliasContext, MAX_IDENTIFIER_LEN};
pub use diff::{diff, partitioned_diff, patches};
pub use error::ExpressionError;
pub use expression::{UpdateOptions, update_expression};
pub use path::PathSegment;
pub use version::{
    DEFAULT_VERSION_PATH, VersionLockOptions, VersionOptions, version_lock_expression,
    versioned_update_expression,
};

pub use dynadiff_model::{
    ComparisonOperator, DiffResult, Node, PartitionedDiff, Patches, UpdateExpression,
};
