//! Error type for expression compilation.

use serde_json::Value;

/// Errors produced while compiling an update expression.
///
/// Every failure is a deterministic function of the input documents; there is
/// nothing to retry.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    /// An attribute name exceeds DynamoDB's identifier length ceiling.
    ///
    /// Not recoverable short of renaming the field.
    #[error("Attribute name [{name}] exceeds the DynamoDB limit of [{limit}] characters")]
    IdentifierTooLong {
        /// The offending attribute name.
        name: String,
        /// The identifier length ceiling.
        limit: usize,
    },
    /// Auto-increment was requested against a current version value that is
    /// neither absent nor numeric.
    #[error("Must specify an explicit new version for non-numeric current version [{value}]")]
    AmbiguousVersion {
        /// The non-numeric current version value.
        value: Value,
    },
    /// A document path string could not be parsed.
    #[error("Invalid document path [{path}]: {reason}")]
    InvalidPath {
        /// The malformed path.
        path: String,
        /// Explanation.
        reason: String,
    },
}
