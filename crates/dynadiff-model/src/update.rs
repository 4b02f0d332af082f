//! Compiled update expression output and condition comparison operators.
//!
//! [`UpdateExpression`] is shaped to be passed straight into an `UpdateItem`
//! call: the JSON wire format uses DynamoDB's PascalCase member names, and the
//! placeholder maps are omitted entirely when empty (DynamoDB rejects unused
//! placeholder declarations).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A compiled update expression with its placeholder maps and optional
/// concurrency-guard condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateExpression {
    /// `SET … REMOVE … DELETE …` clause string; empty for a no-op diff.
    pub update_expression: String,
    /// Placeholder-to-attribute-name substitutions (`#alias` -> name).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expression_attribute_names: Option<BTreeMap<String, String>>,
    /// Placeholder-to-value substitutions (`:alias` -> value).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expression_attribute_values: Option<BTreeMap<String, Value>>,
    /// Conditional-update guard, present only for versioned expressions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition_expression: Option<String>,
}

impl UpdateExpression {
    /// Returns `true` if the update clause is empty (identical documents).
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.update_expression.is_empty()
    }
}

/// Binary comparison operators usable in a condition expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// Equal (`=`).
    #[default]
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl ComparisonOperator {
    /// The operator's expression syntax spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
