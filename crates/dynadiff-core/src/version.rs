//! Optimistic concurrency guards layered on compiled update expressions.
//!
//! A versioned update compares a designated field (a version counter, a
//! timestamp, a range marker) against an expected value in a
//! `ConditionExpression`, so the store rejects the write when another writer
//! got there first. When the field does not exist yet, the guard degrades to
//! `attribute_not_exists`, letting one call serve both as the initial
//! "create" guard and as the subsequent compare-and-swap guard. The lock
//! builder on top auto-increments a numeric version counter without requiring
//! a prior read in the common lock-on-first-write case.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tracing::debug;

use dynadiff_model::{ComparisonOperator, Node, UpdateExpression};

use crate::alias::{AliasContext, alias_node};
use crate::error::ExpressionError;
use crate::expression::{UpdateOptions, compile_with_prefix};
use crate::path;

/// Default root-relative path of the version field.
pub const DEFAULT_VERSION_PATH: &str = "$.version";

/// Options for versioned update expression compilation.
#[derive(Debug, Clone)]
pub struct VersionOptions {
    /// Root-relative path of the version field.
    pub version_path: String,
    /// Compare against the current (pre-update) value; `false` compares
    /// against the new (post-update) value.
    pub use_current: bool,
    /// Explicit current version, overriding the lookup in the original
    /// document.
    pub current_version: Option<Value>,
    /// Comparison operator for the condition.
    pub condition: ComparisonOperator,
    /// Diff orphan mode for the update clause.
    pub orphans: bool,
}

impl Default for VersionOptions {
    fn default() -> Self {
        Self {
            version_path: DEFAULT_VERSION_PATH.to_owned(),
            use_current: true,
            current_version: None,
            condition: ComparisonOperator::Eq,
            orphans: false,
        }
    }
}

/// Options for version lock expression compilation.
#[derive(Debug, Clone)]
pub struct VersionLockOptions {
    /// Root-relative path of the version field.
    pub version_path: String,
    /// Explicit target version; when absent, the current numeric value is
    /// incremented (defaulting to `1` when there is no current value).
    pub new_version: Option<Value>,
    /// Comparison operator for the condition.
    pub condition: ComparisonOperator,
    /// Diff orphan mode for the update clause.
    pub orphans: bool,
}

impl Default for VersionLockOptions {
    fn default() -> Self {
        Self {
            version_path: DEFAULT_VERSION_PATH.to_owned(),
            new_version: None,
            condition: ComparisonOperator::Eq,
            orphans: false,
        }
    }
}

/// The condition fragment merged onto a compiled update expression.
#[derive(Debug)]
struct ConditionPart {
    expression: String,
    names: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

/// Compile an update expression guarded by a version condition.
///
/// The update clause is compiled over the full documents (the version field's
/// own change included, unprefixed); the condition aliases the version path
/// under the context prefix, defaulting to `expected`, so the guard's
/// placeholders never collide with the update's own.
///
/// # Errors
///
/// Returns [`ExpressionError::InvalidPath`] for a malformed version path and
/// [`ExpressionError::IdentifierTooLong`] for oversized attribute names.
pub fn versioned_update_expression(
    original: &Value,
    modified: &Value,
    options: &VersionOptions,
    ctx: &mut AliasContext,
) -> Result<UpdateExpression, ExpressionError> {
    let update_options = UpdateOptions {
        orphans: options.orphans,
        support_sets: false,
    };
    let mut update = compile_with_prefix(original, modified, &update_options, "", ctx)?;

    let segments = path::parse(&options.version_path)?;
    let current = match &options.current_version {
        Some(value) => Some(value.clone()),
        None => path::value_at(original, &segments).cloned(),
    };
    let new = path::value_at(modified, &segments).cloned();

    let condition = version_condition(
        &options.version_path,
        current.as_ref(),
        new.as_ref(),
        options.use_current,
        options.condition,
        ctx,
    )?;
    merge_condition(&mut update, condition);
    Ok(update)
}

/// Compile a lock expression over the version field alone.
///
/// Without an explicit `new_version`, the current numeric value is
/// incremented by one, or the version starts at `1` when no current value
/// exists — in which case the guard is `attribute_not_exists`, claiming the
/// field on first write. With an explicit `new_version`, the stored value is
/// compared against that target using the configured operator, which
/// implements try-lock semantics over arbitrary ordered fields (range
/// markers, expiry timestamps) without a prior read.
///
/// # Errors
///
/// Returns [`ExpressionError::AmbiguousVersion`] if auto-increment meets a
/// present non-numeric value, and [`ExpressionError::InvalidPath`] for a
/// malformed version path.
pub fn version_lock_expression(
    original: Option<&Value>,
    options: &VersionLockOptions,
) -> Result<UpdateExpression, ExpressionError> {
    let segments = path::parse(&options.version_path)?;

    // With no original document at all, an explicit target is still compared
    // against the stored value; only a present-but-missing field downgrades
    // the guard to attribute_not_exists.
    let mut current: Option<Value> = match original {
        Some(doc) => path::value_at(doc, &segments).cloned(),
        None => Some(Value::Null),
    };

    let new_version = match &options.new_version {
        Some(value) => value.clone(),
        None => match &current {
            None | Some(Value::Null) => {
                // Auto versioning starts at 1; dropping the current value
                // turns the guard into attribute_not_exists.
                current = None;
                Value::from(1)
            }
            Some(Value::Number(n)) => increment(n)?,
            Some(other) => {
                return Err(ExpressionError::AmbiguousVersion {
                    value: other.clone(),
                });
            }
        },
    };

    let mut original_doc = Value::Object(Map::new());
    if let Some(value) = &current {
        path::set_value(&mut original_doc, &segments, value.clone());
    }
    let mut modified_doc = Value::Object(Map::new());
    path::set_value(&mut modified_doc, &segments, new_version);

    versioned_update_expression(
        &original_doc,
        &modified_doc,
        &VersionOptions {
            version_path: options.version_path.clone(),
            use_current: options.new_version.is_none(),
            current_version: current,
            condition: options.condition,
            orphans: options.orphans,
        },
        &mut AliasContext::new(),
    )
}

fn increment(n: &Number) -> Result<Value, ExpressionError> {
    let next = if let Some(i) = n.as_i64() {
        i.checked_add(1).map(Value::from)
    } else if let Some(u) = n.as_u64() {
        u.checked_add(1).map(Value::from)
    } else {
        n.as_f64()
            .and_then(|f| Number::from_f64(f + 1.0))
            .map(Value::Number)
    };
    next.ok_or_else(|| ExpressionError::AmbiguousVersion {
        value: Value::Number(n.clone()),
    })
}

fn version_condition(
    version_path: &str,
    current: Option<&Value>,
    new: Option<&Value>,
    use_current: bool,
    condition: ComparisonOperator,
    ctx: &mut AliasContext,
) -> Result<ConditionPart, ExpressionError> {
    let prefix = ctx.prefix().unwrap_or("expected").to_owned();
    let expected = if use_current { current } else { new };

    let mut names = BTreeMap::new();
    let mut values = BTreeMap::new();

    let node = Node::new(
        version_path,
        expected.cloned().unwrap_or(Value::Null),
    );
    let registry = if expected.is_some() {
        Some(&mut values)
    } else {
        None
    };
    let aliased = alias_node(&node, &prefix, &mut names, registry, ctx)?;

    let expression = match (current, aliased.value) {
        (Some(_), Some(token)) => {
            debug!(version_path, %condition, "comparison version guard");
            format!("{} {condition} {token}", aliased.path)
        }
        _ => {
            // No stored value to compare against (or nothing to compare it
            // to): guard on the field not existing yet.
            values.clear();
            debug!(version_path, "attribute-existence version guard");
            format!("attribute_not_exists ({})", aliased.path)
        }
    };

    Ok(ConditionPart {
        expression,
        names,
        values,
    })
}

fn merge_condition(update: &mut UpdateExpression, condition: ConditionPart) {
    if !condition.names.is_empty() {
        update
            .expression_attribute_names
            .get_or_insert_with(BTreeMap::new)
            .extend(condition.names);
    }
    if !condition.values.is_empty() {
        update
            .expression_attribute_values
            .get_or_insert_with(BTreeMap::new)
            .extend(condition.values);
    }
    update.condition_expression = Some(condition.expression);
}
