//! Update expression compilation.
//!
//! Assembles the partitioned diff into DynamoDB's update clause syntax:
//! `SET a = :x, …`, `REMOVE a, …`, `DELETE a :x, …`, concatenated in that
//! fixed order with the name/value placeholder maps collected along the way.
//!
//! The REMOVE clause enumerates leaves rather than parent collections. That
//! keeps emptied containers in place as `{}` / `[]`, so later updates can SET
//! into them without tripping the store's missing-path validation, and
//! readers can enumerate them without null checks.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use dynadiff_model::UpdateExpression;

use crate::alias::{AliasContext, alias_node};
use crate::diff::partitioned_diff;
use crate::error::ExpressionError;

/// Options for update expression compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Report every new deep leaf individually instead of collapsing new
    /// subtrees to their minimal root.
    pub orphans: bool,
    /// Speculatively route scalar-collection element deletions to the DELETE
    /// (set-element removal) clause.
    pub support_sets: bool,
}

/// Compile the diff between two documents into an update expression.
///
/// The alias context supplies the truncation counter (and optional alias
/// prefix) shared across every placeholder generated by this call; reuse one
/// context across multiple compilations to compose their output without
/// placeholder collisions.
///
/// # Errors
///
/// Returns [`ExpressionError::IdentifierTooLong`] if any attribute name
/// exceeds the identifier ceiling.
pub fn update_expression(
    original: &Value,
    modified: &Value,
    options: &UpdateOptions,
    ctx: &mut AliasContext,
) -> Result<UpdateExpression, ExpressionError> {
    let prefix = ctx.prefix().unwrap_or_default().to_owned();
    compile_with_prefix(original, modified, options, &prefix, ctx)
}

/// Compile with an explicit alias prefix, overriding the context's own.
///
/// The version lock builder compiles the update clause unprefixed while
/// reserving the context prefix for its condition aliases.
pub(crate) fn compile_with_prefix(
    original: &Value,
    modified: &Value,
    options: &UpdateOptions,
    prefix: &str,
    ctx: &mut AliasContext,
) -> Result<UpdateExpression, ExpressionError> {
    let parts = partitioned_diff(original, modified, options.orphans, options.support_sets);

    let mut names = BTreeMap::new();
    let mut values = BTreeMap::new();

    let mut set_items = Vec::with_capacity(parts.set.len());
    for node in &parts.set {
        let aliased = alias_node(node, prefix, &mut names, Some(&mut values), ctx)?;
        if let Some(value) = aliased.value {
            set_items.push(format!("{} = {value}", aliased.path));
        }
    }

    let mut remove_items = Vec::with_capacity(parts.remove.len());
    for node in &parts.remove {
        let aliased = alias_node(node, prefix, &mut names, None, ctx)?;
        remove_items.push(aliased.path);
    }

    let mut delete_items = Vec::with_capacity(parts.delete.len());
    for node in &parts.delete {
        let aliased = alias_node(node, prefix, &mut names, Some(&mut values), ctx)?;
        if let Some(value) = aliased.value {
            delete_items.push(format!("{} {value}", aliased.path));
        }
    }

    let mut clauses = Vec::new();
    if !set_items.is_empty() {
        clauses.push(format!("SET {}", set_items.join(", ")));
    }
    if !remove_items.is_empty() {
        clauses.push(format!("REMOVE {}", remove_items.join(", ")));
    }
    if !delete_items.is_empty() {
        clauses.push(format!("DELETE {}", delete_items.join(", ")));
    }

    debug!(
        sets = set_items.len(),
        removes = remove_items.len(),
        deletes = delete_items.len(),
        "compiled update expression"
    );

    Ok(UpdateExpression {
        update_expression: clauses.join(" "),
        expression_attribute_names: (!names.is_empty()).then_some(names),
        expression_attribute_values: (!values.is_empty()).then_some(values),
        condition_expression: None,
    })
}
