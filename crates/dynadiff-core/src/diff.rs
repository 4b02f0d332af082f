//! Tree differ and clause partitioner.
//!
//! Compares two documents as flat node lists and classifies every change as
//! an addition, an update, or a deletion. Deletion follows the
//! index-preserving protocol: a list element is deleted by nullifying it (or
//! emptying it, for strings) in the modified document, never by splicing it
//! out, so sibling indices stay aligned with the stored item. The differ
//! accordingly treats a nulled or emptied leaf as a deletion request, not as
//! an update to null.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use dynadiff_model::{DiffResult, Node, PartitionedDiff, Patches};

use crate::error::ExpressionError;
use crate::path;
use crate::tree::{all_nodes, ancestor_nodes, leaf_nodes};

/// Original had a defined non-null value and modified nulled it out.
fn nullified(original: &Node, modified: &Node) -> bool {
    !original.value.is_null() && modified.value.is_null()
}

/// Original was a non-empty string (or non-string) and modified emptied it.
fn emptied(original: &Node, modified: &Node) -> bool {
    original.value.as_str() != Some("") && modified.value.as_str() == Some("")
}

/// Compute the structural diff between two documents.
///
/// With `orphans = false`, a newly introduced branch collapses to its minimal
/// subtree root, carrying the whole subtree as one value. With
/// `orphans = true`, every new deep leaf is reported individually, which suits
/// callers re-applying the diff through a path setter that auto-vivifies
/// intermediate containers.
#[must_use]
pub fn diff(original: &Value, modified: &Value, orphans: bool) -> DiffResult {
    let original_nodes = all_nodes(original);
    let modified_nodes = all_nodes(modified);

    let original_leaves = leaf_nodes(&original_nodes);
    let modified_leaves = leaf_nodes(&modified_nodes);

    let add = if orphans {
        let original_leaf_paths: HashSet<&str> = original_leaves
            .iter()
            .map(|node| node.path.as_str())
            .collect();
        modified_leaves
            .iter()
            .filter(|node| !original_leaf_paths.contains(node.path.as_str()))
            .cloned()
            .collect()
    } else {
        let original_paths: HashSet<&str> = original_nodes
            .iter()
            .map(|node| node.path.as_str())
            .collect();
        let candidates: Vec<Node> = modified_nodes
            .iter()
            .filter(|node| !original_paths.contains(node.path.as_str()))
            .cloned()
            .collect();
        ancestor_nodes(candidates)
    };

    let modified_by_path: HashMap<&str, &Node> = modified_nodes
        .iter()
        .map(|node| (node.path.as_str(), node))
        .collect();

    // A leaf counts as removed when it has no live counterpart in the
    // modified document: the path vanished, or the remaining value signals
    // deletion via the nullified/emptied protocol.
    let delete: Vec<Node> = original_leaves
        .iter()
        .filter(|node| match modified_by_path.get(node.path.as_str()) {
            Some(counterpart) => nullified(node, counterpart) || emptied(node, counterpart),
            None => true,
        })
        .cloned()
        .collect();

    let original_leaf_by_path: HashMap<&str, &Node> = original_leaves
        .iter()
        .map(|node| (node.path.as_str(), node))
        .collect();

    let set: Vec<Node> = modified_leaves
        .iter()
        .filter(
            |node| match original_leaf_by_path.get(node.path.as_str()) {
                Some(counterpart) => {
                    node.value != counterpart.value
                        && !nullified(counterpart, node)
                        && !emptied(counterpart, node)
                }
                None => false,
            },
        )
        .cloned()
        .collect();

    debug!(
        added = add.len(),
        deleted = delete.len(),
        updated = set.len(),
        orphans,
        "computed document diff"
    );

    DiffResult { add, delete, set }
}

/// Regroup a diff into DynamoDB update clause buckets.
///
/// Additions and updates merge into SET. Deletions go to REMOVE, except that
/// with `support_sets = true`, deletions whose path ends in a numeric
/// subscript and whose original value is a number or string are speculatively
/// routed to DELETE (set-element removal). The routing is a best-effort
/// heuristic: it never consults the store's actual attribute type, so a plain
/// list of numbers is indistinguishable from a number set here.
#[must_use]
pub fn partitioned_diff(
    original: &Value,
    modified: &Value,
    orphans: bool,
    support_sets: bool,
) -> PartitionedDiff {
    let DiffResult { add, delete, set } = diff(original, modified, orphans);

    let mut merged_set = add;
    merged_set.extend(set);

    let (delete, remove) = if support_sets {
        delete.into_iter().partition(|node| {
            path::ends_with_index(&node.path)
                && (node.value.is_number() || node.value.is_string())
        })
    } else {
        (Vec::new(), delete)
    };

    PartitionedDiff {
        set: merged_set,
        remove,
        delete,
    }
}

/// Materialize a diff as three merge-ready partial documents, one per bucket.
///
/// # Errors
///
/// Returns [`ExpressionError::InvalidPath`] only if a node path fails to
/// parse, which cannot happen for paths produced by the flattener.
pub fn patches(original: &Value, modified: &Value, orphans: bool) -> Result<Patches, ExpressionError> {
    let DiffResult { add, delete, set } = diff(original, modified, orphans);

    let materialize = |nodes: Vec<Node>| -> Result<Value, ExpressionError> {
        let mut doc = Value::Object(serde_json::Map::new());
        for node in nodes {
            let segments = path::parse(&node.path)?;
            path::set_value(&mut doc, &segments, node.value);
        }
        Ok(doc)
    };

    Ok(Patches {
        add: materialize(add)?,
        set: materialize(set)?,
        delete: materialize(delete)?,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_diff_identical_documents_to_empty() {
        let doc = json!({"a": {"b": [1, 2]}, "c": null});
        assert!(diff(&doc, &doc, false).is_empty());
        assert!(diff(&doc, &doc, true).is_empty());
    }

    #[test]
    fn test_should_collapse_new_subtree_to_root() {
        let original = json!({});
        let modified = json!({"a": {"b": {"c": 1}}});
        let result = diff(&original, &modified, false);
        assert_eq!(result.add.len(), 1);
        assert_eq!(result.add[0].path, "$.a");
        assert_eq!(result.add[0].value, json!({"b": {"c": 1}}));
    }

    #[test]
    fn test_should_report_new_deep_leaves_in_orphan_mode() {
        let original = json!({});
        let modified = json!({"a": {"b": {"c": 1}}});
        let result = diff(&original, &modified, true);
        assert_eq!(result.add.len(), 1);
        assert_eq!(result.add[0].path, "$.a.b.c");
        assert_eq!(result.add[0].value, json!(1));
    }

    #[test]
    fn test_should_treat_nullified_list_element_as_deletion() {
        let original = json!({"color": ["Red", "Black"]});
        let modified = json!({"color": ["Red", null]});
        let result = diff(&original, &modified, false);
        assert!(result.add.is_empty());
        assert!(result.set.is_empty());
        assert_eq!(result.delete.len(), 1);
        assert_eq!(result.delete[0].path, "$.color[1]");
        assert_eq!(result.delete[0].value, json!("Black"));
    }

    #[test]
    fn test_should_treat_emptied_string_as_deletion() {
        let original = json!({"comment": "text"});
        let modified = json!({"comment": ""});
        let result = diff(&original, &modified, false);
        assert!(result.set.is_empty());
        assert_eq!(result.delete.len(), 1);
        assert_eq!(result.delete[0].path, "$.comment");
    }

    #[test]
    fn test_should_treat_missing_key_as_deletion() {
        let original = json!({"keep": 1, "drop": {"deep": 2}});
        let modified = json!({"keep": 1});
        let result = diff(&original, &modified, false);
        let paths: Vec<&str> = result.delete.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.drop.deep"]);
    }

    #[test]
    fn test_should_report_changed_leaf_as_update() {
        let original = json!({"price": 500, "quantity": null});
        let modified = json!({"price": 600, "quantity": 3});
        let result = diff(&original, &modified, false);
        assert!(result.delete.is_empty());
        let paths: Vec<&str> = result.set.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.price", "$.quantity"]);
    }

    #[test]
    fn test_should_not_report_unchanged_null_leaf() {
        let original = json!({"quantity": null});
        let modified = json!({"quantity": null});
        assert!(diff(&original, &modified, false).is_empty());
    }

    #[test]
    fn test_should_merge_additions_and_updates_into_set_bucket() {
        let original = json!({"a": 1});
        let modified = json!({"a": 2, "b": 3});
        let parts = partitioned_diff(&original, &modified, false, false);
        let paths: Vec<&str> = parts.set.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.b", "$.a"]);
        assert!(parts.remove.is_empty());
        assert!(parts.delete.is_empty());
    }

    #[test]
    fn test_should_route_scalar_subscript_deletions_to_delete_bucket() {
        let original = json!({"tags": ["a", "b"], "meta": {"x": 1}});
        let modified = json!({"tags": ["a", null], "meta": {}});
        let parts = partitioned_diff(&original, &modified, false, true);
        let delete_paths: Vec<&str> = parts.delete.iter().map(|n| n.path.as_str()).collect();
        let remove_paths: Vec<&str> = parts.remove.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(delete_paths, vec!["$.tags[1]"]);
        assert_eq!(remove_paths, vec!["$.meta.x"]);
    }

    #[test]
    fn test_should_keep_all_deletions_in_remove_bucket_by_default() {
        let original = json!({"tags": ["a", "b"]});
        let modified = json!({"tags": ["a", null]});
        let parts = partitioned_diff(&original, &modified, false, false);
        assert!(parts.delete.is_empty());
        assert_eq!(parts.remove.len(), 1);
    }

    #[test]
    fn test_should_materialize_patches() {
        let original = json!({"a": 1, "b": {"c": 2}});
        let modified = json!({"a": 9, "b": {}, "d": true});
        let patches = patches(&original, &modified, false).unwrap();
        assert_eq!(patches.add, json!({"d": true}));
        assert_eq!(patches.set, json!({"a": 9}));
        assert_eq!(patches.delete, json!({"b": {"c": 2}}));
    }

    #[test]
    fn test_should_round_trip_diff_through_path_setter() {
        let original = json!({"a": 1, "list": ["x", "y"], "nested": {"keep": true}});
        let modified =
            json!({"a": 2, "list": ["x", null], "nested": {"keep": true}, "new": {"deep": 5}});
        let result = diff(&original, &modified, true);

        let mut rebuilt = original.clone();
        for node in result.add.iter().chain(result.set.iter()) {
            let segments = path::parse(&node.path).unwrap();
            path::set_value(&mut rebuilt, &segments, node.value.clone());
        }
        for node in &result.delete {
            let segments = path::parse(&node.path).unwrap();
            path::set_value(&mut rebuilt, &segments, json!(null));
        }
        assert_eq!(rebuilt, modified);
    }
}
