//! Document flattening.
//!
//! A document is flattened into a path-sorted list of nodes covering every
//! internal and leaf location (the root itself is excluded). Leaf extraction
//! and ancestor collapsing both run as single scans over the sorted list,
//! using path order as the adjacency test: a parent node always immediately
//! precedes its first descendant.

use serde_json::Value;

use dynadiff_model::Node;

use crate::path;

/// Flatten a document into all of its nodes, sorted by path.
#[must_use]
pub fn all_nodes(doc: &Value) -> Vec<Node> {
    let mut nodes = Vec::new();
    collect(doc, "$", &mut nodes);
    nodes.sort_unstable_by(|a, b| a.path.cmp(&b.path));
    nodes
}

fn collect(value: &Value, prefix: &str, out: &mut Vec<Node>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = path::append_key(prefix, key);
                out.push(Node::new(child_path.clone(), child.clone()));
                collect(child, &child_path, out);
            }
        }
        Value::Array(list) => {
            for (index, child) in list.iter().enumerate() {
                let child_path = path::append_index(prefix, index);
                out.push(Node::new(child_path.clone(), child.clone()));
                collect(child, &child_path, out);
            }
        }
        _ => {}
    }
}

/// Reduce a path-sorted node list to its leaves: scalars, nulls, and empty
/// containers. A node is a parent (and dropped) exactly when the next node in
/// sort order is one of its descendants.
#[must_use]
pub fn leaf_nodes(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .enumerate()
        .filter(|(index, node)| match nodes.get(index + 1) {
            Some(next) => !path::is_parent_of(&node.path, &next.path),
            None => true,
        })
        .map(|(_, node)| node.clone())
        .collect()
}

/// Collapse a node list to its minimal set of subtree roots: a node is kept
/// unless the most recently kept node is one of its ancestors.
///
/// Applied to the candidate additions, this turns a newly introduced branch
/// into one node carrying the whole subtree value instead of many deep leaves.
#[must_use]
pub fn ancestor_nodes(mut nodes: Vec<Node>) -> Vec<Node> {
    nodes.sort_unstable_by(|a, b| a.path.cmp(&b.path));

    let mut roots: Vec<Node> = Vec::new();
    for node in nodes {
        let is_descendant = roots
            .last()
            .is_some_and(|kept| path::is_parent_of(&kept.path, &node.path));
        if !is_descendant {
            roots.push(node);
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_flatten_all_nodes_sorted() {
        let doc = json!({"b": {"c": 1}, "a": [true]});
        let nodes = all_nodes(&doc);
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.a", "$.a[0]", "$.b", "$.b.c"]);
    }

    #[test]
    fn test_should_quote_odd_keys_when_flattening() {
        let doc = json!({"Safety.Warning": "x"});
        let nodes = all_nodes(&doc);
        assert_eq!(nodes[0].path, "$[\"Safety.Warning\"]");
    }

    #[test]
    fn test_should_keep_only_leaves() {
        let doc = json!({"a": {"b": 1, "c": {}}, "d": [1, [2]]});
        let leaves = leaf_nodes(&all_nodes(&doc));
        let paths: Vec<&str> = leaves.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.a.b", "$.a.c", "$.d[0]", "$.d[1][0]"]);
    }

    #[test]
    fn test_should_treat_empty_containers_as_leaves() {
        let doc = json!({"a": {}, "b": []});
        let leaves = leaf_nodes(&all_nodes(&doc));
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].value, json!({}));
        assert_eq!(leaves[1].value, json!([]));
    }

    #[test]
    fn test_should_collapse_to_minimal_ancestors() {
        let nodes = vec![
            Node::new("$.a", json!({"b": {"c": 1}})),
            Node::new("$.a.b", json!({"c": 1})),
            Node::new("$.a.b.c", json!(1)),
            Node::new("$.x.y", json!({"z": 2})),
            Node::new("$.x.y.z", json!(2)),
        ];
        let roots = ancestor_nodes(nodes);
        let paths: Vec<&str> = roots.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["$.a", "$.x.y"]);
    }
}
