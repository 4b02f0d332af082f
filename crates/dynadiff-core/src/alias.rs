//! Placeholder aliasing.
//!
//! DynamoDB's expression syntax forbids many literal characters (and a long
//! list of reserved words) in attribute names, and caps identifiers at 255
//! characters. Every path segment is therefore replaced by a `#name`
//! placeholder and every assigned value by a `:value` placeholder, registered
//! in the result's substitution maps. Aliases are camel-cased from the raw
//! attribute names; an alias that would exceed the ceiling is truncated and
//! suffixed with a counter drawn from the caller's [`AliasContext`], so
//! repeated truncations within one call never collide.

use std::collections::BTreeMap;

use serde_json::Value;

use dynadiff_model::Node;

use crate::error::ExpressionError;
use crate::path::{self, PathSegment};

/// DynamoDB's identifier length ceiling for attribute names and placeholders.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Per-call aliasing state: an optional alias prefix and the counter that
/// disambiguates truncated aliases.
///
/// Owned by one logical compilation call chain. Thread the same context
/// through multiple compilations to keep their aliases collision-free; it is a
/// plain mutable counter, so concurrent calls must each own their own
/// instance.
#[derive(Debug)]
pub struct AliasContext {
    prefix: Option<String>,
    truncation_counter: u64,
}

impl Default for AliasContext {
    fn default() -> Self {
        Self {
            prefix: None,
            truncation_counter: 1,
        }
    }
}

impl AliasContext {
    /// Context with no prefix and a fresh truncation counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a prefix folded into every generated alias.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// The configured alias prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn next_truncation_id(&mut self) -> u64 {
        let id = self.truncation_counter;
        self.truncation_counter += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Camel casing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_numeric() {
        CharClass::Digit
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_alphabetic() {
        CharClass::Lower
    } else {
        CharClass::Other
    }
}

/// Split into words: letter runs broken at lower-to-upper transitions and
/// letter/digit boundaries; anything non-alphanumeric is a separator. An
/// uppercase run is one word up to the last capital before a lowercase letter
/// (`FOOBar` -> `FOO`, `Bar`).
fn split_words(input: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = input.chars().collect();
    let mut word = String::new();
    let mut prev = CharClass::Other;

    for (i, &c) in chars.iter().enumerate() {
        let class = classify(c);
        if class == CharClass::Other {
            if !word.is_empty() {
                out.push(std::mem::take(&mut word));
            }
            prev = class;
            continue;
        }

        let boundary = match (prev, class) {
            (CharClass::Lower, CharClass::Upper)
            | (CharClass::Digit, CharClass::Upper | CharClass::Lower)
            | (CharClass::Lower | CharClass::Upper, CharClass::Digit) => true,
            (CharClass::Upper, CharClass::Upper) => chars
                .get(i + 1)
                .is_some_and(|&next| classify(next) == CharClass::Lower),
            _ => false,
        };
        if boundary && !word.is_empty() {
            out.push(std::mem::take(&mut word));
        }
        word.push(c);
        prev = class;
    }

    if !word.is_empty() {
        out.push(word);
    }
}

/// Camel-case the concatenation of `parts`: every word lowercased, all but
/// the first capitalized.
fn camel_case<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut words = Vec::new();
    for part in parts {
        split_words(part, &mut words);
    }

    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut rest = lower.chars();
            if let Some(first) = rest.next() {
                out.extend(first.to_uppercase());
                out.push_str(rest.as_str());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Truncation and limits
// ---------------------------------------------------------------------------

/// Cap an alias body at `max_len` characters, replacing the tail with the
/// context's next disambiguation counter when it overflows.
fn truncate(name: &str, max_len: usize, ctx: &mut AliasContext) -> String {
    if name.chars().count() <= max_len {
        return name.to_owned();
    }
    let suffix = ctx.next_truncation_id().to_string();
    let keep = max_len.saturating_sub(suffix.len());
    let mut out: String = name.chars().take(keep).collect();
    out.push_str(&suffix);
    out
}

fn check_limit(name: &str) -> Result<(), ExpressionError> {
    if name.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ExpressionError::IdentifierTooLong {
            name: name.to_owned(),
            limit: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Node aliasing
// ---------------------------------------------------------------------------

/// An aliased node: the placeholder-safe path, and the value placeholder when
/// a value registry was supplied.
#[derive(Debug)]
pub(crate) struct Aliased {
    /// Dot-joined chain of name placeholders, subscripts preserved verbatim
    /// (e.g. `#relatedItems[3]`).
    pub path: String,
    /// The registered `:value` placeholder, if values were registered.
    pub value: Option<String>,
}

/// Alias every name segment of a node's path, registering `#alias` -> name
/// mappings; when a value registry is supplied, also register the node's
/// value under a `:alias` derived from the full traversed path.
///
/// # Errors
///
/// Returns [`ExpressionError::IdentifierTooLong`] if a raw attribute name
/// exceeds [`MAX_IDENTIFIER_LEN`], and [`ExpressionError::InvalidPath`] if
/// the node path fails to parse.
pub(crate) fn alias_node(
    node: &Node,
    prefix: &str,
    names: &mut BTreeMap<String, String>,
    values: Option<&mut BTreeMap<String, Value>>,
    ctx: &mut AliasContext,
) -> Result<Aliased, ExpressionError> {
    let segments = path::parse(&node.path)?;

    let mut parts: Vec<String> = Vec::new();
    for segment in &segments {
        match segment {
            PathSegment::Plain(name) | PathSegment::Quoted(name) => {
                check_limit(name)?;
                let body = camel_case([prefix, name.as_str()]);
                let alias = format!("#{}", truncate(&body, MAX_IDENTIFIER_LEN - 1, ctx));
                names.insert(alias.clone(), name.clone());
                parts.push(alias);
            }
            PathSegment::Index(index) => match parts.last_mut() {
                Some(last) => {
                    last.push('[');
                    last.push_str(&index.to_string());
                    last.push(']');
                }
                None => parts.push(format!("[{index}]")),
            },
        }
    }

    let value = if let Some(values) = values {
        let mut sources: Vec<String> = vec![prefix.to_owned()];
        for segment in &segments {
            match segment {
                PathSegment::Plain(name) | PathSegment::Quoted(name) => sources.push(name.clone()),
                PathSegment::Index(index) => sources.push(index.to_string()),
            }
        }
        let body = camel_case(sources.iter().map(String::as_str));
        let token = format!(":{}", truncate(&body, MAX_IDENTIFIER_LEN - 1, ctx));
        values.insert(token.clone(), node.value.clone());
        Some(token)
    } else {
        None
    };

    Ok(Aliased {
        path: parts.join("."),
        value,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn camel(parts: &[&str]) -> String {
        camel_case(parts.iter().copied())
    }

    #[test]
    fn test_should_camel_case_attribute_names() {
        assert_eq!(camel(&["", "color"]), "color");
        assert_eq!(camel(&["", "Safety.Warning"]), "safetyWarning");
        assert_eq!(camel(&["", "left-view"]), "leftView");
        assert_eq!(camel(&["", "name with space"]), "nameWithSpace");
        assert_eq!(camel(&["", "1atBeginning"]), "1AtBeginning");
        assert_eq!(camel(&["expected", "version"]), "expectedVersion");
        assert_eq!(camel(&["InvalidValue", "age"]), "invalidValueAge");
        assert_eq!(camel(&["", "relatedItems", "1"]), "relatedItems1");
        assert_eq!(camel(&["", "pictures", "otherSideView"]), "picturesOtherSideView");
        assert_eq!(camel(&["", "FOOBar"]), "fooBar");
    }

    #[test]
    fn test_should_alias_plain_path() {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new("$.pictures.rearView", json!("url"));

        let aliased = alias_node(&node, "", &mut names, Some(&mut values), &mut ctx).unwrap();
        assert_eq!(aliased.path, "#pictures.#rearView");
        assert_eq!(aliased.value.as_deref(), Some(":picturesRearView"));
        assert_eq!(names["#pictures"], "pictures");
        assert_eq!(names["#rearView"], "rearView");
        assert_eq!(values[":picturesRearView"], json!("url"));
    }

    #[test]
    fn test_should_preserve_subscripts_in_aliased_path() {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new("$.relatedItems[3]", json!(1000));

        let aliased = alias_node(&node, "", &mut names, Some(&mut values), &mut ctx).unwrap();
        assert_eq!(aliased.path, "#relatedItems[3]");
        assert_eq!(aliased.value.as_deref(), Some(":relatedItems3"));
    }

    #[test]
    fn test_should_alias_quoted_segment_to_camel_case() {
        let mut names = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new("$[\"Safety.Warning\"]", json!("x"));

        let aliased = alias_node(&node, "", &mut names, None, &mut ctx).unwrap();
        assert_eq!(aliased.path, "#safetyWarning");
        assert_eq!(names["#safetyWarning"], "Safety.Warning");
        assert!(aliased.value.is_none());
    }

    #[test]
    fn test_should_apply_prefix_to_name_and_value_aliases() {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new("$.version", json!(1));

        let aliased =
            alias_node(&node, "expected", &mut names, Some(&mut values), &mut ctx).unwrap();
        assert_eq!(aliased.path, "#expectedVersion");
        assert_eq!(aliased.value.as_deref(), Some(":expectedVersion"));
        assert_eq!(names["#expectedVersion"], "version");
    }

    #[test]
    fn test_should_disambiguate_truncated_aliases_within_one_call() {
        let name_a = format!("{}x", "a".repeat(254));
        let name_b = format!("{}y", "a".repeat(254));
        let mut names = BTreeMap::new();
        let mut ctx = AliasContext::new();

        let first = alias_node(&Node::new(format!("$.{name_a}"), json!(1)), "", &mut names, None, &mut ctx)
            .unwrap();
        let second = alias_node(&Node::new(format!("$.{name_b}"), json!(2)), "", &mut names, None, &mut ctx)
            .unwrap();

        assert_ne!(first.path, second.path);
        assert!(first.path.ends_with('1'));
        assert!(second.path.ends_with('2'));
        assert_eq!(first.path.len(), 1 + MAX_IDENTIFIER_LEN - 1);
        assert_eq!(names.len(), 2);
        assert_eq!(names[&first.path], name_a);
        assert_eq!(names[&second.path], name_b);
    }

    #[test]
    fn test_should_reject_attribute_name_over_the_limit() {
        let long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        let mut names = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new(format!("$.{long}"), json!(1));

        let err = alias_node(&node, "", &mut names, None, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::IdentifierTooLong { ref name, limit } if *name == long && limit == MAX_IDENTIFIER_LEN
        ));
    }

    #[test]
    fn test_should_accept_name_at_exactly_the_limit() {
        let name = "a".repeat(MAX_IDENTIFIER_LEN);
        let mut names = BTreeMap::new();
        let mut ctx = AliasContext::new();
        let node = Node::new(format!("$.{name}"), json!(1));

        let aliased = alias_node(&node, "", &mut names, None, &mut ctx).unwrap();
        // 255-char body truncated to 254 with the counter suffix.
        assert_eq!(aliased.path.len(), 1 + MAX_IDENTIFIER_LEN - 1);
        assert_eq!(names[&aliased.path], name);
    }
}
