//! Canonical document paths.
//!
//! A path addresses one location in a document, starting at the root `$`:
//! `$.a.b[0]`, `$["odd name"].child`. Map keys that are not plain identifiers
//! (spaces, dots, dashes, leading digits) are bracket-quoted, so an attribute
//! name containing a literal `.` survives stringification intact.
//!
//! Parsing produces one tagged [`PathSegment`] per element instead of
//! classifying raw string chunks, which keeps the aliaser free of any
//! bracket/quote special-casing.

use serde_json::{Map, Value};

use crate::error::ExpressionError;

/// A single element of a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A plain-identifier map key (`.name`).
    Plain(String),
    /// A bracket-quoted map key (`["odd name"]`).
    Quoted(String),
    /// A numeric list subscript (`[3]`).
    Index(usize),
}

impl PathSegment {
    /// The raw attribute name for name segments, `None` for subscripts.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Plain(name) | Self::Quoted(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

/// Parse a canonical `$`-rooted path into segments.
///
/// # Errors
///
/// Returns [`ExpressionError::InvalidPath`] if the path does not start at the
/// root or contains a malformed segment.
pub fn parse(path: &str) -> Result<Vec<PathSegment>, ExpressionError> {
    let invalid = |reason: &str| ExpressionError::InvalidPath {
        path: path.to_owned(),
        reason: reason.to_owned(),
    };

    let mut chars = path.chars().peekable();
    if chars.next() != Some('$') {
        return Err(invalid("must start at the document root '$'"));
    }

    let mut segments = Vec::new();
    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '.' || c == '[' {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(invalid("empty segment after '.'"));
                }
                segments.push(PathSegment::Plain(name));
            }
            '[' => {
                chars.next();
                match chars.peek() {
                    Some('"') => {
                        chars.next();
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some('"') => break,
                                Some(c) => name.push(c),
                                None => return Err(invalid("unterminated quoted segment")),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid("expected ']' after quoted segment"));
                        }
                        segments.push(PathSegment::Quoted(name));
                    }
                    Some(c) if c.is_ascii_digit() => {
                        let mut digits = String::new();
                        while let Some(&c) = chars.peek() {
                            if !c.is_ascii_digit() {
                                break;
                            }
                            digits.push(c);
                            chars.next();
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid("expected ']' after subscript"));
                        }
                        let index = digits
                            .parse()
                            .map_err(|_| invalid("subscript out of range"))?;
                        segments.push(PathSegment::Index(index));
                    }
                    _ => return Err(invalid("expected quoted name or subscript after '['")),
                }
            }
            _ => return Err(invalid("expected '.' or '[' between segments")),
        }
    }

    Ok(segments)
}

/// Render segments back into canonical path form. Inverse of [`parse`].
#[must_use]
pub fn stringify(segments: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in segments {
        match segment {
            PathSegment::Plain(name) => {
                out.push('.');
                out.push_str(name);
            }
            PathSegment::Quoted(name) => {
                out.push_str("[\"");
                out.push_str(name);
                out.push_str("\"]");
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Extend a parent path string with a map key, bracket-quoting keys that are
/// not plain identifiers.
pub(crate) fn append_key(parent: &str, key: &str) -> String {
    if is_plain_identifier(key) {
        format!("{parent}.{key}")
    } else {
        format!("{parent}[\"{key}\"]")
    }
}

/// Extend a parent path string with a list subscript.
pub(crate) fn append_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn is_plain_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Returns `true` if `child` is a strict descendant path of `parent`.
#[must_use]
pub fn is_parent_of(parent: &str, child: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && matches!(child.as_bytes()[parent.len()], b'.' | b'[')
}

/// Returns `true` if the path's final segment is a numeric subscript.
pub(crate) fn ends_with_index(path: &str) -> bool {
    let Some(rest) = path.strip_suffix(']') else {
        return false;
    };
    match rest.rfind('[') {
        Some(pos) => {
            let digits = &rest[pos + 1..];
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Look up the value at a path, `None` if any segment is missing.
#[must_use]
pub fn value_at<'a>(doc: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in segments {
        current = match segment {
            PathSegment::Plain(key) | PathSegment::Quoted(key) => current.as_object()?.get(key)?,
            PathSegment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Set the value at a path, auto-vivifying intermediate containers: name
/// segments create maps, subscripts create lists padded with nulls.
///
/// A non-container value standing where a container is needed is replaced;
/// an empty segment list replaces the whole document.
pub fn set_value(doc: &mut Value, segments: &[PathSegment], value: Value) {
    if segments.is_empty() {
        *doc = value;
        return;
    }

    let mut current = doc;
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        match segment {
            PathSegment::Plain(key) | PathSegment::Quoted(key) => {
                if !current.is_object() {
                    *current = Value::Object(Map::new());
                }
                let Value::Object(map) = current else {
                    return;
                };
                if last {
                    map.insert(key.clone(), value);
                    return;
                }
                current = map.entry(key.clone()).or_insert(Value::Null);
            }
            PathSegment::Index(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let Value::Array(list) = current else {
                    return;
                };
                if list.len() <= *index {
                    list.resize(*index + 1, Value::Null);
                }
                let Some(slot) = list.get_mut(*index) else {
                    return;
                };
                if last {
                    *slot = value;
                    return;
                }
                current = slot;
            }
        }
    }
}
