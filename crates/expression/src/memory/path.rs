//! Memory path syntax: `a.b[0]['c'].d`
//!
//! A path is a list of segments. Reads walk the segments and report "not
//! found" on any missing or null step. Writes create missing containers on
//! the way down.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ExpressionError, ExpressionResult};

/// One step of a memory path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name`, `['name']` or `["name"]`
    Property(String),
    /// `[n]`
    Index(i64),
}

impl PathSegment {
    /// Key form used when a segment addresses an object
    pub fn key(&self) -> String {
        match self {
            PathSegment::Property(name) => name.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Split a path into segments.
pub fn parse_path(path: &str) -> ExpressionResult<Vec<PathSegment>> {
    let invalid = |message: &str| ExpressionError::invalid_path(path, message);
    let chars: Vec<char> = path.trim().chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    if chars.is_empty() {
        return Err(invalid("path is empty"));
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                if i >= chars.len() || chars[i] == '.' || chars[i] == '[' {
                    return Err(invalid("empty property name"));
                }
            }
            '[' => {
                i += 1;
                let segment = match chars.get(i) {
                    Some(&quote) if quote == '\'' || quote == '"' => {
                        i += 1;
                        let mut key = String::new();
                        loop {
                            match chars.get(i) {
                                None => return Err(invalid("unterminated quoted key")),
                                Some(&c) if c == quote => break,
                                Some('\\') => match chars.get(i + 1) {
                                    Some(&escaped @ ('\\' | '\'' | '"')) => {
                                        key.push(escaped);
                                        i += 2;
                                    }
                                    _ => {
                                        key.push('\\');
                                        i += 1;
                                    }
                                },
                                Some(&c) => {
                                    key.push(c);
                                    i += 1;
                                }
                            }
                        }
                        i += 1;
                        PathSegment::Property(key)
                    }
                    _ => {
                        let start = i;
                        while i < chars.len() && chars[i] != ']' {
                            i += 1;
                        }
                        let raw: String = chars[start..i].iter().collect();
                        let raw = raw.trim();
                        if raw.is_empty() {
                            return Err(invalid("empty index"));
                        }
                        match raw.parse::<i64>() {
                            Ok(index) => PathSegment::Index(index),
                            Err(_) => PathSegment::Property(raw.to_string()),
                        }
                    }
                };
                if chars.get(i) != Some(&']') {
                    return Err(invalid("expected ']'"));
                }
                i += 1;
                segments.push(segment);
            }
            _ => {
                let start = i;
                while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                segments.push(PathSegment::Property(name.trim().to_string()));
            }
        }
    }

    Ok(segments)
}

/// Bracketed form of a property key that `parse_path` reads back unchanged.
///
/// Single quotes are preferred; a key holding only single quotes is wrapped
/// in double quotes, otherwise backslash escapes are used.
pub fn quote_key(key: &str) -> String {
    if key.contains('\'') && !key.contains('"') && !key.contains('\\') {
        return format!("[\"{}\"]", key);
    }
    let mut quoted = String::with_capacity(key.len() + 4);
    quoted.push_str("['");
    for c in key.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push_str("']");
    quoted
}

/// Look a property up, falling back to a case-insensitive match when `lenient`.
pub fn lookup<'v>(map: &'v Map<String, Value>, key: &str, lenient: bool) -> Option<&'v Value> {
    map.get(key).or_else(|| {
        if lenient {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        } else {
            None
        }
    })
}

/// Walk `segments` from `root`. `None` means not found.
pub fn resolve<'v>(root: &'v Value, segments: &[PathSegment], lenient: bool) -> Option<&'v Value> {
    let mut current = root;
    for segment in segments {
        current = step(current, segment, lenient)?;
    }
    Some(current)
}

/// Apply a single segment to a value.
pub fn step<'v>(value: &'v Value, segment: &PathSegment, lenient: bool) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Object(map), segment) => lookup(map, &segment.key(), lenient),
        (Value::Array(items), PathSegment::Index(i)) => {
            usize::try_from(*i).ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

/// Write `value` at `segments` below `root`, creating intermediates.
///
/// Missing or null containers become objects, or arrays when the segment
/// applied to them is an index. An index equal to the length appends; a
/// larger one pads with nulls. `path` is the full path, used in errors.
pub fn assign(
    root: &mut Value,
    segments: &[PathSegment],
    value: Value,
    lenient: bool,
    path: &str,
) -> ExpressionResult<()> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        materialize(current, segment);
        current = slot(current, segment, lenient, path)?;
    }

    materialize(current, last);
    *slot(current, last, lenient, path)? = value;
    Ok(())
}

/// Turn a null into the container `segment` addresses.
fn materialize(value: &mut Value, segment: &PathSegment) {
    if value.is_null() {
        *value = match segment {
            PathSegment::Index(_) => Value::Array(Vec::new()),
            PathSegment::Property(_) => Value::Object(Map::new()),
        };
    }
}

/// Mutable slot for `segment` inside `container`, created as null when missing.
fn slot<'v>(
    container: &'v mut Value,
    segment: &PathSegment,
    lenient: bool,
    path: &str,
) -> ExpressionResult<&'v mut Value> {
    match container {
        Value::Object(map) => {
            let requested = segment.key();
            let key = if lenient && !map.contains_key(&requested) {
                map.keys()
                    .find(|k| k.eq_ignore_ascii_case(&requested))
                    .cloned()
                    .unwrap_or(requested)
            } else {
                requested
            };
            Ok(map.entry(key).or_insert(Value::Null))
        }
        Value::Array(items) => {
            let PathSegment::Index(index) = segment else {
                return Err(ExpressionError::invalid_path(
                    path,
                    format!("cannot set property '{}' on a list", segment),
                ));
            };
            let index = usize::try_from(*index).map_err(|_| {
                ExpressionError::invalid_path(path, "negative index")
            })?;
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        other => Err(ExpressionError::invalid_path(
            path,
            format!(
                "cannot set '{}' on a {}",
                segment,
                crate::value_utils::value_type_name(other)
            ),
        )),
    }
}
