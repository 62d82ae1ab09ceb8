//! JSONPath queries over JSON values or JSON text
//!
//! Supported selectors: `$`, `.name`, `.*`, `..name`, `..*`, `[n]` (negative
//! counts from the end), `['key']`, `[*]` and filters of the form
//! `[?(@.a.b)]` or `[?(@.a.b op literal)]`. A path that does not start with
//! `$` is taken relative to the root.

use std::cmp::Ordering;

use serde_json::Value;

use super::get_text_arg;
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::memory::parse_lenient;
use crate::value_utils::{compare_values, is_truthy, values_equal};

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Child(String),
    Wildcard,
    Index(i64),
    Descendant(Option<String>),
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    path: Vec<String>,
    test: Option<(CompareOp, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// `jPath(json, path)`
pub fn j_path(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let document = match &args[0] {
        Value::String(text) => parse_lenient(text)?,
        other => other.clone(),
    };
    let path = get_text_arg("jPath", args, 1, "path")?;
    let selectors = parse_query(&path)?;

    let mut matches = select(&document, &selectors);
    Ok(match matches.len() {
        0 => Value::Null,
        1 => matches.remove(0).clone(),
        _ => Value::Array(matches.into_iter().cloned().collect()),
    })
}

fn select<'v>(root: &'v Value, selectors: &[Selector]) -> Vec<&'v Value> {
    let mut current = vec![root];
    for selector in selectors {
        let mut next = Vec::new();
        for value in current {
            apply(value, selector, &mut next);
        }
        current = next;
    }
    current
}

fn apply<'v>(value: &'v Value, selector: &Selector, out: &mut Vec<&'v Value>) {
    match selector {
        Selector::Child(name) => {
            if let Some(child) = value.as_object().and_then(|map| map.get(name)) {
                out.push(child);
            }
        }
        Selector::Wildcard => out.extend(children(value)),
        Selector::Index(i) => {
            if let Value::Array(items) = value {
                let index = if *i < 0 { items.len() as i64 + i } else { *i };
                if let Some(item) = usize::try_from(index).ok().and_then(|i| items.get(i)) {
                    out.push(item);
                }
            }
        }
        Selector::Descendant(name) => {
            let mut all = Vec::new();
            descendants(value, &mut all);
            for node in all {
                match name {
                    Some(name) => apply(node, &Selector::Child(name.clone()), out),
                    None => out.extend(children(node)),
                }
            }
        }
        Selector::Filter(filter) => {
            out.extend(children(value).filter(|child| filter.accepts(child)));
        }
    }
}

fn children(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => Box::new(std::iter::empty()),
    }
}

fn descendants<'v>(value: &'v Value, out: &mut Vec<&'v Value>) {
    out.push(value);
    for child in children(value) {
        descendants(child, out);
    }
}

impl Filter {
    fn accepts(&self, candidate: &Value) -> bool {
        let mut current = Some(candidate);
        for name in &self.path {
            current = current.and_then(|v| v.as_object()).and_then(|map| map.get(name));
        }
        let Some(actual) = current else {
            return false;
        };

        let Some((op, expected)) = &self.test else {
            return is_truthy(actual);
        };
        match op {
            CompareOp::Eq => values_equal(actual, expected),
            CompareOp::Ne => !values_equal(actual, expected),
            ordering_op => {
                let comparable = matches!(
                    (actual, expected),
                    (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_))
                );
                if !comparable {
                    return false;
                }
                let ordering = compare_values(actual, expected);
                match ordering_op {
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }
            }
        }
    }
}

// ============================================================================
// Query parsing
// ============================================================================

fn parse_query(query: &str) -> ExpressionResult<Vec<Selector>> {
    let chars: Vec<char> = query.trim().chars().collect();
    let invalid = |message: &str| {
        ExpressionError::invalid_argument("jPath", format!("invalid path '{}': {}", query, message))
    };
    let mut selectors = Vec::new();
    let mut i = 0;

    if chars.first() == Some(&'$') {
        i += 1;
    } else if chars.first().is_some_and(|c| *c != '.' && *c != '[') {
        let name = take_name(&chars, &mut i);
        selectors.push(Selector::Child(name));
    }

    while i < chars.len() {
        match chars[i] {
            '.' if chars.get(i + 1) == Some(&'.') => {
                i += 2;
                if chars.get(i) == Some(&'*') {
                    i += 1;
                    selectors.push(Selector::Descendant(None));
                } else {
                    let name = take_name(&chars, &mut i);
                    if name.is_empty() {
                        return Err(invalid("expected a name after '..'"));
                    }
                    selectors.push(Selector::Descendant(Some(name)));
                }
            }
            '.' => {
                i += 1;
                if chars.get(i) == Some(&'*') {
                    i += 1;
                    selectors.push(Selector::Wildcard);
                } else {
                    let name = take_name(&chars, &mut i);
                    if name.is_empty() {
                        return Err(invalid("expected a name after '.'"));
                    }
                    selectors.push(Selector::Child(name));
                }
            }
            '[' => {
                let close = find_bracket_end(&chars, i).ok_or_else(|| invalid("unclosed '['"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                selectors.push(parse_bracket(inner.trim()).ok_or_else(|| invalid("bad bracket selector"))?);
                i = close + 1;
            }
            c => return Err(invalid(&format!("unexpected '{}'", c))),
        }
    }

    Ok(selectors)
}

fn take_name(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && !matches!(chars[*i], '.' | '[') {
        *i += 1;
    }
    chars[start..*i].iter().collect::<String>().trim().to_string()
}

/// Index of the `]` closing the bracket at `open`, skipping quoted text and
/// nested brackets.
fn find_bracket_end(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[open..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_bracket(inner: &str) -> Option<Selector> {
    if inner == "*" {
        return Some(Selector::Wildcard);
    }
    if let Some(key) = unquote(inner) {
        return Some(Selector::Child(key));
    }
    if let Some(filter) = inner.strip_prefix("?(").and_then(|f| f.strip_suffix(')')) {
        return parse_filter(filter.trim()).map(Selector::Filter);
    }
    inner.parse::<i64>().ok().map(Selector::Index)
}

fn unquote(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    text.strip_prefix(quote)?
        .strip_suffix(quote)
        .map(str::to_string)
}

fn parse_filter(filter: &str) -> Option<Filter> {
    const OPERATORS: [(&str, CompareOp); 6] = [
        ("==", CompareOp::Eq),
        ("!=", CompareOp::Ne),
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
    ];

    let (lhs, test) = match OPERATORS
        .iter()
        .find_map(|(symbol, op)| filter.find(symbol).map(|at| (at, symbol.len(), *op)))
    {
        Some((at, len, op)) => {
            let literal = parse_literal(filter[at + len..].trim())?;
            (filter[..at].trim(), Some((op, literal)))
        }
        None => (filter, None),
    };

    let path = lhs.strip_prefix('@')?;
    let path = path
        .split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    Some(Filter { path, test })
}

fn parse_literal(text: &str) -> Option<Value> {
    if let Some(s) = unquote(text) {
        return Some(Value::String(s));
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    const STORE: &str = "{
        'Stores': ['Lambton Quay', 'Willis Street'],
        'Manufacturers': [
            {'Name': 'Acme Co', 'Products': [{'Name': 'Anvil', 'Price': 50}]},
            {'Name': 'Contoso', 'Products': [
                {'Name': 'Elbow Grease', 'Price': 99.95},
                {'Name': 'Headlight Fluid', 'Price': 4}
            ]}
        ]
    }";

    fn query(path: &str) -> Value {
        j_path(&[json!(STORE), json!(path)], &EvaluationContext::new()).unwrap()
    }

    #[rstest]
    #[case("Manufacturers[0].Products[0].Price", json!(50))]
    #[case("$.Manufacturers[1].Name", json!("Contoso"))]
    #[case("$..Products[?(@.Price >= 50)].Name", json!(["Anvil", "Elbow Grease"]))]
    #[case("$.Stores[*]", json!(["Lambton Quay", "Willis Street"]))]
    #[case("$.Stores[-1]", json!("Willis Street"))]
    #[case("$['Manufacturers'][0]['Name']", json!("Acme Co"))]
    #[case("$..Products[?(@.Name == 'Headlight Fluid')].Price", json!(4))]
    #[case("$.Missing", Value::Null)]
    fn test_queries(#[case] path: &str, #[case] expected: Value) {
        assert_eq!(query(path), expected);
    }

    #[test]
    fn test_accepts_parsed_values() {
        let result = j_path(&[json!({"a": [{"b": 1}, {"b": 2}]}), json!("$.a[*].b")], &EvaluationContext::new());
        assert_eq!(result.unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_bad_query() {
        let err = j_path(&[json!("{}"), json!("$.a[")], &EvaluationContext::new()).unwrap_err();
        assert_eq!(err.code(), "EXPR:INVALID_ARG");
    }
}
