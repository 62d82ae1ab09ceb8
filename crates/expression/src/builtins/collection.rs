//! Collection functions over lists, strings and objects

use serde_json::{Map, Value, json};

use super::{get_array_arg, get_int_arg, get_text_arg};
use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::eval::Evaluator;
use crate::memory::{Memory, StackedMemory};
use crate::value_utils::{compare_values, is_truthy, to_text, value_type_name, values_equal};

/// Substring, list item or object key test
pub fn contains(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let found = match &args[0] {
        Value::Null => false,
        Value::String(s) => s.contains(&to_text(&args[1])),
        Value::Array(items) => items.iter().any(|item| values_equal(item, &args[1])),
        Value::Object(map) => args[1].as_str().is_some_and(|key| map.contains_key(key)),
        other => {
            return Err(ExpressionError::invalid_argument(
                "contains",
                format!("expected a string, list or object, got {}", value_type_name(other)),
            ));
        }
    };
    Ok(Value::Bool(found))
}

/// Number of characters, items or properties
pub fn count(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let n = match &args[0] {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(ExpressionError::invalid_argument(
                "count",
                format!("expected a string or list, got {}", value_type_name(other)),
            ));
        }
    };
    Ok(Value::from(n as i64))
}

/// True for null and for empty strings, lists and objects
pub fn empty(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let is_empty = match &args[0] {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };
    Ok(Value::Bool(is_empty))
}

/// First character or item; null for anything else
pub fn first(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let item = match &args[0] {
        Value::String(s) => s.chars().next().map(|c| Value::String(c.to_string())),
        Value::Array(items) => items.first().cloned(),
        _ => None,
    };
    Ok(item.unwrap_or(Value::Null))
}

/// Last character or item; null for anything else
pub fn last(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let item = match &args[0] {
        Value::String(s) => s.chars().next_back().map(|c| Value::String(c.to_string())),
        Value::Array(items) => items.last().cloned(),
        _ => None,
    };
    Ok(item.unwrap_or(Value::Null))
}

/// Name of the iterator variable of `foreach`, `select` or `where`
fn iterator_name<'e>(function: &str, expr: &'e Expr) -> ExpressionResult<&'e str> {
    match expr {
        Expr::Identifier(name) => Ok(name.as_ref()),
        other => Err(ExpressionError::invalid_argument(
            function,
            format!("second parameter must be an identifier, got {}", other),
        )),
    }
}

/// Items to iterate: list items, or `{key, value}` pairs of an object
fn iteration_items(function: &str, collection: Value) -> ExpressionResult<Vec<Value>> {
    match collection {
        Value::Array(items) => Ok(items),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| json!({"key": key, "value": value}))
            .collect()),
        other => Err(ExpressionError::invalid_argument(
            function,
            format!("{} is not a collection", value_type_name(&other)),
        )),
    }
}

/// Evaluate the body once per item with the item bound to the iterator name
fn map_items(
    function: &str,
    items: Vec<Value>,
    args: &[Expr],
    evaluator: &Evaluator<'_>,
    memory: &mut dyn Memory,
) -> ExpressionResult<Vec<(Value, Value)>> {
    let name = iterator_name(function, &args[1])?;
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let mut scope = StackedMemory::with_local(&mut *memory, name, item.clone());
        let result = evaluator.eval(&args[2], &mut scope)?;
        results.push((item, result));
    }
    Ok(results)
}

/// Map a body over a collection; also registered as `select`
pub fn foreach(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let collection = evaluator.eval(&args[0], memory)?;
    let items = iteration_items("foreach", collection)?;
    let results = map_items("foreach", items, args, evaluator, memory)?;
    Ok(Value::Array(results.into_iter().map(|(_, result)| result).collect()))
}

/// Items for which the body is truthy; objects stay objects
pub fn where_(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let collection = evaluator.eval(&args[0], memory)?;
    let source_is_object = collection.is_object();
    let items = iteration_items("where", collection)?;
    let kept = map_items("where", items, args, evaluator, memory)?
        .into_iter()
        .filter(|(_, result)| is_truthy(result))
        .map(|(item, _)| item);

    if !source_is_object {
        return Ok(Value::Array(kept.collect()));
    }

    let map: Map<String, Value> = kept
        .filter_map(|pair| match pair {
            Value::Object(mut entry) => {
                let key = entry.remove("key").map(|k| to_text(&k))?;
                Some((key, entry.remove("value").unwrap_or(Value::Null)))
            }
            _ => None,
        })
        .collect();
    Ok(Value::Object(map))
}

fn push_unique(out: &mut Vec<Value>, item: &Value) {
    if !out.iter().any(|existing| values_equal(existing, item)) {
        out.push(item.clone());
    }
}

/// Distinct items of all lists, in first-seen order
pub fn union(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let mut out = Vec::new();
    for index in 0..args.len() {
        for item in get_array_arg("union", args, index, "list")? {
            push_unique(&mut out, item);
        }
    }
    Ok(Value::Array(out))
}

/// Distinct items present in every list
pub fn intersection(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let lists = (0..args.len())
        .map(|index| get_array_arg("intersection", args, index, "list"))
        .collect::<ExpressionResult<Vec<_>>>()?;

    let mut out = Vec::new();
    for item in lists[0] {
        if lists[1..]
            .iter()
            .all(|list| list.iter().any(|other| values_equal(item, other)))
        {
            push_unique(&mut out, item);
        }
    }
    Ok(Value::Array(out))
}

fn clamp_count(n: i64, len: usize) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX).min(len)
}

/// All but the first `n` items
pub fn skip(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("skip", args, 0, "list")?;
    let n = clamp_count(get_int_arg("skip", args, 1, "count")?, items.len());
    Ok(Value::Array(items[n..].to_vec()))
}

/// The first `n` items
pub fn take(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("take", args, 0, "list")?;
    let n = clamp_count(get_int_arg("take", args, 1, "count")?, items.len());
    Ok(Value::Array(items[..n].to_vec()))
}

/// Items from `start` up to, not including, `end`
pub fn sub_array(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("subArray", args, 0, "list")?;
    let len = items.len() as i64;
    let start = get_int_arg("subArray", args, 1, "start")?;
    let end = match args.get(2) {
        Some(_) => get_int_arg("subArray", args, 2, "end")?,
        None => len,
    };

    if !(0..=len).contains(&start) {
        return Err(ExpressionError::index_out_of_bounds(start, items.len()));
    }
    if end < start || end > len {
        return Err(ExpressionError::index_out_of_bounds(end, items.len()));
    }
    Ok(Value::Array(items[start as usize..end as usize].to_vec()))
}

fn sorted(function: &str, args: &[Value], descending: bool) -> ExpressionResult<Value> {
    let items = get_array_arg(function, args, 0, "list")?;
    let property = match args.get(1) {
        Some(_) => Some(get_text_arg(function, args, 1, "property")?),
        None => None,
    };

    let key = |item: &Value| -> Value {
        match &property {
            Some(name) => item.get(name).cloned().unwrap_or(Value::Null),
            None => item.clone(),
        }
    };

    let mut elements = items.to_vec();
    elements.sort_by(|a, b| {
        let ordering = compare_values(&key(a), &key(b));
        if descending { ordering.reverse() } else { ordering }
    });
    Ok(Value::Array(elements))
}

/// Stable ascending sort, by item or by a property of each item
pub fn sort_by(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    sorted("sortBy", args, false)
}

/// Stable descending sort, by item or by a property of each item
pub fn sort_by_descending(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    sorted("sortByDescending", args, true)
}
