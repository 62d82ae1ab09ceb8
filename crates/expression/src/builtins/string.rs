//! String manipulation functions
//!
//! Null string arguments read as the empty string throughout.

use ::regex::{NoExpand, RegexBuilder};
use serde_json::Value;

use super::{get_array_arg, get_int_arg, get_text_arg};
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::value_utils::{is_integer_number, to_text, value_type_name, values_equal};

/// Concatenate the text form of every argument
pub fn concat(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let text: String = args.iter().map(to_text).collect();
    Ok(Value::String(text))
}

/// Number of characters in a string
pub fn length(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("length", args, 0, "text")?;
    Ok(Value::from(s.chars().count() as i64))
}

/// Replace every occurrence of a substring
pub fn replace(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("replace", args, 0, "text")?;
    let old = get_text_arg("replace", args, 1, "oldText")?;
    let new = get_text_arg("replace", args, 2, "newText")?;
    if old.is_empty() {
        return Err(ExpressionError::invalid_argument(
            "replace",
            "Text to replace cannot be empty",
        ));
    }
    Ok(Value::String(s.replace(&old, &new)))
}

/// Replace every occurrence of a substring, ignoring case
pub fn replace_ignore_case(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("replaceIgnoreCase", args, 0, "text")?;
    let old = get_text_arg("replaceIgnoreCase", args, 1, "oldText")?;
    let new = get_text_arg("replaceIgnoreCase", args, 2, "newText")?;
    if old.is_empty() {
        return Err(ExpressionError::invalid_argument(
            "replaceIgnoreCase",
            "Text to replace cannot be empty",
        ));
    }
    let pattern = RegexBuilder::new(&::regex::escape(&old))
        .case_insensitive(true)
        .build()?;
    Ok(Value::String(
        pattern.replace_all(&s, NoExpand(&new)).into_owned(),
    ))
}

/// Split a string on a separator; no separator yields the whole string
pub fn split(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("split", args, 0, "text")?;
    let separator = get_text_arg("split", args, 1, "separator")?;

    let parts: Vec<Value> = if separator.is_empty() {
        vec![Value::String(s)]
    } else {
        s.split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Ok(Value::Array(parts))
}

/// Characters from `start`, up to the end or `length` of them
pub fn substring(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("substring", args, 0, "text")?;
    if s.is_empty() {
        return Ok(Value::String(String::new()));
    }

    let chars: Vec<char> = s.chars().collect();
    let total = chars.len() as i64;
    let start = get_int_arg("substring", args, 1, "start")?;
    if !(0..=total).contains(&start) {
        return Err(ExpressionError::invalid_argument(
            "substring",
            format!("start index {} is out of range for a string of length {}", start, total),
        ));
    }

    let length = match args.get(2) {
        Some(_) => get_int_arg("substring", args, 2, "length")?,
        None => total - start,
    };
    if length < 0 || start + length > total {
        return Err(ExpressionError::invalid_argument(
            "substring",
            format!(
                "length {} from index {} exceeds a string of length {}",
                length, start, total
            ),
        ));
    }

    let text: String = chars[start as usize..(start + length) as usize].iter().collect();
    Ok(Value::String(text))
}

/// Lowercase a string
pub fn to_lower(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("toLower", args, 0, "text")?;
    Ok(Value::String(s.to_lowercase()))
}

/// Uppercase a string
pub fn to_upper(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("toUpper", args, 0, "text")?;
    Ok(Value::String(s.to_uppercase()))
}

/// Strip leading and trailing whitespace
pub fn trim(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("trim", args, 0, "text")?;
    Ok(Value::String(s.trim().to_string()))
}

/// Prefix test; a null string never matches, a null prefix always does
pub fn starts_with(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    if args[0].is_null() {
        return Ok(Value::Bool(false));
    }
    let s = get_text_arg("startsWith", args, 0, "text")?;
    let prefix = get_text_arg("startsWith", args, 1, "prefix")?;
    Ok(Value::Bool(s.starts_with(&prefix)))
}

/// Suffix test; a null string never matches, a null suffix always does
pub fn ends_with(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    if args[0].is_null() {
        return Ok(Value::Bool(false));
    }
    let s = get_text_arg("endsWith", args, 0, "text")?;
    let suffix = get_text_arg("endsWith", args, 1, "suffix")?;
    Ok(Value::Bool(s.ends_with(&suffix)))
}

/// Number of whitespace-separated words
pub fn count_word(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("countWord", args, 0, "text")?;
    Ok(Value::from(s.split_whitespace().count() as i64))
}

/// English ordinal suffix: `1st`, `12th`, `23rd`
pub fn add_ordinal(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    if let Value::Number(number) = &args[0] {
        if !is_integer_number(number) {
            return Err(ExpressionError::invalid_argument(
                "addOrdinal",
                format!("{} is not an integer", number),
            ));
        }
    }
    let n = get_int_arg("addOrdinal", args, 0, "number")?;
    if n <= 0 {
        return Ok(Value::String(n.to_string()));
    }

    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    Ok(Value::String(format!("{}{}", n, suffix)))
}

/// First position of a substring or list element, or -1
pub fn index_of(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let position = match &args[0] {
        Value::Null => -1,
        Value::Array(items) => position_in_list(items.iter().position(|v| values_equal(v, &args[1]))),
        Value::String(s) => {
            let needle = get_text_arg("indexOf", args, 1, "search")?;
            s.find(&needle).map_or(-1, |byte| char_index(s, byte))
        }
        other => return Err(not_searchable("indexOf", other)),
    };
    Ok(Value::from(position))
}

/// Last position of a substring or list element, or -1
pub fn last_index_of(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let position = match &args[0] {
        Value::Null => -1,
        Value::Array(items) => {
            position_in_list(items.iter().rposition(|v| values_equal(v, &args[1])))
        }
        Value::String(s) => {
            let needle = get_text_arg("lastIndexOf", args, 1, "search")?;
            if needle.is_empty() {
                s.chars().count() as i64 - 1
            } else {
                s.rfind(&needle).map_or(-1, |byte| char_index(s, byte))
            }
        }
        other => return Err(not_searchable("lastIndexOf", other)),
    };
    Ok(Value::from(position))
}

fn char_index(s: &str, byte: usize) -> i64 {
    s[..byte].chars().count() as i64
}

fn position_in_list(position: Option<usize>) -> i64 {
    position.map_or(-1, |p| p as i64)
}

fn not_searchable(function: &str, value: &Value) -> ExpressionError {
    ExpressionError::invalid_argument(
        function,
        format!("expected a string or list, got {}", value_type_name(value)),
    )
}

/// A version 4 GUID drawn from the context's random source
pub fn new_guid(_args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let mut bytes = [0u8; 16];
    ctx.random().fill_bytes(&mut bytes);
    let guid = uuid::Builder::from_random_bytes(bytes).into_uuid();
    Ok(Value::String(guid.to_string()))
}

/// Join list items with a separator, optionally a different one before the last item
pub fn join(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("join", args, 0, "list")?;
    let separator = get_text_arg("join", args, 1, "separator")?;
    let parts: Vec<String> = items.iter().map(to_text).collect();

    let text = match (args.get(2), parts.split_last()) {
        (Some(_), Some((last, rest))) if !rest.is_empty() => {
            let last_separator = get_text_arg("join", args, 2, "lastSeparator")?;
            format!("{}{}{}", rest.join(&separator), last_separator, last)
        }
        _ => parts.join(&separator),
    };
    Ok(Value::String(text))
}
