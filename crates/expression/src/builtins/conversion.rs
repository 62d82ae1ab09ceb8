//! Type conversion functions

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::Value;

use super::get_text_arg;
use super::logic::eval_truthy;
use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::eval::Evaluator;
use crate::memory::{Memory, parse_lenient};
use crate::value_utils::{finite_value, to_float, to_integer, value_type_name};

/// Maximum JSON string length to parse (1MB) - DoS protection
const MAX_JSON_PARSE_LENGTH: usize = 1024 * 1024;

const DATA_URI_PREFIX: &str = "data:text/plain;charset=utf-8;base64,";

/// Everything but RFC 3986 unreserved characters gets escaped
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Convert a number or numeric string to a float
pub fn float(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let f = to_float(&args[0]).map_err(|reason| ExpressionError::invalid_argument("float", reason))?;
    finite_value("float", f)
}

/// Convert a number or numeric string to an integer, truncating
pub fn int(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    to_integer(&args[0])
        .map(Value::from)
        .map_err(|reason| ExpressionError::invalid_argument("int", reason))
}

/// Strings unchanged, everything else as compact JSON
pub fn string(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let text = match &args[0] {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    };
    Ok(Value::String(text))
}

/// Truthiness of the operand; an operand that fails is `false`
pub fn bool(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    Ok(Value::Bool(eval_truthy(&args[0], evaluator, memory)))
}

/// List of the arguments
pub fn create_array(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    Ok(Value::Array(args.to_vec()))
}

/// Single-item list
pub fn array(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    Ok(Value::Array(vec![args[0].clone()]))
}

fn bit_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:08b}", b)).collect()
}

/// Bit string of the UTF-8 bytes of a string
pub fn binary(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("binary", args, 0, "text")?;
    Ok(Value::String(bit_string(s.as_bytes())))
}

/// Base64 encoding of the UTF-8 bytes of a string
pub fn base64(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("base64", args, 0, "text")?;
    Ok(Value::String(STANDARD.encode(s)))
}

fn decode_base64(function: &str, encoded: &str) -> ExpressionResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ExpressionError::invalid_argument(function, format!("invalid base64: {}", e)))
}

fn utf8(function: &str, bytes: Vec<u8>) -> ExpressionResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| ExpressionError::invalid_argument(function, format!("invalid UTF-8: {}", e)))
}

/// Bit string of a base64 payload as written
pub fn base64_to_binary(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let encoded = get_text_arg("base64ToBinary", args, 0, "text")?;
    decode_base64("base64ToBinary", &encoded)?;
    Ok(Value::String(bit_string(encoded.as_bytes())))
}

/// Decode base64 into a UTF-8 string
pub fn base64_to_string(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let encoded = get_text_arg("base64ToString", args, 0, "text")?;
    let bytes = decode_base64("base64ToString", &encoded)?;
    Ok(Value::String(utf8("base64ToString", bytes)?))
}

/// `data:` URI carrying a string as base64 text/plain
pub fn data_uri(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("dataUri", args, 0, "text")?;
    Ok(Value::String(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(s))))
}

/// Bit string of a data URI as written
pub fn data_uri_to_binary(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = get_text_arg("dataUriToBinary", args, 0, "text")?;
    Ok(Value::String(bit_string(uri.as_bytes())))
}

/// Payload of a `data:` URI as a string
pub fn data_uri_to_string(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = get_text_arg("dataUriToString", args, 0, "text")?;
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| ExpressionError::invalid_argument("dataUriToString", "not a data URI"))?;

    let bytes = if header.ends_with(";base64") {
        decode_base64("dataUriToString", payload)?
    } else {
        percent_decode_str(payload).collect()
    };
    Ok(Value::String(utf8("dataUriToString", bytes)?))
}

/// Percent-encode everything but unreserved characters
pub fn uri_component(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("uriComponent", args, 0, "text")?;
    Ok(Value::String(utf8_percent_encode(&s, URI_COMPONENT).to_string()))
}

/// Reverse of `uriComponent`
pub fn uri_component_to_string(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let s = get_text_arg("uriComponentToString", args, 0, "text")?;
    let decoded = percent_decode_str(&s).decode_utf8().map_err(|e| {
        ExpressionError::invalid_argument("uriComponentToString", format!("invalid UTF-8: {}", e))
    })?;
    Ok(Value::String(decoded.into_owned()))
}

/// Parse JSON text; single-quoted strings are accepted
pub fn json(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    match &args[0] {
        Value::String(text) => {
            if text.len() > MAX_JSON_PARSE_LENGTH {
                return Err(ExpressionError::invalid_argument(
                    "json",
                    format!(
                        "JSON string too long: {} bytes (max {})",
                        text.len(),
                        MAX_JSON_PARSE_LENGTH
                    ),
                ));
            }
            parse_lenient(text)
        }
        Value::Array(_) | Value::Object(_) => Ok(args[0].clone()),
        other => Err(ExpressionError::invalid_argument(
            "json",
            format!("expected JSON text, got {}", value_type_name(other)),
        )),
    }
}

/// Render a JSON value (or JSON text) as typed XML under `<root>`
pub fn xml(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let value = json(args, ctx)?;
    let mut out = String::new();
    write_element(&mut out, "root", &value, 0);
    Ok(Value::String(out))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    // Keys that are not XML names go into an attribute of a generic element
    let (tag, name_attr) = if is_xml_name(name) {
        (name, String::new())
    } else {
        ("item", format!(" item=\"{}\"", escape_xml(name)))
    };
    out.push_str(&format!("{}<{}{} type=\"{}\"", indent, tag, name_attr, json_type(value)));

    let children: Vec<(&str, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        Value::Array(items) => items.iter().map(|v| ("item", v)).collect(),
        Value::Null => {
            out.push_str(" />");
            return;
        }
        scalar => {
            let text = match scalar {
                Value::String(s) => escape_xml(s),
                other => other.to_string(),
            };
            out.push_str(&format!(">{}</{}>", text, tag));
            return;
        }
    };

    if children.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    for (child_name, child) in children {
        out.push('\n');
        write_element(out, child_name, child, depth + 1);
    }
    out.push_str(&format!("\n{}</{}>", indent, tag));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(f: fn(&[Value], &EvaluationContext) -> ExpressionResult<Value>, args: &[Value]) -> ExpressionResult<Value> {
        f(args, &EvaluationContext::new())
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(call(float, &[json!("10.333")]).unwrap(), json!(10.333));
        assert_eq!(call(float, &[json!("10")]).unwrap(), json!(10.0));
        assert_eq!(call(int, &[json!("10")]).unwrap(), json!(10));
        assert!(call(int, &[json!("ten")]).is_err());
    }

    #[test]
    fn test_string_serializes_non_strings() {
        assert_eq!(call(string, &[json!("str")]).unwrap(), json!("str"));
        assert_eq!(call(string, &[json!(1.0)]).unwrap(), json!("1.0"));
        assert_eq!(call(string, &[json!({"four": 4.0})]).unwrap(), json!(r#"{"four":4.0}"#));
        assert_eq!(call(string, &[Value::Null]).unwrap(), json!("null"));
    }

    #[test]
    fn test_binary_and_base64() {
        assert_eq!(
            call(binary, &[json!("hello")]).unwrap(),
            json!("0110100001100101011011000110110001101111")
        );
        assert_eq!(call(base64, &[json!("hello")]).unwrap(), json!("aGVsbG8="));
        assert_eq!(call(base64_to_string, &[json!("aGVsbG8=")]).unwrap(), json!("hello"));
        assert!(call(base64_to_string, &[json!("***")]).is_err());
        assert_eq!(
            call(base64_to_binary, &[json!("aGVsbG8=")]).unwrap(),
            json!("0110000101000111010101100111001101100010010001110011100000111101")
        );
    }

    #[test]
    fn test_data_uri() {
        let uri = call(data_uri, &[json!("hello")]).unwrap();
        assert_eq!(uri, json!("data:text/plain;charset=utf-8;base64,aGVsbG8="));
        assert_eq!(call(data_uri_to_string, &[uri]).unwrap(), json!("hello"));
        assert_eq!(
            call(data_uri_to_string, &[json!("data:,a%20b")]).unwrap(),
            json!("a b")
        );
    }

    #[test]
    fn test_uri_component() {
        assert_eq!(
            call(uri_component, &[json!("http://contoso.com")]).unwrap(),
            json!("http%3A%2F%2Fcontoso.com")
        );
        assert_eq!(
            call(uri_component_to_string, &[json!("http%3A%2F%2Fcontoso.com")]).unwrap(),
            json!("http://contoso.com")
        );
    }

    #[test]
    fn test_json_is_lenient() {
        assert_eq!(call(json, &[json!("{'a': [1, 'x']}")]).unwrap(), json!({"a": [1, "x"]}));
        assert!(call(json, &[json!(1)]).is_err());
    }

    #[test]
    fn test_xml_nested_object() {
        let out = call(
            xml,
            &[json!(r#"{"person": {"name": "Sophia Owen", "city": "Seattle"}}"#)],
        )
        .unwrap();
        insta::assert_snapshot!(out.as_str().unwrap(), @r#"
        <root type="object">
          <person type="object">
            <name type="string">Sophia Owen</name>
            <city type="string">Seattle</city>
          </person>
        </root>
        "#);
    }

    #[test]
    fn test_xml_arrays_and_odd_keys() {
        let out = call(xml, &[json!({"list": [1, null], "a b": "<x>"})]).unwrap();
        insta::assert_snapshot!(out.as_str().unwrap(), @r#"
        <root type="object">
          <list type="array">
            <item type="number">1</item>
            <item type="null" />
          </list>
          <item item="a b" type="string">&lt;x&gt;</item>
        </root>
        "#);
        let empty = call(xml, &[json!({})]).unwrap();
        assert_eq!(empty, json!(r#"<root type="object" />"#));
    }
}
