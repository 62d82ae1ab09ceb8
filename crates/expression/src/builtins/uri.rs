//! URI parsing functions

use serde_json::Value;
use url::Url;

use super::get_text_arg;
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};

fn parse_uri(function: &str, args: &[Value]) -> ExpressionResult<Url> {
    let text = get_text_arg(function, args, 0, "uri")?;
    Url::parse(&text).map_err(|e| {
        ExpressionError::invalid_argument(function, format!("'{}' is not an absolute URI: {}", text, e))
    })
}

/// Host name
pub fn uri_host(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriHost", args)?;
    Ok(Value::String(uri.host_str().unwrap_or_default().to_string()))
}

/// Path, without the query
pub fn uri_path(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriPath", args)?;
    Ok(Value::String(uri.path().to_string()))
}

/// Path followed by `?query` when there is one
pub fn uri_path_and_query(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriPathAndQuery", args)?;
    let text = match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    };
    Ok(Value::String(text))
}

/// Explicit port, or the scheme's default
pub fn uri_port(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriPort", args)?;
    uri.port_or_known_default()
        .map(Value::from)
        .ok_or_else(|| ExpressionError::invalid_argument("uriPort", "URI has no port"))
}

/// Query with its leading `?`, or an empty string
pub fn uri_query(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriQuery", args)?;
    let text = uri.query().map(|q| format!("?{}", q)).unwrap_or_default();
    Ok(Value::String(text))
}

/// Scheme, lowercase
pub fn uri_scheme(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let uri = parse_uri("uriScheme", args)?;
    Ok(Value::String(uri.scheme().to_string()))
}
