//! Built-in functions for the expression language
//!
//! Functions are grouped by category. Each is registered with its arity and
//! one of two calling conventions:
//!
//! - *eager* functions receive their arguments already evaluated;
//! - *lazy* functions receive the raw argument expressions together with the
//!   evaluator and memory, which lets them short-circuit, swallow operand
//!   errors, bind iterator variables or write to memory.

pub mod collection;
pub mod conversion;
pub mod datetime;
pub mod datetime_format;
pub mod jpath;
pub mod logic;
pub mod math;
pub mod memory;
pub mod object;
pub mod regex;
pub mod string;
pub mod timezone;
pub mod uri;
pub mod xpath;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::eval::Evaluator;
use crate::memory::Memory;
use crate::value_utils::{to_text, value_type_name};

/// A function over evaluated arguments
pub type BuiltinFunction = fn(&[Value], &EvaluationContext) -> ExpressionResult<Value>;

/// A function over unevaluated arguments
pub type LazyFunction = fn(&[Expr], &Evaluator<'_>, &mut dyn Memory) -> ExpressionResult<Value>;

/// Calling convention of a registered function
#[derive(Clone, Copy)]
pub enum FunctionKind {
    /// Arguments are evaluated left to right before the call; the first error wins
    Eager(BuiltinFunction),
    /// The function evaluates its own arguments
    Lazy(LazyFunction),
}

/// Accepted argument count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Fewest arguments accepted
    pub min: usize,
    /// Most arguments accepted; `None` for variadic functions
    pub max: Option<usize>,
}

impl Arity {
    /// Exactly `n` arguments
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Between `min` and `max` arguments, inclusive
    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// `min` or more arguments
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Check whether `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// A named, arity-checked function the parser can bind calls to
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: Arc<str>,
    arity: Arity,
    kind: FunctionKind,
}

impl FunctionDescriptor {
    /// Describe an eager function
    pub fn eager(name: &str, arity: Arity, function: BuiltinFunction) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            kind: FunctionKind::Eager(function),
        }
    }

    /// Describe a lazy function
    pub fn lazy(name: &str, arity: Arity, function: LazyFunction) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            kind: FunctionKind::Lazy(function),
        }
    }

    /// Function name as written in expressions
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted argument count
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Calling convention
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Fail with `InvalidArgument` when `count` is outside the arity
    pub fn check_arity(&self, count: usize) -> ExpressionResult<()> {
        if self.arity.accepts(count) {
            Ok(())
        } else {
            Err(ExpressionError::invalid_argument(
                self.name(),
                format!("Expected {} arguments, got {}", self.arity, count),
            ))
        }
    }
}

impl PartialEq for FunctionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FunctionKind::Eager(_) => "eager",
            FunctionKind::Lazy(_) => "lazy",
        };
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &kind)
            .finish()
    }
}

/// Registry of all builtin functions
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    functions: HashMap<Arc<str>, Arc<FunctionDescriptor>>,
}

impl BuiltinRegistry {
    /// Create a new builtin registry with all standard functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::with_capacity(160),
        };

        registry.register_string_functions();
        registry.register_math_functions();
        registry.register_logic_functions();
        registry.register_conversion_functions();
        registry.register_datetime_functions();
        registry.register_uri_functions();
        registry.register_collection_functions();
        registry.register_object_functions();

        registry
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register(&mut self, descriptor: FunctionDescriptor) {
        self.functions
            .insert(Arc::clone(&descriptor.name), Arc::new(descriptor));
    }

    fn eager(&mut self, name: &str, arity: Arity, function: BuiltinFunction) {
        self.register(FunctionDescriptor::eager(name, arity, function));
    }

    fn lazy(&mut self, name: &str, arity: Arity, function: LazyFunction) {
        self.register(FunctionDescriptor::lazy(name, arity, function));
    }

    /// Look a function up by name
    pub fn get(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.functions.get(name).cloned()
    }

    /// Check if a function exists
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get all function names, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    // Registration methods for each category

    fn register_string_functions(&mut self) {
        self.eager("concat", Arity::at_least(1), string::concat);
        self.eager("length", Arity::exact(1), string::length);
        self.eager("replace", Arity::exact(3), string::replace);
        self.eager("replaceIgnoreCase", Arity::exact(3), string::replace_ignore_case);
        self.eager("split", Arity::range(1, 2), string::split);
        self.eager("substring", Arity::range(2, 3), string::substring);
        self.eager("toLower", Arity::exact(1), string::to_lower);
        self.eager("toUpper", Arity::exact(1), string::to_upper);
        self.eager("trim", Arity::exact(1), string::trim);
        self.eager("startsWith", Arity::exact(2), string::starts_with);
        self.eager("endsWith", Arity::exact(2), string::ends_with);
        self.eager("countWord", Arity::exact(1), string::count_word);
        self.eager("addOrdinal", Arity::exact(1), string::add_ordinal);
        self.eager("indexOf", Arity::exact(2), string::index_of);
        self.eager("lastIndexOf", Arity::exact(2), string::last_index_of);
        self.eager("newGuid", Arity::exact(0), string::new_guid);
        self.eager("join", Arity::range(2, 3), string::join);
    }

    fn register_math_functions(&mut self) {
        self.eager("add", Arity::at_least(2), math::add);
        self.eager("sub", Arity::at_least(2), math::sub);
        self.eager("mul", Arity::at_least(2), math::mul);
        self.eager("div", Arity::at_least(2), math::div);
        self.eager("mod", Arity::exact(2), math::modulo);
        self.eager("exp", Arity::exact(2), math::exp);
        self.eager("max", Arity::at_least(1), math::max);
        self.eager("min", Arity::at_least(1), math::min);
        self.eager("rand", Arity::exact(2), math::rand);
        self.eager("range", Arity::exact(2), math::range);
        self.eager("sum", Arity::exact(1), math::sum);
        self.eager("average", Arity::exact(1), math::average);
    }

    fn register_logic_functions(&mut self) {
        self.lazy("and", Arity::at_least(1), logic::and);
        self.lazy("or", Arity::at_least(1), logic::or);
        self.lazy("not", Arity::exact(1), logic::not);
        self.lazy("if", Arity::exact(3), logic::if_);
        self.lazy("equals", Arity::exact(2), logic::equals);
        self.lazy("notEquals", Arity::exact(2), logic::not_equals);
        self.lazy("greater", Arity::exact(2), logic::greater);
        self.lazy("greaterOrEquals", Arity::exact(2), logic::greater_or_equals);
        self.lazy("less", Arity::exact(2), logic::less);
        self.lazy("lessOrEquals", Arity::exact(2), logic::less_or_equals);
        self.lazy("exists", Arity::exact(1), logic::exists);
    }

    fn register_conversion_functions(&mut self) {
        self.eager("float", Arity::exact(1), conversion::float);
        self.eager("int", Arity::exact(1), conversion::int);
        self.eager("string", Arity::exact(1), conversion::string);
        self.lazy("bool", Arity::exact(1), conversion::bool);
        self.eager("createArray", Arity::at_least(0), conversion::create_array);
        self.eager("array", Arity::exact(1), conversion::array);
        self.eager("binary", Arity::exact(1), conversion::binary);
        self.eager("base64", Arity::exact(1), conversion::base64);
        self.eager("base64ToBinary", Arity::exact(1), conversion::base64_to_binary);
        self.eager("base64ToString", Arity::exact(1), conversion::base64_to_string);
        self.eager("dataUri", Arity::exact(1), conversion::data_uri);
        self.eager("dataUriToBinary", Arity::exact(1), conversion::data_uri_to_binary);
        self.eager("dataUriToString", Arity::exact(1), conversion::data_uri_to_string);
        self.eager("uriComponent", Arity::exact(1), conversion::uri_component);
        self.eager(
            "uriComponentToString",
            Arity::exact(1),
            conversion::uri_component_to_string,
        );
        self.eager("json", Arity::exact(1), conversion::json);
        self.eager("xml", Arity::exact(1), conversion::xml);
    }

    fn register_datetime_functions(&mut self) {
        self.eager("addDays", Arity::range(2, 3), datetime::add_days);
        self.eager("addHours", Arity::range(2, 3), datetime::add_hours);
        self.eager("addMinutes", Arity::range(2, 3), datetime::add_minutes);
        self.eager("addSeconds", Arity::range(2, 3), datetime::add_seconds);
        self.eager("addToTime", Arity::range(3, 4), datetime::add_to_time);
        self.eager("subtractFromTime", Arity::range(3, 4), datetime::subtract_from_time);
        self.eager("dayOfMonth", Arity::exact(1), datetime::day_of_month);
        self.eager("dayOfWeek", Arity::exact(1), datetime::day_of_week);
        self.eager("dayOfYear", Arity::exact(1), datetime::day_of_year);
        self.eager("month", Arity::exact(1), datetime::month);
        self.eager("year", Arity::exact(1), datetime::year);
        self.eager("date", Arity::exact(1), datetime::date);
        self.eager("utcNow", Arity::range(0, 1), datetime::utc_now);
        self.eager("formatDateTime", Arity::range(1, 2), datetime::format_date_time);
        self.eager("dateReadBack", Arity::range(2, 3), datetime::date_read_back);
        self.eager("getTimeOfDay", Arity::exact(1), datetime::get_time_of_day);
        self.eager("getPastTime", Arity::range(2, 3), datetime::get_past_time);
        self.eager("getFutureTime", Arity::range(2, 3), datetime::get_future_time);
        self.eager("convertFromUTC", Arity::range(2, 3), datetime::convert_from_utc);
        self.eager("convertToUTC", Arity::range(2, 3), datetime::convert_to_utc);
        self.eager("startOfDay", Arity::range(1, 2), datetime::start_of_day);
        self.eager("startOfHour", Arity::range(1, 2), datetime::start_of_hour);
        self.eager("startOfMonth", Arity::range(1, 2), datetime::start_of_month);
        self.eager("ticks", Arity::exact(1), datetime::ticks);
    }

    fn register_uri_functions(&mut self) {
        self.eager("uriHost", Arity::exact(1), uri::uri_host);
        self.eager("uriPath", Arity::exact(1), uri::uri_path);
        self.eager("uriPathAndQuery", Arity::exact(1), uri::uri_path_and_query);
        self.eager("uriPort", Arity::exact(1), uri::uri_port);
        self.eager("uriQuery", Arity::exact(1), uri::uri_query);
        self.eager("uriScheme", Arity::exact(1), uri::uri_scheme);
    }

    fn register_collection_functions(&mut self) {
        self.eager("contains", Arity::exact(2), collection::contains);
        self.eager("count", Arity::exact(1), collection::count);
        self.eager("empty", Arity::exact(1), collection::empty);
        self.eager("first", Arity::exact(1), collection::first);
        self.eager("last", Arity::exact(1), collection::last);
        self.lazy("foreach", Arity::exact(3), collection::foreach);
        self.lazy("select", Arity::exact(3), collection::foreach);
        self.lazy("where", Arity::exact(3), collection::where_);
        self.eager("union", Arity::at_least(1), collection::union);
        self.eager("intersection", Arity::at_least(1), collection::intersection);
        self.eager("skip", Arity::exact(2), collection::skip);
        self.eager("take", Arity::exact(2), collection::take);
        self.eager("subArray", Arity::range(2, 3), collection::sub_array);
        self.eager("sortBy", Arity::range(1, 2), collection::sort_by);
        self.eager("sortByDescending", Arity::range(1, 2), collection::sort_by_descending);
    }

    fn register_object_functions(&mut self) {
        self.eager("isMatch", Arity::exact(2), regex::is_match);
        self.eager("addProperty", Arity::exact(3), object::add_property);
        self.eager("setProperty", Arity::exact(3), object::set_property);
        self.eager("removeProperty", Arity::exact(2), object::remove_property);
        self.eager("coalesce", Arity::at_least(1), object::coalesce);
        self.lazy("getProperty", Arity::range(1, 2), object::get_property);
        self.eager("xPath", Arity::exact(2), xpath::x_path);
        self.eager("jPath", Arity::exact(2), jpath::j_path);
        self.lazy("setPathToValue", Arity::exact(2), memory::set_path_to_value);
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn missing(func_name: &str, arg_name: &str, index: usize) -> ExpressionError {
    ExpressionError::invalid_argument(
        func_name,
        format!("Missing argument '{}' at position {}", arg_name, index),
    )
}

/// Text of a string argument; null reads as the empty string
pub(crate) fn get_text_arg(
    func_name: &str,
    args: &[Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<String> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be a string, got {}",
                arg_name,
                value_type_name(other)
            ),
        )),
    }
}

/// Helper to get a string argument with better error message
pub(crate) fn get_string_arg<'a>(
    func_name: &str,
    args: &'a [Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<&'a str> {
    let val = args.get(index).ok_or_else(|| missing(func_name, arg_name, index))?;
    val.as_str().ok_or_else(|| {
        ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be a string, got {}",
                arg_name,
                value_type_name(val)
            ),
        )
    })
}

/// Helper to get an integer argument with better error message
pub(crate) fn get_int_arg(
    func_name: &str,
    args: &[Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<i64> {
    let val = args.get(index).ok_or_else(|| missing(func_name, arg_name, index))?;
    match val {
        Value::Number(n) => crate::value_utils::number_as_i64(n),
        _ => None,
    }
    .ok_or_else(|| {
        ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be an integer, got {}",
                arg_name,
                value_type_name(val)
            ),
        )
    })
}

/// Helper to get a number argument (int or float) with better error message
pub(crate) fn get_number_arg(
    func_name: &str,
    args: &[Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<f64> {
    let val = args.get(index).ok_or_else(|| missing(func_name, arg_name, index))?;
    match val {
        Value::Number(n) => crate::value_utils::number_as_f64(n),
        _ => None,
    }
    .ok_or_else(|| {
        ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be a number, got {}",
                arg_name,
                value_type_name(val)
            ),
        )
    })
}

/// Helper to get an array argument with better error message
pub(crate) fn get_array_arg<'a>(
    func_name: &str,
    args: &'a [Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<&'a Vec<Value>> {
    let val = args.get(index).ok_or_else(|| missing(func_name, arg_name, index))?;
    val.as_array().ok_or_else(|| {
        ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be an array, got {}",
                arg_name,
                value_type_name(val)
            ),
        )
    })
}

/// Helper to get an object argument with better error message
pub(crate) fn get_object_arg<'a>(
    func_name: &str,
    args: &'a [Value],
    index: usize,
    arg_name: &str,
) -> ExpressionResult<&'a serde_json::Map<String, Value>> {
    let val = args.get(index).ok_or_else(|| missing(func_name, arg_name, index))?;
    val.as_object().ok_or_else(|| {
        ExpressionError::invalid_argument(
            func_name,
            format!(
                "Argument '{}' must be an object, got {}",
                arg_name,
                value_type_name(val)
            ),
        )
    })
}

/// Optional trailing format argument
pub(crate) fn get_optional_text_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).filter(|v| !v.is_null()).map(to_text)
}
