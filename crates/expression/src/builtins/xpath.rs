//! XPath queries over XML text
//!
//! A location-path subset on top of `roxmltree`: absolute and relative paths,
//! `//`, `*`, `.`, `..`, `@attr`, `@*`, `text()`, predicates (`[2]`,
//! `[last()]`, `[name='v']`, `[@id!='v']`, `[child]`) and the `sum()` and
//! `count()` aggregates. Elements come back as their outer XML.

use roxmltree::{Document, Node};
use serde_json::Value;

use super::get_text_arg;
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::value_utils::finite_value;

/// `xPath(xml, query)`
pub fn x_path(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let xml = get_text_arg("xPath", args, 0, "xml")?;
    let query = get_text_arg("xPath", args, 1, "query")?;
    let document = Document::parse(&xml)?;
    let query = query.trim();

    if let Some(inner) = aggregate_argument(query, "sum") {
        let path = parse_path(inner, query)?;
        let mut total = 0.0;
        for item in path.select(&document) {
            let text = item.string_value();
            total += text.trim().parse::<f64>().map_err(|_| {
                ExpressionError::invalid_argument("xPath", format!("'{}' is not a number", text.trim()))
            })?;
        }
        return finite_value("xPath", total);
    }

    if let Some(inner) = aggregate_argument(query, "count") {
        let path = parse_path(inner, query)?;
        return Ok(Value::from(path.select(&document).len()));
    }

    let path = parse_path(query, query)?;
    let mut results: Vec<Value> = path
        .select(&document)
        .into_iter()
        .map(|item| Value::String(item.render(&xml)))
        .collect();

    Ok(match results.len() {
        0 => Value::Null,
        1 => results.remove(0),
        _ => Value::Array(results),
    })
}

fn aggregate_argument<'q>(query: &'q str, name: &str) -> Option<&'q str> {
    query
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Item<'a, 'input> {
    Node(Node<'a, 'input>),
    Attribute(&'a str),
}

impl Item<'_, '_> {
    fn string_value(&self) -> String {
        match self {
            Item::Node(node) => string_value(*node),
            Item::Attribute(value) => value.to_string(),
        }
    }

    fn render(&self, xml: &str) -> String {
        match self {
            Item::Node(node) if node.is_element() => xml
                .get(node.range())
                .map(str::to_string)
                .unwrap_or_else(|| string_value(*node)),
            other => other.string_value(),
        }
    }
}

fn string_value(node: Node<'_, '_>) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    descendant: bool,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Element(String),
    AnyElement,
    Attribute(String),
    AnyAttribute,
    Text,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    Exists(NodeTest),
    Compare {
        test: NodeTest,
        negate: bool,
        value: String,
    },
}

impl LocationPath {
    fn select<'a, 'input>(&self, document: &'a Document<'input>) -> Vec<Item<'a, 'input>> {
        let mut context = vec![Item::Node(document.root())];
        for step in &self.steps {
            let mut next: Vec<Item<'a, 'input>> = Vec::new();
            for item in &context {
                let Item::Node(node) = item else { continue };
                let candidates = step.candidates(*node);
                let count = candidates.len();
                for (position, candidate) in candidates.into_iter().enumerate() {
                    if !step.predicates.iter().all(|p| p.accepts(&candidate, position + 1, count)) {
                        continue;
                    }
                    if let Item::Node(a) = &candidate {
                        if next.iter().any(|i| matches!(i, Item::Node(b) if b == a)) {
                            continue;
                        }
                    }
                    next.push(candidate);
                }
            }
            context = next;
        }
        context
    }
}

impl Step {
    fn candidates<'a, 'input>(&self, node: Node<'a, 'input>) -> Vec<Item<'a, 'input>> {
        let origins: Vec<Node<'a, 'input>> = if self.descendant {
            node.descendants().collect()
        } else {
            vec![node]
        };

        let mut out = Vec::new();
        for origin in origins {
            apply_test(&self.test, origin, &mut out);
        }
        out
    }
}

fn apply_test<'a, 'input>(test: &NodeTest, node: Node<'a, 'input>, out: &mut Vec<Item<'a, 'input>>) {
    match test {
        NodeTest::Element(name) => out.extend(
            node.children()
                .filter(|c| c.is_element() && c.tag_name().name() == name)
                .map(Item::Node),
        ),
        NodeTest::AnyElement => out.extend(node.children().filter(Node::is_element).map(Item::Node)),
        NodeTest::Attribute(name) => out.extend(
            node.attributes()
                .filter(|a| a.name() == name)
                .map(|a| Item::Attribute(a.value())),
        ),
        NodeTest::AnyAttribute => out.extend(node.attributes().map(|a| Item::Attribute(a.value()))),
        NodeTest::Text => out.extend(node.children().filter(Node::is_text).map(Item::Node)),
        NodeTest::SelfNode => out.push(Item::Node(node)),
        NodeTest::Parent => out.extend(node.parent().map(Item::Node)),
    }
}

impl Predicate {
    fn accepts(&self, item: &Item<'_, '_>, position: usize, count: usize) -> bool {
        match self {
            Predicate::Position(n) => position == *n,
            Predicate::Last => position == count,
            Predicate::Exists(test) => !related(test, item).is_empty(),
            Predicate::Compare { test, negate, value } => {
                let found = related(test, item).iter().any(|i| i.string_value() == *value);
                found != *negate
            }
        }
    }
}

fn related<'a, 'input>(test: &NodeTest, item: &Item<'a, 'input>) -> Vec<Item<'a, 'input>> {
    match item {
        Item::Node(node) => {
            let mut out = Vec::new();
            apply_test(test, *node, &mut out);
            out
        }
        Item::Attribute(_) if *test == NodeTest::SelfNode => vec![*item],
        Item::Attribute(_) => Vec::new(),
    }
}

// ============================================================================
// Query parsing
// ============================================================================

fn parse_path(path: &str, query: &str) -> ExpressionResult<LocationPath> {
    let invalid = |message: &str| {
        ExpressionError::invalid_argument("xPath", format!("invalid query '{}': {}", query, message))
    };
    let chars: Vec<char> = path.chars().collect();
    let mut i = 0;
    let mut steps = Vec::new();
    let mut descendant = false;

    while i < chars.len() {
        if chars[i] == '/' {
            if chars.get(i + 1) == Some(&'/') {
                descendant = true;
                i += 1;
            }
            i += 1;
            continue;
        }

        let start = i;
        let mut depth = 0;
        let mut quote: Option<char> = None;
        while i < chars.len() {
            match (quote, chars[i]) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(chars[i]),
                (None, '[') => depth += 1,
                (None, ']') => depth -= 1,
                (None, '/') if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        if depth != 0 || quote.is_some() {
            return Err(invalid("unbalanced brackets or quotes"));
        }

        let text: String = chars[start..i].iter().collect();
        steps.push(parse_step(text.trim(), descendant).ok_or_else(|| invalid("unsupported step"))?);
        descendant = false;
    }

    if steps.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(LocationPath { steps })
}

fn parse_step(text: &str, descendant: bool) -> Option<Step> {
    let (head, mut rest) = match text.find('[') {
        Some(at) => (&text[..at], &text[at..]),
        None => (text, ""),
    };

    let mut predicates = Vec::new();
    while let Some(body) = rest.strip_prefix('[') {
        let close = body.find(']')?;
        predicates.push(parse_predicate(body[..close].trim())?);
        rest = &body[close + 1..];
    }
    if !rest.trim().is_empty() {
        return None;
    }

    Some(Step {
        descendant,
        test: parse_node_test(head.trim())?,
        predicates,
    })
}

fn parse_node_test(text: &str) -> Option<NodeTest> {
    let test = match text {
        "" => return None,
        "*" => NodeTest::AnyElement,
        "@*" => NodeTest::AnyAttribute,
        "text()" => NodeTest::Text,
        "." => NodeTest::SelfNode,
        ".." => NodeTest::Parent,
        _ => match text.strip_prefix('@') {
            Some(name) => NodeTest::Attribute(name.to_string()),
            None if text.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')) => {
                NodeTest::Element(text.to_string())
            }
            None => return None,
        },
    };
    Some(test)
}

fn parse_predicate(text: &str) -> Option<Predicate> {
    if text == "last()" {
        return Some(Predicate::Last);
    }
    if let Ok(n) = text.parse::<usize>() {
        return Some(Predicate::Position(n));
    }

    let (lhs, negate, rhs) = if let Some(at) = text.find("!=") {
        (&text[..at], true, &text[at + 2..])
    } else if let Some(at) = text.find('=') {
        (&text[..at], false, &text[at + 1..])
    } else {
        return Some(Predicate::Exists(parse_node_test(text)?));
    };

    let rhs = rhs.trim();
    let value = ['\'', '"']
        .iter()
        .find_map(|q| rhs.strip_prefix(*q).and_then(|r| r.strip_suffix(*q)))
        .unwrap_or(rhs);
    Some(Predicate::Compare {
        test: parse_node_test(lhs.trim())?,
        negate,
        value: value.to_string(),
    })
}
