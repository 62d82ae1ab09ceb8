//! Behaviour the memory backends share, and where they differ

mod common;

use adaptive_expression::{
    Expression, JsonMemory, MapMemory, Memory, SimpleObjectMemory, StackedMemory,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::Serialize;
use serde_json::{Value, json};

fn eval(source: &str, memory: &mut dyn Memory) -> Value {
    Expression::parse(source)
        .unwrap()
        .try_evaluate_with(memory, &common::context())
        .unwrap()
}

#[rstest]
#[case("bag.name", json!("mybag"))]
#[case("bag.list[1]", json!("blue"))]
#[case("items[5]", Value::Null)]
#[case("bag.missing.deeper", Value::Null)]
#[case("nullObj", Value::Null)]
#[case("one.xxx", Value::Null)]
fn test_reads_agree(#[case] source: &str, #[case] expected: Value) {
    for (backend, mut memory) in common::memories() {
        assert_eq!(eval(source, memory.as_mut()), expected, "{} on {}", source, backend);
    }
}

#[test]
fn test_writes_agree() {
    for (backend, mut memory) in common::memories() {
        eval("setPathToValue(fresh.list[1], 'x')", memory.as_mut());
        assert_eq!(memory.get_value("fresh.list"), Some(json!([null, "x"])), "{}", backend);

        eval("setPathToValue(bag.name, 'renamed')", memory.as_mut());
        assert_eq!(memory.get_value("bag.name"), Some(json!("renamed")), "{}", backend);
    }
}

#[test]
fn test_deep_write_into_unbound_name() {
    for (backend, mut memory) in common::memories() {
        assert_eq!(eval("setPathToValue(a.b.c, 1)", memory.as_mut()), json!(1));
        assert_eq!(memory.get_value("a"), Some(json!({"b": {"c": 1}})), "{}", backend);
    }

    let mut empty = MapMemory::new();
    eval("setPathToValue(x.y.z, 'deep')", &mut empty);
    assert_eq!(empty.get_value("x.y.z"), Some(json!("deep")));

    let mut wrapped_null = SimpleObjectMemory::new(Value::Null);
    eval("setPathToValue(x.list[0], 2)", &mut wrapped_null);
    assert_eq!(wrapped_null.value(), &json!({"x": {"list": [2]}}));
}

#[test]
fn test_write_through_scalar_fails() {
    for (backend, mut memory) in common::memories() {
        let result = Expression::parse("setPathToValue(hello.x, 1)")
            .unwrap()
            .try_evaluate(memory.as_mut());
        let error = result.unwrap_err();
        assert_eq!(error.code(), "EXPR:INVALID_PATH", "{}", backend);
        assert!(error.to_string().contains("hello.x"), "{}: {}", backend, error);
    }
}

#[test]
fn test_case_matching_differs() {
    let mut simple = SimpleObjectMemory::new(common::scope());
    assert_eq!(eval("BAG.Name", &mut simple), json!("mybag"));

    let mut strict = JsonMemory::new(common::scope());
    assert_eq!(eval("BAG.Name", &mut strict), Value::Null);
}

#[test]
fn test_wrap_serializable() {
    #[derive(Serialize)]
    struct Order {
        id: u32,
        lines: Vec<&'static str>,
    }

    let mut memory = SimpleObjectMemory::wrap(&Order {
        id: 7,
        lines: vec!["tea", "milk"],
    })
    .unwrap();
    assert_eq!(eval("concat(id, ':', join(lines, '+'))", &mut memory), json!("7:tea+milk"));
}

#[test]
fn test_json_memory_from_lenient_text() {
    let mut memory = JsonMemory::parse("{'user': {'name': 'Ann'}}").unwrap();
    assert_eq!(eval("user.name", &mut memory), json!("Ann"));
    assert!(JsonMemory::parse("{user: }").is_err());
}

#[test]
fn test_stacked_scope_shadows_and_falls_through() {
    let mut base = MapMemory::new();
    base.insert("x", json!(1));
    base.insert("y", json!(2));

    {
        let mut scope = StackedMemory::with_local(&mut base, "x", json!(10));
        assert_eq!(eval("x + y", &mut scope), json!(12));

        eval("setPathToValue(y, 20)", &mut scope);
        eval("setPathToValue(x, 30)", &mut scope);
        assert_eq!(scope.get_value("x"), Some(json!(30)));
    }

    assert_eq!(base.get_value("x"), Some(json!(1)));
    assert_eq!(base.get_value("y"), Some(json!(20)));
}

#[test]
fn test_iteration_does_not_leak_into_memory() {
    let mut memory = SimpleObjectMemory::new(json!({"items": [1, 2, 3]}));
    assert_eq!(eval("foreach(items, item, item * 10)", &mut memory), json!([10, 20, 30]));
    assert_eq!(memory.get_value("item"), None);
    assert_eq!(memory.value(), &json!({"items": [1, 2, 3]}));
}
