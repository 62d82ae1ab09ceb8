//! Shared scope and assertions for the integration tests

#![allow(dead_code)]

use adaptive_expression::{EvaluationContext, JsonMemory, MapMemory, Memory, SimpleObjectMemory};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Clock every evaluation in these tests runs against
pub const FIXED_NOW: &str = "2018-03-15T13:00:00Z";

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_NOW)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn context() -> EvaluationContext {
    EvaluationContext::builder()
        .fixed_time(fixed_now())
        .seed(17)
        .build()
}

pub fn scope() -> Value {
    json!({
        "path": {"array": [1]},
        "one": 1.0,
        "two": 2.0,
        "hello": "hello",
        "world": "world",
        "cit": "cit",
        "y": "y",
        "istrue": true,
        "nullObj": null,
        "bag": {
            "three": 3.0,
            "set": {"four": 4.0},
            "list": ["red", "blue"],
            "index": 3,
            "name": "mybag"
        },
        "items": ["zero", "one", "two"],
        "nestedItems": [{"x": 1}, {"x": 2}, {"x": 3}],
        "user": {
            "lists": {"todo": ["todo1", "todo2", "todo3"]},
            "listType": "todo"
        },
        "timestamp": "2018-03-15T13:00:00.000Z",
        "notISOTimestamp": "2018/03/15 13:00:00",
        "timestampObj": "2018-03-15T13:00:00Z",
        "unixTimestamp": 1521118800,
        "xmlStr": "<?xml version='1.0'?> <produce> <item> <name>Gala</name> <type>apple</type> <count>20</count> </item> <item> <name>Honeycrisp</name> <type>apple</type> <count>10</count> </item> </produce>",
        "jsonStr": "{
            'Stores': ['Lambton Quay', 'Willis Street'],
            'Manufacturers': [
                {'Name': 'Acme Co', 'Products': [{'Name': 'Anvil', 'Price': 50}]},
                {'Name': 'Contoso', 'Products': [
                    {'Name': 'Elbow Grease', 'Price': 99.95},
                    {'Name': 'Headlight Fluid', 'Price': 4}
                ]}
            ]
        }",
        "turn": {
            "recognized": {
                "entities": {
                    "city": ["Seattle"],
                    "ordinal": ["1", "2", "3"],
                    "CompositeList1": [["firstItem"]],
                    "CompositeList2": [["firstItem", "secondItem"]]
                },
                "intents": {
                    "BookFlight": "BookFlight",
                    "BookHotel": [
                        {"Where": "Bellevue", "Time": "Tomorrow", "People": "2"},
                        {"Where": "Kirkland", "Time": "Today", "People": "4"}
                    ]
                }
            }
        },
        "dialog": {
            "x": 3,
            "instance": {"xxx": "instance", "yyy": {"instanceY": "instanceY"}},
            "options": {"xxx": "options", "yyy": ["optionY1", "optionY2"]},
            "title": "Dialog Title",
            "subTitle": "Dialog Sub Title"
        },
        "callstack": [
            {
                "x": 3,
                "instance": {"xxx": "instance", "yyy": {"instanceY": "instanceY"}},
                "options": {"xxx": "options", "yyy": ["optionY1", "optionY2"]},
                "title": "Dialog Title",
                "subTitle": "Dialog Sub Title"
            },
            {"x": 2, "y": 2},
            {"x": 1, "y": 1, "z": 1}
        ]
    })
}

/// The scope wrapped by every memory backend, freshly built
pub fn memories() -> Vec<(&'static str, Box<dyn Memory>)> {
    let Value::Object(bindings) = scope() else {
        unreachable!("scope is an object");
    };
    vec![
        ("simple", Box::new(SimpleObjectMemory::new(scope()))),
        ("json", Box::new(JsonMemory::new(scope()))),
        ("map", Box::new(MapMemory::from(bindings))),
    ]
}

/// Integers must match exactly; any float on the actual side compares at
/// single precision. Lists compare item by item under the same rule.
pub fn assert_value_eq(source: &str, expected: &Value, actual: &Value) {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => {
            if a.is_i64() || a.is_u64() {
                assert!(
                    e.is_i64() || e.is_u64(),
                    "{}: expected {} but got integer {}",
                    source,
                    e,
                    a
                );
                assert_eq!(e, a, "{}", source);
            } else {
                let (e, a) = (e.as_f64().unwrap() as f32, a.as_f64().unwrap() as f32);
                assert_eq!(e, a, "{}", source);
            }
        }
        (Value::Array(e), Value::Array(a)) => {
            assert_eq!(e.len(), a.len(), "{}: {:?} vs {:?}", source, e, a);
            for (e, a) in e.iter().zip(a) {
                assert_value_eq(source, e, a);
            }
        }
        _ => assert_eq!(expected, actual, "{}", source),
    }
}
