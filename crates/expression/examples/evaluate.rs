//! Evaluate a few expressions against a bot turn and print what they read
//!
//! Run with `RUST_LOG=adaptive_expression=trace cargo run --example evaluate`
//! to see the evaluator's trace output.

use adaptive_expression::{Expression, ExpressionEngine, SimpleObjectMemory, format_error};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut memory = SimpleObjectMemory::new(json!({
        "user": {"name": "Ann", "visits": 3},
        "turn": {
            "recognized": {
                "entities": {"city": ["Seattle", "Kirkland"]},
                "intents": {"BookHotel": {"score": 0.92}}
            }
        },
        "dialog": {"nights": 2}
    }));

    println!("=== Expressions ===\n");
    let sources = [
        "concat('Hi ', user.name, ', visit number ', addOrdinal(user.visits))",
        "turn.recognized.intents.BookHotel.score > 0.9",
        "join(turn.recognized.entities.city, ', ', ' or ')",
        "join(foreach(turn.recognized.entities.city, c, toUpper(c)), '/')",
        "setPathToValue(dialog.total, dialog.nights * 129.5)",
    ];

    for source in sources {
        match Expression::parse(source) {
            Ok(expression) => {
                let refs: Vec<&str> = expression.references().iter().map(String::as_str).collect();
                match expression.try_evaluate(&mut memory) {
                    Ok(value) => println!("{}\n  = {}\n  reads {:?}\n", source, value, refs),
                    Err(e) => println!("{}\n  error: {}\n", source, e),
                }
            }
            Err(e) => println!("{}\n", format_error(source, &e)),
        }
    }

    println!("=== Memory after evaluation ===\n");
    println!("{:#}\n", memory.value()["dialog"]);

    println!("=== Error Messages ===\n");
    let engine = ExpressionEngine::new();
    for source in ["concat(user.name,\n  'unterminated)", "user.name +", "greet(user.name)"] {
        if let Err(e) = engine.evaluate(source, &mut memory) {
            println!("{}\n", format_error(source, &e));
        }
    }

    let e = engine.evaluate("1 / 0", &mut memory).unwrap_err();
    println!("[{}] {}", e.code(), e);
}
