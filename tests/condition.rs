//! Unit tests for the condition grammar: parsing and evaluation.
mod common;
use ahash::AHashMap;
use taiwa::error::ConditionError;
use taiwa::prelude::*;

fn vars(entries: &[(&str, Value)]) -> AHashMap<String, Value> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn eval(source: &str, variables: &AHashMap<String, Value>) -> bool {
    Condition::parse(source).unwrap().eval_truthy(variables).unwrap()
}

#[test]
fn test_numeric_comparisons() {
    let v = vars(&[("score", Value::Number(10.0))]);
    assert!(eval("score >= 10", &v));
    assert!(eval("score > 9.5", &v));
    assert!(!eval("score < 10", &v));
    assert!(eval("score == 10", &v));
    assert!(eval("score != 11", &v));
}

#[test]
fn test_string_equality_and_contains() {
    let v = vars(&[("status", Value::Str("open".to_string()))]);
    assert!(eval("status == \"open\"", &v));
    assert!(eval("status == 'open'", &v));
    assert!(!eval("status == \"closed\"", &v));
    assert!(eval("status contains \"pe\"", &v));
    assert!(!eval("status contains \"x\"", &v));
}

#[test]
fn test_numeric_string_coercion() {
    // Designer variables often arrive as strings; comparisons coerce when
    // both sides are numeric.
    let v = vars(&[("count", Value::Str("5".to_string()))]);
    assert!(eval("count > 3", &v));
    assert!(eval("count == 5", &v));
}

#[test]
fn test_boolean_combinators() {
    let v = vars(&[
        ("a", Value::Bool(true)),
        ("b", Value::Bool(false)),
    ]);
    assert!(eval("a and not b", &v));
    assert!(eval("a && !b", &v));
    assert!(eval("a or b", &v));
    assert!(eval("b || a", &v));
    assert!(!eval("a and b", &v));
    assert!(eval("not (a and b)", &v));
}

#[test]
fn test_short_circuit_skips_undefined_right_side() {
    let v = vars(&[("a", Value::Bool(true))]);
    // `or` short-circuits before touching the undefined variable.
    assert!(eval("a or missing > 3", &v));
    let v = vars(&[("a", Value::Bool(false))]);
    assert!(!eval("a and missing > 3", &v));
}

#[test]
fn test_literals() {
    let v = AHashMap::new();
    assert!(eval("true", &v));
    assert!(!eval("false", &v));
    assert!(!eval("null", &v));
    assert!(eval("1", &v));
    assert!(!eval("0", &v));
}

#[test]
fn test_bare_variable_truthiness() {
    let v = vars(&[
        ("name", Value::Str("Lin".to_string())),
        ("empty", Value::Str(String::new())),
        ("zero", Value::Number(0.0)),
    ]);
    assert!(eval("name", &v));
    assert!(!eval("empty", &v));
    assert!(!eval("zero", &v));
}

#[test]
fn test_undefined_variable_is_an_error() {
    let condition = Condition::parse("missing > 3").unwrap();
    let result = condition.eval_truthy(&AHashMap::new());
    assert!(matches!(result, Err(ConditionError::UndefinedVariable(_))));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        Condition::parse("\"unterminated"),
        Err(ConditionError::Parse { .. })
    ));
    assert!(matches!(
        Condition::parse("a ==" ),
        Err(ConditionError::Parse { .. })
    ));
    assert!(matches!(
        Condition::parse("a b"),
        Err(ConditionError::Parse { .. })
    ));
    assert!(matches!(
        Condition::parse("(a"),
        Err(ConditionError::Parse { .. })
    ));
    assert!(matches!(
        Condition::parse("a @ b"),
        Err(ConditionError::Parse { .. })
    ));
}

#[test]
fn test_dotted_and_unicode_identifiers() {
    let v = vars(&[
        ("user.level", Value::Number(3.0)),
        ("名前", Value::Str("花子".to_string())),
    ]);
    assert!(eval("user.level >= 3", &v));
    assert!(eval("名前 == \"花子\"", &v));
}

#[test]
fn test_value_display_integral_floats() {
    assert_eq!(Value::Number(3.0).to_string(), "3");
    assert_eq!(Value::Number(3.5).to_string(), "3.5");
    assert_eq!(Value::Str("x".to_string()).to_string(), "x");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Null.to_string(), "null");
}

#[test]
fn test_source_is_kept_for_diagnostics() {
    let condition = Condition::parse("score >= 10").unwrap();
    assert_eq!(condition.source(), "score >= 10");
}
