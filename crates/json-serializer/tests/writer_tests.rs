use json_serializer::writer::{render, render_pretty, render_with, WriteOptions};
use json_serializer::{parse_str, EncodeError, Map, Value};

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// Helper: the rendered text must be valid JSON to serde_json as well.
fn assert_serde_accepts(text: &str) {
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(text);
    assert!(parsed.is_ok(), "serde_json rejected: {text}");
}

// ============================================================================
// Compact output
// ============================================================================

#[test]
fn render_person() {
    let person = object(vec![("name", Value::from("ann")), ("age", Value::from(30))]);
    assert_eq!(render(&person).unwrap(), r#"{"name":"ann","age":30}"#);
}

#[test]
fn render_nested_document() {
    let doc = object(vec![
        ("list", Value::Array(vec![Value::from(1), Value::Null, Value::from(true)])),
        ("inner", object(vec![("x", Value::from(0.5))])),
    ]);
    let text = render(&doc).unwrap();
    assert_eq!(text, r#"{"list":[1,null,true],"inner":{"x":0.5}}"#);
    assert_serde_accepts(&text);
}

#[test]
fn render_is_deterministic() {
    let doc = object(vec![
        ("b", Value::from(1)),
        ("a", Value::Array(vec![Value::from("x"), Value::from(2.25)])),
    ]);
    let first = render(&doc).unwrap();
    for _ in 0..10 {
        assert_eq!(render(&doc).unwrap(), first);
    }
}

#[test]
fn render_floats_reparse_as_floats() {
    for f in [1.0, 0.1, 100.0, 1e21, 1e-7, 123456.789, f64::MAX, f64::MIN_POSITIVE] {
        let text = render(&Value::from(f)).unwrap();
        assert_eq!(parse_str(&text).unwrap(), Value::from(f), "{text}");
        assert_serde_accepts(&text);
    }
}

#[test]
fn render_control_characters() {
    let text = render(&Value::from("\u{01}\u{7f}")).unwrap();
    assert_eq!(text, "\"\\u0001\u{7f}\"");
}

#[test]
fn render_escaped_keys() {
    let doc = object(vec![("a\"b", Value::Null)]);
    assert_eq!(render(&doc).unwrap(), r#"{"a\"b":null}"#);
}

// ============================================================================
// Pretty output
// ============================================================================

#[test]
fn pretty_matches_fixture_layout() {
    let doc = object(vec![
        (
            "nested",
            object(vec![
                ("name", Value::from("someName")),
                (
                    "nestedMore",
                    object(vec![
                        ("name", Value::from("nestedName")),
                        ("value", Value::from(31)),
                    ]),
                ),
            ]),
        ),
        ("value", Value::from(5)),
    ]);
    let expected = r#"{
  "nested": {
    "name": "someName",
    "nestedMore": {
      "name": "nestedName",
      "value": 31
    }
  },
  "value": 5
}"#;
    assert_eq!(render_pretty(&doc, 2).unwrap(), expected);
}

#[test]
fn pretty_with_four_spaces() {
    let doc = object(vec![("k", Value::Array(vec![Value::from(1)]))]);
    assert_eq!(
        render_pretty(&doc, 4).unwrap(),
        "{\n    \"k\": [\n        1\n    ]\n}"
    );
}

#[test]
fn pretty_empty_containers() {
    let doc = object(vec![
        ("a", Value::Array(vec![])),
        ("o", Value::Object(Map::new())),
    ]);
    assert_eq!(
        render_pretty(&doc, 2).unwrap(),
        "{\n  \"a\": [],\n  \"o\": {}\n}"
    );
}

#[test]
fn pretty_and_compact_parse_equal() {
    let doc = object(vec![
        ("xs", Value::Array(vec![Value::from(1), object(vec![("y", Value::Null)])])),
        ("s", Value::from("text")),
    ]);
    let compact = parse_str(&render(&doc).unwrap()).unwrap();
    let pretty = parse_str(&render_pretty(&doc, 2).unwrap()).unwrap();
    assert_eq!(compact, pretty);
    assert_eq!(compact, doc);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn nan_in_nested_object_reports_path() {
    let doc = object(vec![(
        "stats",
        object(vec![("mean", Value::from(f64::NAN))]),
    )]);
    let err = render(&doc).unwrap_err();
    match &err {
        EncodeError::NonFiniteNumber { value, path } => {
            assert!(value.is_nan());
            assert_eq!(path.to_string(), "root.stats.mean");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn infinity_message() {
    let err = render(&Value::Array(vec![Value::from(f64::INFINITY)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot encode non-finite number inf at root[0]"
    );
}

#[test]
fn over_deep_value_fails_instead_of_overflowing() {
    let mut value = Value::from(1);
    for _ in 0..1_000 {
        value = Value::Array(vec![value]);
    }
    let err = render(&value).unwrap_err();
    assert!(matches!(err, EncodeError::DepthExceeded { limit: 128, .. }));

    let options = WriteOptions {
        indent: None,
        max_depth: 1_000,
    };
    let text = render_with(&value, &options).unwrap();
    assert_eq!(text.len(), 2_001);
}
