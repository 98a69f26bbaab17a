//! Canonical text rendering of manuscript content.
//!
//! Rules:
//! - object keys are emitted in lexicographic (byte) order at every depth
//! - objects and arrays are broken over lines with two-space indentation
//! - empty objects and arrays render as `{}` and `[]`
//! - scalars use compact JSON (strings escaped, so no raw newlines appear)
//! - there is no trailing newline
//!
//! Every line of the output therefore corresponds to exactly one JSON token
//! group, which keeps line diffs meaningful.

use std::fmt::Write;

use folio_types::Content;
use serde_json::Value;

const INDENT: &str = "  ";

/// Render a JSON value canonically.
pub fn canonical_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

/// Render a whole document canonically, as a JSON object keyed by section.
pub fn canonical_content(content: &Content) -> String {
    let mut out = String::new();
    write_object(&mut out, content.iter(), 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            write_object(out, entries.into_iter(), depth);
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, depth + 1);
                write_value(out, item, depth + 1);
            }
            newline(out, depth);
            out.push(']');
        }
        // Display on a scalar Value is compact JSON and cannot fail.
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

fn write_object<'a, I>(out: &mut String, entries: I, depth: usize)
where
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    let mut empty = true;
    out.push('{');
    for (key, value) in entries {
        if !empty {
            out.push(',');
        }
        empty = false;
        newline(out, depth + 1);
        let _ = write!(out, "{}: ", Value::String(key.clone()));
        write_value(out, value, depth + 1);
    }
    if !empty {
        newline(out, depth);
    }
    out.push('}');
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Content {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_document() {
        assert_eq!(canonical_content(&Content::new()), "{}");
    }

    #[test]
    fn flat_document_layout() {
        let content = doc(&[("b", json!(1)), ("a", json!("x"))]);
        assert_eq!(canonical_content(&content), "{\n  \"a\": \"x\",\n  \"b\": 1\n}");
    }

    #[test]
    fn nested_keys_are_sorted() {
        let value = json!({"z": {"b": 2, "a": [1, {"y": null, "x": true}]}, "m": []});
        let expected = "{\n  \"m\": [],\n  \"z\": {\n    \"a\": [\n      1,\n      {\n        \"x\": true,\n        \"y\": null\n      }\n    ],\n    \"b\": 2\n  }\n}";
        assert_eq!(canonical_value(&value), expected);
    }

    #[test]
    fn strings_are_escaped_onto_one_line() {
        let value = json!({"text": "line one\nline two"});
        let rendered = canonical_value(&value);
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.contains("line one\\nline two"));
    }

    #[test]
    fn equal_values_render_identically() {
        let a: Value = serde_json::from_str(r#"{"b": {"d": 1, "c": 2}, "a": 0}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": 0, "b": {"c": 2, "d": 1}}"#).unwrap();
        assert_eq!(canonical_value(&a), canonical_value(&b));
    }

    #[test]
    fn no_trailing_newline() {
        let rendered = canonical_content(&doc(&[("a", json!([1, 2]))]));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn empty_object_value() {
        assert_eq!(canonical_value(&json!({})), "{}");
        assert_eq!(canonical_value(&json!({"a": {}})), "{\n  \"a\": {}\n}");
    }
}
