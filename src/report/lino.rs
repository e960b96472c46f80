//! Links Notation (lino) report output.
//!
//! Converts JSON values to an indentation-based notation: objects become
//! `key:` followed by their entries indented two spaces, scalars become
//! `key value`. Arrays of objects that carry a `name` are keyed by that
//! name, so each ranking appears as its own `'C/C++':` block.

use crate::models::AggregatedReport;
use anyhow::Result;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Characters that force a token to be quoted.
pub const RESERVED_CHARS: &[char] = &[':', '(', ')', '\'', '"', '`', '/', '#', ','];

const INDENT: &str = "  ";

/// Quote a key or string value when it would not survive as a bare token.
///
/// Line breaks are folded to spaces since a token never spans lines.
pub fn quote(s: &str) -> Cow<'_, str> {
    let needs_quotes =
        s.is_empty() || s.chars().any(|c| c.is_whitespace() || RESERVED_CHARS.contains(&c));
    if !needs_quotes {
        return Cow::Borrowed(s);
    }

    let mut text = s.replace(['\r', '\n'], " ");
    let quote = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else {
        if text.contains('`') {
            text = text.replace('`', "'");
        }
        '`'
    };
    Cow::Owned(format!("{quote}{text}{quote}"))
}

fn scalar(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::String(s) => quote(s),
        Value::Array(_) | Value::Object(_) => Cow::Borrowed("()"),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn push_line(out: &mut String, level: usize, text: &str) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn write_entries(out: &mut String, map: &Map<String, Value>, level: usize) {
    for (key, value) in map {
        write_entry(out, key, value, level);
    }
}

fn write_entry(out: &mut String, key: &str, value: &Value, level: usize) {
    let key = quote(key);

    if is_empty_container(value) {
        push_line(out, level, &format!("{} ()", key));
        return;
    }

    match value {
        Value::Object(map) => {
            push_line(out, level, &format!("{}:", key));
            write_entries(out, map, level + 1);
        }
        Value::Array(items) => {
            push_line(out, level, &format!("{}:", key));
            write_items(out, items, level + 1);
        }
        scalar_value => push_line(out, level, &format!("{} {}", key, scalar(scalar_value))),
    }
}

fn write_items(out: &mut String, items: &[Value], level: usize) {
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Object(map) => {
                let key = match map.get("name") {
                    Some(Value::String(name)) => name.clone(),
                    _ => index.to_string(),
                };
                write_entry(out, &key, item, level);
            }
            Value::Array(_) => write_entry(out, &index.to_string(), item, level),
            scalar_value => push_line(out, level, &scalar(scalar_value)),
        }
    }
}

/// Convert a JSON value to lino text.
pub fn json_to_lino(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => write_entries(&mut out, map, 0),
        Value::Array(items) => write_items(&mut out, items, 0),
        scalar_value => push_line(&mut out, 0, &scalar(scalar_value)),
    }
    out
}

/// Render the aggregated report as lino.
pub fn generate_lino_report(report: &AggregatedReport) -> Result<String> {
    let value = serde_json::to_value(report)?;
    Ok(json_to_lino(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_rules() {
        assert_eq!(quote("Python"), "Python");
        assert_eq!(quote("C++"), "C++");
        assert_eq!(quote("C/C++"), "'C/C++'");
        assert_eq!(quote("Visual Basic"), "'Visual Basic'");
        assert_eq!(quote("F#"), "'F#'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote(r#"it's "x""#), r#"`it's "x"`"#);
        assert_eq!(quote("a\nb"), "'a b'");
    }

    #[test]
    fn test_nested_objects_and_scalars() {
        let lino = json_to_lino(&json!({
            "meta": { "title": "Rankings", "version": "1.0.0" },
            "count": 3,
            "ok": true,
            "missing": null,
        }));

        assert_eq!(
            lino,
            "meta:\n  title Rankings\n  version 1.0.0\ncount 3\nok true\nmissing null\n"
        );
    }

    #[test]
    fn test_named_objects_keyed_by_name() {
        let lino = json_to_lino(&json!({
            "rankings": [
                { "rank": 1, "name": "C/C++", "scorePercent": "12.00%" },
                { "rank": 2, "name": "Go" },
            ]
        }));

        let expected = "\
rankings:
  'C/C++':
    rank 1
    name 'C/C++'
    scorePercent 12.00%
  Go:
    rank 2
    name Go
";
        assert_eq!(lino, expected);
    }

    #[test]
    fn test_plain_arrays_and_empty_containers() {
        let lino = json_to_lino(&json!({
            "top10": ["Python", "C#"],
            "weaknesses": [],
            "extra": {},
            "points": [{ "date": "2025-01" }],
        }));

        let expected = "\
top10:
  Python
  'C#'
weaknesses ()
extra ()
points:
  0:
    date 2025-01
";
        assert_eq!(lino, expected);
    }
}
