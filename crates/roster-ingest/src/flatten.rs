//! Dotted-path access into nested source records.
//!
//! Source records arrive as nested JSON objects (`{"tables": {"students":
//! {...}}}`). Export flattens them into one row per record keyed by dotted
//! path; extraction reads single scalars by path.

use indexmap::IndexMap;
use serde_json::Value;

/// Scalar lookup failure: the path ended on (or passed through) a value
/// that is not a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub found: &'static str,
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read the scalar at `path` as text.
///
/// Missing segments and `null` yield `Ok(None)`, as do blank strings.
/// Numbers and booleans are rendered as text. Objects, arrays, or a scalar
/// where an object is needed to descend are a [`ShapeMismatch`].
pub fn lookup(record: &Value, path: &str) -> Result<Option<String>, ShapeMismatch> {
    let mut current = record;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            },
            Value::Null => return Ok(None),
            other => return Err(ShapeMismatch { found: kind(other) }),
        }
    }
    match current {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(ShapeMismatch { found: kind(other) }),
    }
}

/// Flatten nested objects into `dotted.path -> text` cells.
///
/// Arrays are kept whole as JSON text; `null` becomes an empty cell.
pub fn flatten(record: &Value) -> IndexMap<String, String> {
    let mut row = IndexMap::new();
    flatten_into(record, None, &mut row);
    row
}

fn flatten_into(value: &Value, prefix: Option<&str>, row: &mut IndexMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}.{key}"),
                    None => key.clone(),
                };
                flatten_into(child, Some(&path), row);
            }
        }
        other => {
            let cell = match other {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                scalar => scalar.to_string(),
            };
            row.insert(prefix.unwrap_or_default().to_string(), cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_reads_nested_scalars() {
        let record = json!({"tables": {"students": {"grade": 5, "first_name": "Ann", "email": "  "}}});
        assert_eq!(lookup(&record, "tables.students.grade"), Ok(Some("5".into())));
        assert_eq!(lookup(&record, "tables.students.first_name"), Ok(Some("Ann".into())));
        assert_eq!(lookup(&record, "tables.students.email"), Ok(None));
        assert_eq!(lookup(&record, "tables.students.missing"), Ok(None));
        assert_eq!(lookup(&record, "tables.teachers.id"), Ok(None));
    }

    #[test]
    fn lookup_rejects_containers() {
        let record = json!({"tables": {"students": {"grade": [5]}, "flag": "x"}});
        assert_eq!(
            lookup(&record, "tables.students"),
            Err(ShapeMismatch { found: "object" })
        );
        assert_eq!(
            lookup(&record, "tables.students.grade"),
            Err(ShapeMismatch { found: "array" })
        );
        assert_eq!(
            lookup(&record, "tables.flag.inner"),
            Err(ShapeMismatch { found: "string" })
        );
    }

    #[test]
    fn flatten_joins_object_keys() {
        let record = json!({"tables": {"students": {"student_number": "1001", "house": null}}, "id": 3});
        let row = flatten(&record);
        assert_eq!(row.get("tables.students.student_number").map(String::as_str), Some("1001"));
        assert_eq!(row.get("tables.students.house").map(String::as_str), Some(""));
        assert_eq!(row.get("id").map(String::as_str), Some("3"));
    }
}
