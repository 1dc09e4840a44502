//! JSON Schema validation for tool arguments.
//!
//! Arguments are checked against a tool's `inputSchema` before its handler
//! runs. Every violation is collected with the dotted path of the offending
//! field (`endpoints[0].path`), so a caller can fix all of them in one go.
//!
//! Supported keywords: `type`, `properties`, `required`,
//! `additionalProperties` (`false` or a schema for undeclared values), `items`, `enum`, `minimum`, `maximum`,
//! `minLength`, `maxLength`.
//!
//! Safe coercions are applied and returned in the validated value:
//! - `"123"` → `123` for `integer` / `number` fields
//! - `"true"` / `"false"` → `true` / `false` for `boolean` fields
//! - numbers and booleans → strings for `string` fields

use serde_json::{Map, Value};

use crate::error::FieldIssue;
use crate::{Error, Result};

/// Validate `arguments` against `schema`, returning the coerced arguments.
///
/// A null argument value is treated as an empty object.
///
/// # Errors
///
/// Returns [`Error::SchemaValidation`] listing every violation found.
pub fn validate(arguments: &Value, schema: &Value) -> Result<Value> {
    let empty = Value::Object(Map::new());
    let arguments = if arguments.is_null() { &empty } else { arguments };

    let mut issues = Vec::new();
    let coerced = check(arguments, schema, "", &mut issues);

    if issues.is_empty() {
        Ok(coerced)
    } else {
        Err(Error::SchemaValidation(issues))
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn check(value: &Value, schema: &Value, path: &str, issues: &mut Vec<FieldIssue>) -> Value {
    let coerced = match schema.get("type").and_then(Value::as_str) {
        Some(ty) => match coerce(value, ty) {
            Ok(v) => v,
            Err(msg) => {
                issues.push(FieldIssue::new(path, msg));
                return value.clone();
            }
        },
        None => value.clone(),
    };

    if let Some(options) = schema.get("enum").and_then(Value::as_array)
        && !options.contains(&coerced)
    {
        let rendered: Vec<String> = options.iter().map(display).collect();
        issues.push(FieldIssue::new(
            path,
            format!("must be one of: {}", rendered.join(", ")),
        ));
    }

    if let Some(num) = coerced.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64)
            && num < min
        {
            issues.push(FieldIssue::new(path, format!("must be >= {min}")));
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64)
            && num > max
        {
            issues.push(FieldIssue::new(path, format!("must be <= {max}")));
        }
    }

    if let Some(s) = coerced.as_str() {
        let len = s.chars().count() as u64;
        if let Some(min_len) = schema.get("minLength").and_then(Value::as_u64)
            && len < min_len
        {
            issues.push(FieldIssue::new(
                path,
                format!("must be at least {min_len} characters long"),
            ));
        }
        if let Some(max_len) = schema.get("maxLength").and_then(Value::as_u64)
            && len > max_len
        {
            issues.push(FieldIssue::new(
                path,
                format!("must be at most {max_len} characters long"),
            ));
        }
    }

    match coerced {
        Value::Object(map) => Value::Object(check_object(map, schema, path, issues)),
        Value::Array(items) => match schema.get("items") {
            Some(item_schema) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| check(item, item_schema, &format!("{path}[{i}]"), issues))
                    .collect(),
            ),
            None => Value::Array(items),
        },
        other => other,
    }
}

fn check_object(
    map: Map<String, Value>,
    schema: &Value,
    path: &str,
    issues: &mut Vec<FieldIssue>,
) -> Map<String, Value> {
    let no_properties = Map::new();
    let extra = schema.get("additionalProperties");
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => properties,
        None if extra.is_some_and(Value::is_object) => &no_properties,
        None => return map,
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            match map.get(name) {
                None => issues.push(FieldIssue::new(child(path, name), "required parameter is missing")),
                Some(Value::Null) => issues.push(FieldIssue::new(
                    child(path, name),
                    "required parameter must not be null",
                )),
                Some(_) => {}
            }
        }
    }

    let mut out = Map::new();
    for (key, value) in map {
        match (properties.get(&key), extra) {
            (Some(_), _) if value.is_null() => {
                out.insert(key, value);
            }
            (Some(prop_schema), _) => {
                let checked = check(&value, prop_schema, &child(path, &key), issues);
                out.insert(key, checked);
            }
            (None, Some(Value::Bool(false))) => {
                let known: Vec<&str> = properties.keys().map(String::as_str).collect();
                issues.push(FieldIssue::new(
                    child(path, &key),
                    format!("unknown parameter, valid parameters are: {}", known.join(", ")),
                ));
            }
            // Undeclared keys of a map-like object, e.g. header values.
            (None, Some(value_schema @ Value::Object(_))) => {
                let checked = check(&value, value_schema, &child(path, &key), issues);
                out.insert(key, checked);
            }
            (None, _) => {
                out.insert(key, value);
            }
        }
    }
    out
}

fn coerce(value: &Value, declared_type: &str) -> std::result::Result<Value, String> {
    match (declared_type, value) {
        ("string", Value::String(_))
        | ("number", Value::Number(_))
        | ("boolean", Value::Bool(_))
        | ("array", Value::Array(_))
        | ("object", Value::Object(_)) => Ok(value.clone()),

        ("string", Value::Number(n)) => Ok(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Ok(Value::String(b.to_string())),

        ("integer", Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        ("integer", Value::Number(n)) => match n.as_f64() {
            #[allow(clippy::cast_possible_truncation)]
            Some(f) if f.fract() == 0.0 => Ok(Value::Number((f as i64).into())),
            _ => Err(format!("expected integer, got float {n}")),
        },
        ("integer", Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| format!("expected integer, got string \"{s}\"")),

        ("number", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got string \"{s}\"")),

        ("boolean", Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got string \"{s}\"")),
        },

        ("string" | "integer" | "number" | "boolean" | "array" | "object", other) => Err(format!(
            "expected {declared_type}, got {}",
            type_name(other)
        )),

        // Unknown type keyword: accept as-is.
        _ => Ok(value.clone()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{s}\""),
        _ => v.to_string(),
    }
}
