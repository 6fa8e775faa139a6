use super::ParseError;
use crate::store::KvMap;
use serde_json::Value;

/// Flatten a parsed document into slash-delimited keys.
///
/// The document root must be a mapping; an empty document yields no keys.
/// Scalar arrays are joined with
/// `glue`; arrays holding mappings or arrays are rejected.
pub fn flatten_document(
    document: &Value,
    glue: &str,
    origin: &str,
    out: &mut KvMap,
) -> Result<(), ParseError> {
    match document {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_value(key, value, glue, out)?;
            }
            Ok(())
        }
        Value::Null => Ok(()),
        _ => Err(ParseError::NotAMapping(origin.to_string())),
    }
}

fn flatten_value(path: &str, value: &Value, glue: &str, out: &mut KvMap) -> Result<(), ParseError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_value(&format!("{path}/{key}"), child, glue, out)?;
            }
        }
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| scalar_text(item).ok_or_else(|| ParseError::NestedArray(path.to_string())))
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(path.to_string(), parts.join(glue).into_bytes());
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                out.insert(path.to_string(), text.into_bytes());
            }
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
