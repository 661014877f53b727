//! JSON object parser.

use s3config::{ConfigData, ObjectParser, ParseError};
use serde_json::Value;

use crate::join_key;

/// Flattens a JSON document into `section:key` pairs.
///
/// The top-level element must be an object. Strings keep their value
/// verbatim, numbers and booleans are rendered with their JSON syntax, and
/// `null` becomes an empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonObjectParser;

impl ObjectParser for JsonObjectParser {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigData, ParseError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ParseError::new(e.to_string()))?;
        if !value.is_object() {
            return Err(ParseError::new(
                "top-level JSON element must be an object",
            ));
        }

        let mut data = ConfigData::new();
        flatten("", &value, &mut data);
        Ok(data)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut ConfigData) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join_key(prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&join_key(prefix, &index.to_string()), child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
