//! TOML object parser.

use ::toml::Value;
use s3config::{ConfigData, ObjectParser, ParseError};

use crate::join_key;

/// Flattens a TOML document into `section:key` pairs, with array elements
/// addressed by index. Datetimes are rendered in their TOML text form.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlObjectParser;

impl ObjectParser for TomlObjectParser {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigData, ParseError> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| ParseError::new(e.to_string()))?;
        let value: Value =
            ::toml::from_str(text).map_err(|e| ParseError::new(e.to_string()))?;

        let mut data = ConfigData::new();
        flatten("", &value, &mut data);
        Ok(data)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut ConfigData) {
    match value {
        Value::Table(table) => {
            for (key, child) in table {
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
        Value::Integer(i) => {
            out.insert(prefix.to_string(), i.to_string());
        }
        Value::Float(f) => {
            out.insert(prefix.to_string(), f.to_string());
        }
        Value::Boolean(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Datetime(dt) => {
            out.insert(prefix.to_string(), dt.to_string());
        }
    }
}
