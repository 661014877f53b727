//! YAML object parser.

use s3config::{ConfigData, ObjectParser, ParseError};
use serde_yaml::Value;

use crate::join_key;

/// Flattens a YAML document into `section:key` pairs.
///
/// Mapping keys must be strings; anything else (sequences or maps used as
/// keys) is a [`ParseError`]. YAML `null` becomes an empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlObjectParser;

impl ObjectParser for YamlObjectParser {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigData, ParseError> {
        let value: Value =
            serde_yaml::from_slice(bytes).map_err(|e| ParseError::new(e.to_string()))?;
        if !value.is_mapping() {
            return Err(ParseError::new(
                "top-level YAML element must be a mapping",
            ));
        }

        let mut data = ConfigData::new();
        flatten("", &value, &mut data)?;
        Ok(data)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut ConfigData) -> Result<(), ParseError> {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = key.as_str().ok_or_else(|| {
                    ParseError::new(format!("mapping key {key:?} is not a string"))
                })?;
                flatten(&join_key(prefix, key), child, out)?;
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&join_key(prefix, &index.to_string()), child, out)?;
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::Tagged(tagged) => {
            flatten(prefix, &tagged.value, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_mappings() {
        let data = YamlObjectParser
            .parse(b"database:\n  url: postgres://x\n  pool:\n    max: 8\n")
            .unwrap();
        assert_eq!(
            data.get("database:url").map(String::as_str),
            Some("postgres://x")
        );
        assert_eq!(data.get("database:pool:max").map(String::as_str), Some("8"));
    }

    #[test]
    fn indexes_sequences() {
        let data = YamlObjectParser
            .parse(b"hosts:\n  - a\n  - b\n")
            .unwrap();
        assert_eq!(data.get("hosts:0").map(String::as_str), Some("a"));
        assert_eq!(data.get("hosts:1").map(String::as_str), Some("b"));
    }

    #[test]
    fn null_becomes_empty_string() {
        let data = YamlObjectParser.parse(b"empty: null\n").unwrap();
        assert_eq!(data.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(YamlObjectParser.parse(b"key: [unclosed\n").is_err());
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        assert!(YamlObjectParser.parse(b"- a\n- b\n").is_err());
    }

    #[test]
    fn non_string_key_is_rejected() {
        assert!(YamlObjectParser.parse(b"{1: one}\n").is_err());
    }
}
