use serde::Deserialize;
use serde_json::{Map, Value};

use super::{with_newline, Format, FormatError, FormatOptions};

/// YAML documents via `serde_yaml`.
///
/// A stream with several documents reads as an array of them. Mapping keys
/// that are not strings are stringified and tags are dropped, since the
/// document model only has string keys and no tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl Format for Yaml {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["yml"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        let mut docs = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(input) {
            let value = serde_yaml::Value::deserialize(doc).map_err(|e| FormatError::parse("yaml", e))?;
            docs.push(to_json(value));
        }
        Ok(match docs.len() {
            0 => Value::Null,
            1 => docs.remove(0),
            _ => Value::Array(docs),
        })
    }

    fn write(&self, value: &Value, _opts: &FormatOptions) -> Result<String, FormatError> {
        serde_yaml::to_string(value)
            .map(with_newline)
            .map_err(|e| FormatError::write("yaml", e))
    }
}

fn to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => number_to_json(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                map.insert(key_text(k), to_json(v));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => to_json(tagged.value),
    }
}

fn number_to_json(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        // .nan and .inf have no JSON number form
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn key_text(key: serde_yaml::Value) -> String {
    match to_json(key) {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
