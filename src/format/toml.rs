use serde_json::{Map, Value};

use super::{scalar_text, with_newline, Format, FormatError, FormatOptions};

/// TOML documents via the `toml` crate.
///
/// Datetimes read as strings. TOML has no null, so writing a document that
/// contains one fails instead of silently dropping the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

impl Format for Toml {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        let table: toml::Table = input.parse().map_err(|e| FormatError::parse("toml", e))?;
        Ok(table_to_json(table))
    }

    fn write(&self, value: &Value, _opts: &FormatOptions) -> Result<String, FormatError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Array(_) => {
                return Err(FormatError::write(
                    "toml",
                    "document root must be a table, found an array",
                ))
            }
            scalar => return Ok(with_newline(scalar_text(scalar).unwrap_or_default())),
        };
        let table = json_to_table(map, "")?;
        toml::to_string(&table)
            .map(with_newline)
            .map_err(|e| FormatError::write("toml", e))
    }
}

fn table_to_json(table: toml::Table) -> Value {
    Value::Object(table.into_iter().map(|(k, v)| (k, to_json(v))).collect())
}

fn to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        toml::Value::Table(table) => table_to_json(table),
    }
}

fn json_to_table(map: &Map<String, Value>, path: &str) -> Result<toml::Table, FormatError> {
    let mut table = toml::Table::new();
    for (key, value) in map {
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        table.insert(key.clone(), to_toml(value, &child)?);
    }
    Ok(table)
}

fn to_toml(value: &Value, path: &str) -> Result<toml::Value, FormatError> {
    Ok(match value {
        Value::Null => {
            return Err(FormatError::write(
                "toml",
                format!("`{path}` is null, which TOML cannot represent"),
            ))
        }
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => toml::Value::Integer(i),
            None => toml::Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Array(items) => toml::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_toml(item, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => toml::Value::Table(json_to_table(map, path)?),
    })
}
