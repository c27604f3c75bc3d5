use serde::Serialize;
use serde_json::Value;

use super::{with_newline, Format, FormatError, FormatOptions};

/// JSON documents via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Format for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        if input.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(input).map_err(|e| FormatError::parse("json", e))
    }

    fn write(&self, value: &Value, opts: &FormatOptions) -> Result<String, FormatError> {
        if opts.compact {
            let out = serde_json::to_string(value).map_err(|e| FormatError::write("json", e))?;
            return Ok(with_newline(out));
        }
        let indent = " ".repeat(opts.indent);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut ser)
            .map_err(|e| FormatError::write("json", e))?;
        let out = String::from_utf8(buf).map_err(|e| FormatError::write("json", e))?;
        Ok(with_newline(out))
    }
}
