use serde_json::Value;

use super::{scalar_text, with_newline, Format, FormatError, FormatOptions};

/// HCL bodies via `hcl-rs`.
///
/// Blocks read as nested objects keyed by block type, then by each label.
/// Writing always produces attributes; block structure is not restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hcl;

impl Format for Hcl {
    fn name(&self) -> &'static str {
        "hcl"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["tf"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["hcl", "tf"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        if input.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        hcl::from_str(input).map_err(|e| FormatError::parse("hcl", e))
    }

    fn write(&self, value: &Value, _opts: &FormatOptions) -> Result<String, FormatError> {
        match value {
            Value::Object(_) => hcl::to_string(value)
                .map(with_newline)
                .map_err(|e| FormatError::write("hcl", e)),
            Value::Array(_) => Err(FormatError::write(
                "hcl",
                "document root must be an object, found an array",
            )),
            scalar => Ok(with_newline(scalar_text(scalar).unwrap_or_default())),
        }
    }
}
