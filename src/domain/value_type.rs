use serde_json::Value;

/// How a `put` value given on the command line is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ValueType {
    /// Use the text as-is.
    #[default]
    String,
    /// Signed 64-bit integer.
    Int,
    /// Finite floating point number.
    Float,
    /// `true` or `false`.
    Bool,
    /// Ignore the text and store `null`.
    Null,
    /// Parse the text as a JSON literal (objects and arrays included).
    Json,
}

/// Error returned when a raw value does not fit the requested [`ValueType`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("cannot read {raw:?} as {kind}: {reason}")]
pub struct ValueError {
    pub raw: String,
    pub kind: &'static str,
    pub reason: String,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Null => "null",
            ValueType::Json => "json",
        }
    }

    /// Convert raw command-line text into a document value.
    pub fn coerce(self, raw: &str) -> Result<Value, ValueError> {
        let fail = |reason: String| ValueError {
            raw: raw.to_string(),
            kind: self.as_str(),
            reason,
        };
        match self {
            ValueType::String => Ok(Value::String(raw.to_string())),
            ValueType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| fail(e.to_string())),
            ValueType::Float => {
                let f = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| fail(e.to_string()))?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| fail("value is not finite".to_string()))
            }
            ValueType::Bool => match raw.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail("expected `true` or `false`".to_string())),
            },
            ValueType::Null => Ok(Value::Null),
            ValueType::Json => serde_json::from_str(raw).map_err(|e| fail(e.to_string())),
        }
    }
}
