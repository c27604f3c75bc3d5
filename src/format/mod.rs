//! Format plugins and the registry the dispatcher resolves them from.
//!
//! Every plugin converts between its text form and a `serde_json::Value`
//! document. The registry keeps plugins in registration order, which is
//! also the order `confq formats` prints them in.

mod csv;
mod d;
mod hcl;
mod json;
mod toml;
mod xml;
mod yaml;

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::domain::FormatName;

pub use self::csv::Csv;
pub use self::d::D;
pub use self::hcl::Hcl;
pub use self::json::Json;
pub use self::toml::Toml;
pub use self::xml::Xml;
pub use self::yaml::Yaml;

pub(crate) use self::xml::is_element_name;

/// A document format that can be read into and written from a [`Value`].
pub trait Format: Send + Sync {
    /// Canonical lowercase name (`"yaml"`).
    fn name(&self) -> &'static str;

    /// Alternative names accepted by `--in`/`--out` (`"yml"`).
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// File extensions that select this format for `--file`.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse a whole document.
    fn read(&self, input: &str, opts: &FormatOptions) -> Result<Value, FormatError>;

    /// Render a value as a document. Non-empty output ends with a newline.
    fn write(&self, value: &Value, opts: &FormatOptions) -> Result<String, FormatError>;
}

/// Knobs shared by readers and writers. Each plugin uses the ones it cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Indentation width for pretty output.
    pub indent: usize,
    /// Single-line output where the format supports it.
    pub compact: bool,
    /// Field separator for CSV.
    pub csv_delimiter: u8,
    /// Root element name used when an XML document has no single root key.
    pub xml_root: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            compact: false,
            csv_delimiter: b',',
            xml_root: "doc".to_string(),
        }
    }
}

/// Errors raised while resolving, reading, or writing a format.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown format `{0}`")]
    Unknown(FormatName),
    #[error("invalid {format} input: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("cannot write {format}: {message}")]
    Write {
        format: &'static str,
        message: String,
    },
}

impl FormatError {
    pub(crate) fn parse(format: &'static str, err: impl std::fmt::Display) -> Self {
        FormatError::Parse {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn write(format: &'static str, err: impl std::fmt::Display) -> Self {
        FormatError::Write {
            format,
            message: err.to_string(),
        }
    }
}

/// Ordered collection of format plugins.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn Format>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin:
    /// csv, d, hcl, json, toml, xml, yaml (in that order).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Csv));
        registry.register(Box::new(D));
        registry.register(Box::new(Hcl));
        registry.register(Box::new(Json));
        registry.register(Box::new(Toml));
        registry.register(Box::new(Xml));
        registry.register(Box::new(Yaml));
        registry
    }

    /// Add a plugin. A plugin with the same name replaces the earlier one
    /// in its original position.
    pub fn register(&mut self, format: Box<dyn Format>) {
        debug!(format = format.name(), "registering format");
        match self.formats.iter().position(|f| f.name() == format.name()) {
            Some(idx) => self.formats[idx] = format,
            None => self.formats.push(format),
        }
    }

    /// Look up a plugin by canonical name or alias.
    pub fn get(&self, name: &FormatName) -> Result<&dyn Format, FormatError> {
        self.formats
            .iter()
            .find(|f| f.name() == name.as_str() || f.aliases().contains(&name.as_str()))
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::Unknown(name.clone()))
    }

    /// Look up a plugin by the extension of `path`.
    pub fn for_path(&self, path: &Path) -> Option<&dyn Format> {
        let ext = FormatName::from_path(path)?;
        self.formats
            .iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
            .map(|f| f.as_ref())
    }

    /// Registered plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Format> {
        self.formats.iter().map(|f| f.as_ref())
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.name()).collect()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

/// Plain-text rendering of a scalar, used by formats that cannot hold a
/// bare scalar as a document. Returns `None` for arrays and objects.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Append a trailing newline unless one is already there.
pub(crate) fn with_newline(mut out: String) -> String {
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
