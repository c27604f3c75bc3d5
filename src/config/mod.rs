//! Optional KDL configuration.
//!
//! ```kdl
//! defaults {
//!     in "yaml"
//!     out "json"
//! }
//! output {
//!     indent 4
//!     compact #false
//! }
//! csv {
//!     delimiter ";"
//! }
//! xml {
//!     root "config"
//! }
//! ```
//!
//! Every node is optional. Unknown top-level sections are ignored; unknown
//! nodes inside a known section are rejected with their line number.

mod document;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::FormatName;
use crate::format::{is_element_name, FormatOptions};

use document::{ConfigDocument, ConfigSection, ParseNode};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "CONFQ_CONFIG";

/// Top-level configuration loaded from a KDL file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub defaults: Defaults,
    pub output: OutputConfig,
    pub csv: CsvConfig,
    pub xml: XmlConfig,
}

/// Formats used when neither a flag nor the file extension decides.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub input: Option<FormatName>,
    pub output: Option<FormatName>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub indent: Option<usize>,
    pub compact: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    pub delimiter: Option<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XmlConfig {
    pub root: Option<String>,
}

/// Errors that can occur when loading or parsing a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid KDL syntax: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load a config from a KDL file at the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let doc = ConfigDocument::load(path)?;
        let config = Self::from_document(&doc)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Load the file at `path`, or return the built-in defaults when there is none.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a KDL string into a Config.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::from_document(&ConfigDocument::parse(content)?)
    }

    fn from_document(doc: &ConfigDocument) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        for_each_node(doc.section("defaults"), "defaults", |node| {
            match node.name() {
                "in" => config.defaults.input = Some(FormatName::new(string_value(node)?)),
                "out" => config.defaults.output = Some(FormatName::new(string_value(node)?)),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        for_each_node(doc.section("output"), "output", |node| {
            match node.name() {
                "indent" => config.output.indent = Some(indent_value(node)?),
                "compact" => config.output.compact = Some(bool_value(node)?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        for_each_node(doc.section("csv"), "csv", |node| {
            match node.name() {
                "delimiter" => config.csv.delimiter = Some(delimiter_value(node)?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        for_each_node(doc.section("xml"), "xml", |node| {
            match node.name() {
                "root" => config.xml.root = Some(element_name(node)?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        Ok(config)
    }

    /// Copy configured values over `opts`. Flags are applied afterwards and win.
    pub fn apply(&self, opts: &mut FormatOptions) {
        if let Some(indent) = self.output.indent {
            opts.indent = indent;
        }
        if let Some(compact) = self.output.compact {
            opts.compact = compact;
        }
        if let Some(delimiter) = self.csv.delimiter {
            opts.csv_delimiter = delimiter;
        }
        if let Some(root) = &self.xml.root {
            opts.xml_root = root.clone();
        }
    }
}

/// Run `handle` on every node of a section. `handle` returns `Ok(false)` for
/// node names it does not know, which is reported as an error.
fn for_each_node(
    section: Option<ConfigSection<'_>>,
    section_name: &str,
    mut handle: impl FnMut(&ParseNode<'_>) -> Result<bool, ConfigError>,
) -> Result<(), ConfigError> {
    let Some(section) = section else {
        return Ok(());
    };
    for node in section.nodes() {
        if !handle(&node)? {
            return Err(ConfigError::ValidationError(format!(
                "line {}: unknown node \"{}\" in {section_name} section",
                node.line(),
                node.name()
            )));
        }
    }
    Ok(())
}

fn invalid(node: &ParseNode<'_>, expected: &str) -> ConfigError {
    ConfigError::ValidationError(format!(
        "line {}: \"{}\" expects {expected}",
        node.line(),
        node.name()
    ))
}

fn string_value<'a>(node: &ParseNode<'a>) -> Result<&'a str, ConfigError> {
    node.single_value()
        .and_then(|v| v.as_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid(node, "a single non-empty string"))
}

fn indent_value(node: &ParseNode<'_>) -> Result<usize, ConfigError> {
    node.single_value()
        .and_then(|v| v.as_integer())
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i <= 16)
        .ok_or_else(|| invalid(node, "an integer from 0 to 16"))
}

fn bool_value(node: &ParseNode<'_>) -> Result<bool, ConfigError> {
    node.single_value()
        .and_then(|v| v.as_bool())
        .ok_or_else(|| invalid(node, "#true or #false"))
}

fn delimiter_value(node: &ParseNode<'_>) -> Result<u8, ConfigError> {
    let text = node
        .single_value()
        .and_then(|v| v.as_string())
        .ok_or_else(|| invalid(node, "a single ASCII character"))?;
    match text.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(*byte),
        _ => Err(invalid(node, "a single ASCII character")),
    }
}

fn element_name(node: &ParseNode<'_>) -> Result<String, ConfigError> {
    let name = string_value(node)?;
    if is_element_name(name) {
        Ok(name.to_string())
    } else {
        Err(invalid(node, "an XML element name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn validation_message(content: &str) -> String {
        match Config::parse(content) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    // --- KDL Parsing Tests ---

    #[test]
    fn parse_valid_kdl_with_all_sections() {
        let config = Config::parse(
            r#"
            defaults {
                in "YAML"
                out "json"
            }
            output {
                indent 4
                compact #true
            }
            csv {
                delimiter ";"
            }
            xml {
                root "config"
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.input, Some(FormatName::new("yaml")));
        assert_eq!(config.defaults.output, Some(FormatName::new("json")));
        assert_eq!(config.output.indent, Some(4));
        assert_eq!(config.output.compact, Some(true));
        assert_eq!(config.csv.delimiter, Some(b';'));
        assert_eq!(config.xml.root.as_deref(), Some("config"));
    }

    #[test]
    fn parse_empty_kdl_file() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_top_level_sections_are_ignored() {
        let config = Config::parse("plugins { anything 1 }\nxml { root \"r\" }").unwrap();
        assert_eq!(config.xml.root.as_deref(), Some("r"));
    }

    #[test]
    fn later_node_wins() {
        let config = Config::parse("output {\n indent 2\n indent 8\n}").unwrap();
        assert_eq!(config.output.indent, Some(8));
    }

    #[test]
    fn tab_delimiter_via_escape() {
        let config = Config::parse(r#"csv { delimiter "\t" }"#).unwrap();
        assert_eq!(config.csv.delimiter, Some(b'\t'));
    }

    #[test]
    fn invalid_kdl_returns_parse_error() {
        let result = Config::parse("this is { not valid { kdl");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    // --- Validation Tests ---

    #[test]
    fn unknown_node_reports_line() {
        let err = validation_message("defaults {\n    in \"json\"\n    colour \"red\"\n}");
        assert_eq!(err, "line 3: unknown node \"colour\" in defaults section");
    }

    #[test]
    fn indent_must_be_small_integer() {
        let err = validation_message("output {\n    indent \"four\"\n}");
        assert_eq!(err, "line 2: \"indent\" expects an integer from 0 to 16");
        let err = validation_message("output {\n    indent -1\n}");
        assert!(err.starts_with("line 2:"), "got: {err}");
        let err = validation_message("output {\n    indent 99\n}");
        assert!(err.starts_with("line 2:"), "got: {err}");
    }

    #[test]
    fn compact_must_be_bool() {
        let err = validation_message("output {\n    compact \"yes\"\n}");
        assert_eq!(err, "line 2: \"compact\" expects #true or #false");
    }

    #[test]
    fn delimiter_must_be_one_ascii_char() {
        let err = validation_message("csv {\n    delimiter \";;\"\n}");
        assert_eq!(err, "line 2: \"delimiter\" expects a single ASCII character");
        let err = validation_message("csv {\n    delimiter \"é\"\n}");
        assert!(err.contains("single ASCII character"), "got: {err}");
    }

    #[test]
    fn format_defaults_need_one_string() {
        let err = validation_message("defaults {\n    in \"json\" \"yaml\"\n}");
        assert_eq!(err, "line 2: \"in\" expects a single non-empty string");
        let err = validation_message("defaults {\n    out format=\"json\"\n}");
        assert!(err.contains("single non-empty string"), "got: {err}");
    }

    #[test]
    fn xml_root_must_be_element_name() {
        let err = validation_message("xml {\n    root \"two words\"\n}");
        assert_eq!(err, "line 2: \"root\" expects an XML element name");
        let err = validation_message("xml {\n    root \"1st\"\n}");
        assert!(err.contains("XML element name"), "got: {err}");
    }

    // --- Apply Tests ---

    #[test]
    fn apply_overrides_only_configured_values() {
        let config = Config::parse("output { indent 4 }\ncsv { delimiter \"|\" }").unwrap();
        let mut opts = FormatOptions::default();
        config.apply(&mut opts);

        assert_eq!(opts.indent, 4);
        assert!(!opts.compact);
        assert_eq!(opts.csv_delimiter, b'|');
        assert_eq!(opts.xml_root, "doc");
    }

    // --- File Loading Tests ---

    #[test]
    fn load_nonexistent_file_returns_not_found() {
        let result = Config::load(Path::new("/tmp/does-not-exist-confq-12345.kdl"));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound(_)));
    }

    #[test]
    fn load_valid_file_from_disk() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(
            tmpfile,
            r#"defaults {{
    in "toml"
}}"#
        )
        .unwrap();

        let config = Config::load(tmpfile.path()).unwrap();
        assert_eq!(config.defaults.input, Some(FormatName::new("toml")));
    }

    #[test]
    fn load_file_with_invalid_kdl_returns_parse_error() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        writeln!(tmpfile, "invalid {{ kdl {{ syntax").unwrap();

        let result = Config::load(tmpfile.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
