//! Selectors: paths into a document.
//!
//! ```text
//! server.ports[0]        key, then array index
//! users[-1].name         negative index counts from the end
//! users.*.name           every child
//! ..password             every value stored under `password`, at any depth
//! "odd.key"['x y']       quoted keys
//! items[]                append position (put only)
//! users.len()            terminal function: len(), keys(), type()
//! ```
//!
//! [`Selector::parse`] turns text into segments; [`select`], [`put`] and
//! [`delete`] evaluate them against a `serde_json::Value`.

mod eval;
mod parse;

pub use eval::{delete, put, select, SelectError};
pub use parse::SelectorError;

/// One step of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key. A numeric key also indexes arrays.
    Key(String),
    /// Array index; negative values count from the end.
    Index(i64),
    /// One past the last element of an array.
    Append,
    /// Every child of an array or object.
    Wildcard,
    /// Every descendant value stored under this key.
    Recursive(String),
    /// Computed value of the current node. Always the last segment.
    Function(Function),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Len,
    Keys,
    Type,
}

impl Function {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Function::Len),
            "keys" => Some(Function::Keys),
            "type" => Some(Function::Type),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Len => "len",
            Function::Keys => "keys",
            Function::Type => "type",
        }
    }
}

/// A parsed selector. The empty selector addresses the document root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    segments: Vec<Segment>,
}

impl Selector {
    /// The selector for the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        parse::parse(input).map(|segments| Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&display_path(&self.segments))
    }
}

/// Render segments back into selector text (used in error messages).
pub(crate) fn display_path(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return ".".to_string();
    }
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) => {
                if i > 0 {
                    out.push('.');
                }
                push_key(&mut out, key);
            }
            Segment::Index(index) => out.push_str(&format!("[{index}]")),
            Segment::Append => out.push_str("[]"),
            Segment::Wildcard => out.push_str("[*]"),
            Segment::Recursive(key) => {
                out.push_str("..");
                push_key(&mut out, key);
            }
            Segment::Function(func) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(func.name());
                out.push_str("()");
            }
        }
    }
    out
}

fn push_key(out: &mut String, key: &str) {
    if !key.is_empty() && key.chars().all(parse::is_bare_char) && key != "*" {
        out.push_str(key);
    } else {
        out.push('"');
        for c in key.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
}

#[cfg(test)]
mod tests;
