//! Config document abstraction layer.
//!
//! `ConfigDocument`, `ConfigSection`, and `ParseNode` wrap the `kdl` crate
//! types so the rest of the config module never touches KDL directly.

/// Parsed KDL document paired with its source text.
pub(super) struct ConfigDocument {
    doc: kdl::KdlDocument,
    source: String,
}

impl ConfigDocument {
    /// Parse a KDL source string into a document.
    pub(super) fn parse(source: &str) -> Result<Self, super::ConfigError> {
        let doc: kdl::KdlDocument = source
            .parse()
            .map_err(|e: kdl::KdlError| super::ConfigError::ParseError(e.to_string()))?;
        Ok(Self {
            doc,
            source: source.to_string(),
        })
    }

    /// Load and parse a KDL config file.
    pub(super) fn load(path: &std::path::Path) -> Result<Self, super::ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                super::ConfigError::NotFound(path.to_path_buf())
            } else {
                super::ConfigError::ReadError(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Children of a named top-level section.
    ///
    /// `section("csv")` returns the contents of the `csv { … }` block.
    pub(super) fn section(&self, name: &str) -> Option<ConfigSection<'_>> {
        self.doc
            .get(name)
            .and_then(|n| n.children())
            .map(|doc| ConfigSection {
                doc,
                source: &self.source,
            })
    }
}

/// Borrowed view into the children block of a top-level node.
pub(super) struct ConfigSection<'a> {
    doc: &'a kdl::KdlDocument,
    source: &'a str,
}

impl<'a> ConfigSection<'a> {
    /// All child nodes in source order.
    pub(super) fn nodes(&self) -> Vec<ParseNode<'a>> {
        self.doc
            .nodes()
            .iter()
            .map(|node| ParseNode {
                node,
                source: self.source,
            })
            .collect()
    }
}

/// Single KDL node with source context for line-number reporting.
pub(super) struct ParseNode<'a> {
    node: &'a kdl::KdlNode,
    source: &'a str,
}

impl<'a> ParseNode<'a> {
    /// The node's identifier (e.g. `"indent"`, `"delimiter"`).
    pub(super) fn name(&self) -> &'a str {
        self.node.name().value()
    }

    /// The node's only argument. `None` when it has several entries,
    /// a property, or a children block.
    pub(super) fn single_value(&self) -> Option<&'a kdl::KdlValue> {
        if self.node.children().is_some() {
            return None;
        }
        match self.node.entries() {
            [entry] if entry.name().is_none() => Some(entry.value()),
            _ => None,
        }
    }

    /// 1-based line number of this node in the original source.
    pub(super) fn line(&self) -> usize {
        let offset = self.node.span().offset();
        self.source[..offset.min(self.source.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1
    }
}
