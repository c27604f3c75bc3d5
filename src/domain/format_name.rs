use std::path::Path;

/// A normalized format identifier (trimmed, lowercase).
///
/// Constructed from user input (`--in YAML`), config values, or a file
/// extension, so `YAML`, ` yaml ` and `config.yaml` all produce
/// `FormatName("yaml")`. Whether the name is known is decided by the
/// format registry, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatName(pub(crate) String);

impl FormatName {
    /// Create from a raw format string.
    pub fn new(raw: &str) -> Self {
        FormatName(raw.trim().to_ascii_lowercase())
    }

    /// Take the extension of `path` as a format name.
    ///
    /// `conf/app.YML` → `yml`, `Cargo.toml` → `toml`. Returns `None` when the
    /// path has no extension or it is not valid UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FormatName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FormatName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for FormatName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
