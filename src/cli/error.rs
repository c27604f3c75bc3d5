use std::path::PathBuf;

use crate::config::ConfigError;
use crate::domain::ValueError;
use crate::format::FormatError;
use crate::selector::{SelectError, SelectorError};

/// Every failure the dispatcher reports. Rendered through `miette` on stderr.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(
        code(confq::config),
        help("the config file comes from --config or $CONFQ_CONFIG")
    )]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(confq::format))]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(
        code(confq::selector),
        help("selectors look like `server.ports[0]`, `users.*.name` or `..id`")
    )]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    #[diagnostic(code(confq::select))]
    Select(#[from] SelectError),

    #[error(transparent)]
    #[diagnostic(
        code(confq::value),
        help("choose a different --type, or `-t json` for structured values")
    )]
    Value(#[from] ValueError),

    #[error("cannot tell which format the input is in")]
    #[diagnostic(
        code(confq::missing_format),
        help("pass --in, read a file with a known extension, or set `in` under `defaults` in the config")
    )]
    MissingInputFormat,

    #[error("--write needs --file")]
    #[diagnostic(code(confq::usage))]
    WriteWithoutFile,

    #[error("failed to read {}", describe(.path, "stdin"))]
    #[diagnostic(code(confq::io))]
    Read {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", describe(.path, "stdout"))]
    #[diagnostic(code(confq::io))]
    Write {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Render the error as a plain-text `miette` report.
    pub fn render(&self) -> String {
        let handler = miette::GraphicalReportHandler::new_themed(
            miette::GraphicalTheme::unicode_nocolor(),
        )
        .with_width(200);
        let mut out = String::new();
        if handler.render_report(&mut out, self).is_err() {
            out = format!("Error: {self}\n");
        }
        out
    }
}

fn describe(path: &Option<PathBuf>, stream: &str) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => stream.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormatName;

    #[test]
    fn render_includes_message_code_and_help() {
        let report = Error::MissingInputFormat.render();
        assert!(report.contains("confq::missing_format"), "got: {report}");
        assert!(report.contains("cannot tell which format"), "got: {report}");
        assert!(report.contains("pass --in"), "got: {report}");
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err = Error::from(FormatError::Unknown(FormatName::new("ini")));
        assert_eq!(err.to_string(), "unknown format `ini`");
        assert!(err.render().contains("unknown format `ini`"));
    }

    #[test]
    fn read_error_names_stdin_without_path() {
        let err = Error::Read {
            path: None,
            source: std::io::Error::other("boom"),
        };
        assert_eq!(err.to_string(), "failed to read stdin");
    }
}
