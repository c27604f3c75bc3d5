//! Standard input detection.
//!
//! Only a connected pipe counts as input. A terminal, a redirected regular
//! file, `/dev/null`, a closed descriptor, or a failed metadata query all
//! mean "no input", so a bare `confq` never blocks waiting on a terminal.

use std::io;

use tracing::debug;

/// How the process's standard input is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Piped,
    Absent,
}

/// The live stdin stream when it is a pipe, `None` otherwise.
pub fn piped() -> Option<io::Stdin> {
    match mode() {
        InputMode::Piped => Some(io::stdin()),
        InputMode::Absent => None,
    }
}

/// Classify the current process's stdin.
#[cfg(unix)]
pub fn mode() -> InputMode {
    let mode = classify(unix::file_type(io::stdin()));
    debug!(?mode, "classified stdin");
    mode
}

/// Classify the current process's stdin. Without FIFO metadata, anything
/// that is not a terminal is treated as piped.
#[cfg(not(unix))]
pub fn mode() -> InputMode {
    use std::io::IsTerminal;

    let mode = if io::stdin().is_terminal() {
        InputMode::Absent
    } else {
        InputMode::Piped
    };
    debug!(?mode, "classified stdin");
    mode
}

/// Map the result of a metadata query onto an [`InputMode`]. Only a FIFO is
/// piped; errors are never surfaced.
#[cfg(unix)]
pub fn classify(file_type: io::Result<std::fs::FileType>) -> InputMode {
    use std::os::unix::fs::FileTypeExt;

    match file_type {
        Ok(ft) if ft.is_fifo() => InputMode::Piped,
        Ok(_) => InputMode::Absent,
        Err(err) => {
            debug!(%err, "stdin metadata unavailable");
            InputMode::Absent
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::{File, FileType};
    use std::io;
    use std::os::fd::AsFd;

    /// File type behind a descriptor, read through a duplicate so the
    /// original stays open and untouched.
    pub(super) fn file_type(fd: impl AsFd) -> io::Result<FileType> {
        let owned = fd.as_fd().try_clone_to_owned()?;
        Ok(File::from(owned).metadata()?.file_type())
    }
}
