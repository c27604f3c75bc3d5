//! The dispatcher: argument parsing, format resolution, and the
//! query/put/delete commands.

mod error;
mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CONFIG_ENV;
use crate::domain::ValueType;

pub use error::Error;
pub use run::{must_run, run};

/// Query and modify configuration documents in many formats.
#[derive(Debug, Parser)]
#[command(name = "confq", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub io: IoArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct IoArgs {
    /// Input format (defaults to the file extension)
    #[arg(short = 'i', long = "in", value_name = "FORMAT", global = true)]
    pub input: Option<String>,

    /// Output format (defaults to the input format)
    #[arg(short = 'o', long = "out", value_name = "FORMAT", global = true)]
    pub output: Option<String>,

    /// Read the document from a file instead of stdin
    #[arg(short, long, value_name = "PATH", global = true)]
    pub file: Option<PathBuf>,

    /// Write put/delete results back to --file instead of printing them
    #[arg(short, long, global = true)]
    pub write: bool,

    /// Single-line output where the format supports it
    #[arg(long, global = true)]
    pub compact: bool,

    /// Indentation width for pretty output
    #[arg(long, value_name = "N", global = true)]
    pub indent: Option<usize>,

    /// Path to the KDL config file
    #[arg(long, value_name = "PATH", env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every value the selector addresses (the default command)
    Query {
        /// Path into the document; empty means the whole document
        selector: Option<String>,
    },
    /// Set a value and print the resulting document
    Put {
        selector: String,
        value: String,
        /// How VALUE is interpreted
        #[arg(short = 't', long = "type", value_enum, default_value_t)]
        value_type: ValueType,
    },
    /// Remove a value and print the resulting document
    Delete { selector: String },
    /// List the registered formats and their aliases
    Formats,
}
