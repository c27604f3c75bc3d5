use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use clap::Parser;
use serde_json::Value;
use tracing::debug;

use super::{Cli, Commands, Error, IoArgs};
use crate::config::Config;
use crate::domain::FormatName;
use crate::format::{with_newline, Format, FormatOptions, FormatRegistry};
use crate::selector::{self, Selector};

/// Parse the process arguments, run the command, and exit.
///
/// Usage errors (and `--help`/`--version`) are reported by clap, which
/// exits with status 2 (or 0). Any other failure is written to `stderr` and
/// exits with status 1.
pub fn must_run<R: Read, W: Write, E: Write>(
    registry: &FormatRegistry,
    stdin: Option<R>,
    mut stdout: W,
    mut stderr: E,
) -> ! {
    let cli = Cli::try_parse().unwrap_or_else(|err| err.exit());

    let code = match run(&cli, registry, stdin, &mut stdout) {
        Ok(()) => 0,
        Err(err) => {
            debug!(?err, "command failed");
            let _ = stderr.write_all(err.render().as_bytes());
            1
        }
    };
    let _ = stdout.flush();
    let _ = stderr.flush();
    std::process::exit(code)
}

/// Run one parsed command against `stdin` (when present), writing results to `stdout`.
pub fn run<R: Read, W: Write>(
    cli: &Cli,
    registry: &FormatRegistry,
    stdin: Option<R>,
    stdout: &mut W,
) -> Result<(), Error> {
    if let Some(Commands::Formats) = cli.command {
        return list_formats(registry, stdout);
    }

    let io = &cli.io;
    let mutates = matches!(cli.command, Some(Commands::Put { .. } | Commands::Delete { .. }));
    if mutates && io.write && io.file.is_none() {
        return Err(Error::WriteWithoutFile);
    }

    let config = Config::load_or_default(io.config.as_deref())?;
    let opts = format_options(io, &config);

    let source = read_source(io, stdin)?;
    let input = input_format(registry, io, &config)?;
    let output = output_format(registry, io, &config, input)?;
    debug!(
        input = input.map(|f| f.name()),
        output = output.name(),
        has_source = source.is_some(),
        "resolved formats"
    );

    let mut doc = match source {
        Some(text) => input.ok_or(Error::MissingInputFormat)?.read(&text, &opts)?,
        None => Value::Null,
    };

    match &cli.command {
        None => query(&doc, "", output, &opts, stdout),
        Some(Commands::Query { selector }) => {
            query(&doc, selector.as_deref().unwrap_or(""), output, &opts, stdout)
        }
        Some(Commands::Put {
            selector,
            value,
            value_type,
        }) => {
            let selector = parse_selector(selector)?;
            let value = value_type.coerce(value)?;
            selector::put(&mut doc, &selector, value)?;
            emit(&doc, output, &opts, io, stdout)
        }
        Some(Commands::Delete { selector }) => {
            let selector = parse_selector(selector)?;
            selector::delete(&mut doc, &selector)?;
            emit(&doc, output, &opts, io, stdout)
        }
        Some(Commands::Formats) => list_formats(registry, stdout),
    }
}

/// Defaults, then config, then flags.
fn format_options(io: &IoArgs, config: &Config) -> FormatOptions {
    let mut opts = FormatOptions::default();
    config.apply(&mut opts);
    if let Some(indent) = io.indent {
        opts.indent = indent;
    }
    if io.compact {
        opts.compact = true;
    }
    opts
}

/// The document text: `--file` if given, else piped stdin, else nothing.
fn read_source<R: Read>(io: &IoArgs, stdin: Option<R>) -> Result<Option<String>, Error> {
    if let Some(path) = &io.file {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: Some(path.clone()),
            source,
        })?;
        return Ok(Some(text));
    }
    let Some(mut reader) = stdin else {
        return Ok(None);
    };
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| Error::Read { path: None, source })?;
    Ok(Some(text))
}

/// `--in`, then the file extension, then `defaults.in` from the config.
fn input_format<'r>(
    registry: &'r FormatRegistry,
    io: &IoArgs,
    config: &Config,
) -> Result<Option<&'r dyn Format>, Error> {
    if let Some(name) = &io.input {
        return Ok(Some(registry.get(&FormatName::new(name))?));
    }
    if let Some(format) = io.file.as_deref().and_then(|p| registry.for_path(p)) {
        return Ok(Some(format));
    }
    match &config.defaults.input {
        Some(name) => Ok(Some(registry.get(name)?)),
        None => Ok(None),
    }
}

/// `--out`, then `defaults.out` from the config, then the input format, then JSON.
fn output_format<'r>(
    registry: &'r FormatRegistry,
    io: &IoArgs,
    config: &Config,
    input: Option<&'r dyn Format>,
) -> Result<&'r dyn Format, Error> {
    if let Some(name) = &io.output {
        return Ok(registry.get(&FormatName::new(name))?);
    }
    if let Some(name) = &config.defaults.output {
        return Ok(registry.get(name)?);
    }
    match input {
        Some(format) => Ok(format),
        None => Ok(registry.get(&FormatName::new("json"))?),
    }
}

fn parse_selector(text: &str) -> Result<Selector, Error> {
    let selector = Selector::parse(text)?;
    debug!(%selector, "parsed selector");
    Ok(selector)
}

fn query<W: Write>(
    doc: &Value,
    selector: &str,
    output: &dyn Format,
    opts: &FormatOptions,
    stdout: &mut W,
) -> Result<(), Error> {
    let selector = parse_selector(selector)?;
    for value in selector::select(doc, &selector)? {
        let text = with_newline(output.write(&value, opts)?);
        write_stdout(stdout, &text)?;
    }
    Ok(())
}

/// Print the whole document, or with `--write` store it back into `--file`.
fn emit<W: Write>(
    doc: &Value,
    output: &dyn Format,
    opts: &FormatOptions,
    io: &IoArgs,
    stdout: &mut W,
) -> Result<(), Error> {
    let text = output.write(doc, opts)?;
    match (&io.file, io.write) {
        (Some(path), true) => write_file(path, &text),
        _ => write_stdout(stdout, &with_newline(text)),
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), Error> {
    debug!(path = %path.display(), "writing document back");
    fs::write(path, text).map_err(|source| Error::Write {
        path: Some(path.to_path_buf()),
        source,
    })
}

fn write_stdout<W: Write>(stdout: &mut W, text: &str) -> Result<(), Error> {
    stdout
        .write_all(text.as_bytes())
        .map_err(|source| Error::Write { path: None, source })
}

/// One line per format: the canonical name followed by its aliases.
fn list_formats<W: Write>(registry: &FormatRegistry, stdout: &mut W) -> Result<(), Error> {
    let mut text = String::new();
    for format in registry.iter() {
        let names: Vec<&str> = std::iter::once(format.name())
            .chain(format.aliases().iter().copied())
            .collect();
        text.push_str(&names.join(", "));
        text.push('\n');
    }
    write_stdout(stdout, &text)
}
