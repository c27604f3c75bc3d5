//! The `d` document format: a relaxed literal syntax for documents.
//!
//! ```text
//! # comment
//! {
//!   name: "confq",
//!   'quoted key': [1, 2.5, true, null,],
//!   nested: {level: 'two'},
//! }
//! ```
//!
//! Keys may be bare (`[A-Za-z_][A-Za-z0-9_-]*`) or quoted with `"` or `'`.
//! Strings use JSON escapes in either quote style. Trailing commas are
//! allowed and `#` comments run to the end of the line.

use serde_json::{Map, Number, Value};

use super::{with_newline, Format, FormatError, FormatOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct D;

impl Format for D {
    fn name(&self) -> &'static str {
        "d"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["d"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        Parser::new(input)
            .document()
            .map_err(|e| FormatError::parse("d", e))
    }

    fn write(&self, value: &Value, opts: &FormatOptions) -> Result<String, FormatError> {
        let mut out = String::new();
        let style = Style {
            indent: opts.indent,
            compact: opts.compact,
        };
        write_value(&mut out, value, style, 0);
        Ok(with_newline(out))
    }
}

/// Syntax error with a 1-based source position.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("line {line}, column {column}: {message}")]
pub(crate) struct SyntaxError {
    line: usize,
    column: usize,
    message: String,
}

/// Deepest allowed nesting of arrays and objects, the same limit serde_json uses.
const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn document(mut self) -> Result<Value, SyntaxError> {
        self.skip_trivia();
        if self.peek().is_none() {
            return Ok(Value::Null);
        }
        let value = self.value()?;
        self.skip_trivia();
        match self.peek() {
            None => Ok(value),
            Some(c) => Err(self.error(format!("unexpected `{c}` after document"))),
        }
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        match self.peek() {
            Some(open @ ('{' | '[')) => {
                if self.depth == MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let value = if open == '{' {
                    self.object()
                } else {
                    self.array()
                };
                self.depth -= 1;
                value
            }
            Some(q @ ('"' | '\'')) => self.string(q).map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                match self.ident() {
                    "null" => Ok(Value::Null),
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    other => {
                        let message = format!("unexpected identifier `{other}`");
                        self.pos = start;
                        Err(self.error(message))
                    }
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> Result<Value, SyntaxError> {
        self.bump(); // {
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(q @ ('"' | '\'')) => self.string(q)?,
                Some(c) if is_ident_start(c) => self.ident().to_string(),
                Some(c) => return Err(self.error(format!("expected a key, found `{c}`"))),
                None => return Err(self.error("unclosed object")),
            };
            self.skip_trivia();
            self.expect(':')?;
            self.skip_trivia();
            let value = self.value()?;
            map.insert(key, value);
            if !self.separator('}')? {
                self.bump();
                return Ok(Value::Object(map));
            }
        }
    }

    fn array(&mut self) -> Result<Value, SyntaxError> {
        self.bump(); // [
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            if self.peek().is_none() {
                return Err(self.error("unclosed array"));
            }
            items.push(self.value()?);
            if !self.separator(']')? {
                self.bump();
                return Ok(Value::Array(items));
            }
        }
    }

    /// After a member: consume `,` and return true, or stop at `close`
    /// (not consumed) and return false.
    fn separator(&mut self, close: char) -> Result<bool, SyntaxError> {
        self.skip_trivia();
        match self.peek() {
            Some(',') => {
                self.bump();
                Ok(true)
            }
            Some(c) if c == close => Ok(false),
            Some(c) => Err(self.error(format!("expected `,` or `{close}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{close}` before end of input"))),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let open = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                self.pos = open;
                return Err(self.error("unterminated string"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => out.push(self.escape()?),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, SyntaxError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        Ok(match c {
            '"' => '"',
            '\'' => '\'',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let high = self.hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    if self.bump() != Some('\\') || self.bump() != Some('u') {
                        return Err(self.error("unpaired surrogate in \\u escape"));
                    }
                    let low = self.hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("invalid low surrogate in \\u escape"));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))?
                } else {
                    char::from_u32(high).ok_or_else(|| self.error("invalid \\u escape"))?
                }
            }
            other => return Err(self.error(format!("unknown escape `\\{other}`"))),
        })
    }

    fn hex4(&mut self) -> Result<u32, SyntaxError> {
        let start = self.pos;
        let digits = self.src.get(start..start + 4).unwrap_or("");
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("expected four hex digits"));
        }
        self.pos += 4;
        u32::from_str_radix(digits, 16).map_err(|e| self.error(e.to_string()))
    }

    fn number(&mut self) -> Result<Value, SyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.') {
                self.bump();
            } else {
                break;
            }
        }
        let src = self.src;
        let text = &src[start..self.pos];
        match text.parse::<Number>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => {
                self.pos = start;
                Err(self.error(format!("invalid number `{text}`")))
            }
        }
    }

    fn ident(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        &src[start..self.pos]
    }

    fn expect(&mut self, want: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{want}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{want}` before end of input"))),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let consumed = &self.src[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
        SyntaxError {
            line,
            column: consumed[line_start..].chars().count() + 1,
            message: message.into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

#[derive(Clone, Copy)]
struct Style {
    indent: usize,
    compact: bool,
}

fn write_value(out: &mut String, value: &Value, style: Style, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => {
            write_container(out, ('[', ']'), items.iter(), style, level, |out, item, level| {
                write_value(out, item, style, level);
            });
        }
        Value::Object(map) => {
            write_container(out, ('{', '}'), map.iter(), style, level, |out, (key, item), level| {
                if is_bare_key(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
                out.push_str(": ");
                write_value(out, item, style, level);
            });
        }
    }
}

fn write_container<I, T>(
    out: &mut String,
    (open, close): (char, char),
    items: I,
    style: Style,
    level: usize,
    mut write_item: impl FnMut(&mut String, T, usize),
) where
    I: ExactSizeIterator<Item = T>,
{
    if items.len() == 0 {
        out.push(open);
        out.push(close);
        return;
    }
    out.push(open);
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if style.compact {
            if i > 0 {
                out.push(' ');
            }
        } else {
            out.push('\n');
            push_indent(out, style.indent * (level + 1));
        }
        write_item(out, item, level + 1);
    }
    if !style.compact {
        out.push('\n');
        push_indent(out, style.indent * level);
    }
    out.push(close);
}

fn push_indent(out: &mut String, width: usize) {
    out.push_str(&" ".repeat(width));
}

fn quote(s: &str) -> String {
    // serialising a str cannot fail
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}
