use super::{Function, Segment};

/// Error returned when selector text cannot be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid selector `{selector}` at column {column}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub column: usize,
    pub message: String,
}

/// Characters allowed in an unquoted key.
pub(crate) fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '.' | '[' | ']' | '"' | '\'' | '(' | ')')
}

struct Cursor<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        SelectorError {
            selector: self.input.to_string(),
            column: self.pos + 1,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{want}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{want}` before end of selector"))),
        }
    }

    /// A key, wildcard, or function call outside brackets.
    fn step(&mut self) -> Result<Segment, SelectorError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.quoted(q).map(Segment::Key),
            Some('*') if !self.peek_at(1).is_some_and(is_bare_char) => {
                self.pos += 1;
                Ok(Segment::Wildcard)
            }
            _ => {
                let start = self.pos;
                let name = self.bare()?;
                if self.peek() != Some('(') {
                    return Ok(Segment::Key(name));
                }
                let Some(func) = Function::from_name(&name) else {
                    self.pos = start;
                    return Err(self.error(format!("unknown function `{name}()`")));
                };
                self.pos += 1;
                self.expect(')')?;
                Ok(Segment::Function(func))
            }
        }
    }

    /// `[N]`, `[-N]`, `[]`, `[*]` or `["key"]`.
    fn bracket(&mut self) -> Result<Segment, SelectorError> {
        self.pos += 1; // [
        let segment = match self.peek() {
            Some(']') => Segment::Append,
            Some('*') => {
                self.pos += 1;
                Segment::Wildcard
            }
            Some(q @ ('"' | '\'')) => Segment::Key(self.quoted(q)?),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                self.pos += 1;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                let index = text.parse::<i64>().map_err(|_| {
                    let mut err = self.error(format!("invalid index `{text}`"));
                    err.column = start + 1;
                    err
                })?;
                Segment::Index(index)
            }
            Some(c) => return Err(self.error(format!("unexpected `{c}` in brackets"))),
            None => return Err(self.error("unclosed `[`")),
        };
        self.expect(']')?;
        Ok(segment)
    }

    fn bare(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_bare_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a key, found `{c}`")),
                None => self.error("expected a key before end of selector"),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    self.pos = open;
                    return Err(self.error("unterminated quoted key"));
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') if self.peek_at(1).is_some() => {
                    out.extend(self.peek_at(1));
                    self.pos += 2;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Key following `..`: bare or quoted.
    fn recursive_key(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.quoted(q),
            _ => self.bare(),
        }
    }
}

pub(super) fn parse(input: &str) -> Result<Vec<Segment>, SelectorError> {
    let trimmed = input.trim();
    let mut cur = Cursor {
        input: trimmed,
        chars: trimmed.chars().collect(),
        pos: 0,
    };
    let mut segments = Vec::new();
    // true right after a segment: the next step must start with `.` or `[`
    let mut need_separator = false;

    while let Some(c) = cur.peek() {
        match c {
            '[' => {
                segments.push(cur.bracket()?);
                need_separator = true;
            }
            '.' if cur.peek_at(1) == Some('.') => {
                cur.pos += 2;
                segments.push(Segment::Recursive(cur.recursive_key()?));
                need_separator = true;
            }
            '.' => {
                cur.pos += 1;
                need_separator = false;
                if cur.peek().is_none() && !segments.is_empty() {
                    return Err(cur.error("selector ends with `.`"));
                }
            }
            c if need_separator => {
                return Err(cur.error(format!("expected `.` or `[`, found `{c}`")));
            }
            _ => {
                segments.push(cur.step()?);
                need_separator = true;
            }
        }
    }

    if let Some(Segment::Function(func)) = segments
        .iter()
        .rev()
        .skip(1)
        .find(|s| matches!(s, Segment::Function(_)))
    {
        return Err(SelectorError {
            selector: trimmed.to_string(),
            column: 1,
            message: format!("`{}()` must be the last segment", func.name()),
        });
    }
    Ok(segments)
}
