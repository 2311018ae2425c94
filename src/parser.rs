use crate::errors::{JsonPathError, Result};

/// Character-level scanner shared by the path tokenizer and the
/// expression tokenizer, tracking the current byte offset for error
/// reporting.
pub(crate) struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Current byte offset into the input.
    pub fn pos(&self) -> usize {
        self.i
    }

    /// Parses an identifier run (alphanumeric or underscore).
    pub fn parse_identifier(&mut self) -> Result<String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(JsonPathError::parse("identifier expected", start));
        }
        Ok(self.s[start..self.i].to_string())
    }

    /// Parses an unsigned decimal literal (digits with an optional
    /// fractional part). Signs are the tokenizer's business.
    pub fn parse_number(&mut self) -> Result<f64> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
        // Consume a dot only when a digit follows, so `4.foo` leaves the
        // dot for the caller.
        let rest = &self.s[self.i..];
        if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.i += 1;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.i += 1;
                } else {
                    break;
                }
            }
        }
        let s = &self.s[start..self.i];
        if s.is_empty() {
            return Err(JsonPathError::parse("number expected", start));
        }
        s.parse::<f64>()
            .map_err(|_| JsonPathError::parse(format!("bad number `{s}`"), start))
    }

    /// Parses a single- or double-quoted string. The body is passed
    /// through verbatim; there is no escape decoding.
    pub fn parse_quoted_string(&mut self) -> Result<String> {
        let at = self.i;
        let quote = self
            .peek_char()
            .ok_or_else(|| JsonPathError::parse("expected quoted string", at))?;
        if quote != '\'' && quote != '"' {
            return Err(JsonPathError::parse("expected quoted string", at));
        }
        self.i += 1;
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == quote {
                let out = self.s[start..self.i].to_string();
                self.i += 1;
                return Ok(out);
            }
            self.i += c.len_utf8();
        }
        Err(JsonPathError::parse("unterminated string", at))
    }

    /// Consumes a balanced `open`...`close` run, honoring nesting of the
    /// same pair and skipping quoted sections. Returns the content
    /// between the outer delimiters.
    pub fn capture_balanced(&mut self, open: char, close: char) -> Result<&'a str> {
        let at = self.i;
        self.expect(open)?;
        let start = self.i;
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == open => depth += 1,
                None if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.s[start..self.i - close.len_utf8()]);
                    }
                }
                None => {}
            }
        }
        Err(JsonPathError::parse(format!("unterminated `{open}`"), at))
    }

    pub fn expect(&mut self, c: char) -> Result<()> {
        let at = self.i;
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(JsonPathError::parse(format!("expected `{c}`"), at))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn advance(&mut self, bytes: usize) {
        self.i += bytes;
    }

    /// The input consumed since `from` (a value previously returned by
    /// `pos`).
    pub fn slice(&self, from: usize) -> &'a str {
        &self.s[from..self.i]
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}
