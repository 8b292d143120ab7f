// src/parser.rs
//! Character-level parser for data model paths such as `Group[1].Child.field`.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{0}")]
    InvalidSyntax(String),
}

/// One step of a data model path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Parse the whole input as a dotted path with optional `[n]` indexes.
    pub fn parse_path(&mut self) -> Result<Vec<PathSegment>, ParseError> {
        let mut segments = Vec::new();
        self.skip_ws();
        if self.eof() {
            return Err(ParseError::InvalidSyntax("empty path".into()));
        }
        loop {
            let key = self.parse_identifier()?;
            segments.push(PathSegment::Key(key));
            while self.consume_char('[') {
                let idx = self.parse_index()?;
                self.expect(']')?;
                segments.push(PathSegment::Index(idx));
            }
            if self.eof() {
                break;
            }
            self.expect('.')?;
        }
        Ok(segments)
    }

    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c == '-' || c == '$' || c.is_alphanumeric() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax(format!(
                "identifier expected at offset {start}"
            )));
        }
        Ok(self.s[start..self.i].to_string())
    }

    pub fn parse_index(&mut self) -> Result<usize, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax("expected index".into()));
        }
        self.s[start..self.i]
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidSyntax("bad index".into()))
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!(
                "expected '{}' at offset {}",
                c, self.i
            )))
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
