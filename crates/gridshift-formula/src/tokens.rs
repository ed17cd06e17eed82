//! Formula token walker
//!
//! Scans formula text for reference tokens without building an expression
//! tree. String literals, numbers, function names and defined names are
//! skipped; `#REF!` is reported as an already-invalid reference so callers
//! can keep it in place.

use std::ops::Range;

use gridshift_core::{CellAddress, CellError};

use crate::error::{FormulaError, FormulaResult};
use crate::reference::{is_unquoted_name_char, scan_quoted_name, Reference, SheetName};

/// What a reference token holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenReference {
    /// A readable reference
    Valid(Reference),
    /// A `#REF!` literal (possibly sheet-qualified)
    Invalid,
}

/// One reference token and its byte span in the formula text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    /// Byte range of the whole token, sheet qualifier included
    pub span: Range<usize>,
    /// The reference, or `Invalid` for `#REF!`
    pub reference: TokenReference,
}

impl ReferenceToken {
    /// The reference, if the token is not `#REF!`
    pub fn valid(&self) -> Option<&Reference> {
        match &self.reference {
            TokenReference::Valid(r) => Some(r),
            TokenReference::Invalid => None,
        }
    }
}

/// Lazy iterator over the reference tokens of a formula
///
/// A clone continues from the same position, so cloning a fresh walker
/// gives an independent pass over the same text. Text that cannot be
/// scanned (an unterminated string literal or sheet name) yields one
/// error, after which the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct ReferenceTokens<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> ReferenceTokens<'a> {
    /// Scan `formula`; a leading `=` is skipped
    pub fn new(formula: &'a str) -> Self {
        Self {
            input: formula,
            pos: usize::from(formula.starts_with('=')),
            done: false,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn fail(&mut self, msg: String) -> Option<FormulaResult<ReferenceToken>> {
        self.done = true;
        Some(Err(FormulaError::Parse(msg)))
    }

    fn skip_string(&mut self) -> bool {
        self.advance(); // Skip opening quote
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '"' {
                // Check for escaped quote ("")
                if self.peek_char() == Some('"') {
                    self.advance();
                } else {
                    return true;
                }
            }
        }
        false
    }

    fn skip_number(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit() || c == '.') {
            self.advance();
        }
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E')
            && self
                .peek_char_at(1)
                .map_or(false, |c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }
    }

    fn scan_word(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| is_unquoted_name_char(c) || c == '$')
        {
            self.advance();
        }
        &self.input[start..self.pos]
    }

    /// Read `addr[:addr]` at the current position
    ///
    /// On failure the position is left past whatever word was read, so the
    /// caller simply continues scanning.
    fn scan_reference_body(&mut self, sheet: Option<SheetName>) -> Option<Reference> {
        let body_start = self.pos;
        let word = self.scan_word();
        if self.peek_char() == Some('(') {
            return None;
        }
        let start = CellAddress::parse(word).ok()?;

        if self.peek_char() == Some(':') {
            let checkpoint = self.pos;
            self.advance();
            let second = self.scan_word();
            match CellAddress::parse(second) {
                Ok(end) if self.peek_char() != Some('(') && self.peek_char() != Some('!') => {
                    let text = &self.input[body_start..self.pos];
                    return Some(Reference::range(sheet, start, end).spelled(text));
                }
                _ => self.pos = checkpoint,
            }
        }
        Some(Reference::cell(sheet, start).spelled(word))
    }

    /// Handle what follows `Sheet!`: a `#REF!`, a reference, or a name
    fn scan_qualified(&mut self, token_start: usize, sheet: SheetName) -> Option<ReferenceToken> {
        if let Some((CellError::Ref, len)) = CellError::match_prefix(&self.input[self.pos..]) {
            self.pos += len;
            return Some(ReferenceToken {
                span: token_start..self.pos,
                reference: TokenReference::Invalid,
            });
        }
        let reference = self.scan_reference_body(Some(sheet))?;
        Some(ReferenceToken {
            span: token_start..self.pos,
            reference: TokenReference::Valid(reference),
        })
    }
}

impl<'a> Iterator for ReferenceTokens<'a> {
    type Item = FormulaResult<ReferenceToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(c) = self.peek_char() {
            let start = self.pos;

            // String literal
            if c == '"' {
                if !self.skip_string() {
                    return self.fail(format!("unterminated string literal at byte {}", start));
                }
                continue;
            }

            // Quoted sheet name
            if c == '\'' {
                let Some((name, end)) = scan_quoted_name(self.input, start) else {
                    return self.fail(format!("unterminated sheet name at byte {}", start));
                };
                self.pos = end;
                if self.peek_char() != Some('!') {
                    return self.fail(format!("expected '!' after sheet name at byte {}", end));
                }
                self.advance();
                if let Some(token) = self.scan_qualified(start, SheetName { name, quoted: true }) {
                    return Some(Ok(token));
                }
                continue;
            }

            // Error literals
            if c == '#' {
                match CellError::match_prefix(&self.input[start..]) {
                    Some((CellError::Ref, len)) => {
                        self.pos += len;
                        return Some(Ok(ReferenceToken {
                            span: start..self.pos,
                            reference: TokenReference::Invalid,
                        }));
                    }
                    Some((_, len)) => self.pos += len,
                    None => self.advance(),
                }
                continue;
            }

            // Structured or external-book brackets are opaque
            if c == '[' {
                while let Some(c) = self.peek_char() {
                    self.advance();
                    if c == ']' {
                        break;
                    }
                }
                continue;
            }

            // Numbers
            if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) {
                self.skip_number();
                continue;
            }

            // Identifier, sheet prefix, or reference
            if c.is_alphabetic() || c == '_' || c == '$' {
                let word = self.scan_word();
                if self.peek_char() == Some('!') {
                    self.advance();
                    let sheet = SheetName {
                        name: word.to_string(),
                        quoted: false,
                    };
                    if let Some(token) = self.scan_qualified(start, sheet) {
                        return Some(Ok(token));
                    }
                    continue;
                }
                self.pos = start;
                if let Some(reference) = self.scan_reference_body(None) {
                    return Some(Ok(ReferenceToken {
                        span: start..self.pos,
                        reference: TokenReference::Valid(reference),
                    }));
                }
                continue;
            }

            self.advance();
        }

        self.done = true;
        None
    }
}

/// Collect every reference token of a formula
pub fn tokenize(formula: &str) -> FormulaResult<Vec<ReferenceToken>> {
    ReferenceTokens::new(formula).collect()
}
