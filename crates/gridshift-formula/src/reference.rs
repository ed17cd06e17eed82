//! The reference model
//!
//! A [`Reference`] is one cell or range reference as it appears in formula
//! text, e.g. `B3`, `$A$1:C7` or `'Q1 Data'!A1:B2`. Serializing a parsed
//! reference reproduces its text exactly, including the `$` markers and
//! the quoting style of the sheet name.

use std::fmt;

use gridshift_core::{CellAddress, CellRange};

use crate::error::{FormulaError, FormulaResult};

/// Sheet qualifier of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetName {
    /// Unescaped sheet name
    pub name: String,
    /// Whether the name was written inside single quotes
    pub quoted: bool,
}

impl SheetName {
    /// A sheet qualifier, quoted only when the name requires it
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let quoted = Self::needs_quotes(&name);
        Self { name, quoted }
    }

    /// Check if `name` must be quoted to be read back as a sheet name
    pub fn needs_quotes(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        if first.is_ascii_digit() || first == '.' {
            return true;
        }
        if !name.chars().all(is_unquoted_name_char) {
            return true;
        }
        // A bare name that reads as a cell address would be ambiguous
        CellAddress::parse(name).is_ok()
    }

    /// Check if this qualifier names `other`
    ///
    /// Sheet names compare case-insensitively unless `case_sensitive` is set.
    pub fn matches(&self, other: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.name == other
        } else {
            self.name.to_lowercase() == other.to_lowercase()
        }
    }

    /// The same qualifier pointing at a new name
    ///
    /// A quoted name stays quoted; an unquoted one gains quotes only when
    /// the new name needs them.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            quoted: self.quoted || Self::needs_quotes(name),
        }
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "'{}'", self.name.replace('\'', "''"))
        } else {
            f.write_str(&self.name)
        }
    }
}

pub(crate) fn is_unquoted_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Read a quoted sheet name starting at the opening quote at `pos`
///
/// Returns the unescaped name and the byte position just past the
/// closing quote.
pub(crate) fn scan_quoted_name(input: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&b'\'') {
        return None;
    }
    let mut name = String::new();
    let mut i = pos + 1;
    loop {
        let c = input[i..].chars().next()?;
        if c == '\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                name.push('\'');
                i += 2;
                continue;
            }
            return Some((name, i + 1));
        }
        name.push(c);
        i += c.len_utf8();
    }
}

/// A cell or range reference inside formula text
///
/// `start` and `end` are always the top-left and bottom-right corners. A
/// parsed reference also remembers how its corners were written (letter
/// case, reversed corners) and prints them that way until they change.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Sheet qualifier, `None` for a reference into the formula's own sheet
    pub sheet: Option<SheetName>,
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner (equal to `start` for a single cell)
    pub end: CellAddress,
    /// Whether the text used the `start:end` form
    pub is_range: bool,
    written: Option<String>,
}

impl Reference {
    /// A single-cell reference
    pub fn cell(sheet: Option<SheetName>, addr: CellAddress) -> Self {
        Self {
            sheet,
            start: addr,
            end: addr,
            is_range: false,
            written: None,
        }
    }

    /// A range reference, normalized so `start` is the top-left corner
    pub fn range(sheet: Option<SheetName>, start: CellAddress, end: CellAddress) -> Self {
        let range = CellRange::new(start, end);
        Self {
            sheet,
            start: range.start,
            end: range.end,
            is_range: true,
            written: None,
        }
    }

    /// Remember `text` as the spelling of the corners
    pub(crate) fn spelled(mut self, text: &str) -> Self {
        self.written = None;
        if self.corners_text() != text {
            self.written = Some(text.to_string());
        }
        self
    }

    fn corners_text(&self) -> String {
        if self.is_range {
            format!("{}:{}", self.start, self.end)
        } else {
            self.start.to_string()
        }
    }

    /// Parse a complete reference such as `Sheet2!$A$1:B2`
    pub fn parse(s: &str) -> FormulaResult<Self> {
        let (sheet, rest) = if s.starts_with('\'') {
            let (name, end) = scan_quoted_name(s, 0)
                .ok_or_else(|| FormulaError::Parse(format!("unterminated sheet name in '{}'", s)))?;
            let rest = s[end..]
                .strip_prefix('!')
                .ok_or_else(|| FormulaError::Parse(format!("expected '!' after sheet name in '{}'", s)))?;
            (
                Some(SheetName { name, quoted: true }),
                rest,
            )
        } else if let Some((name, rest)) = s.split_once('!') {
            if name.is_empty() || !name.chars().all(is_unquoted_name_char) {
                return Err(FormulaError::Parse(format!("invalid sheet name '{}'", name)));
            }
            (
                Some(SheetName {
                    name: name.to_string(),
                    quoted: false,
                }),
                rest,
            )
        } else {
            (None, s)
        };

        let reference = match rest.split_once(':') {
            Some((start, end)) => Self::range(sheet, CellAddress::parse(start)?, CellAddress::parse(end)?),
            None => Self::cell(sheet, CellAddress::parse(rest)?),
        };
        Ok(reference.spelled(rest))
    }

    /// The referenced rectangle
    pub fn cell_range(&self) -> CellRange {
        CellRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Same sheet and range form, new corners
    ///
    /// Corners equal to the current ones keep the written spelling.
    pub fn with_corners(&self, start: CellAddress, end: CellAddress) -> Self {
        let moved = if self.is_range {
            Self::range(self.sheet.clone(), start, end)
        } else {
            Self::cell(self.sheet.clone(), start)
        };
        if moved.start == self.start && moved.end == self.end {
            return self.clone();
        }
        moved
    }

    /// The same reference written in canonical form: upper-case columns,
    /// top-left corner first
    pub fn normalized(&self) -> Self {
        Self {
            written: None,
            ..self.clone()
        }
    }

    /// Same corners, new sheet qualifier
    pub fn with_sheet(&self, sheet: Option<SheetName>) -> Self {
        Self {
            sheet,
            ..self.clone()
        }
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.sheet == other.sheet
            && self.start == other.start
            && self.end == other.end
            && self.is_range == other.is_range
    }
}

impl Eq for Reference {}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", sheet)?;
        }
        match &self.written {
            Some(text) => f.write_str(text),
            None => {
                write!(f, "{}", self.start)?;
                if self.is_range {
                    write!(f, ":{}", self.end)?;
                }
                Ok(())
            }
        }
    }
}
