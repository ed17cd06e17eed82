//! Cached cell values and error literals

use std::fmt;

/// Spreadsheet error values
///
/// Only [`CellError::Ref`] is produced by structural edits; the others are
/// recognized so that error literals inside formula text are never mistaken
/// for references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    /// All error literals, longest first so prefix matching is greedy
    pub const ALL: [CellError; 9] = [
        CellError::Div0,
        CellError::Value,
        CellError::Spill,
        CellError::Null,
        CellError::Name,
        CellError::Calc,
        CellError::Ref,
        CellError::Num,
        CellError::Na,
    ];

    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }

    /// Parse an error literal (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
    }

    /// Match an error literal at the start of `s`, returning it and its byte length
    pub fn match_prefix(s: &str) -> Option<(Self, usize)> {
        Self::ALL.into_iter().find_map(|e| {
            let lit = e.as_str();
            let head = s.get(..lit.len())?;
            head.eq_ignore_ascii_case(lit).then_some((e, lit.len()))
        })
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type code persisted next to a cached value (`t` in a cell record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValueType {
    /// Text
    String,
    /// Number
    Number,
    /// TRUE / FALSE
    Boolean,
    /// Text forced from a number-like input
    ForceString,
}

impl CellValueType {
    /// Numeric code used in persisted records
    pub fn code(&self) -> u8 {
        match self {
            CellValueType::String => 1,
            CellValueType::Number => 2,
            CellValueType::Boolean => 3,
            CellValueType::ForceString => 4,
        }
    }

    /// Map a persisted code back to a type
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CellValueType::String),
            2 => Some(CellValueType::Number),
            3 => Some(CellValueType::Boolean),
            4 => Some(CellValueType::ForceString),
            _ => None,
        }
    }
}

/// A scalar computed value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Numeric value
    Number(f64),
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Error value
    Error(CellError),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::String(s) => write!(f, "{}", s),
            ScalarValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            ScalarValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<CellError> for ScalarValue {
    fn from(e: CellError) -> Self {
        ScalarValue::Error(e)
    }
}

/// The last value an external evaluator wrote for a formula cell
///
/// The type code is kept separately because records may carry a value
/// without one (or a code this crate does not know about).
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// The value (`v`)
    pub value: ScalarValue,
    /// Raw type code (`t`), if present
    pub type_code: Option<u8>,
}

impl CachedValue {
    /// Create a cached value with an explicit type code
    pub fn new(value: impl Into<ScalarValue>, type_code: Option<u8>) -> Self {
        Self {
            value: value.into(),
            type_code,
        }
    }

    /// A numeric cached value tagged with the number type code
    pub fn number(n: f64) -> Self {
        Self::new(n, Some(CellValueType::Number.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_literal_lookup() {
        assert_eq!(CellError::from_str("#ref!"), Some(CellError::Ref));
        assert_eq!(CellError::from_str("#N/A"), Some(CellError::Na));
        assert_eq!(CellError::from_str("#BOGUS!"), None);
    }

    #[test]
    fn test_error_prefix_match() {
        assert_eq!(CellError::match_prefix("#REF!,1,1)"), Some((CellError::Ref, 5)));
        assert_eq!(CellError::match_prefix("#DIV/0!+1"), Some((CellError::Div0, 7)));
        assert_eq!(CellError::match_prefix("#RE"), None);
        assert_eq!(CellError::match_prefix("A1"), None);
    }

    #[test]
    fn test_value_type_codes() {
        for ty in [
            CellValueType::String,
            CellValueType::Number,
            CellValueType::Boolean,
            CellValueType::ForceString,
        ] {
            assert_eq!(CellValueType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(CellValueType::from_code(9), None);
    }

    #[test]
    fn test_cached_number() {
        let cached = CachedValue::number(3.0);
        assert_eq!(cached.type_code, Some(2));
        assert_eq!(cached.type_code.and_then(CellValueType::from_code), Some(CellValueType::Number));
        assert_eq!(cached.value.to_string(), "3");
    }
}
