//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while reading formula text or resolving an edit
///
/// A reference invalidated by an edit is not an error; it is written into
/// the formula as `#REF!`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Text that cannot be read as a reference or formula
    #[error("Parse error: {0}")]
    Parse(String),

    /// Edit descriptor that can never be applied (zero count, overlapping move)
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    /// Edit index or rectangle outside the grid
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Edit targets a sheet the workbook does not have
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Error raised by the data model
    #[error(transparent)]
    Core(#[from] gridshift_core::Error),
}
