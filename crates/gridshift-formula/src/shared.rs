//! Shared-formula text derivation
//!
//! A dependent member of a shared group stores no text of its own. Its
//! effective formula is the canonical text with every relative row/column
//! component moved by the member's offset from the canonical cell.

use gridshift_core::CellAddress;

use crate::error::FormulaResult;
use crate::rewrite::rewrite_references;
use crate::transform::TransformedReference;

fn offset_relative(addr: CellAddress, d_row: i64, d_col: i64) -> Option<CellAddress> {
    let d_row = if addr.row_absolute { 0 } else { d_row };
    let d_col = if addr.col_absolute { 0 } else { d_col };
    addr.offset(d_row, d_col)
}

/// Effective text of a cell `(d_row, d_col)` away from the canonical cell
///
/// Absolute components are copied verbatim; a relative component pushed
/// off the grid turns its reference into `#REF!`.
///
/// ```
/// use gridshift_formula::derive_effective_text;
///
/// let text = derive_effective_text("=SUM(A20)+$B$1", 1, 0).unwrap();
/// assert_eq!(text, "=SUM(A21)+$B$1");
/// ```
pub fn derive_effective_text(canonical: &str, d_row: i64, d_col: i64) -> FormulaResult<String> {
    if d_row == 0 && d_col == 0 {
        return Ok(canonical.to_string());
    }
    let rewritten = rewrite_references(canonical, |reference| {
        match (
            offset_relative(reference.start, d_row, d_col),
            offset_relative(reference.end, d_row, d_col),
        ) {
            (Some(start), Some(end)) => TransformedReference::Shifted(reference.with_corners(start, end)),
            _ => TransformedReference::Invalidated,
        }
    })?;
    Ok(rewritten.unwrap_or_else(|| canonical.to_string()))
}
