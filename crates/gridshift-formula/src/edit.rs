//! Structural edit descriptors

use std::fmt;

use gridshift_core::{CellRange, SheetId, MAX_COLS, MAX_ROWS};

use crate::error::{FormulaError, FormulaResult};

/// Grid axis an edit works along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Row indices
    Rows,
    /// Column indices
    Cols,
}

impl Axis {
    /// Number of positions on this axis
    pub fn limit(self) -> u32 {
        match self {
            Axis::Rows => MAX_ROWS,
            Axis::Cols => MAX_COLS as u32,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Axis::Rows => "row",
            Axis::Cols => "column",
        }
    }
}

/// A workbook edit that moves, creates or destroys cells
///
/// Indices are 0-based. `MoveRows` / `MoveCols` use insertion-index
/// semantics: the block `[start, start + count)` is placed before the
/// pre-move position `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralEdit {
    /// Insert `count` empty rows before row `at`
    InsertRows { sheet: SheetId, at: u32, count: u32 },
    /// Remove rows `[at, at + count)`
    RemoveRows { sheet: SheetId, at: u32, count: u32 },
    /// Insert `count` empty columns before column `at`
    InsertCols { sheet: SheetId, at: u32, count: u32 },
    /// Remove columns `[at, at + count)`
    RemoveCols { sheet: SheetId, at: u32, count: u32 },
    /// Move rows `[start, start + count)` to before row `to`
    MoveRows {
        sheet: SheetId,
        start: u32,
        count: u32,
        to: u32,
    },
    /// Move columns `[start, start + count)` to before column `to`
    MoveCols {
        sheet: SheetId,
        start: u32,
        count: u32,
        to: u32,
    },
    /// Move the cells of `from` onto `to` (same size)
    MoveRange {
        sheet: SheetId,
        from: CellRange,
        to: CellRange,
    },
    /// Insert blank cells at `range`, pushing the cells below it down
    InsertRangeShiftDown { sheet: SheetId, range: CellRange },
    /// Insert blank cells at `range`, pushing the cells to its right over
    InsertRangeShiftRight { sheet: SheetId, range: CellRange },
    /// Delete `range`, pulling the cells below it up
    DeleteRangeShiftUp { sheet: SheetId, range: CellRange },
    /// Delete `range`, pulling the cells to its right left
    DeleteRangeShiftLeft { sheet: SheetId, range: CellRange },
    /// Give a sheet a new display name
    RenameSheet { sheet: SheetId, new_name: String },
    /// Delete a sheet
    RemoveSheet { sheet: SheetId },
}

impl StructuralEdit {
    /// The sheet the edit applies to
    pub fn sheet(&self) -> &SheetId {
        match self {
            StructuralEdit::InsertRows { sheet, .. }
            | StructuralEdit::RemoveRows { sheet, .. }
            | StructuralEdit::InsertCols { sheet, .. }
            | StructuralEdit::RemoveCols { sheet, .. }
            | StructuralEdit::MoveRows { sheet, .. }
            | StructuralEdit::MoveCols { sheet, .. }
            | StructuralEdit::MoveRange { sheet, .. }
            | StructuralEdit::InsertRangeShiftDown { sheet, .. }
            | StructuralEdit::InsertRangeShiftRight { sheet, .. }
            | StructuralEdit::DeleteRangeShiftUp { sheet, .. }
            | StructuralEdit::DeleteRangeShiftLeft { sheet, .. }
            | StructuralEdit::RenameSheet { sheet, .. }
            | StructuralEdit::RemoveSheet { sheet } => sheet,
        }
    }

    /// Whether formula cells change position under this edit
    pub fn moves_cells(&self) -> bool {
        !matches!(
            self,
            StructuralEdit::RenameSheet { .. } | StructuralEdit::RemoveSheet { .. }
        )
    }

    /// The syntactic inverse of this edit
    ///
    /// `RenameSheet` needs the previous name and `RemoveSheet` needs the
    /// removed content, so neither has a syntactic inverse here; the
    /// mutation payload restores them.
    pub fn inverse(&self) -> Option<StructuralEdit> {
        let inverse = match self.clone() {
            StructuralEdit::InsertRows { sheet, at, count } => {
                StructuralEdit::RemoveRows { sheet, at, count }
            }
            StructuralEdit::RemoveRows { sheet, at, count } => {
                StructuralEdit::InsertRows { sheet, at, count }
            }
            StructuralEdit::InsertCols { sheet, at, count } => {
                StructuralEdit::RemoveCols { sheet, at, count }
            }
            StructuralEdit::RemoveCols { sheet, at, count } => {
                StructuralEdit::InsertCols { sheet, at, count }
            }
            StructuralEdit::MoveRows {
                sheet,
                start,
                count,
                to,
            } => {
                let (start, to) = inverse_move(start, count, to);
                StructuralEdit::MoveRows {
                    sheet,
                    start,
                    count,
                    to,
                }
            }
            StructuralEdit::MoveCols {
                sheet,
                start,
                count,
                to,
            } => {
                let (start, to) = inverse_move(start, count, to);
                StructuralEdit::MoveCols {
                    sheet,
                    start,
                    count,
                    to,
                }
            }
            StructuralEdit::MoveRange { sheet, from, to } => StructuralEdit::MoveRange {
                sheet,
                from: to,
                to: from,
            },
            StructuralEdit::InsertRangeShiftDown { sheet, range } => {
                StructuralEdit::DeleteRangeShiftUp { sheet, range }
            }
            StructuralEdit::InsertRangeShiftRight { sheet, range } => {
                StructuralEdit::DeleteRangeShiftLeft { sheet, range }
            }
            StructuralEdit::DeleteRangeShiftUp { sheet, range } => {
                StructuralEdit::InsertRangeShiftDown { sheet, range }
            }
            StructuralEdit::DeleteRangeShiftLeft { sheet, range } => {
                StructuralEdit::InsertRangeShiftRight { sheet, range }
            }
            StructuralEdit::RenameSheet { .. } | StructuralEdit::RemoveSheet { .. } => return None,
        };
        Some(inverse)
    }

    /// Check the edit's indices against the grid
    ///
    /// Sheet existence and name rules are checked by the caller, which
    /// owns the workbook.
    pub fn validate(&self) -> FormulaResult<()> {
        match self {
            StructuralEdit::InsertRows { at, count, .. } => check_insert(Axis::Rows, *at, *count),
            StructuralEdit::InsertCols { at, count, .. } => check_insert(Axis::Cols, *at, *count),
            StructuralEdit::RemoveRows { at, count, .. } => check_block(Axis::Rows, *at, *count),
            StructuralEdit::RemoveCols { at, count, .. } => check_block(Axis::Cols, *at, *count),
            StructuralEdit::MoveRows {
                start, count, to, ..
            } => check_move(Axis::Rows, *start, *count, *to),
            StructuralEdit::MoveCols {
                start, count, to, ..
            } => check_move(Axis::Cols, *start, *count, *to),
            StructuralEdit::MoveRange { from, to, .. } => {
                check_range(from)?;
                check_range(to)?;
                if from.row_count() != to.row_count() || from.col_count() != to.col_count() {
                    return Err(FormulaError::InvalidEdit(format!(
                        "move source {} and destination {} differ in size",
                        from, to
                    )));
                }
                Ok(())
            }
            StructuralEdit::InsertRangeShiftDown { range, .. }
            | StructuralEdit::InsertRangeShiftRight { range, .. }
            | StructuralEdit::DeleteRangeShiftUp { range, .. }
            | StructuralEdit::DeleteRangeShiftLeft { range, .. } => check_range(range),
            StructuralEdit::RenameSheet { new_name, .. } => {
                if new_name.is_empty() {
                    return Err(FormulaError::InvalidEdit("sheet name cannot be empty".into()));
                }
                Ok(())
            }
            StructuralEdit::RemoveSheet { .. } => Ok(()),
        }
    }
}

/// Where a moved block lands and how to move it back
fn inverse_move(start: u32, count: u32, to: u32) -> (u32, u32) {
    if to > start + count {
        (to - count, start)
    } else if to < start {
        (to, start + count)
    } else {
        (start, to)
    }
}

fn check_count(axis: Axis, count: u32) -> FormulaResult<()> {
    if count == 0 {
        return Err(FormulaError::InvalidEdit(format!(
            "{} count must be at least 1",
            axis.noun()
        )));
    }
    Ok(())
}

fn check_insert(axis: Axis, at: u32, count: u32) -> FormulaResult<()> {
    check_count(axis, count)?;
    if at >= axis.limit() || count > axis.limit() {
        return Err(FormulaError::OutOfRange(format!(
            "cannot insert {} {}s at {}",
            count,
            axis.noun(),
            at
        )));
    }
    Ok(())
}

fn check_block(axis: Axis, start: u32, count: u32) -> FormulaResult<()> {
    check_count(axis, count)?;
    if start as u64 + count as u64 > axis.limit() as u64 {
        return Err(FormulaError::OutOfRange(format!(
            "{}s {}..{} exceed the grid",
            axis.noun(),
            start,
            start as u64 + count as u64
        )));
    }
    Ok(())
}

fn check_move(axis: Axis, start: u32, count: u32, to: u32) -> FormulaResult<()> {
    check_block(axis, start, count)?;
    if to > axis.limit() {
        return Err(FormulaError::OutOfRange(format!(
            "{} move target {} exceeds the grid",
            axis.noun(),
            to
        )));
    }
    Ok(())
}

fn check_range(range: &CellRange) -> FormulaResult<()> {
    if range.end.row >= MAX_ROWS || range.end.col >= MAX_COLS {
        return Err(FormulaError::OutOfRange(format!("{} exceeds the grid", range)));
    }
    Ok(())
}

impl fmt::Display for StructuralEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralEdit::InsertRows { sheet, at, count } => {
                write!(f, "insert {} row(s) at {} on {}", count, at, sheet)
            }
            StructuralEdit::RemoveRows { sheet, at, count } => {
                write!(f, "remove {} row(s) at {} on {}", count, at, sheet)
            }
            StructuralEdit::InsertCols { sheet, at, count } => {
                write!(f, "insert {} column(s) at {} on {}", count, at, sheet)
            }
            StructuralEdit::RemoveCols { sheet, at, count } => {
                write!(f, "remove {} column(s) at {} on {}", count, at, sheet)
            }
            StructuralEdit::MoveRows {
                sheet,
                start,
                count,
                to,
            } => write!(f, "move {} row(s) from {} to {} on {}", count, start, to, sheet),
            StructuralEdit::MoveCols {
                sheet,
                start,
                count,
                to,
            } => write!(f, "move {} column(s) from {} to {} on {}", count, start, to, sheet),
            StructuralEdit::MoveRange { sheet, from, to } => {
                write!(f, "move {} to {} on {}", from, to, sheet)
            }
            StructuralEdit::InsertRangeShiftDown { sheet, range } => {
                write!(f, "insert {} shifting down on {}", range, sheet)
            }
            StructuralEdit::InsertRangeShiftRight { sheet, range } => {
                write!(f, "insert {} shifting right on {}", range, sheet)
            }
            StructuralEdit::DeleteRangeShiftUp { sheet, range } => {
                write!(f, "delete {} shifting up on {}", range, sheet)
            }
            StructuralEdit::DeleteRangeShiftLeft { sheet, range } => {
                write!(f, "delete {} shifting left on {}", range, sheet)
            }
            StructuralEdit::RenameSheet { sheet, new_name } => {
                write!(f, "rename {} to {:?}", sheet, new_name)
            }
            StructuralEdit::RemoveSheet { sheet } => write!(f, "remove sheet {}", sheet),
        }
    }
}
