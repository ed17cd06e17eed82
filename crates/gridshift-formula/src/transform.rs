//! Structural transform resolver
//!
//! Computes what a structural edit does to one reference, and where a
//! formula cell on the edited sheet ends up. Nothing here mutates; the
//! caller splices the results into formula text.

use gridshift_core::{CellAddress, CellRange, SheetId};

use crate::edit::{Axis, StructuralEdit};
use crate::reference::Reference;

/// Effect of an edit on one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformedReference {
    /// The reference does not depend on the edit
    Unchanged,
    /// The reference now reads differently
    Shifted(Reference),
    /// The referenced cells no longer exist (`#REF!`)
    Invalidated,
}

/// A one-dimensional position map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AxisShift {
    Insert { at: u32, count: u32 },
    Remove { at: u32, count: u32 },
    Move { start: u32, count: u32, to: u32 },
}

/// Result of mapping an inclusive span `[a, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanShift {
    Same,
    Moved(u32, u32),
    Gone,
}

impl AxisShift {
    /// Where a single position goes; `None` if it is removed or pushed off the grid
    pub(crate) fn map_position(self, p: u32, limit: u32) -> Option<u32> {
        match self {
            AxisShift::Insert { at, count } => {
                if p < at {
                    Some(p)
                } else {
                    p.checked_add(count).filter(|&q| q < limit)
                }
            }
            AxisShift::Remove { at, count } => {
                if p < at {
                    Some(p)
                } else if p - at < count {
                    None
                } else {
                    Some(p - count)
                }
            }
            AxisShift::Move { start, count, to } => Some(permute(p, start, count, to)),
        }
    }

    /// Where a span goes
    ///
    /// Endpoints at or past an insertion point move, so a span straddling
    /// the insertion grows. A far end pushed past the grid edge sticks to
    /// the last row or column; only a span whose start leaves the grid is
    /// lost. A removal clips the span to its surviving part
    /// and loses it only when every position is removed. A move maps both
    /// endpoints through the permutation; if that would invert the span,
    /// the moved block is treated as removed and re-inserted where it lands.
    pub(crate) fn map_span(self, a: u32, b: u32, limit: u32) -> SpanShift {
        let (na, nb) = match self {
            AxisShift::Insert { at, count } => {
                let shift = |p: u32| if p >= at { p as u64 + count as u64 } else { p as u64 };
                let (na, nb) = (shift(a), shift(b));
                if na >= limit as u64 {
                    return SpanShift::Gone;
                }
                (na as u32, nb.min(limit as u64 - 1) as u32)
            }
            AxisShift::Remove { at, count } => {
                let end = at as u64 + count as u64;
                if a >= at && (b as u64) < end {
                    return SpanShift::Gone;
                }
                let na = if a < at {
                    a
                } else if (a as u64) < end {
                    at
                } else {
                    a - count
                };
                let nb = if b < at {
                    b
                } else if (b as u64) < end {
                    at - 1
                } else {
                    b - count
                };
                (na, nb)
            }
            AxisShift::Move { start, count, to } => {
                if to >= start && to <= start + count {
                    return SpanShift::Same;
                }
                let (na, nb) = (permute(a, start, count, to), permute(b, start, count, to));
                if na > nb {
                    let landing = if to > start { to - count } else { to };
                    let removed = AxisShift::Remove { at: start, count }.map_span(a, b, limit);
                    let reinsert = AxisShift::Insert { at: landing, count };
                    return match removed {
                        SpanShift::Same => reinsert.map_span(a, b, limit),
                        SpanShift::Moved(ra, rb) => match reinsert.map_span(ra, rb, limit) {
                            SpanShift::Same => SpanShift::Moved(ra, rb),
                            other => other,
                        },
                        SpanShift::Gone => SpanShift::Gone,
                    };
                }
                (na, nb)
            }
        };
        if (na, nb) == (a, b) {
            SpanShift::Same
        } else {
            SpanShift::Moved(na, nb)
        }
    }
}

/// Row/column permutation of a block move with insertion-index semantics
fn permute(p: u32, start: u32, count: u32, to: u32) -> u32 {
    let end = start + count;
    if to > end {
        if p >= start && p < end {
            p - start + to - count
        } else if p >= end && p < to {
            p - count
        } else {
            p
        }
    } else if to < start {
        if p >= start && p < end {
            p - start + to
        } else if p >= to && p < start {
            p + count
        } else {
            p
        }
    } else {
        p
    }
}

fn axis_span(range: &CellRange, axis: Axis) -> (u32, u32) {
    match axis {
        Axis::Rows => (range.start.row, range.end.row),
        Axis::Cols => (range.start.col as u32, range.end.col as u32),
    }
}

fn with_axis(addr: CellAddress, axis: Axis, p: u32) -> CellAddress {
    match axis {
        Axis::Rows => CellAddress { row: p, ..addr },
        Axis::Cols => CellAddress {
            col: p as u16,
            ..addr
        },
    }
}

/// Apply a one-axis shift to a reference
fn shift_reference(reference: &Reference, axis: Axis, shift: AxisShift) -> TransformedReference {
    let (a, b) = axis_span(&reference.cell_range(), axis);
    match shift.map_span(a, b, axis.limit()) {
        SpanShift::Same => TransformedReference::Unchanged,
        SpanShift::Gone => TransformedReference::Invalidated,
        SpanShift::Moved(na, nb) => TransformedReference::Shifted(reference.with_corners(
            with_axis(reference.start, axis, na),
            with_axis(reference.end, axis, nb),
        )),
    }
}

/// The shift an edit applies, and the band of the other axis it is limited to
struct BandShift {
    axis: Axis,
    shift: AxisShift,
    band: Option<(u32, u32)>,
}

/// An edit bound to the current name of the sheet it targets
///
/// Qualified references are matched by sheet name; unqualified ones by
/// the id of the sheet holding the formula.
#[derive(Debug, Clone)]
pub struct ResolvedEdit {
    edit: StructuralEdit,
    sheet_name: String,
    case_sensitive: bool,
}

impl ResolvedEdit {
    /// Bind `edit` to the display name its sheet has before the edit
    pub fn new(edit: StructuralEdit, sheet_name: impl Into<String>) -> Self {
        Self {
            edit,
            sheet_name: sheet_name.into(),
            case_sensitive: false,
        }
    }

    /// Compare sheet names case-sensitively
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// The edit
    pub fn edit(&self) -> &StructuralEdit {
        &self.edit
    }

    /// Display name of the edited sheet before the edit
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn band_shift(&self) -> Option<BandShift> {
        let plain = |axis, shift| {
            Some(BandShift {
                axis,
                shift,
                band: None,
            })
        };
        let banded = |axis, shift, range: &CellRange| {
            let other = match axis {
                Axis::Rows => Axis::Cols,
                Axis::Cols => Axis::Rows,
            };
            Some(BandShift {
                axis,
                shift,
                band: Some(axis_span(range, other)),
            })
        };
        match &self.edit {
            StructuralEdit::InsertRows { at, count, .. } => plain(Axis::Rows, AxisShift::Insert { at: *at, count: *count }),
            StructuralEdit::RemoveRows { at, count, .. } => plain(Axis::Rows, AxisShift::Remove { at: *at, count: *count }),
            StructuralEdit::InsertCols { at, count, .. } => plain(Axis::Cols, AxisShift::Insert { at: *at, count: *count }),
            StructuralEdit::RemoveCols { at, count, .. } => plain(Axis::Cols, AxisShift::Remove { at: *at, count: *count }),
            StructuralEdit::MoveRows { start, count, to, .. } => plain(
                Axis::Rows,
                AxisShift::Move { start: *start, count: *count, to: *to },
            ),
            StructuralEdit::MoveCols { start, count, to, .. } => plain(
                Axis::Cols,
                AxisShift::Move { start: *start, count: *count, to: *to },
            ),
            StructuralEdit::InsertRangeShiftDown { range, .. } => banded(
                Axis::Rows,
                AxisShift::Insert { at: range.start.row, count: range.row_count() },
                range,
            ),
            StructuralEdit::DeleteRangeShiftUp { range, .. } => banded(
                Axis::Rows,
                AxisShift::Remove { at: range.start.row, count: range.row_count() },
                range,
            ),
            StructuralEdit::InsertRangeShiftRight { range, .. } => banded(
                Axis::Cols,
                AxisShift::Insert { at: range.start.col as u32, count: range.col_count() as u32 },
                range,
            ),
            StructuralEdit::DeleteRangeShiftLeft { range, .. } => banded(
                Axis::Cols,
                AxisShift::Remove { at: range.start.col as u32, count: range.col_count() as u32 },
                range,
            ),
            StructuralEdit::MoveRange { .. }
            | StructuralEdit::RenameSheet { .. }
            | StructuralEdit::RemoveSheet { .. } => None,
        }
    }

    fn targets(&self, reference: &Reference, context: &SheetId) -> bool {
        match &reference.sheet {
            Some(sheet) => sheet.matches(&self.sheet_name, self.case_sensitive),
            None => context == self.edit.sheet(),
        }
    }

    /// Transform one reference found in a formula on sheet `context`
    pub fn transform(&self, reference: &Reference, context: &SheetId) -> TransformedReference {
        match &self.edit {
            StructuralEdit::RenameSheet { new_name, .. } => match &reference.sheet {
                Some(sheet) if sheet.matches(&self.sheet_name, self.case_sensitive) => {
                    TransformedReference::Shifted(reference.with_sheet(Some(sheet.renamed(new_name))))
                }
                _ => TransformedReference::Unchanged,
            },
            StructuralEdit::RemoveSheet { .. } => match &reference.sheet {
                Some(sheet) if sheet.matches(&self.sheet_name, self.case_sensitive) => {
                    TransformedReference::Invalidated
                }
                _ => TransformedReference::Unchanged,
            },
            StructuralEdit::MoveRange { from, to, .. } => {
                if !self.targets(reference, context) || !from.contains_range(&reference.cell_range()) {
                    return TransformedReference::Unchanged;
                }
                let d_row = to.start.row as i64 - from.start.row as i64;
                let d_col = to.start.col as i64 - from.start.col as i64;
                if d_row == 0 && d_col == 0 {
                    return TransformedReference::Unchanged;
                }
                match (reference.start.offset(d_row, d_col), reference.end.offset(d_row, d_col)) {
                    (Some(start), Some(end)) => {
                        TransformedReference::Shifted(reference.with_corners(start, end))
                    }
                    _ => TransformedReference::Invalidated,
                }
            }
            _ => {
                if !self.targets(reference, context) {
                    return TransformedReference::Unchanged;
                }
                let Some(BandShift { axis, shift, band }) = self.band_shift() else {
                    return TransformedReference::Unchanged;
                };
                if let Some((lo, hi)) = band {
                    let other = match axis {
                        Axis::Rows => Axis::Cols,
                        Axis::Cols => Axis::Rows,
                    };
                    let (a, b) = axis_span(&reference.cell_range(), other);
                    if a < lo || b > hi {
                        return TransformedReference::Unchanged;
                    }
                }
                shift_reference(reference, axis, shift)
            }
        }
    }

    /// Where a formula cell at `(row, col)` on the edited sheet ends up
    ///
    /// `None` means the cell is destroyed: removed, overwritten by a moved
    /// range, or pushed off the grid.
    pub fn map_cell(&self, row: u32, col: u16) -> Option<(u32, u16)> {
        if let StructuralEdit::MoveRange { from, to, .. } = &self.edit {
            if from.contains(row, col) {
                let r = row as i64 + to.start.row as i64 - from.start.row as i64;
                let c = col as i64 + to.start.col as i64 - from.start.col as i64;
                return Some((r as u32, c as u16));
            }
            if to.contains(row, col) {
                return None;
            }
            return Some((row, col));
        }

        let Some(BandShift { axis, shift, band }) = self.band_shift() else {
            return Some((row, col));
        };
        let (p, q) = match axis {
            Axis::Rows => (row, col as u32),
            Axis::Cols => (col as u32, row),
        };
        if let Some((lo, hi)) = band {
            if q < lo || q > hi {
                return Some((row, col));
            }
        }
        let p = shift.map_position(p, axis.limit())?;
        Some(match axis {
            Axis::Rows => (p, col),
            Axis::Cols => (row, p as u16),
        })
    }
}
