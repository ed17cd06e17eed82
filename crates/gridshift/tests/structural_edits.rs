//! Structural edits replayed against a reference workbook
//!
//! Each test applies one edit, checks the rewritten formulas, then undoes
//! and redoes it and checks that both states are restored exactly.

use gridshift::prelude::*;
use gridshift::{CellRange, SharedId};
use pretty_assertions::assert_eq;

type Snapshot = Vec<(SheetId, String, Vec<(u32, u16, FormulaCell)>)>;

fn sheet1() -> SheetId {
    SheetId::new("sheet1")
}

fn sheet2() -> SheetId {
    SheetId::new("sheet2")
}

fn reference_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("sheet2", "Sheet2").unwrap();
    let sheet = workbook.worksheet_mut(&sheet1()).unwrap();

    sheet.set_formula_at(0, 6, "=A1:B2").unwrap();
    sheet.set_formula_at(2, 2, "=A1:B2").unwrap();
    sheet.set_formula_at(5, 2, "=SUM(A1:B2)").unwrap();

    for (i, row) in (7..=9).enumerate() {
        for (j, col) in (3..=5).enumerate() {
            let text = format!("=SUM({}{})", ["A", "B", "C"][j], 8 + i);
            sheet.set_formula_at(row, col, &text).unwrap();
        }
    }
    sheet.set_formula_at(7, 7, "=SUM(A8:C10)").unwrap();
    sheet.set_shared_formula_at(7, 8, "=SUM(B8:D10)", "CarNau").unwrap();
    sheet.set_formula_at(7, 9, "CarNau").unwrap();
    sheet.set_shared_formula_at(8, 7, "=SUM(A9:C11)", "y0gLJX").unwrap();
    sheet.set_shared_member_at(8, 8, "y0gLJX").unwrap();
    sheet.set_formula_at(8, 9, "y0gLJX").unwrap();
    sheet.set_shared_member_at(9, 7, "y0gLJX").unwrap();
    sheet.set_shared_member_at(9, 8, "y0gLJX").unwrap();
    sheet.set_formula_at(9, 9, "y0gLJX").unwrap();

    for (i, row) in (10..=12).enumerate() {
        for (j, col) in (0..=2).enumerate() {
            let text = format!("=SUM({}{})", ["A", "B", "C"][j], 8 + i);
            sheet.set_formula_at(row, col, &text).unwrap();
        }
    }

    sheet.set_formula_at(14, 0, "=A1:B2").unwrap();
    sheet.set_formula_at(14, 2, "=Sheet2!A1:B2").unwrap();

    sheet.set_formula_at(18, 1, "=SUM(A19)").unwrap();
    sheet.set_cached_value_at(18, 1, CachedValue::number(1.0)).unwrap();
    sheet.set_shared_formula_at(19, 1, "=SUM(A20)", "id1").unwrap();
    sheet.set_cached_value_at(19, 1, CachedValue::number(2.0)).unwrap();
    sheet.set_shared_member_at(20, 1, "id1").unwrap();
    sheet.set_cached_value_at(20, 1, CachedValue::number(3.0)).unwrap();

    sheet.set_formula_at(21, 2, "=OFFSET(A1,1,1)").unwrap();
    sheet.set_cached_value_at(21, 2, CachedValue::number(0.0)).unwrap();
    sheet.set_shared_formula_at(21, 3, "=OFFSET(B1,1,1)", "id2").unwrap();
    sheet.set_cached_value_at(21, 3, CachedValue::number(1.0)).unwrap();
    sheet.set_shared_member_at(21, 4, "id2").unwrap();
    sheet.set_cached_value_at(21, 4, CachedValue::number(1.0)).unwrap();

    workbook
}

fn snapshot(workbook: &Workbook) -> Snapshot {
    workbook
        .worksheets()
        .map(|sheet| {
            let cells = sheet
                .formulas()
                .iter()
                .map(|(row, col, cell)| (row, col, cell.clone()))
                .collect();
            (sheet.id().clone(), sheet.name().to_string(), cells)
        })
        .collect()
}

/// Formula text and group key per cell, ignoring cached values
fn formulas(workbook: &Workbook) -> Vec<(u32, u16, Option<String>, Option<SharedId>)> {
    workbook
        .worksheet(&sheet1())
        .map(|sheet| {
            sheet
                .formulas()
                .iter()
                .map(|(row, col, cell)| (row, col, cell.text.clone(), cell.shared_id.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn cell(workbook: &Workbook, row: u32, col: u16) -> Option<FormulaCell> {
    workbook.worksheet(&sheet1())?.formula_at(row, col).cloned()
}

fn text(workbook: &Workbook, row: u32, col: u16) -> Option<String> {
    cell(workbook, row, col).and_then(|cell| cell.text)
}

/// Apply `edit`, then check undo and redo restore both states exactly
fn edit_with_options(edit: StructuralEdit, options: &EditOptions) -> (Workbook, MutationPair) {
    let mut workbook = reference_workbook();
    let before = snapshot(&workbook);

    let (pair, _) = workbook.apply_edit_with_options(&edit, options).unwrap();
    let after = snapshot(&workbook);

    workbook.apply_mutation(&pair.inverse).unwrap();
    assert_eq!(snapshot(&workbook), before, "undo of {}", edit);

    workbook.apply_mutation(&pair.forward).unwrap();
    assert_eq!(snapshot(&workbook), after, "redo of {}", edit);

    (workbook, pair)
}

fn replay(edit: StructuralEdit) -> Workbook {
    edit_with_options(edit, &EditOptions::default()).0
}

fn range(a1: &str) -> CellRange {
    CellRange::parse(a1).unwrap()
}

#[test]
fn test_insert_row_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::InsertRows { sheet: sheet1(), at: 1, count: 1 });
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:B3"));
    assert_eq!(text(&workbook, 2, 2), None);
    assert_eq!(text(&workbook, 3, 2).as_deref(), Some("=A1:B3"));
    assert_eq!(text(&workbook, 6, 2).as_deref(), Some("=SUM(A1:B3)"));
    assert_eq!(text(&workbook, 15, 2).as_deref(), Some("=Sheet2!A1:B2"));
}

#[test]
fn test_insert_row_adjacent_formulas() {
    let workbook = replay(StructuralEdit::InsertRows { sheet: sheet1(), at: 8, count: 1 });
    assert_eq!(text(&workbook, 10, 0), None);
    assert_eq!(text(&workbook, 11, 0).as_deref(), Some("=SUM(A8)"));
    assert_eq!(text(&workbook, 12, 0).as_deref(), Some("=SUM(A10)"));
    assert_eq!(text(&workbook, 13, 0).as_deref(), Some("=SUM(A11)"));

    // Shared group moves down as a whole and stays shared
    let anchor = cell(&workbook, 9, 7).unwrap();
    assert_eq!(anchor.text.as_deref(), Some("=SUM(A10:C12)"));
    assert_eq!(anchor.shared_id, Some(SharedId::new("y0gLJX")));
    assert!(cell(&workbook, 9, 8).unwrap().is_dependent());
    assert!(cell(&workbook, 10, 7).unwrap().is_dependent());
}

#[test]
fn test_insert_column_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::InsertCols { sheet: sheet1(), at: 1, count: 1 });
    assert_eq!(text(&workbook, 2, 3).as_deref(), Some("=A1:C2"));
    assert_eq!(text(&workbook, 5, 3).as_deref(), Some("=SUM(A1:C2)"));
    assert_eq!(text(&workbook, 7, 3), None);
    assert_eq!(text(&workbook, 7, 4).as_deref(), Some("=SUM(A8)"));
    assert_eq!(text(&workbook, 7, 5).as_deref(), Some("=SUM(C8)"));
    assert_eq!(text(&workbook, 7, 6).as_deref(), Some("=SUM(D8)"));
}

#[test]
fn test_remove_row_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::RemoveRows { sheet: sheet1(), at: 1, count: 1 });
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:B1"));
    assert_eq!(text(&workbook, 1, 2).as_deref(), Some("=A1:B1"));
    assert_eq!(text(&workbook, 2, 2), None);
    assert_eq!(text(&workbook, 4, 2).as_deref(), Some("=SUM(A1:B1)"));
}

#[test]
fn test_remove_row_invalidates_reference() {
    let workbook = replay(StructuralEdit::RemoveRows { sheet: sheet1(), at: 8, count: 1 });
    assert_eq!(text(&workbook, 9, 0).as_deref(), Some("=SUM(A8)"));
    assert_eq!(text(&workbook, 10, 0).as_deref(), Some("=SUM(#REF!)"));
    assert_eq!(text(&workbook, 11, 0).as_deref(), Some("=SUM(A9)"));
    assert_eq!(text(&workbook, 12, 0), None);
    assert_eq!(text(&workbook, 7, 7).as_deref(), Some("=SUM(A8:C9)"));
}

#[test]
fn test_remove_row_reroots_shared_group() {
    let workbook = replay(StructuralEdit::RemoveRows { sheet: sheet1(), at: 8, count: 1 });
    let root = cell(&workbook, 8, 7).unwrap();
    assert_eq!(root.text.as_deref(), Some("=SUM(A9:C11)"));
    assert_eq!(root.shared_id, Some(SharedId::new("y0gLJX")));
    assert!(cell(&workbook, 8, 8).unwrap().is_dependent());
    assert_eq!(text(&workbook, 8, 9).as_deref(), Some("y0gLJX"));
    assert_eq!(cell(&workbook, 9, 7), None);
}

#[test]
fn test_remove_row_containing_formula() {
    let workbook = replay(StructuralEdit::RemoveRows { sheet: sheet1(), at: 10, count: 1 });
    assert_eq!(text(&workbook, 10, 0).as_deref(), Some("=SUM(A9)"));
    assert_eq!(text(&workbook, 11, 0).as_deref(), Some("=SUM(A10)"));
}

#[test]
fn test_remove_column_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::RemoveCols { sheet: sheet1(), at: 1, count: 1 });
    assert_eq!(text(&workbook, 2, 1).as_deref(), Some("=A1:A2"));
    assert_eq!(text(&workbook, 5, 1).as_deref(), Some("=SUM(A1:A2)"));
    assert_eq!(text(&workbook, 7, 2).as_deref(), Some("=SUM(A8)"));
    assert_eq!(text(&workbook, 7, 3).as_deref(), Some("=SUM(#REF!)"));
    assert_eq!(text(&workbook, 7, 4).as_deref(), Some("=SUM(B8)"));
    assert_eq!(text(&workbook, 7, 5), None);
}

#[test]
fn test_remove_columns_detaches_divergent_member() {
    let (workbook, pair) = edit_with_options(
        StructuralEdit::RemoveCols { sheet: sheet1(), at: 0, count: 2 },
        &EditOptions::default(),
    );

    let first = cell(&workbook, 21, 0).unwrap();
    assert_eq!(first.text.as_deref(), Some("=OFFSET(#REF!,1,1)"));
    assert_eq!(first.shared_id, None);

    let anchor = cell(&workbook, 21, 1).unwrap();
    assert_eq!(anchor.text.as_deref(), Some("=OFFSET(#REF!,1,1)"));
    assert_eq!(anchor.shared_id, Some(SharedId::new("id2")));

    let detached = cell(&workbook, 21, 2).unwrap();
    assert_eq!(detached.text.as_deref(), Some("=OFFSET(A1,1,1)"));
    assert_eq!(detached.shared_id, None);

    assert_eq!(cell(&workbook, 21, 3), None);
    assert_eq!(cell(&workbook, 21, 4), None);
    // Members of y0gLJX whose ranges were clipped differently also detach
    assert_eq!(pair.stats.detached, 3);
    // Column B held every cell of group id1
    assert_eq!(pair.stats.dissolved, 1);
}

#[test]
fn test_remove_column_containing_formula() {
    let workbook = replay(StructuralEdit::RemoveCols { sheet: sheet1(), at: 3, count: 1 });
    assert_eq!(text(&workbook, 7, 3).as_deref(), Some("=SUM(B8)"));
}

#[test]
fn test_move_rows_updates_reference() {
    let workbook = replay(StructuralEdit::MoveRows { sheet: sheet1(), start: 1, count: 1, to: 4 });
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:B4"));
    assert_eq!(text(&workbook, 1, 2).as_deref(), Some("=A1:B4"));
    assert_eq!(text(&workbook, 5, 2).as_deref(), Some("=SUM(A1:B4)"));
}

#[test]
fn test_move_rows_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::MoveRows { sheet: sheet1(), start: 1, count: 1, to: 9 });
    assert_eq!(text(&workbook, 1, 2).as_deref(), Some("=A1:B9"));
    assert_eq!(text(&workbook, 2, 2), None);
    assert_eq!(text(&workbook, 4, 2).as_deref(), Some("=SUM(A1:B9)"));
}

#[test]
fn test_move_columns_updates_reference() {
    let workbook = replay(StructuralEdit::MoveCols { sheet: sheet1(), start: 0, count: 1, to: 4 });
    assert_eq!(text(&workbook, 2, 1).as_deref(), Some("=A1:A2"));
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:A2"));
}

#[test]
fn test_move_columns_updates_reference_and_position() {
    let workbook = replay(StructuralEdit::MoveCols { sheet: sheet1(), start: 1, count: 1, to: 9 });
    assert_eq!(text(&workbook, 0, 5).as_deref(), Some("=A1:I2"));
    assert_eq!(text(&workbook, 2, 1).as_deref(), Some("=A1:I2"));
    assert_eq!(text(&workbook, 5, 1).as_deref(), Some("=SUM(A1:I2)"));
}

#[test]
fn test_move_range_updates_reference() {
    let workbook = replay(StructuralEdit::MoveRange {
        sheet: sheet1(),
        from: range("A1:B2"),
        to: range("D1:E2"),
    });
    assert_eq!(text(&workbook, 2, 2).as_deref(), Some("=D1:E2"));
    assert_eq!(text(&workbook, 5, 2).as_deref(), Some("=SUM(D1:E2)"));
    assert_eq!(text(&workbook, 14, 2).as_deref(), Some("=Sheet2!A1:B2"));
}

#[test]
fn test_move_range_updates_position() {
    let workbook = replay(StructuralEdit::MoveRange {
        sheet: sheet1(),
        from: range("C6"),
        to: range("D6"),
    });
    assert_eq!(text(&workbook, 5, 2), None);
    assert_eq!(text(&workbook, 5, 3).as_deref(), Some("=SUM(A1:B2)"));
}

#[test]
fn test_move_range_keeps_shared_group_and_cache() {
    let options = EditOptions {
        preserve_cached_values: true,
        ..Default::default()
    };
    let (workbook, _) = edit_with_options(
        StructuralEdit::MoveRange {
            sheet: sheet1(),
            from: range("B19:B21"),
            to: range("C19:C21"),
        },
        &options,
    );

    assert_eq!(cell(&workbook, 18, 1), None);
    assert_eq!(
        cell(&workbook, 18, 2),
        Some(FormulaCell::literal("=SUM(A19)").with_cached(CachedValue::number(1.0)))
    );
    assert_eq!(
        cell(&workbook, 19, 2),
        Some(FormulaCell::anchor("=SUM(A20)", "id1").with_cached(CachedValue::number(2.0)))
    );
    assert_eq!(
        cell(&workbook, 20, 2),
        Some(FormulaCell::member("id1").with_cached(CachedValue::number(3.0)))
    );
}

#[test]
fn test_relocated_cache_cleared_by_default() {
    let workbook = replay(StructuralEdit::MoveRange {
        sheet: sheet1(),
        from: range("B19:B21"),
        to: range("C19:C21"),
    });
    assert_eq!(cell(&workbook, 19, 2).unwrap().cached, None);
}

#[test]
fn test_delete_shift_up() {
    let workbook = replay(StructuralEdit::DeleteRangeShiftUp { sheet: sheet1(), range: range("A2:B2") });
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:B1"));
    assert_eq!(text(&workbook, 2, 2).as_deref(), Some("=A1:B1"));
    assert_eq!(text(&workbook, 13, 0).as_deref(), Some("=A1:B1"));
    assert_eq!(text(&workbook, 14, 0), None);
}

#[test]
fn test_delete_shift_up_moves_cell_below() {
    let workbook = replay(StructuralEdit::DeleteRangeShiftUp { sheet: sheet1(), range: range("C2") });
    assert_eq!(text(&workbook, 1, 2).as_deref(), Some("=A1:B2"));
    assert_eq!(text(&workbook, 2, 2), None);
}

#[test]
fn test_delete_shift_left() {
    let workbook = replay(StructuralEdit::DeleteRangeShiftLeft { sheet: sheet1(), range: range("B1:B2") });
    assert_eq!(text(&workbook, 0, 5).as_deref(), Some("=A1:A2"));
    assert_eq!(text(&workbook, 2, 2).as_deref(), Some("=A1:A2"));
}

#[test]
fn test_delete_shift_left_moves_cell_on_the_right() {
    let workbook = replay(StructuralEdit::DeleteRangeShiftLeft { sheet: sheet1(), range: range("B3") });
    assert_eq!(text(&workbook, 2, 1).as_deref(), Some("=A1:B2"));
    assert_eq!(text(&workbook, 2, 2), None);
}

#[test]
fn test_insert_shift_down() {
    let workbook = replay(StructuralEdit::InsertRangeShiftDown { sheet: sheet1(), range: range("A2:B2") });
    assert_eq!(text(&workbook, 0, 6).as_deref(), Some("=A1:B3"));
    assert_eq!(text(&workbook, 15, 0).as_deref(), Some("=A1:B3"));
}

#[test]
fn test_insert_shift_down_moves_cell_below() {
    let workbook = replay(StructuralEdit::InsertRangeShiftDown { sheet: sheet1(), range: range("C2") });
    assert_eq!(text(&workbook, 2, 2), None);
    assert_eq!(text(&workbook, 3, 2).as_deref(), Some("=A1:B2"));
}

#[test]
fn test_insert_shift_right() {
    let workbook = replay(StructuralEdit::InsertRangeShiftRight { sheet: sheet1(), range: range("B1:B2") });
    assert_eq!(text(&workbook, 14, 0).as_deref(), Some("=A1:C2"));
    assert_eq!(text(&workbook, 0, 7).as_deref(), Some("=A1:C2"));
}

#[test]
fn test_insert_shift_right_moves_cell_on_the_right() {
    let workbook = replay(StructuralEdit::InsertRangeShiftRight { sheet: sheet1(), range: range("B6") });
    assert_eq!(text(&workbook, 5, 2), None);
    assert_eq!(text(&workbook, 5, 3).as_deref(), Some("=SUM(A1:B2)"));
}

#[test]
fn test_rename_sheet() {
    let (workbook, pair) = edit_with_options(
        StructuralEdit::RenameSheet {
            sheet: sheet2(),
            new_name: "Sheet2Rename".into(),
        },
        &EditOptions::default(),
    );
    assert_eq!(text(&workbook, 14, 2).as_deref(), Some("=Sheet2Rename!A1:B2"));
    assert_eq!(workbook.worksheet(&sheet2()).unwrap().name(), "Sheet2Rename");
    assert_eq!(
        pair.inverse_edit,
        Some(StructuralEdit::RenameSheet {
            sheet: sheet2(),
            new_name: "Sheet2".into(),
        })
    );
}

#[test]
fn test_rename_sheet_rejects_duplicate_name() {
    let mut workbook = reference_workbook();
    let before = snapshot(&workbook);
    let result = workbook.apply_edit(&StructuralEdit::RenameSheet {
        sheet: sheet2(),
        new_name: "sheet1".into(),
    });
    assert!(result.is_err());
    assert_eq!(snapshot(&workbook), before);
}

#[test]
fn test_remove_sheet() {
    let (workbook, pair) = edit_with_options(
        StructuralEdit::RemoveSheet { sheet: sheet2() },
        &EditOptions::default(),
    );
    assert_eq!(text(&workbook, 14, 2).as_deref(), Some("=#REF!"));
    assert!(workbook.worksheet(&sheet2()).is_none());
    assert_eq!(pair.inverse_edit, None);
}

#[test]
fn test_notification_lists_patched_cells() {
    let mut workbook = reference_workbook();
    let (pair, changed) = workbook
        .apply_edit(&StructuralEdit::RemoveSheet { sheet: sheet2() })
        .unwrap();
    assert_eq!(changed.sheets, vec![sheet1(), sheet2()]);
    assert_eq!(changed.cells, vec![(sheet1(), 14, 2)]);
    assert_eq!(pair.forward.cells.len(), 1);
}

#[test]
fn test_invalid_edit_changes_nothing() {
    let mut workbook = reference_workbook();
    let before = snapshot(&workbook);
    let result = workbook.apply_edit(&StructuralEdit::InsertRows { sheet: sheet1(), at: 0, count: 0 });
    assert!(matches!(result, Err(FormulaError::InvalidEdit(_))));
    assert_eq!(snapshot(&workbook), before);
}

#[test]
fn test_inverse_edit_restores_formulas_without_payload() {
    let mut workbook = reference_workbook();
    let before = formulas(&workbook);
    let (pair, _) = workbook
        .apply_edit(&StructuralEdit::InsertRows { sheet: sheet1(), at: 3, count: 2 })
        .unwrap();
    let inverse = pair.inverse_edit.unwrap();
    workbook.apply_edit(&inverse).unwrap();
    assert_eq!(formulas(&workbook), before);
}
