//! Mutation payloads
//!
//! A structural edit is committed as a [`FormulaMutation`]: per-cell
//! patches plus an optional sheet operation. Every accepted edit yields a
//! [`MutationPair`] whose inverse payload restores the exact pre-edit
//! state when applied after the forward one.

use std::collections::BTreeSet;

use gridshift_core::{Error, FormulaCell, SheetId, Workbook, Worksheet};
use gridshift_formula::{FormulaError, FormulaResult, StructuralEdit};

/// New content for one cell position (`None` clears it)
#[derive(Debug, Clone, PartialEq)]
pub struct CellPatch {
    /// Sheet holding the cell
    pub sheet: SheetId,
    /// Row index
    pub row: u32,
    /// Column index
    pub col: u16,
    /// Content after the patch
    pub cell: Option<FormulaCell>,
}

/// Sheet-level part of a mutation
#[derive(Debug, Clone)]
pub enum SheetOp {
    /// Give a sheet a new display name
    Rename { sheet: SheetId, name: String },
    /// Delete a sheet
    Remove { sheet: SheetId },
}

/// One atomic change to the formula data of a workbook
///
/// Applied in order: `restore` first, then `cells`, then `sheet_op`.
#[derive(Debug, Clone, Default)]
pub struct FormulaMutation {
    /// A previously removed sheet to put back at its position
    pub restore: Option<(usize, Worksheet)>,
    /// Cell patches, at most one per position
    pub cells: Vec<CellPatch>,
    /// Rename or removal applied last
    pub sheet_op: Option<SheetOp>,
}

impl FormulaMutation {
    /// Check if applying the mutation would change nothing
    pub fn is_empty(&self) -> bool {
        self.restore.is_none() && self.cells.is_empty() && self.sheet_op.is_none()
    }
}

/// Counters describing one planned edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditStats {
    /// Formula cells examined
    pub scanned: usize,
    /// Cells whose effective formula text changed
    pub rewritten: usize,
    /// Cells that changed position
    pub relocated: usize,
    /// Cells destroyed by the edit
    pub removed: usize,
    /// Formulas left untouched because they could not be scanned
    pub passed_through: usize,
    /// Shared members turned into independent formulas
    pub detached: usize,
    /// Shared groups given a new canonical cell
    pub rerooted: usize,
    /// Shared groups with no surviving cell
    pub dissolved: usize,
}

/// Forward and inverse payloads of one accepted edit
#[derive(Debug, Clone)]
pub struct MutationPair {
    /// The edit as requested
    pub edit: StructuralEdit,
    /// Payload that performs the edit
    pub forward: FormulaMutation,
    /// Payload that restores the pre-edit state
    pub inverse: FormulaMutation,
    /// The edit that undoes `edit` geometrically, when one exists
    pub inverse_edit: Option<StructuralEdit>,
    /// What the planner saw and did
    pub stats: EditStats,
}

/// Notification emitted after a mutation is committed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaDataChanged {
    /// Sheets whose formula data, name or existence changed
    pub sheets: Vec<SheetId>,
    /// Cells that were patched
    pub cells: Vec<(SheetId, u32, u16)>,
}

/// Apply a mutation to a workbook
///
/// Every part is checked before anything is touched, so a rejected
/// mutation leaves the workbook unchanged.
pub fn apply_mutation(
    workbook: &mut Workbook,
    mutation: &FormulaMutation,
) -> FormulaResult<FormulaDataChanged> {
    check_mutation(workbook, mutation)?;

    let mut touched = BTreeSet::new();
    let mut changed = FormulaDataChanged::default();

    if let Some((index, sheet)) = &mutation.restore {
        touched.insert(sheet.id().clone());
        workbook.insert_worksheet(*index, sheet.clone())?;
    }

    for patch in &mutation.cells {
        let sheet = workbook
            .worksheet_mut(&patch.sheet)
            .ok_or_else(|| FormulaError::SheetNotFound(patch.sheet.to_string()))?;
        match &patch.cell {
            Some(cell) => sheet.put(patch.row, patch.col, cell.clone())?,
            None => {
                sheet.clear_cell_at(patch.row, patch.col);
            }
        }
        touched.insert(patch.sheet.clone());
        changed.cells.push((patch.sheet.clone(), patch.row, patch.col));
    }

    match &mutation.sheet_op {
        Some(SheetOp::Rename { sheet, name }) => {
            workbook.rename_worksheet(sheet, name)?;
            touched.insert(sheet.clone());
        }
        Some(SheetOp::Remove { sheet }) => {
            workbook.remove_worksheet(sheet)?;
            touched.insert(sheet.clone());
        }
        None => {}
    }

    changed.sheets = touched.into_iter().collect();
    Ok(changed)
}

fn check_mutation(workbook: &Workbook, mutation: &FormulaMutation) -> FormulaResult<()> {
    // Sheets as they stand once `restore` is applied
    let mut sheets: Vec<(&SheetId, &str)> = workbook.worksheets().map(|ws| (ws.id(), ws.name())).collect();

    if let Some((index, sheet)) = &mutation.restore {
        if *index > sheets.len() {
            return Err(Error::SheetOutOfBounds(*index, sheets.len()).into());
        }
        if sheets.iter().any(|(id, _)| *id == sheet.id()) {
            return Err(Error::DuplicateSheetId(sheet.id().to_string()).into());
        }
        workbook.validate_sheet_name(sheet.name(), None)?;
        sheets.insert(*index, (sheet.id(), sheet.name()));
    }

    let position = |id: &SheetId| {
        sheets
            .iter()
            .position(|(present, _)| *present == id)
            .ok_or_else(|| FormulaError::SheetNotFound(id.to_string()))
    };

    for patch in &mutation.cells {
        position(&patch.sheet)?;
    }

    match &mutation.sheet_op {
        Some(SheetOp::Rename { sheet, name }) => {
            let index = position(sheet)?;
            Workbook::check_sheet_name_syntax(name)?;
            let lower = name.to_lowercase();
            let taken = sheets
                .iter()
                .enumerate()
                .any(|(i, (_, other))| i != index && other.to_lowercase() == lower);
            if taken {
                return Err(Error::DuplicateSheetName(name.clone()).into());
            }
        }
        Some(SheetOp::Remove { sheet }) => {
            position(sheet)?;
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_patches_and_report() {
        let mut workbook = Workbook::new();
        let sheet = SheetId::new("sheet1");
        let mutation = FormulaMutation {
            cells: vec![
                CellPatch {
                    sheet: sheet.clone(),
                    row: 0,
                    col: 0,
                    cell: Some(FormulaCell::literal("=B1")),
                },
                CellPatch {
                    sheet: sheet.clone(),
                    row: 3,
                    col: 3,
                    cell: None,
                },
            ],
            ..Default::default()
        };

        let changed = apply_mutation(&mut workbook, &mutation).unwrap();
        assert_eq!(changed.sheets, vec![sheet.clone()]);
        assert_eq!(changed.cells, vec![(sheet.clone(), 0, 0), (sheet, 3, 3)]);
        let ws = workbook.worksheet_at(0).unwrap();
        assert_eq!(ws.formula_at(0, 0).unwrap().text.as_deref(), Some("=B1"));
    }

    #[test]
    fn test_rejected_mutation_changes_nothing() {
        let mut workbook = Workbook::new();
        let mutation = FormulaMutation {
            cells: vec![
                CellPatch {
                    sheet: SheetId::new("sheet1"),
                    row: 0,
                    col: 0,
                    cell: Some(FormulaCell::literal("=1")),
                },
                CellPatch {
                    sheet: SheetId::new("ghost"),
                    row: 0,
                    col: 0,
                    cell: None,
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            apply_mutation(&mut workbook, &mutation).unwrap_err(),
            FormulaError::SheetNotFound("ghost".into())
        );
        assert!(workbook.worksheet_at(0).unwrap().is_empty());
    }

    #[test]
    fn test_restore_then_patch_then_rename() {
        let mut workbook = Workbook::new();
        let restored = Worksheet::new("sheet2", "Sheet2");
        let mutation = FormulaMutation {
            restore: Some((1, restored)),
            cells: vec![CellPatch {
                sheet: SheetId::new("sheet2"),
                row: 1,
                col: 1,
                cell: Some(FormulaCell::literal("=A1")),
            }],
            sheet_op: Some(SheetOp::Rename {
                sheet: SheetId::new("sheet2"),
                name: "Data".into(),
            }),
        };

        let changed = apply_mutation(&mut workbook, &mutation).unwrap();
        assert_eq!(changed.sheets, vec![SheetId::new("sheet2")]);
        let sheet = workbook.worksheet_at(1).unwrap();
        assert_eq!(sheet.name(), "Data");
        assert_eq!(sheet.formula_count(), 1);
    }

    #[test]
    fn test_rename_checked_against_restored_sheets() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("sheet3", "Sheet3").unwrap();
        let mutation = FormulaMutation {
            restore: Some((1, Worksheet::new("sheet2", "Data"))),
            sheet_op: Some(SheetOp::Rename {
                sheet: SheetId::new("sheet3"),
                name: "data".into(),
            }),
            ..Default::default()
        };

        assert_eq!(
            apply_mutation(&mut workbook, &mutation).unwrap_err(),
            FormulaError::Core(Error::DuplicateSheetName("data".into()))
        );
        assert_eq!(workbook.sheet_count(), 2);
        assert_eq!(workbook.worksheet_at(1).unwrap().name(), "Sheet3");
    }

    #[test]
    fn test_rename_of_restored_sheet_undoes_remove_edit() {
        use crate::WorkbookEditExt;

        let mut workbook = Workbook::new();
        workbook.add_worksheet("sheet2", "Sheet2").unwrap();
        workbook
            .worksheet_mut(&SheetId::new("sheet1"))
            .unwrap()
            .set_formula("A1", "=Sheet2!B2")
            .unwrap();
        let (pair, _) = workbook
            .apply_edit(&StructuralEdit::RemoveSheet {
                sheet: SheetId::new("sheet2"),
            })
            .unwrap();

        // Put the sheet back under a new name in one step
        let mut undo = pair.inverse.clone();
        undo.sheet_op = Some(SheetOp::Rename {
            sheet: SheetId::new("sheet2"),
            name: "Archive".into(),
        });
        apply_mutation(&mut workbook, &undo).unwrap();
        assert_eq!(workbook.worksheet_at(1).unwrap().name(), "Archive");
        let restored = workbook.worksheet_at(0).unwrap().formula("A1").unwrap().unwrap();
        assert_eq!(restored.text.as_deref(), Some("=Sheet2!B2"));
    }
}
