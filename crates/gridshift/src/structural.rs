//! Structural edits over a workbook
//!
//! Plans the formula side of a structural edit: every formula in scope is
//! rewritten, cells on the edited sheet are relocated, shared groups are
//! re-rooted or dissolved, and stale cached values are dropped. The plan
//! is a [`MutationPair`]; nothing is touched until its forward payload is
//! applied.
//!
//! # Example
//!
//! ```rust
//! use gridshift::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_at_mut(0).unwrap();
//! sheet.set_formula("C3", "=SUM(A1:B2)").unwrap();
//! let id = sheet.id().clone();
//!
//! let (pair, _) = workbook
//!     .apply_edit(&StructuralEdit::InsertRows { sheet: id, at: 1, count: 1 })
//!     .unwrap();
//! let sheet = workbook.worksheet_at(0).unwrap();
//! assert_eq!(sheet.formula("C4").unwrap().unwrap().text.as_deref(), Some("=SUM(A1:B3)"));
//!
//! workbook.apply_mutation(&pair.inverse).unwrap();
//! let sheet = workbook.worksheet_at(0).unwrap();
//! assert_eq!(sheet.formula("C3").unwrap().unwrap().text.as_deref(), Some("=SUM(A1:B2)"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use gridshift_core::{FormulaCell, FormulaStore, SharedId, Workbook, Worksheet};
use gridshift_formula::{
    derive_effective_text, rewrite_formula, FormulaError, FormulaResult, ResolvedEdit, StructuralEdit,
};
use log::{debug, trace, warn};

use crate::mutation::{
    self, CellPatch, EditStats, FormulaDataChanged, FormulaMutation, MutationPair, SheetOp,
};

/// Options for planning structural edits
#[derive(Debug, Clone)]
pub struct EditOptions {
    /// Keep the cached value of a relocated cell whose effective text did
    /// not change (default: false)
    pub preserve_cached_values: bool,
    /// Match sheet names in references case-sensitively (default: false)
    pub case_sensitive_sheet_names: bool,
    /// Turn shared members that no longer follow their canonical formula
    /// into independent formulas (default: true)
    pub detach_divergent_members: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            preserve_cached_values: false,
            case_sensitive_sheet_names: false,
            detach_divergent_members: true,
        }
    }
}

/// Extension trait for Workbook to add structural edit methods
pub trait WorkbookEditExt {
    /// Compute the forward and inverse payloads of `edit` without applying them
    fn plan_edit(&self, edit: &StructuralEdit, options: &EditOptions) -> FormulaResult<MutationPair>;

    /// Plan and apply `edit` with default options
    fn apply_edit(&mut self, edit: &StructuralEdit) -> FormulaResult<(MutationPair, FormulaDataChanged)>;

    /// Plan and apply `edit` with custom options
    fn apply_edit_with_options(
        &mut self,
        edit: &StructuralEdit,
        options: &EditOptions,
    ) -> FormulaResult<(MutationPair, FormulaDataChanged)>;

    /// Apply a payload from a previous plan (forward for redo, inverse for undo)
    fn apply_mutation(&mut self, mutation: &FormulaMutation) -> FormulaResult<FormulaDataChanged>;
}

impl WorkbookEditExt for Workbook {
    fn plan_edit(&self, edit: &StructuralEdit, options: &EditOptions) -> FormulaResult<MutationPair> {
        EditPlanner::new(self, edit, options)?.plan()
    }

    fn apply_edit(&mut self, edit: &StructuralEdit) -> FormulaResult<(MutationPair, FormulaDataChanged)> {
        self.apply_edit_with_options(edit, &EditOptions::default())
    }

    fn apply_edit_with_options(
        &mut self,
        edit: &StructuralEdit,
        options: &EditOptions,
    ) -> FormulaResult<(MutationPair, FormulaDataChanged)> {
        let pair = self.plan_edit(edit, options)?;
        let changed = mutation::apply_mutation(self, &pair.forward)?;
        Ok((pair, changed))
    }

    fn apply_mutation(&mut self, mutation: &FormulaMutation) -> FormulaResult<FormulaDataChanged> {
        mutation::apply_mutation(self, mutation)
    }
}

/// A formula cell followed through the edit
struct Entry {
    from: (u32, u16),
    /// Landing position, `None` when the cell is destroyed
    to: Option<(u32, u16)>,
    cell: FormulaCell,
    /// Effective text before and after; `None` for members whose
    /// canonical formula cannot be found
    before: Option<String>,
    after: Option<String>,
}

impl Entry {
    fn is_anchor(&self) -> bool {
        self.cell.text.is_some()
    }
}

struct EditPlanner<'a> {
    workbook: &'a Workbook,
    edit: ResolvedEdit,
    options: &'a EditOptions,
    stats: EditStats,
}

impl<'a> EditPlanner<'a> {
    fn new(workbook: &'a Workbook, edit: &StructuralEdit, options: &'a EditOptions) -> FormulaResult<Self> {
        edit.validate()?;
        let target = workbook
            .worksheet(edit.sheet())
            .ok_or_else(|| FormulaError::SheetNotFound(edit.sheet().to_string()))?;

        match edit {
            StructuralEdit::RenameSheet { sheet, new_name } => {
                let index = workbook
                    .sheet_index(sheet)
                    .ok_or_else(|| FormulaError::SheetNotFound(sheet.to_string()))?;
                workbook.validate_sheet_name(new_name, Some(index))?;
            }
            StructuralEdit::RemoveSheet { .. } if workbook.sheet_count() == 1 => {
                return Err(FormulaError::InvalidEdit("cannot remove the only sheet".into()));
            }
            _ => {}
        }

        let resolved = ResolvedEdit::new(edit.clone(), target.name())
            .case_sensitive(options.case_sensitive_sheet_names);
        Ok(Self {
            workbook,
            edit: resolved,
            options,
            stats: EditStats::default(),
        })
    }

    fn plan(mut self) -> FormulaResult<MutationPair> {
        let edit = self.edit.edit().clone();
        let mut forward = FormulaMutation::default();
        let mut inverse = FormulaMutation::default();
        let mut inverse_edit = edit.inverse();

        let workbook = self.workbook;
        for sheet in workbook.worksheets() {
            if matches!(&edit, StructuralEdit::RemoveSheet { sheet: removed } if removed == sheet.id()) {
                continue;
            }
            let moves = edit.moves_cells() && sheet.id() == edit.sheet();
            let (fwd, inv) = self.plan_sheet(sheet, moves);
            forward.cells.extend(fwd);
            inverse.cells.extend(inv);
        }

        match &edit {
            StructuralEdit::RenameSheet { sheet, new_name } => {
                forward.sheet_op = Some(SheetOp::Rename {
                    sheet: sheet.clone(),
                    name: new_name.clone(),
                });
                inverse.sheet_op = Some(SheetOp::Rename {
                    sheet: sheet.clone(),
                    name: self.edit.sheet_name().to_string(),
                });
                inverse_edit = Some(StructuralEdit::RenameSheet {
                    sheet: sheet.clone(),
                    new_name: self.edit.sheet_name().to_string(),
                });
            }
            StructuralEdit::RemoveSheet { sheet } => {
                let index = self
                    .workbook
                    .sheet_index(sheet)
                    .ok_or_else(|| FormulaError::SheetNotFound(sheet.to_string()))?;
                let snapshot = self.workbook.require_worksheet(sheet)?.clone();
                forward.sheet_op = Some(SheetOp::Remove { sheet: sheet.clone() });
                inverse.restore = Some((index, snapshot));
            }
            _ => {}
        }

        debug!(
            "{}: scanned {}, rewritten {}, relocated {}, removed {}, patches {}",
            edit,
            self.stats.scanned,
            self.stats.rewritten,
            self.stats.relocated,
            self.stats.removed,
            forward.cells.len()
        );

        Ok(MutationPair {
            edit,
            forward,
            inverse,
            inverse_edit,
            stats: self.stats,
        })
    }

    /// Forward and inverse cell patches for one sheet
    fn plan_sheet(&mut self, sheet: &Worksheet, moves: bool) -> (Vec<CellPatch>, Vec<CellPatch>) {
        let store = sheet.formulas();
        let mut entries = Vec::with_capacity(store.len());

        for (row, col, cell) in store.iter() {
            self.stats.scanned += 1;
            let to = if moves { self.edit.map_cell(row, col) } else { Some((row, col)) };
            let before = effective_text(store, row, col, cell);
            let after = match (&before, to) {
                (Some(text), Some(_)) => Some(self.rewrite(sheet, row, col, text)),
                _ => before.clone(),
            };
            match to {
                None => self.stats.removed += 1,
                Some(pos) if pos != (row, col) => self.stats.relocated += 1,
                Some(_) => {}
            }
            entries.push(Entry {
                from: (row, col),
                to,
                cell: cell.clone(),
                before,
                after,
            });
        }

        let landed = self.land(sheet, store, &entries);

        let positions: BTreeSet<(u32, u16)> = entries
            .iter()
            .map(|entry| entry.from)
            .chain(landed.keys().copied())
            .collect();
        let mut forward = Vec::new();
        let mut inverse = Vec::new();
        for (row, col) in positions {
            let old = store.get(row, col);
            let new = landed.get(&(row, col));
            if old == new {
                continue;
            }
            forward.push(CellPatch {
                sheet: sheet.id().clone(),
                row,
                col,
                cell: new.cloned(),
            });
            inverse.push(CellPatch {
                sheet: sheet.id().clone(),
                row,
                col,
                cell: old.cloned(),
            });
        }
        (forward, inverse)
    }

    fn rewrite(&mut self, sheet: &Worksheet, row: u32, col: u16, text: &str) -> String {
        match rewrite_formula(&self.edit, text, sheet.id()) {
            Ok(Some(new)) => {
                self.stats.rewritten += 1;
                trace!("{}!({}, {}): {} -> {}", sheet.name(), row, col, text, new);
                new
            }
            Ok(None) => text.to_string(),
            Err(err) => {
                self.stats.passed_through += 1;
                warn!("{}!({}, {}): formula left as is: {}", sheet.name(), row, col, err);
                text.to_string()
            }
        }
    }

    /// Build the post-edit cells of a sheet, keyed by landing position
    fn land(
        &mut self,
        sheet: &Worksheet,
        store: &FormulaStore,
        entries: &[Entry],
    ) -> BTreeMap<(u32, u16), FormulaCell> {
        let mut groups: BTreeMap<&SharedId, Vec<&Entry>> = BTreeMap::new();
        let mut landed = BTreeMap::new();

        for entry in entries {
            match &entry.cell.shared_id {
                Some(id) => groups.entry(id).or_default().push(entry),
                None => {
                    if let Some(to) = entry.to {
                        let cell = FormulaCell {
                            text: entry.after.clone(),
                            shared_id: None,
                            cached: None,
                        };
                        landed.insert(to, self.with_cache(entry, cell));
                    }
                }
            }
        }

        for (id, members) in groups {
            self.land_group(sheet, store, id, &members, &mut landed);
        }
        landed
    }

    fn land_group(
        &mut self,
        sheet: &Worksheet,
        store: &FormulaStore,
        id: &SharedId,
        entries: &[&Entry],
        landed: &mut BTreeMap<(u32, u16), FormulaCell>,
    ) {
        let mut survivors: Vec<(&Entry, (u32, u16))> = entries
            .iter()
            .filter_map(|entry| entry.to.map(|to| (*entry, to)))
            .collect();
        if survivors.is_empty() {
            self.stats.dissolved += 1;
            warn!("{}: shared group {} dissolved", sheet.name(), id);
            return;
        }
        survivors.sort_by_key(|(_, to)| *to);

        // Lowest surviving anchor, else the first member that can carry text
        let root = survivors
            .iter()
            .find(|(entry, _)| entry.is_anchor())
            .or_else(|| survivors.iter().find(|(entry, _)| entry.after.is_some()))
            .map(|(entry, to)| (entry.from, *to, entry.after.clone()));

        if let Some((root_from, _, _)) = &root {
            if store.groups().canonical(id) != Some(*root_from) {
                self.stats.rerooted += 1;
                warn!(
                    "{}: shared group {} re-rooted at ({}, {})",
                    sheet.name(),
                    id,
                    root_from.0,
                    root_from.1
                );
            }
        }

        for (entry, to) in survivors {
            let mut cell = entry.cell.clone();
            cell.cached = None;
            match &root {
                Some((root_from, _, _)) if entry.is_anchor() || entry.from == *root_from => {
                    cell.text = entry.after.clone();
                }
                Some((_, root_to, Some(root_text))) => {
                    if let Some(text) = &entry.after {
                        let d_row = to.0 as i64 - root_to.0 as i64;
                        let d_col = to.1 as i64 - root_to.1 as i64;
                        let follows = derive_effective_text(root_text, d_row, d_col)
                            .map(|derived| &derived == text)
                            .unwrap_or(false);
                        if !follows && self.options.detach_divergent_members {
                            self.stats.detached += 1;
                            debug!(
                                "{}: ({}, {}) detached from shared group {}",
                                sheet.name(),
                                to.0,
                                to.1,
                                id
                            );
                            cell.text = Some(text.clone());
                            cell.shared_id = None;
                        }
                    }
                }
                _ => {}
            }
            landed.insert(to, self.with_cache(entry, cell));
        }
    }

    fn with_cache(&self, entry: &Entry, mut cell: FormulaCell) -> FormulaCell {
        let same_text = entry.before == entry.after;
        let stayed = entry.to == Some(entry.from);
        cell.cached = if same_text && (stayed || self.options.preserve_cached_values) {
            entry.cell.cached.clone()
        } else {
            None
        };
        cell
    }
}

/// Formula text a cell evaluates, deriving it for dependent shared members
fn effective_text(store: &FormulaStore, row: u32, col: u16, cell: &FormulaCell) -> Option<String> {
    if let Some(text) = &cell.text {
        return Some(text.clone());
    }
    let id = cell.shared_id.as_ref()?;
    let (c_row, c_col) = store.groups().canonical(id)?;
    let canonical = store.get(c_row, c_col)?.text.as_deref()?;
    derive_effective_text(canonical, row as i64 - c_row as i64, col as i64 - c_col as i64).ok()
}
