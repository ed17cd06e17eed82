//! Workbook type - the sheet registry

use crate::error::{Error, Result};
use crate::worksheet::{SheetId, Worksheet};
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// Sheets are ordered and addressed by a stable [`SheetId`]; the display
/// name is what sheet-qualified references in formula text match against.
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create a new workbook with one worksheet (`sheet1` / `Sheet1`)
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("sheet1", "Sheet1")],
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by id
    pub fn worksheet(&self, id: &SheetId) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.id() == id)
    }

    /// Get a mutable worksheet by id
    pub fn worksheet_mut(&mut self, id: &SheetId) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.id() == id)
    }

    /// Get a worksheet by id or fail with [`Error::SheetNotFound`]
    pub fn require_worksheet(&self, id: &SheetId) -> Result<&Worksheet> {
        self.worksheet(id)
            .ok_or_else(|| Error::SheetNotFound(id.to_string()))
    }

    /// Get a worksheet by position
    pub fn worksheet_at(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by position
    pub fn worksheet_at_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by display name (case-insensitive)
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets
            .iter()
            .find(|ws| ws.name().to_lowercase() == name.to_lowercase())
    }

    /// Position of a sheet
    pub fn sheet_index(&self, id: &SheetId) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.id() == id)
    }

    /// Iterate over all worksheets in order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a new, empty worksheet
    pub fn add_worksheet(&mut self, id: impl Into<SheetId>, name: &str) -> Result<usize> {
        let index = self.worksheets.len();
        self.insert_worksheet(index, Worksheet::new(id, name))?;
        Ok(index)
    }

    /// Insert an existing worksheet at a position
    pub fn insert_worksheet(&mut self, index: usize, worksheet: Worksheet) -> Result<()> {
        if index > self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        if self.worksheet(worksheet.id()).is_some() {
            return Err(Error::DuplicateSheetId(worksheet.id().to_string()));
        }
        self.validate_sheet_name(worksheet.name(), None)?;

        self.worksheets.insert(index, worksheet);
        Ok(())
    }

    /// Remove a worksheet, returning its position and content
    pub fn remove_worksheet(&mut self, id: &SheetId) -> Result<(usize, Worksheet)> {
        let index = self
            .sheet_index(id)
            .ok_or_else(|| Error::SheetNotFound(id.to_string()))?;
        Ok((index, self.worksheets.remove(index)))
    }

    /// Rename a worksheet, returning the previous name
    pub fn rename_worksheet(&mut self, id: &SheetId, new_name: &str) -> Result<String> {
        let index = self
            .sheet_index(id)
            .ok_or_else(|| Error::SheetNotFound(id.to_string()))?;
        self.validate_sheet_name(new_name, Some(index))?;

        let sheet = &mut self.worksheets[index];
        let old = sheet.name().to_string();
        sheet.set_name(new_name);
        Ok(old)
    }

    /// Check that `name` could be given to the sheet at `exclude_index`
    /// (or to a new sheet when `None`)
    pub fn validate_sheet_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        Self::check_sheet_name_syntax(name)?;

        // Check for duplicate names (case-insensitive)
        let name_lower = name.to_lowercase();
        for (i, ws) in self.worksheets.iter().enumerate() {
            if Some(i) != exclude_index && ws.name().to_lowercase() == name_lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    /// Check the characters and length of a sheet name, ignoring other sheets
    pub fn check_sheet_name_syntax(name: &str) -> Result<()> {
        // Check length
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot begin or end with an apostrophe".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
