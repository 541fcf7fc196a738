//! The spreadsheet collaborator seen by the interpreter.
//!
//! The engine never owns workbook storage. Hosts implement [`Spreadsheet`]
//! over whatever model they keep; `cell_core::Workbook` is the in-memory one.

use thiserror::Error;

use crate::value::Value;

/// Characters a sheet name may not contain.
const FORBIDDEN_SHEET_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("cell '{0}' refer failed")]
    InvalidAxis(String),

    #[error("sheet {0} is not found.")]
    NotFound(String),

    #[error("sheet {0} already exists.")]
    Exists(String),

    #[error("sheet {0} is the last sheet and cannot be deleted.")]
    LastSheet(String),

    #[error("'{0}' is invalid sheet name.")]
    InvalidName(String),
}

/// Operations the interpreter needs from a workbook.
///
/// All cell operations address the active sheet. Navigation methods return
/// the name of the newly active sheet, or an empty string when there is no
/// sheet in that direction (the active sheet is then unchanged).
pub trait Spreadsheet {
    /// Raw text of the cell at `axis` (e.g. `"B3"`); empty for unset cells.
    fn cell_value(&self, axis: &str) -> Result<String, SheetError>;

    fn set_cell_value(&mut self, axis: &str, value: Value) -> Result<(), SheetError>;

    fn active_sheet_name(&self) -> String;

    fn set_active_sheet(&mut self, name: &str) -> Result<(), SheetError>;

    fn sheet_exists(&self, name: &str) -> bool;

    /// Append a sheet and make it active.
    fn add_sheet(&mut self, name: &str) -> Result<(), SheetError>;

    /// Rename `old` to `new`, returning the new name.
    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<String, SheetError>;

    fn sheet_count(&self) -> usize;

    fn delete_sheet(&mut self, name: &str) -> Result<(), SheetError>;

    fn copy_sheet(&mut self, from: &str, to: &str) -> Result<(), SheetError>;

    fn head_sheet(&mut self) -> String;

    fn tail_sheet(&mut self) -> String;

    fn next_sheet(&mut self) -> String;

    fn prev_sheet(&mut self) -> String;

    /// Last used row of the active sheet, 1-based (0 when empty).
    fn rows_count(&self) -> usize;

    /// Last used column of the active sheet, 1-based (0 when empty).
    fn cols_count(&self) -> usize;
}

/// Whether `name` is acceptable as a worksheet name.
pub fn is_valid_sheet_name(name: &str) -> bool {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return false;
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return false;
    }
    !name.contains(FORBIDDEN_SHEET_CHARS)
}
