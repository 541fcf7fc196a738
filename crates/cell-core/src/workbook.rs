//! In-memory multi-sheet workbook.
//!
//! Sheets keep document order; exactly one is active at a time. Cell
//! operations coming through [`Spreadsheet`] address the active sheet.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use cell_engine::{CellRef, SheetError, Spreadsheet, Value};

/// Cell storage for one sheet (DashMap is internally Arc-based, clones are cheap).
pub type Grid = Arc<DashMap<CellRef, Value>>;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

fn new_grid() -> Grid {
    Arc::new(DashMap::new())
}

#[derive(Debug)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            grid: new_grid(),
        }
    }

    /// A copy with its own storage.
    fn duplicate(&self, name: &str) -> Self {
        let grid: DashMap<CellRef, Value> = self
            .grid
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        Sheet {
            name: name.to_string(),
            grid: Arc::new(grid),
        }
    }

    pub fn get(&self, cell: &CellRef) -> Option<Value> {
        self.grid.get(cell).map(|v| v.value().clone())
    }

    /// Store a value; an empty string clears the cell.
    pub fn set(&self, cell: CellRef, value: Value) {
        if matches!(&value, Value::Str(s) if s.is_empty()) {
            self.grid.remove(&cell);
        } else {
            self.grid.insert(cell, value);
        }
    }

    /// Last used row, 1-based (0 when empty).
    pub fn last_row(&self) -> usize {
        self.grid.iter().map(|e| e.key().row + 1).max().unwrap_or(0)
    }

    /// Last used column, 1-based (0 when empty).
    pub fn last_col(&self) -> usize {
        self.grid.iter().map(|e| e.key().col + 1).max().unwrap_or(0)
    }

    /// Cells sorted by row, then column.
    pub fn sorted_cells(&self) -> Vec<(CellRef, Value)> {
        let mut cells: Vec<_> = self
            .grid
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        cells.sort_by(|(a, _), (b, _)| a.row.cmp(&b.row).then(a.col.cmp(&b.col)));
        cells
    }
}

#[derive(Debug)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active: usize,
}

impl Workbook {
    /// A workbook with a single empty `Sheet1`.
    pub fn new() -> Self {
        Workbook {
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME)],
            active: 0,
        }
    }

    /// Build a workbook from loaded sheets; the first one is active.
    /// An empty list yields a fresh workbook.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        if sheets.is_empty() {
            return Self::new();
        }
        Workbook { sheets, active: 0 }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    fn index_of(&self, name: &str) -> Result<usize, SheetError> {
        self.sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SheetError::NotFound(name.to_string()))
    }

    fn parse_axis(axis: &str) -> Result<CellRef, SheetError> {
        CellRef::parse(axis).ok_or_else(|| SheetError::InvalidAxis(axis.to_string()))
    }

    fn activate(&mut self, index: usize) -> String {
        self.active = index;
        self.sheets[index].name.clone()
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Spreadsheet for Workbook {
    fn cell_value(&self, axis: &str) -> Result<String, SheetError> {
        let cell = Self::parse_axis(axis)?;
        Ok(self
            .active_sheet()
            .get(&cell)
            .map(|v| v.as_string())
            .unwrap_or_default())
    }

    fn set_cell_value(&mut self, axis: &str, value: Value) -> Result<(), SheetError> {
        let cell = Self::parse_axis(axis)?;
        self.active_sheet().set(cell, value);
        Ok(())
    }

    fn active_sheet_name(&self) -> String {
        self.active_sheet().name.clone()
    }

    fn set_active_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        self.active = self.index_of(name)?;
        Ok(())
    }

    fn sheet_exists(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    fn add_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        if self.sheet_exists(name) {
            return Err(SheetError::Exists(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        self.active = self.sheets.len() - 1;
        debug!("added sheet '{}' ({} total)", name, self.sheets.len());
        Ok(())
    }

    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<String, SheetError> {
        if old == new {
            self.index_of(old)?;
            return Ok(new.to_string());
        }
        if self.sheet_exists(new) {
            return Err(SheetError::Exists(new.to_string()));
        }
        let index = self.index_of(old)?;
        self.sheets[index].name = new.to_string();
        Ok(new.to_string())
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Deleting the active sheet activates the one before it.
    fn delete_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        let index = self.index_of(name)?;
        if self.sheets.len() == 1 {
            return Err(SheetError::LastSheet(name.to_string()));
        }
        self.sheets.remove(index);
        if self.active > index || (self.active == index && index > 0) {
            self.active -= 1;
        }
        Ok(())
    }

    fn copy_sheet(&mut self, from: &str, to: &str) -> Result<(), SheetError> {
        if self.sheet_exists(to) {
            return Err(SheetError::Exists(to.to_string()));
        }
        let index = self.index_of(from)?;
        let copy = self.sheets[index].duplicate(to);
        self.sheets.push(copy);
        Ok(())
    }

    fn head_sheet(&mut self) -> String {
        self.activate(0)
    }

    fn tail_sheet(&mut self) -> String {
        self.activate(self.sheets.len() - 1)
    }

    fn next_sheet(&mut self) -> String {
        if self.active + 1 < self.sheets.len() {
            self.activate(self.active + 1)
        } else {
            String::new()
        }
    }

    fn prev_sheet(&mut self) -> String {
        if self.active > 0 {
            self.activate(self.active - 1)
        } else {
            String::new()
        }
    }

    fn rows_count(&self) -> usize {
        self.active_sheet().last_row()
    }

    fn cols_count(&self) -> usize {
        self.active_sheet().last_col()
    }
}
