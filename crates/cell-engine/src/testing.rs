//! Test doubles shared by the engine's unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use crate::cell_ref::CellRef;
use crate::interp::{Interpreter, Outcome};
use crate::sheet::{SheetError, Spreadsheet};
use crate::value::Value;

/// A minimal multi-sheet workbook kept in hash maps.
pub struct FakeSheet {
    sheets: Vec<(String, HashMap<CellRef, Value>)>,
    active: usize,
}

impl FakeSheet {
    pub fn new() -> Self {
        FakeSheet {
            sheets: vec![("Sheet1".to_string(), HashMap::new())],
            active: 0,
        }
    }

    /// Stored value of a cell on any sheet, bypassing the active sheet.
    pub fn raw(&self, sheet: &str, axis: &str) -> Option<Value> {
        let cell = CellRef::parse(axis)?;
        let (_, cells) = self.sheets.iter().find(|(name, _)| name == sheet)?;
        cells.get(&cell).cloned()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|(n, _)| n == name)
    }

    fn parse_axis(axis: &str) -> Result<CellRef, SheetError> {
        CellRef::parse(axis).ok_or_else(|| SheetError::InvalidAxis(axis.to_string()))
    }

    fn activate(&mut self, index: usize) -> String {
        self.active = index;
        self.sheets[index].0.clone()
    }
}

impl Spreadsheet for FakeSheet {
    fn cell_value(&self, axis: &str) -> Result<String, SheetError> {
        let cell = Self::parse_axis(axis)?;
        Ok(self.sheets[self.active]
            .1
            .get(&cell)
            .map(Value::as_string)
            .unwrap_or_default())
    }

    fn set_cell_value(&mut self, axis: &str, value: Value) -> Result<(), SheetError> {
        let cell = Self::parse_axis(axis)?;
        self.sheets[self.active].1.insert(cell, value);
        Ok(())
    }

    fn active_sheet_name(&self) -> String {
        self.sheets[self.active].0.clone()
    }

    fn set_active_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| SheetError::NotFound(name.to_string()))?;
        self.active = index;
        Ok(())
    }

    fn sheet_exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn add_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        if self.sheet_exists(name) {
            return Err(SheetError::Exists(name.to_string()));
        }
        self.sheets.push((name.to_string(), HashMap::new()));
        self.active = self.sheets.len() - 1;
        Ok(())
    }

    fn rename_sheet(&mut self, old: &str, new: &str) -> Result<String, SheetError> {
        if self.sheet_exists(new) {
            return Err(SheetError::Exists(new.to_string()));
        }
        let index = self
            .index_of(old)
            .ok_or_else(|| SheetError::NotFound(old.to_string()))?;
        self.sheets[index].0 = new.to_string();
        Ok(new.to_string())
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn delete_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| SheetError::NotFound(name.to_string()))?;
        if self.sheets.len() == 1 {
            return Err(SheetError::LastSheet(name.to_string()));
        }
        self.sheets.remove(index);
        if self.active >= index && self.active > 0 {
            self.active -= 1;
        }
        Ok(())
    }

    fn copy_sheet(&mut self, from: &str, to: &str) -> Result<(), SheetError> {
        if self.sheet_exists(to) {
            return Err(SheetError::Exists(to.to_string()));
        }
        let index = self
            .index_of(from)
            .ok_or_else(|| SheetError::NotFound(from.to_string()))?;
        let cells = self.sheets[index].1.clone();
        self.sheets.push((to.to_string(), cells));
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
        self.sheets[self.active]
            .1
            .keys()
            .map(|c| c.row + 1)
            .max()
            .unwrap_or(0)
    }

    fn cols_count(&self) -> usize {
        self.sheets[self.active]
            .1
            .keys()
            .map(|c| c.col + 1)
            .max()
            .unwrap_or(0)
    }
}

/// An output sink whose contents stay readable after the interpreter takes it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An interpreter over a fresh [`FakeSheet`] reading `input`.
pub fn interpreter(input: &str) -> (Interpreter<FakeSheet>, SharedBuffer) {
    interpreter_with(FakeSheet::new(), input)
}

pub fn interpreter_with(sheet: FakeSheet, input: &str) -> (Interpreter<FakeSheet>, SharedBuffer) {
    let mut interp = Interpreter::new(sheet);
    interp.set_input(Cursor::new(input.as_bytes().to_vec()));
    let out = SharedBuffer::default();
    interp.set_output(out.clone());
    (interp, out)
}

pub fn run_ok(interp: &mut Interpreter<FakeSheet>, src: &str) -> Outcome {
    match interp.run(src) {
        Ok(outcome) => outcome,
        Err(e) => panic!("script failed: {}\n{}", e, src),
    }
}
