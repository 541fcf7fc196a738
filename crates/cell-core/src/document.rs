//! A workbook plus the script run against it.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::info;

use cell_engine::{Interpreter, Outcome, Settings};

use crate::error::Result;
use crate::storage;
use crate::workbook::Workbook;

pub struct Document {
    pub workbook: Workbook,
    /// Where the workbook was loaded from, if anywhere.
    pub file_path: Option<PathBuf>,
}

impl Document {
    /// A document over a fresh workbook.
    pub fn new() -> Self {
        Document {
            workbook: Workbook::new(),
            file_path: None,
        }
    }

    /// Load a document; `None` starts from a fresh workbook.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::new());
        };
        Ok(Document {
            workbook: storage::load(path)?,
            file_path: Some(path.to_path_buf()),
        })
    }

    /// Run `program` against the workbook.
    ///
    /// The workbook keeps every change made before a fatal error.
    pub fn run_script(
        &mut self,
        program: &str,
        settings: &Settings,
        input: impl BufRead + 'static,
        output: impl Write + 'static,
    ) -> Result<Outcome> {
        let code = settings.wrap_program(program);
        let mut interp = Interpreter::new(std::mem::take(&mut self.workbook));
        interp.set_input(input);
        interp.set_output(output);

        let result = interp.configure(settings).and_then(|()| interp.run(&code));
        self.workbook = interp.into_sheet();

        let outcome = result?;
        info!(
            "script finished with exit code {}{}",
            outcome.exit_code,
            if outcome.aborted { " (aborted)" } else { "" }
        );
        Ok(outcome)
    }

    /// Write the workbook to `path`; the format follows the extension.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        storage::save(path, &self.workbook)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_engine::{CellError, Spreadsheet};
    use std::io::{self, Cursor};

    fn run(doc: &mut Document, program: &str, settings: &Settings) -> Result<Outcome> {
        doc.run_script(program, settings, Cursor::new(Vec::new()), io::sink())
    }

    #[test]
    fn test_changes_land_in_workbook() {
        let mut doc = Document::new();
        run(&mut doc, "[\"A1\"] = 2 * 21", &Settings::default()).unwrap();
        assert_eq!(doc.workbook.cell_value("A1").unwrap(), "42");
    }

    #[test]
    fn test_changes_survive_a_fatal_error() {
        let mut doc = Document::new();
        let err = run(&mut doc, "[\"A1\"] = 1; undefined()", &Settings::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::WorkbookError::Script(CellError::UndefinedFunction(_))
        ));
        assert_eq!(doc.workbook.cell_value("A1").unwrap(), "1");
    }

    #[test]
    fn test_initial_sheet_setting() {
        let mut doc = Document::new();
        let settings = Settings {
            initial_sheet: Some("Report".into()),
            ..Settings::default()
        };
        run(&mut doc, "[\"A1\"] = @", &settings).unwrap();
        assert_eq!(doc.workbook.active_sheet_name(), "Report");
        assert_eq!(doc.workbook.cell_value("A1").unwrap(), "Report");
    }

    #[test]
    fn test_row_loop_wrapper() {
        let mut doc = Document::new();
        for (i, axis) in ["A1", "A2", "A3"].iter().enumerate() {
            doc.workbook
                .set_cell_value(axis, cell_engine::Value::Number(i as f64 + 1.0))
                .unwrap();
        }
        let settings = Settings {
            row_loop: true,
            start_row: 2,
            ..Settings::default()
        };
        run(&mut doc, "[\"B\" . NER] = [\"A\" . NER] * 10", &settings).unwrap();
        assert_eq!(doc.workbook.cell_value("B1").unwrap(), "");
        assert_eq!(doc.workbook.cell_value("B2").unwrap(), "20");
        assert_eq!(doc.workbook.cell_value("B3").unwrap(), "30");
    }

    #[test]
    fn test_open_without_path() {
        let doc = Document::open(None).unwrap();
        assert_eq!(doc.workbook.sheet_count(), 1);
        assert!(doc.file_path.is_none());
    }
}
