//! End-to-end scripts against the real workbook, including file round trips.

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use cell_core::{Document, Settings, Value, WorkbookError};
use cell_engine::{CellError, Spreadsheet};

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(doc: &mut Document, program: &str, input: &str) -> (cell_core::Result<cell_core::Outcome>, String) {
    run_with(doc, program, input, &Settings::default())
}

fn run_with(
    doc: &mut Document,
    program: &str,
    input: &str,
    settings: &Settings,
) -> (cell_core::Result<cell_core::Outcome>, String) {
    let out = Captured::default();
    let result = doc.run_script(
        program,
        settings,
        Cursor::new(input.as_bytes().to_vec()),
        out.clone(),
    );
    (result, out.text())
}

#[test]
fn test_arithmetic_printed() {
    let mut doc = Document::new();
    let (result, out) = run(
        &mut doc,
        "puts(1 + 3, 1 - 3, 9 / 3, 10 % 3, 9.99 % 3.33, 2 ** 3, 3 ** 0)",
        "",
    );
    result.unwrap();
    assert_eq!(out, "4 -2 3 1 0 8 1\n");
}

#[test]
fn test_cell_round_trip_through_workbook() {
    let mut doc = Document::new();
    let (result, out) = run(
        &mut doc,
        "[\"A1\"] = \"5\"; puts([\"A1\"] + 1); [\"A1\"] = \"abc\"; puts([\"A1\"] . \"!\")",
        "",
    );
    result.unwrap();
    assert_eq!(out, "6\nabc!\n");
    assert_eq!(
        doc.workbook.active_sheet().get(&cell_core::CellRef::new(0, 0)),
        Some(Value::from("abc"))
    );
}

#[test]
fn test_record_loop_sums_columns() {
    let mut doc = Document::new();
    let settings = Settings {
        record_loop: true,
        field_separator: Some(",".into()),
        ..Settings::default()
    };
    let (result, out) = run_with(
        &mut doc,
        "[\"A\" . NR] = $1; [\"B\" . NR] = $2 * 2; total += $2",
        "apple,3\npear,4\n",
        &settings,
    );
    result.unwrap();
    assert_eq!(out, "");
    assert_eq!(doc.workbook.cell_value("A2").unwrap(), "pear");
    assert_eq!(doc.workbook.cell_value("B1").unwrap(), "6");
    assert_eq!(doc.workbook.cell_value("B2").unwrap(), "8");
}

#[test]
fn test_sheet_management_script() {
    let mut doc = Document::new();
    let (result, out) = run(
        &mut doc,
        r#"
[ "A1" ] = 10
copy("Sheet1", "Copy")
@ = "Copy"
["A1"] += 5
rename("Sheet1", "Original")
puts(count(), head(), tail(), @)
@ = "Original"
puts(["A1"])
"#,
        "",
    );
    result.unwrap();
    assert_eq!(out, "2 Original Copy Copy\n10\n");
    assert_eq!(doc.workbook.sheet("Copy").map(|s| s.grid.len()), Some(1));
}

#[test]
fn test_iterating_sheets_with_pointer() {
    let mut doc = Document::new();
    let (result, out) = run(
        &mut doc,
        "@ = \"B\"; @ = \"C\"; head(); do { puts(@) } while (++@ ne \"\")",
        "",
    );
    result.unwrap();
    assert_eq!(out, "Sheet1\nB\nC\n");
}

#[test]
fn test_fatal_error_reports_script_error() {
    let mut doc = Document::new();
    let (result, _) = run(&mut doc, "delete(\"Sheet1\")", "");
    assert!(matches!(
        result,
        Err(WorkbookError::Script(CellError::Sheet(_)))
    ));
}

#[test]
fn test_grd_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.grd");

    let mut doc = Document::new();
    let (result, _) = run(
        &mut doc,
        "[\"A1\"] = 1.5; [\"B2\"] = \"two words\"; @ = \"Other\"; [\"C3\"] = 3",
        "",
    );
    result.unwrap();
    doc.save_as(&path).unwrap();

    let mut reopened = Document::open(Some(&path)).unwrap();
    assert_eq!(reopened.workbook.sheet_count(), 2);
    let (result, out) = run(
        &mut reopened,
        "puts(@, [\"A1\"], [\"B2\"]); @ = \"Other\"; puts([\"C3\"] * 2)",
        "",
    );
    result.unwrap();
    assert_eq!(out, "Sheet1 1.5 two words\n6\n");
}

#[test]
fn test_csv_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(&input, "item,qty\nbolt,3\nnut,10\n").unwrap();

    let mut doc = Document::open(Some(&input)).unwrap();
    let settings = Settings {
        row_loop: true,
        start_row: 2,
        ..Settings::default()
    };
    let (result, _) = run_with(&mut doc, "[\"C\" . NER] = [\"B\" . NER] * 2", "", &settings);
    result.unwrap();
    doc.save_as(&output).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "item,qty,\nbolt,3,6\nnut,10,20\n");
}
