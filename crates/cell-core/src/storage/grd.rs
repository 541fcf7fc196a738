//! The `.grd` text workbook format.
//!
//! ```text
//! # Cell workbook
//! [Sheet1]
//! A1: 42
//! B1: "text with \"quotes\""
//! [Totals]
//! A1: 1e+06
//! ```
//!
//! Cells before the first `[name]` header belong to `Sheet1`.

use std::fs;
use std::path::Path;

use cell_engine::{CellRef, Value, format_number, is_valid_sheet_name};

use crate::error::{Result, WorkbookError};
use crate::workbook::{DEFAULT_SHEET_NAME, Sheet, Workbook};

/// Parse a .grd file into a workbook.
pub fn parse_grd(path: &Path) -> Result<Workbook> {
    let content = fs::read_to_string(path)?;
    parse_grd_content(&content)
}

/// Parse .grd content from a string.
pub fn parse_grd_content(content: &str) -> Result<Workbook> {
    let mut sheets: Vec<Sheet> = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        let line_num = line_num + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if !is_valid_sheet_name(name) {
                return Err(WorkbookError::Parse {
                    line: line_num,
                    message: format!("Invalid sheet name: {}", name),
                });
            }
            if sheets.iter().any(|s| s.name == name) {
                return Err(WorkbookError::Parse {
                    line: line_num,
                    message: format!("Duplicate sheet: {}", name),
                });
            }
            sheets.push(Sheet::new(name));
            continue;
        }

        let Some((cell_ref_str, value_str)) = line.split_once(':') else {
            return Err(WorkbookError::Parse {
                line: line_num,
                message: "Expected 'CELLREF: VALUE' format".to_string(),
            });
        };

        let cell_ref_str = cell_ref_str.trim();
        let cell_ref = CellRef::parse(cell_ref_str).ok_or_else(|| WorkbookError::Parse {
            line: line_num,
            message: format!("Invalid cell reference: {}", cell_ref_str),
        })?;

        let value = parse_cell_value(value_str, line_num)?;
        if sheets.is_empty() {
            sheets.push(Sheet::new(DEFAULT_SHEET_NAME));
        }
        if let Some(sheet) = sheets.last() {
            sheet.set(cell_ref, value);
        }
    }

    Ok(Workbook::from_sheets(sheets))
}

fn parse_cell_value(value: &str, line_num: usize) -> Result<Value> {
    let value = value.trim();

    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return Ok(Value::Str(unescape_grd_text(&value[1..value.len() - 1])));
    }

    if let Ok(n) = value.parse::<f64>() {
        return Ok(Value::Number(n));
    }

    Err(WorkbookError::Parse {
        line: line_num,
        message: format!("Invalid value: {}. Use quotes for text.", value),
    })
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(next @ ('\\' | '"')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Write a workbook to a .grd file.
pub fn write_grd(path: &Path, workbook: &Workbook) -> Result<()> {
    fs::write(path, write_grd_content(workbook))?;
    Ok(())
}

/// Render a workbook in .grd format, cells sorted by position.
pub fn write_grd_content(workbook: &Workbook) -> String {
    let mut lines = vec!["# Cell workbook".to_string()];

    for sheet in workbook.sheets() {
        lines.push(format!("[{}]", sheet.name));
        for (cell_ref, value) in sheet.sorted_cells() {
            let value_str = match value {
                Value::Number(n) => format_number(n),
                Value::Str(s) => format!("\"{}\"", escape_grd_text(&s)),
            };
            lines.push(format!("{}: {}", cell_ref, value_str));
        }
    }

    lines.join("\n") + "\n"
}
