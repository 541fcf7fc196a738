//! CSV import/export for a single sheet.

use std::path::Path;

use cell_engine::{CellRef, Value, format_number};

use crate::error::Result;
use crate::workbook::{Sheet, Workbook};

/// Load a CSV file into a one-sheet workbook.
pub fn parse_csv(path: &Path) -> Result<Workbook> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_csv_content(&content))
}

pub fn parse_csv_content(content: &str) -> Workbook {
    let workbook = Workbook::new();
    let sheet = workbook.active_sheet();
    for (cell_ref, value) in parse_csv_cells(content) {
        sheet.set(cell_ref, value);
    }
    workbook
}

/// Parse CSV text into cells anchored at A1. Empty fields are skipped.
pub fn parse_csv_cells(content: &str) -> Vec<(CellRef, Value)> {
    let mut cells = Vec::new();
    for (row_idx, line) in content.lines().enumerate() {
        for (col_idx, field) in parse_csv_line(line).into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            cells.push((CellRef::new(col_idx, row_idx), parse_csv_field(&field)));
        }
    }
    cells
}

/// Parse a single CSV line, handling quoted fields
pub(crate) fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
            }
            ',' => {
                let field = std::mem::take(&mut current);
                fields.push(if field_was_quoted {
                    field
                } else {
                    field.trim().to_string()
                });
                field_was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    fields.push(if field_was_quoted {
        current
    } else {
        current.trim().to_string()
    });
    fields
}

/// Numbers become numeric cells, except ones with leading zeros ("007"),
/// which stay text along with everything else.
pub(crate) fn parse_csv_field(field: &str) -> Value {
    let trimmed = field.trim();
    if field != trimmed {
        return Value::from(field);
    }

    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return Value::from(trimmed);
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::from(trimmed),
    }
}

/// Write the active sheet of `workbook` as CSV.
pub fn write_csv(path: &Path, workbook: &Workbook) -> Result<()> {
    std::fs::write(path, write_csv_content(workbook.active_sheet()))?;
    Ok(())
}

/// Render a sheet as CSV covering A1 through its last used row and column.
pub fn write_csv_content(sheet: &Sheet) -> String {
    let (rows, cols) = (sheet.last_row(), sheet.last_col());
    let mut out = String::new();
    for row in 0..rows {
        let fields: Vec<String> = (0..cols)
            .map(|col| match sheet.get(&CellRef::new(col, row)) {
                Some(Value::Number(n)) => format_number(n),
                Some(Value::Str(s)) => escape_csv_field(&s),
                None => String::new(),
            })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it holds a separator, a quote, a line break or
/// surrounding whitespace.
fn escape_csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r']) || field.trim() != field;
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
