//! Cell addresses and column-letter arithmetic.
//!
//! Provides conversion between spreadsheet-style axes (e.g. "A1", "AA100")
//! and zero-indexed column/row coordinates, plus the 1-based column-name
//! helpers used by `LCC` and by letter-style increments (`"z"` -> `"aa"`).
//!
//! # Examples
//!
//! ```
//! use cell_engine::CellRef;
//!
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn axis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$").expect("axis regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2").
    /// Returns None if the input is not a valid axis.
    pub fn parse(axis: &str) -> Option<CellRef> {
        let caps = axis_re().captures(axis)?;
        let col = column_name_to_number(&caps["letters"])?.checked_sub(1)?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// Convert a column name to its 1-based number ("A" -> 1, "AA" -> 27).
/// Case-insensitive. Returns None for empty, non-alphabetic or overflowing input.
pub fn column_name_to_number(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in name.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

/// Convert a 1-based column number to its name (1 -> "A", 27 -> "AA").
/// Returns None for 0.
pub fn column_number_to_name(number: usize) -> Option<String> {
    let col = number.checked_sub(1)?;
    Some(CellRef::col_to_letters(col))
}

/// Step a purely alphabetic string through column order by `delta`.
///
/// Case is preserved when the input is all lowercase; anything else comes
/// back uppercase. Stepping below "A" yields the empty string.
pub fn step_column_name(name: &str, delta: i64) -> Option<String> {
    let number = column_name_to_number(name)? as i64;
    let lowercase = name.bytes().all(|c| c.is_ascii_lowercase());
    let stepped = number.checked_add(delta)?;
    if stepped < 1 {
        return Some(String::new());
    }
    let letters = column_number_to_name(stepped as usize)?;
    Some(if lowercase {
        letters.to_ascii_lowercase()
    } else {
        letters
    })
}
