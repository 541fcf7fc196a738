//! cell-engine - the Cell language: lexer, parser and tree-walking evaluator.
//!
//! - [`lexer`] / [`parser`] turn program text into an [`ast`]
//! - [`Value`] holds the number/string runtime values and their coercions
//! - [`Interpreter`] evaluates programs against any [`Spreadsheet`]
//! - [`cell_ref`] converts between `A1` axes and column/row indices

pub mod ast;
mod builtins;
pub mod cell_ref;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod sheet;
pub mod value;

#[cfg(test)]
mod testing;

pub use ast::{Expr, Stmt};
pub use cell_ref::CellRef;
pub use error::{CellError, Result};
pub use interp::{Interpreter, MAX_CALL_DEPTH, Outcome, Settings};
pub use parser::parse_program;
pub use sheet::{SheetError, Spreadsheet, is_valid_sheet_name};
pub use value::{Value, format_number};
