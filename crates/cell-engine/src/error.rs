//! Error types for the Cell engine.
//!
//! Every variant is fatal: the interpreter stops at the first one and the
//! host reports it. `Aborted` never reaches the host as an error. Value
//! coercion never produces an error.

use thiserror::Error;

use crate::sheet::SheetError;

/// Errors that can occur while lexing, parsing or evaluating a program.
#[derive(Error, Debug)]
pub enum CellError {
    #[error("line {line}: {message}")]
    Lex { line: usize, message: String },

    #[error("syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("function '{0}' is not found")]
    UndefinedFunction(String),

    #[error("function '{name}' expects {expected} argument(s) but got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("function '{0}' is already defined")]
    Redefinition(String),

    #[error("special var '{0}' is readonly")]
    ReadOnly(String),

    #[error("'{0}' is not allowed outside a loop")]
    OutsideLoop(&'static str),

    #[error("integer divide by zero")]
    DivisionByZero,

    #[error("'{pattern}' is invalid regular expression: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("FS '{0}' is invalid format")]
    FieldSeparator(String),

    #[error("'{0}' has too many fields")]
    TooManyFields(String),

    #[error("sheet add error. '{0}' is invalid sheet name.")]
    InvalidSheetName(String),

    /// Raised by `abort()`; the interpreter turns it into an aborted outcome.
    #[error("aborted with exit code {0}")]
    Aborted(i32),

    #[error("call depth exceeded limit ({0})")]
    CallDepth(usize),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CellError>;
