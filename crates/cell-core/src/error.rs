//! Error types for Cell core.

use std::path::PathBuf;

use thiserror::Error;

use cell_engine::{CellError, SheetError};

/// Errors that can occur while loading, running against or saving a workbook.
#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported workbook format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("workbook file '{}' is not found", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Script(#[from] CellError),
}

pub type Result<T> = std::result::Result<T, WorkbookError>;
